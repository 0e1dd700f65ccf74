use collision::{
    AGENT_RADIUS, Aabb, Collider, CollisionWorld, Cylinder, MoveOutcome, MoveRequest, Obb,
    PUSH_EPSILON, Triangle2, Trimesh, TrapKind, Vector2, narrow_phase,
};

fn v(x: f32, z: f32) -> Vector2<f32> {
    Vector2::new(x, z)
}

fn remaining_penetration(world: &CollisionWorld, p: Vector2<f32>) -> f32 {
    world
        .colliders()
        .iter()
        .filter_map(|c| narrow_phase::push_out_circle(p, AGENT_RADIUS, c, 0.57))
        .map(|hit| hit.depth)
        .fold(0.0, f32::max)
}

#[test]
fn no_op_when_no_colliders() {
    let world = CollisionWorld::new();
    for (start, end) in [
        (v(0.0, 0.0), v(1.0, 1.0)),
        (v(-123.5, 9.0), v(-120.25, 14.0)),
        (v(3.0, 3.0), v(3.0, 3.0)),
    ] {
        assert_eq!(world.resolve_movement(start, end, 0.0, true), end);
        assert_eq!(world.resolve_movement(start, end, 7.0, false), end);
    }
}

#[test]
fn end_to_end_box_blocks_approach() {
    let mut world = CollisionWorld::new();
    world.register_aabb(10.0, 10.0, 12.0, 12.0, 0.0, 2.0).unwrap();

    let p = world.resolve_movement(v(9.0, 11.0), v(11.0, 11.0), 0.0, true);
    assert!(p.x <= 10.0 - AGENT_RADIUS + 0.01, "x = {}", p.x);
}

#[test]
fn wall_sliding_keeps_parallel_progress() {
    let mut world = CollisionWorld::new();
    world.register_aabb(10.0, -50.0, 12.0, 50.0, 0.0, 3.0).unwrap();

    let p = world.resolve_movement(v(9.5, 5.0), v(11.0, 10.0), 0.0, true);
    assert!(p.x <= 10.0 - AGENT_RADIUS + 0.01, "x = {}", p.x);
    assert!(p.y > 5.0, "z = {}", p.y);
}

#[test]
fn single_collider_penetration_is_resolved() {
    let shapes: Vec<Collider> = vec![
        Aabb::new(-1.0, -2.0, 1.0, 2.0, 0.0, 2.0).into(),
        Cylinder::new(0.0, 0.0, 1.5, 0.0, 2.0).into(),
        Obb::from_yaw(0.0, 0.0, 2.0, 0.75, 0.6, 0.0, 2.0).into(),
        Trimesh::new(
            vec![Triangle2 {
                ax: -2.0,
                az: -1.5,
                bx: 2.0,
                bz: -1.5,
                cx: 0.0,
                cz: 2.0,
            }],
            0.0,
            2.0,
        )
        .into(),
    ];

    for shape in shapes {
        let mut world = CollisionWorld::new();
        world.register(shape.clone()).unwrap();

        for ix in -12..=12 {
            for iz in -12..=12 {
                let end = v(ix as f32 * 0.25 + 0.01, iz as f32 * 0.25 - 0.02);
                let start = v(-10.0, -10.0);
                let p = world.resolve_movement(start, end, 0.0, true);
                let depth = remaining_penetration(&world, p);
                assert!(
                    depth <= PUSH_EPSILON + 1.0e-5,
                    "{shape:?}: end {end:?} resolved to {p:?} still penetrates {depth}"
                );
            }
        }
    }
}

#[test]
fn vertically_separated_collider_never_blocks() {
    let mut world = CollisionWorld::new();
    // Below the feet.
    world.register_aabb(0.0, 0.0, 4.0, 4.0, -3.0, -1.0).unwrap();
    // Above the head.
    world.register_cylinder(2.0, 2.0, 1.0, 5.0, 9.0).unwrap();

    for grounded in [true, false] {
        let end = v(2.0, 2.0);
        assert_eq!(world.resolve_movement(v(-2.0, -2.0), end, 0.0, grounded), end);
    }
}

#[test]
fn unrotated_obb_matches_aabb_in_world() {
    let mut aabb_world = CollisionWorld::new();
    aabb_world.register_aabb(2.0, 3.0, 6.0, 5.0, 0.0, 2.0).unwrap();

    let mut obb_world = CollisionWorld::new();
    obb_world
        .register(Obb {
            cx: 4.0,
            cz: 4.0,
            half_w: 2.0,
            half_d: 1.0,
            cos_a: 1.0,
            sin_a: 0.0,
            min_y: 0.0,
            max_y: 2.0,
        })
        .unwrap();

    for end in [v(1.75, 4.0), v(3.0, 3.5), v(5.5, 4.75), v(6.25, 5.25), v(4.0, 2.75)] {
        let start = v(0.0, 0.0);
        let a = aabb_world.resolve_movement(start, end, 0.0, false);
        let o = obb_world.resolve_movement(start, end, 0.0, false);
        assert!((a - o).norm() < 1.0e-5, "end {end:?}: aabb {a:?} obb {o:?}");
    }
}

#[test]
fn narrow_gap_returns_start_for_any_attempt() {
    let mut world = CollisionWorld::new();
    let gap = 2.0 * AGENT_RADIUS - 0.2;
    world.register_aabb(-5.0, -5.0, 0.0, 5.0, 0.0, 3.0).unwrap();
    world.register_aabb(gap, -5.0, gap + 5.0, 5.0, 0.0, 3.0).unwrap();

    let mid = gap * 0.5;
    let start = v(mid, -6.0);
    for end_z in [-4.5, -3.0, 0.0, 2.0] {
        let res = world.resolve_movement_detailed(MoveRequest::new(start, v(mid, end_z), 0.0, true));
        assert_eq!(res.position, start);
        assert_eq!(res.outcome, MoveOutcome::Blocked(TrapKind::Pocket));
    }
}

#[test]
fn triangle_containment_is_never_a_miss() {
    let tri = Triangle2 {
        ax: 0.0,
        az: 0.0,
        bx: 6.0,
        bz: 0.0,
        cx: 3.0,
        cz: 5.0,
    };
    for (x, z) in [(3.0, 1.0), (1.5, 0.5), (4.5, 0.5), (3.0, 4.0), (3.0, 2.5)] {
        let hit = narrow_phase::circle_vs_triangle(v(x, z), 0.05, &tri);
        assert!(hit.is_some(), "center ({x}, {z}) inside but reported clear");
        assert!(hit.unwrap().depth > 0.05);
    }
}

#[test]
fn height_query_prefers_highest_reachable_surface() {
    let mut world = CollisionWorld::new();
    world.register_aabb(0.0, 0.0, 10.0, 10.0, 0.0, 0.1).unwrap();
    world.register_aabb(4.0, 4.0, 6.0, 6.0, 0.0, 0.6).unwrap();
    world.register_aabb(4.5, 4.5, 5.5, 5.5, 0.0, 1.5).unwrap();

    // Feet at 0.3 with 0.5 step: 0.6 reachable, 1.5 is not, and 0.1 loses to 0.6.
    assert_eq!(world.collision_height_at(5.0, 5.0, 0.3, 0.5), 0.6);
    // Standing higher brings the tall block in reach.
    assert_eq!(world.collision_height_at(5.0, 5.0, 1.2, 0.5), 1.5);
    // Nothing reachable from deep below.
    assert_eq!(world.collision_height_at(5.0, 5.0, -5.0, 0.5), f32::NEG_INFINITY);
}
