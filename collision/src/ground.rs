use nalgebra::Vector2;

use super::{
    settings::{BARYCENTRIC_EPS, GEOM_EPS},
    types::{Bounds2, Collider, Triangle3, Trimesh},
    world::CollisionWorld,
};

/// Highest walkable collider surface under `(x, z)` that an agent with feet at `agent_y`
/// could stand on without climbing more than `step_height`.
///
/// - Flat-topped shapes (AABB, OBB, cylinder) offer their `max_y` when `(x, z)` is inside
///   their footprint.
/// - Trimeshes with 3D data offer the interpolated height of every walkable triangle
///   under `(x, z)`; steep triangles are walls, not ground.
/// - Trimeshes without 3D data offer their flat `max_y` over any triangle footprint.
///
/// Returns `f32::NEG_INFINITY` when nothing qualifies. Callers combine this with terrain
/// height by taking the maximum.
pub fn collision_height_at(
    world: &CollisionWorld,
    x: f32,
    z: f32,
    agent_y: f32,
    step_height: f32,
) -> f32 {
    if world.is_empty() {
        return f32::NEG_INFINITY;
    }

    let config = world.config();
    let limit = agent_y + step_height;
    let probe = Bounds2::new(x, z, x, z).inflate(config.agent_radius);

    let mut candidates = Vec::new();
    world.query_into(&probe, &mut candidates);

    let mut best = f32::NEG_INFINITY;
    for &i in &candidates {
        let collider = &world.colliders()[i];
        if collider.min_y() > limit {
            continue;
        }
        if let Some(y) = surface_height(collider, x, z, limit, config.walkable_slope_cos) {
            best = best.max(y);
        }
    }
    best
}

/// Highest surface of one collider under `(x, z)` that does not exceed `limit`.
pub fn surface_height(
    collider: &Collider,
    x: f32,
    z: f32,
    limit: f32,
    walkable_slope_cos: f32,
) -> Option<f32> {
    let top = match collider {
        Collider::Aabb(b) => b.contains_xz(x, z).then_some(b.max_y),
        Collider::Obb(o) => o.contains_xz(x, z).then_some(o.max_y),
        Collider::Cylinder(c) => {
            let d_sq = (x - c.cx) * (x - c.cx) + (z - c.cz) * (z - c.cz);
            (d_sq <= c.radius * c.radius).then_some(c.max_y)
        }
        Collider::Trimesh(m) => return trimesh_surface_height(m, x, z, limit, walkable_slope_cos),
    };
    top.filter(|&y| y <= limit)
}

fn trimesh_surface_height(
    mesh: &Trimesh,
    x: f32,
    z: f32,
    limit: f32,
    walkable_slope_cos: f32,
) -> Option<f32> {
    let p = Vector2::new(x, z);

    let Some(tris) = &mesh.triangles_3d else {
        let inside_any = mesh.triangles.iter().any(|t| {
            let [a, b, c] = t.vertices();
            barycentric(p, a, b, c).is_some_and(|(u, v)| inside_with_tolerance(u, v))
        });
        return (inside_any && mesh.max_y <= limit).then_some(mesh.max_y);
    };

    let mut best: Option<f32> = None;
    for tri in tris {
        if !tri.is_walkable(walkable_slope_cos) {
            continue;
        }
        let Some(y) = interpolate_height(tri, p) else {
            continue;
        };
        if y <= limit && best.is_none_or(|b| y > b) {
            best = Some(y);
        }
    }
    best
}

/// Height of the triangle's plane at `p`, if `p` falls within its XZ projection.
fn interpolate_height(tri: &Triangle3, p: Vector2<f32>) -> Option<f32> {
    let a = tri.a.xz();
    let b = tri.b.xz();
    let c = tri.c.xz();
    let (u, v) = barycentric(p, a, b, c)?;
    if !inside_with_tolerance(u, v) {
        return None;
    }
    Some(tri.a.y + u * (tri.c.y - tri.a.y) + v * (tri.b.y - tri.a.y))
}

/// Barycentric weights `(u, v)` of `p` along `a -> c` and `a -> b`.
/// `None` when the projected triangle is degenerate.
fn barycentric(
    p: Vector2<f32>,
    a: Vector2<f32>,
    b: Vector2<f32>,
    c: Vector2<f32>,
) -> Option<(f32, f32)> {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() <= GEOM_EPS {
        return None;
    }
    let inv = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv;
    let v = (dot00 * dot12 - dot01 * dot02) * inv;
    Some((u, v))
}

#[inline]
fn inside_with_tolerance(u: f32, v: f32) -> bool {
    u >= -BARYCENTRIC_EPS && v >= -BARYCENTRIC_EPS && u + v <= 1.0 + BARYCENTRIC_EPS
}
