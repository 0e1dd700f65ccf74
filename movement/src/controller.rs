use collision::{CollisionWorld, MoveOutcome, MoveRequest};
use nalgebra::{Vector2, Vector3};

use crate::terrain::TerrainHeight;

/// Planar moves shorter than this are skipped.
const DIST_EPS: f32 = 1.0e-5;

/// A horizontal move achieving less than this share of the desired distance
/// triggers a step-up attempt.
const STEP_TRIGGER_RATIO: f32 = 0.9;

/// Tuning for the reference controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Planar speed at full input (m/s).
    pub move_speed: f32,
    /// Downward acceleration while airborne (m/s²).
    pub gravity: f32,
    /// Upward velocity given by a jump (m/s).
    pub jump_speed: f32,
    /// Maximum falling speed (m/s, positive magnitude).
    pub terminal_velocity: f32,
    /// Highest ledge the agent climbs without jumping (m).
    pub step_height: f32,
    /// How far below the feet a grounded agent keeps contact with a surface (m).
    pub snap_distance: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            gravity: 9.81,
            jump_speed: 5.0,
            terminal_velocity: 50.0,
            step_height: 0.5,
            snap_distance: 0.5,
        }
    }
}

/// Agent state carried between ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentState {
    /// Feet position (world space).
    pub position: Vector3<f32>,
    /// Signed vertical speed, positive up.
    pub vertical_velocity: f32,
    pub grounded: bool,
}

impl AgentState {
    pub fn grounded_at(position: Vector3<f32>) -> Self {
        Self {
            position,
            vertical_velocity: 0.0,
            grounded: true,
        }
    }

    pub fn airborne_at(position: Vector3<f32>) -> Self {
        Self {
            position,
            vertical_velocity: 0.0,
            grounded: false,
        }
    }
}

/// Player intent for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveInput {
    /// Desired XZ direction; lengths above 1 are normalized.
    pub direction: Vector2<f32>,
    pub jump: bool,
}

/// Output of a single `step()` tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepResult {
    pub state: AgentState,
    /// Outcome of the horizontal resolve that was kept.
    pub outcome: MoveOutcome,
    /// The horizontal move was taken from the stepped-up height.
    pub stepped: bool,
    /// The agent touched down this tick.
    pub landed: bool,
}

/// Perform one movement tick.
///
/// Behavior
/// - Starts a jump when grounded and requested.
/// - Resolves the planar move against the world. A grounded agent that is mostly blocked
///   retries the move with its feet raised by `step_height`.
/// - Keeps a grounded agent on the highest reachable surface (terrain or collider) within
///   `snap_distance`; with nothing in reach the agent walks off the ledge.
/// - Applies gravity while airborne, clamped to terminal velocity. Landing checks every
///   surface between the previous and new feet height, so fast falls cannot skip a thin top.
pub fn step(
    world: &CollisionWorld,
    terrain: &impl TerrainHeight,
    config: &ControllerConfig,
    state: AgentState,
    input: MoveInput,
    dt_seconds: f32,
) -> StepResult {
    let dt = dt_seconds.max(0.0);
    let mut pos = state.position;
    let mut vy = state.vertical_velocity;
    let mut grounded = state.grounded;
    let mut landed = false;

    // 1) Jump.
    if grounded && input.jump {
        vy = config.jump_speed;
        grounded = false;
    }

    // 2) Horizontal move, with step-up when blocked on the ground.
    let desired = desired_planar_translation(input.direction, config.move_speed, dt);
    let (xz, outcome, stepped) = move_with_optional_step(world, config, pos, desired, grounded);
    pos.x = xz.x;
    pos.z = xz.y;

    // 3) Stay on the ground, or walk off the ledge.
    if grounded {
        let ground = support_height(world, terrain, pos, config.step_height);
        if ground >= pos.y - config.snap_distance {
            pos.y = ground;
            vy = 0.0;
        } else {
            log::trace!("agent left ground at ({}, {}, {})", pos.x, pos.y, pos.z);
            grounded = false;
            vy = 0.0;
        }
    }

    // 4) Fall.
    if !grounded && dt > 0.0 {
        vy = (vy - config.gravity * dt).max(-config.terminal_velocity.abs());
        let prev_y = pos.y;
        let next_y = prev_y + vy * dt;

        if vy <= 0.0 {
            let fallen = prev_y - next_y;
            let ground = support_height(world, terrain, Vector3::new(pos.x, next_y, pos.z), fallen);
            if next_y <= ground {
                pos.y = ground;
                vy = 0.0;
                grounded = true;
                landed = true;
            } else {
                pos.y = next_y;
            }
        } else {
            pos.y = next_y;
        }
    }

    StepResult {
        state: AgentState {
            position: pos,
            vertical_velocity: vy,
            grounded,
        },
        outcome,
        stepped,
        landed,
    }
}

/// Highest surface under `pos` no more than `reach` above its feet: terrain or collider.
#[inline]
fn support_height(
    world: &CollisionWorld,
    terrain: &impl TerrainHeight,
    pos: Vector3<f32>,
    reach: f32,
) -> f32 {
    let collider_top = world.collision_height_at(pos.x, pos.z, pos.y, reach);
    terrain.height(pos.x, pos.z).max(collider_top)
}

#[inline]
fn desired_planar_translation(direction: Vector2<f32>, speed: f32, dt: f32) -> Vector2<f32> {
    let len = direction.norm();
    if !len.is_finite() || len <= DIST_EPS {
        return Vector2::zeros();
    }
    let dir = if len > 1.0 { direction / len } else { direction };
    dir * speed.max(0.0) * dt
}

/// Resolve the planar move; if a grounded agent is significantly blocked, retry with the
/// feet raised by `step_height` and keep that result when it gets further.
///
/// Returns (new XZ, outcome, used_step).
fn move_with_optional_step(
    world: &CollisionWorld,
    config: &ControllerConfig,
    pos: Vector3<f32>,
    desired: Vector2<f32>,
    grounded: bool,
) -> (Vector2<f32>, MoveOutcome, bool) {
    let start = pos.xz();
    if desired.norm_squared() <= DIST_EPS * DIST_EPS {
        return (start, MoveOutcome::Clear, false);
    }

    let flat = world.resolve_movement_detailed(MoveRequest::new(
        start,
        start + desired,
        pos.y,
        grounded,
    ));

    let desired_len = desired.norm();
    let achieved_len = (flat.position - start).norm();
    if !grounded || config.step_height <= 0.0 || achieved_len >= desired_len * STEP_TRIGGER_RATIO {
        return (flat.position, flat.outcome, false);
    }

    // Raised as airborne: only tops at or below the step height are passable.
    let raised = world.resolve_movement_detailed(MoveRequest::new(
        start,
        start + desired,
        pos.y + config.step_height,
        false,
    ));
    if (raised.position - start).norm() > achieved_len + 1.0e-4 {
        return (raised.position, raised.outcome, true);
    }

    (flat.position, flat.outcome, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{FlatTerrain, NoTerrain};

    const DT: f32 = 0.1;

    fn walk(dir_x: f32, dir_z: f32) -> MoveInput {
        MoveInput {
            direction: Vector2::new(dir_x, dir_z),
            jump: false,
        }
    }

    fn run(
        world: &CollisionWorld,
        terrain: &impl TerrainHeight,
        mut state: AgentState,
        input: MoveInput,
        ticks: usize,
    ) -> AgentState {
        let config = ControllerConfig::default();
        for _ in 0..ticks {
            state = step(world, terrain, &config, state, input, DT).state;
        }
        state
    }

    #[test]
    fn walks_freely_on_flat_ground() {
        let world = CollisionWorld::new();
        let state = run(
            &world,
            &FlatTerrain(0.0),
            AgentState::grounded_at(Vector3::zeros()),
            walk(0.0, 1.0),
            4,
        );
        assert!((state.position.z - 2.0).abs() < 1.0e-4);
        assert_eq!(state.position.y, 0.0);
        assert!(state.grounded);
    }

    #[test]
    fn oversized_input_is_normalized() {
        let world = CollisionWorld::new();
        let config = ControllerConfig::default();
        let res = step(
            &world,
            &FlatTerrain(0.0),
            &config,
            AgentState::grounded_at(Vector3::zeros()),
            walk(30.0, 40.0),
            DT,
        );
        let moved = res.state.position.xz().norm();
        assert!((moved - config.move_speed * DT).abs() < 1.0e-4);
    }

    #[test]
    fn tall_wall_stops_the_agent() {
        let mut world = CollisionWorld::new();
        world.register_aabb(2.0, -5.0, 3.0, 5.0, 0.0, 3.0).unwrap();

        let state = run(
            &world,
            &FlatTerrain(0.0),
            AgentState::grounded_at(Vector3::zeros()),
            walk(1.0, 0.0),
            20,
        );
        assert!(state.position.x <= 2.0 - collision::AGENT_RADIUS + 0.01);
        assert_eq!(state.position.y, 0.0);
        assert!(state.grounded);
    }

    #[test]
    fn steps_onto_low_box() {
        let mut world = CollisionWorld::new();
        world.register_aabb(1.0, -2.0, 3.0, 2.0, 0.0, 0.3).unwrap();
        let config = ControllerConfig::default();

        let mut state = AgentState::grounded_at(Vector3::zeros());
        let mut stepped = false;
        for _ in 0..4 {
            let res = step(&world, &FlatTerrain(0.0), &config, state, walk(1.0, 0.0), DT);
            stepped |= res.stepped;
            state = res.state;
        }

        assert!(stepped);
        assert!((state.position.x - 2.0).abs() < 1.0e-3, "x = {}", state.position.x);
        assert_eq!(state.position.y, 0.3);
        assert!(state.grounded);
    }

    #[test]
    fn ledge_above_step_height_blocks() {
        let mut world = CollisionWorld::new();
        world.register_aabb(1.0, -2.0, 3.0, 2.0, 0.0, 0.6).unwrap();

        let state = run(
            &world,
            &FlatTerrain(0.0),
            AgentState::grounded_at(Vector3::zeros()),
            walk(1.0, 0.0),
            10,
        );
        assert!(state.position.x <= 1.0 - collision::AGENT_RADIUS + 0.01);
        assert_eq!(state.position.y, 0.0);
    }

    #[test]
    fn jumps_and_lands_back_on_the_ground() {
        let world = CollisionWorld::new();
        let terrain = FlatTerrain(0.0);
        let config = ControllerConfig::default();

        let mut state = step(
            &world,
            &terrain,
            &config,
            AgentState::grounded_at(Vector3::zeros()),
            MoveInput {
                direction: Vector2::zeros(),
                jump: true,
            },
            DT,
        )
        .state;
        assert!(!state.grounded);
        assert!(state.position.y > 0.0);

        let mut peak = state.position.y;
        let mut landed = false;
        for _ in 0..50 {
            let res = step(&world, &terrain, &config, state, MoveInput::default(), DT);
            state = res.state;
            peak = peak.max(state.position.y);
            if res.landed {
                landed = true;
                break;
            }
        }

        assert!(landed);
        assert!(peak > 0.9, "peak = {peak}");
        assert_eq!(state.position.y, 0.0);
        assert_eq!(state.vertical_velocity, 0.0);
        assert!(state.grounded);
    }

    #[test]
    fn walks_off_a_ledge_and_falls_to_terrain() {
        let mut world = CollisionWorld::new();
        world.register_aabb(-5.0, -5.0, 5.0, 5.0, 0.0, 2.0).unwrap();
        let terrain = FlatTerrain(0.0);
        let config = ControllerConfig::default();

        let mut state = AgentState::grounded_at(Vector3::new(4.0, 2.0, 0.0));
        let mut left_ground = false;
        for _ in 0..30 {
            state = step(&world, &terrain, &config, state, walk(1.0, 0.0), DT).state;
            left_ground |= !state.grounded;
            if left_ground && state.grounded {
                break;
            }
        }

        assert!(left_ground);
        assert!(state.grounded);
        assert_eq!(state.position.y, 0.0);
        assert!(state.position.x > 5.0);
    }

    #[test]
    fn fast_fall_lands_on_thin_platform() {
        let mut world = CollisionWorld::new();
        world.register_aabb(-2.0, -2.0, 2.0, 2.0, 0.95, 1.0).unwrap();
        let config = ControllerConfig::default();

        let mut state = AgentState {
            position: Vector3::new(0.0, 5.0, 0.0),
            vertical_velocity: -30.0,
            grounded: false,
        };
        for _ in 0..5 {
            state = step(&world, &NoTerrain, &config, state, MoveInput::default(), DT).state;
            if state.grounded {
                break;
            }
        }

        assert!(state.grounded);
        assert_eq!(state.position.y, 1.0);
    }

    #[test]
    fn falling_speed_is_capped() {
        let world = CollisionWorld::new();
        let config = ControllerConfig::default();
        let state = run(
            &world,
            &NoTerrain,
            AgentState::airborne_at(Vector3::zeros()),
            MoveInput::default(),
            100,
        );
        assert_eq!(state.vertical_velocity, -config.terminal_velocity);
        assert!(!state.grounded);
    }
}
