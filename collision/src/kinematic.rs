use nalgebra::Vector2;

use super::{
    narrow_phase,
    types::{Bounds2, Collider, PushOut},
    world::CollisionWorld,
};

/// Parameters for a single horizontal movement attempt.
///
/// - Movement is expressed as the desired end position for this tick, not a velocity.
/// - Collision is resolved by discrete push-out at the end position (no time-of-impact
///   sweep), sliding along the deepest contact each iteration.
#[derive(Clone, Copy, Debug)]
pub struct MoveRequest {
    /// Agent XZ position at the start of the tick.
    pub start: Vector2<f32>,
    /// Desired agent XZ position at the end of the tick (e.g., from input).
    pub end: Vector2<f32>,
    /// Height of the agent's feet.
    pub agent_y: f32,
    /// Whether the agent is standing on something. Grounded agents are not blocked by
    /// the collider they stand on.
    pub grounded: bool,
}

impl MoveRequest {
    #[inline]
    pub fn new(start: Vector2<f32>, end: Vector2<f32>, agent_y: f32, grounded: bool) -> Self {
        Self {
            start,
            end,
            agent_y,
            grounded,
        }
    }
}

/// Why the resolver gave up and returned the start position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapKind {
    /// Start was clear: the move walked into a concave pocket and was refused.
    Pocket,
    /// Start was already penetrating: horizontal motion is frozen until the agent
    /// leaves vertically.
    Trapped,
}

/// How a resolve call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The end position was free; nothing was pushed.
    Clear,
    /// The agent was pushed out `iterations` times.
    Slid { iterations: u32 },
    /// Opposing push-outs were detected and the start position was returned.
    Blocked(TrapKind),
}

/// Result of a movement resolve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveResolution {
    /// Final agent XZ position.
    pub position: Vector2<f32>,
    pub outcome: MoveOutcome,
}

impl MoveResolution {
    #[inline]
    fn clear(position: Vector2<f32>) -> Self {
        Self {
            position,
            outcome: MoveOutcome::Clear,
        }
    }
}

/// Iterative push-out ("slide") resolution of one horizontal move.
///
/// Algorithm:
/// - Broad phase over the rectangle swept by the agent circle from start to end.
/// - Drop candidates that do not vertically overlap the agent. A grounded agent ignores
///   the top `on_top_eps` of every collider so it is not blocked by its own floor.
/// - Up to `max_iterations` times: find the deepest penetration at the current position
///   and push out along its normal by `depth + push_epsilon`.
/// - If two consecutive push normals nearly oppose each other the agent is bouncing
///   between facing surfaces; return the start position instead of oscillating.
pub fn resolve_movement(world: &CollisionWorld, req: MoveRequest) -> MoveResolution {
    if world.is_empty() {
        return MoveResolution::clear(req.end);
    }

    let config = world.config();
    let radius = config.agent_radius;

    let swept = Bounds2::swept_circle(req.start, req.end, radius);
    let mut candidates = Vec::new();
    world.query_into(&swept, &mut candidates);
    if candidates.is_empty() {
        return MoveResolution::clear(req.end);
    }

    let agent_min_y = req.agent_y;
    let agent_max_y = req.agent_y + config.agent_height;
    let on_top = config.on_top_tolerance(req.grounded);
    let colliders = world.colliders();
    candidates.retain(|&i| {
        let (min_y, max_y) = colliders[i].vertical_range();
        agent_max_y > min_y && agent_min_y < max_y - on_top
    });
    if candidates.is_empty() {
        return MoveResolution::clear(req.end);
    }

    let deepest_at = |p: Vector2<f32>| {
        deepest_push_out(
            p,
            radius,
            candidates.iter().map(|&i| &colliders[i]),
            config.walkable_slope_cos,
        )
    };

    let mut pos = req.end;
    let mut prev_normal: Option<Vector2<f32>> = None;
    let mut iterations = 0;

    for _ in 0..config.max_iterations {
        let Some(push) = deepest_at(pos) else {
            break;
        };

        if let Some(prev) = prev_normal {
            if push.normal.dot(&prev) < config.trap_dot_threshold {
                let kind = if deepest_at(req.start).is_none() {
                    TrapKind::Pocket
                } else {
                    TrapKind::Trapped
                };
                log::debug!(
                    "concave trap ({kind:?}) resolving ({}, {}) -> ({}, {}); holding start",
                    req.start.x,
                    req.start.y,
                    req.end.x,
                    req.end.y
                );
                return MoveResolution {
                    position: req.start,
                    outcome: MoveOutcome::Blocked(kind),
                };
            }
        }

        pos += push.translation(config.push_epsilon);
        prev_normal = Some(push.normal);
        iterations += 1;
    }

    MoveResolution {
        position: pos,
        outcome: if iterations == 0 {
            MoveOutcome::Clear
        } else {
            MoveOutcome::Slid { iterations }
        },
    }
}

/// Deepest push-out across `colliders`, or `None` when the circle is clear of all of them.
///
/// Ties keep the first collider in iteration order.
pub fn deepest_push_out<'a>(
    p: Vector2<f32>,
    radius: f32,
    colliders: impl IntoIterator<Item = &'a Collider>,
    walkable_slope_cos: f32,
) -> Option<PushOut> {
    let mut best: Option<PushOut> = None;
    for collider in colliders {
        if let Some(hit) = narrow_phase::push_out_circle(p, radius, collider, walkable_slope_cos) {
            if best.is_none_or(|b| hit.depth > b.depth) {
                best = Some(hit);
            }
        }
    }
    best
}
