/*!
Collision engine settings and tolerances.

Defaults for the broad-phase grid, the sliding resolver and the surface
height query.

Notes
- Distances are in world units (meters).
- Tolerances are world-space distances, not machine epsilon.
- `CollisionConfig` carries the same values per world; a level can override
  them without touching the defaults.
*/

use crate::error::ConfigError;

/// Size of one broad-phase grid cell in world units. All cells are square.
pub const CELL_SIZE: f32 = 16.0;

/// Horizontal radius of the agent cylinder.
pub const AGENT_RADIUS: f32 = 0.4;

/// Height of the agent cylinder, measured up from the feet.
pub const AGENT_HEIGHT: f32 = 1.8;

/// Tolerance under a collider's top within which a grounded agent is not blocked by it.
/// Prevents landing jitter when the feet rest exactly on a top surface.
pub const ON_TOP_EPS: f32 = 0.15;

/// Extra distance added to every push-out so the next pass does not re-collide on rounding error.
pub const PUSH_EPSILON: f32 = 0.001;

/// Maximum number of slide iterations per resolve call.
pub const MAX_ITERATIONS: u32 = 3;

/// Dot product between consecutive push normals below which the agent is considered trapped
/// between facing surfaces.
pub const TRAP_DOT_THRESHOLD: f32 = -0.5;

/// cos(55°). Triangles whose normal has a larger +Y component count as floor.
pub const WALKABLE_SLOPE_COS: f32 = 0.573_576_4;

/// Squared-length guard for edges, normals and denominators.
pub const GEOM_EPS: f32 = 1.0e-10;

/// Tolerance on barycentric coordinates so points exactly on shared edges still resolve.
pub const BARYCENTRIC_EPS: f32 = 1.0e-4;

/// Allowed deviation of `cos² + sin²` from 1 for an OBB rotation.
pub const ROTATION_EPS: f32 = 1.0e-3;

/// Thickness given to perfectly flat meshes so their vertical range stays non-degenerate.
pub const MIN_MESH_THICKNESS: f32 = 0.01;

/// Per-world tuning for the collision engine.
///
/// `Default` reproduces the constants above.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionConfig {
    pub cell_size: f32,
    pub agent_radius: f32,
    pub agent_height: f32,
    pub on_top_eps: f32,
    pub push_epsilon: f32,
    pub max_iterations: u32,
    pub trap_dot_threshold: f32,
    pub walkable_slope_cos: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            agent_radius: AGENT_RADIUS,
            agent_height: AGENT_HEIGHT,
            on_top_eps: ON_TOP_EPS,
            push_epsilon: PUSH_EPSILON,
            max_iterations: MAX_ITERATIONS,
            trap_dot_threshold: TRAP_DOT_THRESHOLD,
            walkable_slope_cos: WALKABLE_SLOPE_COS,
        }
    }
}

impl CollisionConfig {
    /// Reject values the grid and resolver cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if !(self.agent_radius.is_finite() && self.agent_radius > 0.0) {
            return Err(ConfigError::AgentRadius(self.agent_radius));
        }
        Ok(())
    }

    /// Tolerance applied under collider tops for the given grounded state.
    #[inline]
    pub fn on_top_tolerance(&self, grounded: bool) -> f32 {
        if grounded { self.on_top_eps } else { 0.0 }
    }
}
