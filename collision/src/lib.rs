/*!
Static-level collision for a walking agent.

The agent is a vertical cylinder that moves on the XZ plane; vertical placement is a
separate highest-surface query. The code is split for clarity:

- types:        collider shapes, XZ bounds and push-out results
- settings:     tuning constants and `CollisionConfig`
- broad:        uniform spatial hash grid over collider XZ bounds
- narrow_phase: circle vs AABB / cylinder / OBB / triangle / trimesh push-outs
- kinematic:    iterative slide resolver with concave-trap detection
- ground:       highest walkable surface within step height
- world:        `CollisionWorld`, the registry that owns colliders and grid
- mesh:         world-space trimeshes from indexed model geometry
- debug:        collider visitor and wireframe output for overlays
*/

pub mod broad;
pub mod debug;
pub mod error;
pub mod ground;
pub mod kinematic;
pub mod mesh;
pub mod narrow_phase;
pub mod settings;
pub mod types;
pub mod world;

// Re-export commonly used types and functions.
pub use debug::{ColliderVisitor, Segment, WireframeBuilder};
pub use error::{ColliderError, ConfigError};
pub use kinematic::{MoveOutcome, MoveRequest, MoveResolution, TrapKind};
pub use mesh::{MeshPlacement, trimesh_from_indexed};
pub use settings::{AGENT_HEIGHT, AGENT_RADIUS, CollisionConfig, PUSH_EPSILON};
pub use types::{Aabb, Bounds2, Collider, Cylinder, Obb, PushOut, Triangle2, Triangle3, Trimesh};
pub use world::{CollisionStats, CollisionWorld};

pub use nalgebra::{Vector2, Vector3};
