/*!
Agent movement on top of the `collision` engine.

- terrain:    base ground height providers
- level:      JSON level descriptions and world population
- controller: reference per-tick controller (step-up, ground snap, jump, gravity)
*/

pub mod controller;
pub mod level;
pub mod terrain;

pub use controller::{AgentState, ControllerConfig, MoveInput, StepResult, step};
pub use level::{
    LevelDef, LevelError, LoadReport, MeshDef, ObstacleDef, SkipReason, SkippedObstacle,
    build_collider, load_level,
};
pub use terrain::{FlatTerrain, NoTerrain, TerrainHeight};
