use thiserror::Error;

/// Reasons a collider is refused at registration or construction time.
///
/// These are data-integrity failures in level content, not runtime faults. Callers that
/// populate a world from external data are expected to log and skip the offending shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColliderError {
    #[error("degenerate vertical range: min_y {min_y} must be below max_y {max_y}")]
    DegenerateVerticalRange { min_y: f32, max_y: f32 },

    #[error("collider contains a non-finite coordinate")]
    NonFinite,

    #[error("negative or zero extent: {0}")]
    NonPositiveExtent(f32),

    #[error("trimesh has no triangles")]
    EmptyTrimesh,

    #[error("trimesh has {triangles} 2D triangles but {triangles_3d} 3D triangles")]
    MismatchedTriangleData {
        triangles: usize,
        triangles_3d: usize,
    },

    #[error("vertex buffer length {0} is not a multiple of 3")]
    VertexBufferLength(usize),

    #[error("index buffer length {0} is not a multiple of 3")]
    IndexBufferLength(usize),

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("rotation (cos {cos_a}, sin {sin_a}) is not a unit vector")]
    NonUnitRotation { cos_a: f32, sin_a: f32 },
}

/// Invalid per-world tuning passed to `CollisionWorld::with_config`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid cell size must be positive and finite, got {0}")]
    CellSize(f32),

    #[error("agent radius must be positive and finite, got {0}")]
    AgentRadius(f32),
}
