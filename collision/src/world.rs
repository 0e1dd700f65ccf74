use nalgebra::Vector2;

use super::{
    broad::SpatialGrid,
    error::{ColliderError, ConfigError},
    ground, kinematic,
    kinematic::{MoveRequest, MoveResolution},
    settings::CollisionConfig,
    types::{Aabb, Bounds2, Collider, Cylinder, Obb, Trimesh},
};

/// Counters exposed to diagnostics overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionStats {
    /// Number of registered colliders.
    pub colliders: usize,
    /// Number of non-empty broad-phase cells.
    pub cells: usize,
    /// Colliders too wide for the cells, tested on every overlapping query.
    pub oversized: usize,
}

/// The static collision world for one loaded level.
///
/// Owns the collider registry and the broad-phase grid. Build it once at level load with
/// the `register*` methods, then share it immutably with the per-tick queries.
/// Colliders are never removed; their index is stable for the lifetime of the world.
pub struct CollisionWorld {
    config: CollisionConfig,
    colliders: Vec<Collider>,
    grid: SpatialGrid,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::build(CollisionConfig::default())
    }

    /// World with custom tuning. Fails on a non-positive cell size or agent radius.
    pub fn with_config(config: CollisionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CollisionConfig) -> Self {
        Self {
            grid: SpatialGrid::new(config.cell_size),
            colliders: Vec::new(),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Validate and register a collider, returning its stable index.
    ///
    /// Degenerate shapes (inverted or empty vertical range, non-finite data, empty meshes)
    /// are rejected and leave the world untouched.
    pub fn register(&mut self, collider: impl Into<Collider>) -> Result<usize, ColliderError> {
        let collider = collider.into();
        if let Err(err) = collider.validate() {
            log::debug!("rejected collider: {err}");
            return Err(err);
        }

        let index = self.colliders.len();
        let bounds = collider.xz_bounds();
        self.grid.insert(index, &bounds);
        self.colliders.push(collider);

        log::trace!(
            "registered collider {index} over x [{}, {}] z [{}, {}]",
            bounds.min_x,
            bounds.max_x,
            bounds.min_z,
            bounds.max_z
        );
        Ok(index)
    }

    pub fn register_aabb(
        &mut self,
        min_x: f32,
        min_z: f32,
        max_x: f32,
        max_z: f32,
        min_y: f32,
        max_y: f32,
    ) -> Result<usize, ColliderError> {
        self.register(Aabb::new(min_x, min_z, max_x, max_z, min_y, max_y))
    }

    pub fn register_cylinder(
        &mut self,
        cx: f32,
        cz: f32,
        radius: f32,
        min_y: f32,
        max_y: f32,
    ) -> Result<usize, ColliderError> {
        self.register(Cylinder::new(cx, cz, radius, min_y, max_y))
    }

    /// Register a box rotated by `yaw` radians about +Y.
    #[allow(clippy::too_many_arguments)]
    pub fn register_obb(
        &mut self,
        cx: f32,
        cz: f32,
        half_w: f32,
        half_d: f32,
        yaw: f32,
        min_y: f32,
        max_y: f32,
    ) -> Result<usize, ColliderError> {
        self.register(Obb::from_yaw(cx, cz, half_w, half_d, yaw, min_y, max_y))
    }

    pub fn register_trimesh(&mut self, mesh: Trimesh) -> Result<usize, ColliderError> {
        self.register(mesh)
    }

    /// All registered colliders, indexed by registration order.
    #[inline]
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    #[inline]
    pub fn collider(&self, index: usize) -> Option<&Collider> {
        self.colliders.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn stats(&self) -> CollisionStats {
        CollisionStats {
            colliders: self.colliders.len(),
            cells: self.grid.cell_count(),
            oversized: self.grid.oversized_count(),
        }
    }

    /// De-duplicated indices of colliders whose cells overlap the rectangle.
    pub fn query(&self, min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Vec<usize> {
        self.grid.query(&Bounds2::new(min_x, min_z, max_x, max_z))
    }

    /// Non-allocating broad-phase query into a caller-owned buffer.
    #[inline]
    pub fn query_into(&self, bounds: &Bounds2, out: &mut Vec<usize>) {
        self.grid.query_into(bounds, out);
    }

    /// Slide the agent from `start` toward `end` and return the corrected XZ position.
    pub fn resolve_movement(
        &self,
        start: Vector2<f32>,
        end: Vector2<f32>,
        agent_y: f32,
        grounded: bool,
    ) -> Vector2<f32> {
        kinematic::resolve_movement(self, MoveRequest::new(start, end, agent_y, grounded)).position
    }

    /// Like [`CollisionWorld::resolve_movement`] but also reports how the move ended.
    pub fn resolve_movement_detailed(&self, req: MoveRequest) -> MoveResolution {
        kinematic::resolve_movement(self, req)
    }

    /// Highest walkable collider surface under `(x, z)` reachable within `step_height`,
    /// or negative infinity.
    pub fn collision_height_at(&self, x: f32, z: f32, agent_y: f32, step_height: f32) -> f32 {
        ground::collision_height_at(self, x, z, agent_y, step_height)
    }
}
