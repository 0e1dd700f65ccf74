/// Base ground height of the level, independent of registered colliders.
pub trait TerrainHeight {
    fn height(&self, x: f32, z: f32) -> f32;
}

/// Infinite flat ground at a fixed height.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatTerrain(pub f32);

impl TerrainHeight for FlatTerrain {
    #[inline]
    fn height(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}

/// No base terrain: only colliders provide ground.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTerrain;

impl TerrainHeight for NoTerrain {
    #[inline]
    fn height(&self, _x: f32, _z: f32) -> f32 {
        f32::NEG_INFINITY
    }
}

impl<F> TerrainHeight for F
where
    F: Fn(f32, f32) -> f32,
{
    #[inline]
    fn height(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}
