/*!
Core collision types shared by the collision submodules.

No resolution algorithms live here, only the data exchanged between:
- the registry and broad-phase grid (collider shapes and their XZ bounds)
- the narrow phase (push-out results)
- the sliding resolver and the surface height query

All shapes are static: built once at level load and never mutated.
*/

use nalgebra::{Vector2, Vector3};

use crate::{error::ColliderError, settings::ROTATION_EPS};

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Aabb {
    #[inline]
    pub fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
            min_y,
            max_y,
        }
    }

    #[inline]
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

/// Vertical cylinder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cylinder {
    pub cx: f32,
    pub cz: f32,
    pub radius: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Cylinder {
    #[inline]
    pub fn new(cx: f32, cz: f32, radius: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            cx,
            cz,
            radius,
            min_y,
            max_y,
        }
    }
}

/// Box rotated about the vertical axis.
///
/// The angle is stored as `cos_a`/`sin_a`. A local offset `(lx, lz)` maps to world space as
/// `(lx * cos_a - lz * sin_a, lx * sin_a + lz * cos_a)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    pub cx: f32,
    pub cz: f32,
    pub half_w: f32,
    pub half_d: f32,
    pub cos_a: f32,
    pub sin_a: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Obb {
    /// Build an OBB from a yaw angle in radians.
    pub fn from_yaw(
        cx: f32,
        cz: f32,
        half_w: f32,
        half_d: f32,
        yaw: f32,
        min_y: f32,
        max_y: f32,
    ) -> Self {
        let (sin_a, cos_a) = yaw.sin_cos();
        Self {
            cx,
            cz,
            half_w,
            half_d,
            cos_a,
            sin_a,
            min_y,
            max_y,
        }
    }

    /// World XZ point into the box's unrotated local frame (origin at the box center).
    #[inline]
    pub fn to_local(&self, x: f32, z: f32) -> Vector2<f32> {
        let dx = x - self.cx;
        let dz = z - self.cz;
        Vector2::new(
            dx * self.cos_a + dz * self.sin_a,
            -dx * self.sin_a + dz * self.cos_a,
        )
    }

    /// Rotate a local-frame direction back to world space.
    #[inline]
    pub fn rotate_to_world(&self, v: Vector2<f32>) -> Vector2<f32> {
        Vector2::new(
            v.x * self.cos_a - v.y * self.sin_a,
            v.x * self.sin_a + v.y * self.cos_a,
        )
    }

    /// The four XZ corners in world space, counter-clockwise in the local frame.
    pub fn corners(&self) -> [Vector2<f32>; 4] {
        let center = Vector2::new(self.cx, self.cz);
        [
            (-self.half_w, -self.half_d),
            (self.half_w, -self.half_d),
            (self.half_w, self.half_d),
            (-self.half_w, self.half_d),
        ]
        .map(|(lx, lz)| center + self.rotate_to_world(Vector2::new(lx, lz)))
    }

    #[inline]
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        let local = self.to_local(x, z);
        local.x.abs() <= self.half_w && local.y.abs() <= self.half_d
    }
}

/// A triangle projected onto the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle2 {
    pub ax: f32,
    pub az: f32,
    pub bx: f32,
    pub bz: f32,
    pub cx: f32,
    pub cz: f32,
}

impl Triangle2 {
    #[inline]
    pub fn vertices(&self) -> [Vector2<f32>; 3] {
        [
            Vector2::new(self.ax, self.az),
            Vector2::new(self.bx, self.bz),
            Vector2::new(self.cx, self.cz),
        ]
    }
}

/// A full 3D triangle, used for slope classification and height interpolation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle3 {
    pub a: Vector3<f32>,
    pub b: Vector3<f32>,
    pub c: Vector3<f32>,
}

impl Triangle3 {
    #[inline]
    pub fn new(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Self {
        Self { a, b, c }
    }

    /// Build from 9 packed floats `[ax, ay, az, bx, by, bz, cx, cy, cz]`.
    #[inline]
    pub fn from_array(v: [f32; 9]) -> Self {
        Self {
            a: Vector3::new(v[0], v[1], v[2]),
            b: Vector3::new(v[3], v[4], v[5]),
            c: Vector3::new(v[6], v[7], v[8]),
        }
    }

    /// Unit normal following the `a -> b -> c` winding, or `None` for a degenerate triangle.
    pub fn normal(&self) -> Option<Vector3<f32>> {
        let n = (self.b - self.a).cross(&(self.c - self.a));
        let len_sq = n.norm_squared();
        if len_sq <= crate::settings::GEOM_EPS {
            return None;
        }
        Some(n / len_sq.sqrt())
    }

    /// Is this triangle an upward-facing floor under the given slope limit?
    #[inline]
    pub fn is_walkable(&self, slope_cos: f32) -> bool {
        self.normal().is_some_and(|n| n.y > slope_cos)
    }

    #[inline]
    pub fn project_xz(&self) -> Triangle2 {
        Triangle2 {
            ax: self.a.x,
            az: self.a.z,
            bx: self.b.x,
            bz: self.b.z,
            cx: self.c.x,
            cz: self.c.z,
        }
    }
}

/// A triangle soup used for arbitrary static geometry.
///
/// `triangles` drives horizontal sliding. `triangles_3d`, when present, is parallel to it and
/// lets the engine tell floors from walls and interpolate surface heights.
#[derive(Clone, Debug, PartialEq)]
pub struct Trimesh {
    pub triangles: Vec<Triangle2>,
    pub min_y: f32,
    pub max_y: f32,
    pub triangles_3d: Option<Vec<Triangle3>>,
}

impl Trimesh {
    /// Flat 2D-only mesh.
    pub fn new(triangles: Vec<Triangle2>, min_y: f32, max_y: f32) -> Self {
        Self {
            triangles,
            min_y,
            max_y,
            triangles_3d: None,
        }
    }

    /// Mesh with full 3D vertices. The 2D list and vertical range are derived from them.
    pub fn from_triangles_3d(triangles_3d: Vec<Triangle3>) -> Self {
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for tri in &triangles_3d {
            for v in [tri.a, tri.b, tri.c] {
                min_y = min_y.min(v.y);
                max_y = max_y.max(v.y);
            }
        }
        Self {
            triangles: triangles_3d.iter().map(Triangle3::project_xz).collect(),
            min_y,
            max_y,
            triangles_3d: Some(triangles_3d),
        }
    }
}

/// Static collision shapes supported by the world.
#[derive(Clone, Debug, PartialEq)]
pub enum Collider {
    Aabb(Aabb),
    Cylinder(Cylinder),
    Obb(Obb),
    Trimesh(Trimesh),
}

impl Collider {
    /// Half-open vertical range `[min_y, max_y)`.
    #[inline]
    pub fn vertical_range(&self) -> (f32, f32) {
        match self {
            Collider::Aabb(b) => (b.min_y, b.max_y),
            Collider::Cylinder(c) => (c.min_y, c.max_y),
            Collider::Obb(o) => (o.min_y, o.max_y),
            Collider::Trimesh(m) => (m.min_y, m.max_y),
        }
    }

    #[inline]
    pub fn min_y(&self) -> f32 {
        self.vertical_range().0
    }

    /// World-space XZ bounding rectangle.
    pub fn xz_bounds(&self) -> Bounds2 {
        match self {
            Collider::Aabb(b) => Bounds2::new(b.min_x, b.min_z, b.max_x, b.max_z),
            Collider::Cylinder(c) => Bounds2::new(
                c.cx - c.radius,
                c.cz - c.radius,
                c.cx + c.radius,
                c.cz + c.radius,
            ),
            Collider::Obb(o) => Bounds2::from_points(o.corners()),
            Collider::Trimesh(m) => {
                Bounds2::from_points(m.triangles.iter().flat_map(Triangle2::vertices))
            }
        }
    }

    /// Check the data-integrity invariants required for registration.
    pub fn validate(&self) -> Result<(), ColliderError> {
        let (min_y, max_y) = self.vertical_range();
        if !min_y.is_finite() || !max_y.is_finite() {
            return Err(ColliderError::NonFinite);
        }
        if max_y <= min_y {
            return Err(ColliderError::DegenerateVerticalRange { min_y, max_y });
        }

        match self {
            Collider::Aabb(b) => {
                all_finite(&[b.min_x, b.min_z, b.max_x, b.max_z])?;
                positive(b.max_x - b.min_x)?;
                positive(b.max_z - b.min_z)?;
            }
            Collider::Cylinder(c) => {
                all_finite(&[c.cx, c.cz, c.radius])?;
                positive(c.radius)?;
            }
            Collider::Obb(o) => {
                all_finite(&[o.cx, o.cz, o.half_w, o.half_d, o.cos_a, o.sin_a])?;
                positive(o.half_w)?;
                positive(o.half_d)?;
                if (o.cos_a * o.cos_a + o.sin_a * o.sin_a - 1.0).abs() > ROTATION_EPS {
                    return Err(ColliderError::NonUnitRotation {
                        cos_a: o.cos_a,
                        sin_a: o.sin_a,
                    });
                }
            }
            Collider::Trimesh(m) => {
                if m.triangles.is_empty() {
                    return Err(ColliderError::EmptyTrimesh);
                }
                if let Some(tris) = &m.triangles_3d {
                    if tris.len() != m.triangles.len() {
                        return Err(ColliderError::MismatchedTriangleData {
                            triangles: m.triangles.len(),
                            triangles_3d: tris.len(),
                        });
                    }
                    let finite = |v: &Vector3<f32>| v.iter().all(|c| c.is_finite());
                    if !tris
                        .iter()
                        .all(|t| finite(&t.a) && finite(&t.b) && finite(&t.c))
                    {
                        return Err(ColliderError::NonFinite);
                    }
                }
                for t in &m.triangles {
                    all_finite(&[t.ax, t.az, t.bx, t.bz, t.cx, t.cz])?;
                }
            }
        }
        Ok(())
    }
}

#[inline]
fn all_finite(values: &[f32]) -> Result<(), ColliderError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ColliderError::NonFinite)
    }
}

#[inline]
fn positive(extent: f32) -> Result<(), ColliderError> {
    if extent > 0.0 {
        Ok(())
    } else {
        Err(ColliderError::NonPositiveExtent(extent))
    }
}

impl From<Aabb> for Collider {
    fn from(value: Aabb) -> Self {
        Collider::Aabb(value)
    }
}

impl From<Cylinder> for Collider {
    fn from(value: Cylinder) -> Self {
        Collider::Cylinder(value)
    }
}

impl From<Obb> for Collider {
    fn from(value: Obb) -> Self {
        Collider::Obb(value)
    }
}

impl From<Trimesh> for Collider {
    fn from(value: Trimesh) -> Self {
        Collider::Trimesh(value)
    }
}

/// Axis-aligned rectangle on the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2 {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
}

impl Bounds2 {
    #[inline]
    pub fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
        }
    }

    /// Smallest rectangle containing every point. Empty input yields an inverted rectangle.
    pub fn from_points(points: impl IntoIterator<Item = Vector2<f32>>) -> Self {
        points.into_iter().fold(
            Self::new(
                f32::INFINITY,
                f32::INFINITY,
                f32::NEG_INFINITY,
                f32::NEG_INFINITY,
            ),
            |b, p| Self::new(b.min_x.min(p.x), b.min_z.min(p.y), b.max_x.max(p.x), b.max_z.max(p.y)),
        )
    }

    /// Rectangle swept by a circle of `radius` moving from `start` to `end`.
    #[inline]
    pub fn swept_circle(start: Vector2<f32>, end: Vector2<f32>, radius: f32) -> Self {
        Self::new(
            start.x.min(end.x) - radius,
            start.y.min(end.y) - radius,
            start.x.max(end.x) + radius,
            start.y.max(end.y) + radius,
        )
    }

    /// Grow the rectangle by `margin` on all sides.
    #[inline]
    pub fn inflate(&self, margin: f32) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_z - margin,
            self.max_x + margin,
            self.max_z + margin,
        )
    }
}

/// Minimal horizontal translation separating the agent from one collider.
///
/// `normal` is a unit XZ direction (x, z) pointing away from the collider and `depth` is
/// strictly positive. "No collision" is `None` at the call sites, never a zero-depth push.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PushOut {
    pub normal: Vector2<f32>,
    pub depth: f32,
}

impl PushOut {
    #[inline]
    pub fn new(normal: Vector2<f32>, depth: f32) -> Self {
        Self { normal, depth }
    }

    /// Translation that clears this penetration plus `epsilon`.
    #[inline]
    pub fn translation(&self, epsilon: f32) -> Vector2<f32> {
        self.normal * (self.depth + epsilon)
    }
}
