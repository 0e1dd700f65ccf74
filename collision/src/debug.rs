//! Debug geometry for collision overlays.
//!
//! Nothing in the engine depends on this module; it only reads colliders.

use std::f32::consts::TAU;

use nalgebra::{Point3, Vector2};

use crate::{
    types::{Aabb, Collider, Cylinder, Obb, Trimesh},
    world::CollisionWorld,
};

/// A world-space line segment.
pub type Segment = [Point3<f32>; 2];

/// Visitor over the collider variants.
pub trait ColliderVisitor {
    type Output;

    fn visit_aabb(&mut self, aabb: &Aabb) -> Self::Output;
    fn visit_cylinder(&mut self, cylinder: &Cylinder) -> Self::Output;
    fn visit_obb(&mut self, obb: &Obb) -> Self::Output;
    fn visit_trimesh(&mut self, mesh: &Trimesh) -> Self::Output;
}

impl Collider {
    pub fn accept<V: ColliderVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Collider::Aabb(b) => visitor.visit_aabb(b),
            Collider::Cylinder(c) => visitor.visit_cylinder(c),
            Collider::Obb(o) => visitor.visit_obb(o),
            Collider::Trimesh(m) => visitor.visit_trimesh(m),
        }
    }
}

/// Accumulates wireframe line segments for colliders.
pub struct WireframeBuilder {
    segments: Vec<Segment>,
    cylinder_sides: usize,
}

impl Default for WireframeBuilder {
    fn default() -> Self {
        Self::new(16)
    }
}

impl WireframeBuilder {
    pub fn new(cylinder_sides: usize) -> Self {
        Self {
            segments: Vec::new(),
            cylinder_sides: cylinder_sides.max(3),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Closed loop at `y` through `points`, plus uprights to `top` at every `stride`-th point.
    fn prism(&mut self, points: &[Vector2<f32>], min_y: f32, max_y: f32, stride: usize) {
        let at = |p: Vector2<f32>, y: f32| Point3::new(p.x, y, p.y);
        for (i, &p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            self.segments.push([at(p, min_y), at(q, min_y)]);
            self.segments.push([at(p, max_y), at(q, max_y)]);
            if i % stride == 0 {
                self.segments.push([at(p, min_y), at(p, max_y)]);
            }
        }
    }
}

impl ColliderVisitor for WireframeBuilder {
    type Output = ();

    fn visit_aabb(&mut self, b: &Aabb) {
        let corners = [
            Vector2::new(b.min_x, b.min_z),
            Vector2::new(b.max_x, b.min_z),
            Vector2::new(b.max_x, b.max_z),
            Vector2::new(b.min_x, b.max_z),
        ];
        self.prism(&corners, b.min_y, b.max_y, 1);
    }

    fn visit_cylinder(&mut self, c: &Cylinder) {
        let n = self.cylinder_sides;
        let ring: Vec<Vector2<f32>> = (0..n)
            .map(|i| {
                let (s, co) = (TAU * i as f32 / n as f32).sin_cos();
                Vector2::new(c.cx + c.radius * co, c.cz + c.radius * s)
            })
            .collect();
        self.prism(&ring, c.min_y, c.max_y, (n / 4).max(1));
    }

    fn visit_obb(&mut self, o: &Obb) {
        self.prism(&o.corners(), o.min_y, o.max_y, 1);
    }

    fn visit_trimesh(&mut self, m: &Trimesh) {
        match &m.triangles_3d {
            Some(tris) => {
                for t in tris {
                    let (a, b, c) = (Point3::from(t.a), Point3::from(t.b), Point3::from(t.c));
                    self.segments.extend([[a, b], [b, c], [c, a]]);
                }
            }
            None => {
                for t in &m.triangles {
                    let [a, b, c] = t.vertices().map(|v| Point3::new(v.x, m.max_y, v.y));
                    self.segments.extend([[a, b], [b, c], [c, a]]);
                }
            }
        }
    }
}

impl CollisionWorld {
    /// Wireframe of every registered collider.
    pub fn wireframe(&self) -> Vec<Segment> {
        let mut builder = WireframeBuilder::default();
        for collider in self.colliders() {
            collider.accept(&mut builder);
        }
        builder.into_segments()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Triangle3;

    struct CountVariants([usize; 4]);

    impl ColliderVisitor for CountVariants {
        type Output = ();
        fn visit_aabb(&mut self, _: &Aabb) {
            self.0[0] += 1;
        }
        fn visit_cylinder(&mut self, _: &Cylinder) {
            self.0[1] += 1;
        }
        fn visit_obb(&mut self, _: &Obb) {
            self.0[2] += 1;
        }
        fn visit_trimesh(&mut self, _: &Trimesh) {
            self.0[3] += 1;
        }
    }

    #[test]
    fn accept_dispatches_to_matching_variant() {
        let mut world = CollisionWorld::new();
        world.register_aabb(0.0, 0.0, 1.0, 1.0, 0.0, 1.0).unwrap();
        world.register_aabb(2.0, 0.0, 3.0, 1.0, 0.0, 1.0).unwrap();
        world.register_obb(5.0, 5.0, 1.0, 1.0, 0.2, 0.0, 1.0).unwrap();

        let mut counter = CountVariants([0; 4]);
        for c in world.colliders() {
            c.accept(&mut counter);
        }
        assert_eq!(counter.0, [2, 0, 1, 0]);
    }

    #[test]
    fn box_wireframe_has_twelve_edges() {
        let mut builder = WireframeBuilder::default();
        Collider::Aabb(Aabb::new(0.0, 0.0, 1.0, 2.0, 0.0, 3.0)).accept(&mut builder);
        assert_eq!(builder.segments().len(), 12);
        assert!(builder.segments().iter().flatten().all(|p| p.y == 0.0 || p.y == 3.0));
    }

    #[test]
    fn cylinder_wireframe_has_rings_and_four_uprights() {
        let mut builder = WireframeBuilder::new(8);
        Collider::Cylinder(Cylinder::new(0.0, 0.0, 1.0, 0.0, 1.0)).accept(&mut builder);
        assert_eq!(builder.segments().len(), 8 * 2 + 4);
    }

    #[test]
    fn world_wireframe_covers_trimesh_edges() {
        let mut world = CollisionWorld::new();
        world
            .register_trimesh(Trimesh::from_triangles_3d(vec![Triangle3::from_array([
                0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.5, 1.0,
            ])]))
            .unwrap();
        assert_eq!(world.wireframe().len(), 3);
    }
}
