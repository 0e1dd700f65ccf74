//! Building world-space trimeshes from indexed model geometry.
//!
//! Collision models are stored once per model as a flat vertex buffer `[x, y, z, ...]` and
//! an index buffer `[i0, i1, i2, ...]`, then instanced many times with a placement.

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::{
    error::ColliderError,
    settings::MIN_MESH_THICKNESS,
    types::{Triangle3, Trimesh},
};

/// World placement of one model instance: uniform scale, then rotation, then translation.
#[derive(Clone, Copy, Debug)]
pub struct MeshPlacement {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: f32,
}

impl Default for MeshPlacement {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: 1.0,
        }
    }
}

impl MeshPlacement {
    /// Placement from Euler angles in degrees about X, Y and Z, applied X first.
    pub fn from_euler_degrees(translation: Vector3<f32>, rot_deg: Vector3<f32>, scale: f32) -> Self {
        Self {
            translation,
            rotation: UnitQuaternion::from_euler_angles(
                rot_deg.x.to_radians(),
                rot_deg.y.to_radians(),
                rot_deg.z.to_radians(),
            ),
            scale,
        }
    }

    #[inline]
    pub fn transform_point(&self, p: Point3<f32>) -> Point3<f32> {
        Point3::from(self.rotation * (p.coords * self.scale) + self.translation)
    }
}

/// Build a world-space trimesh (2D and 3D triangle lists) from indexed geometry.
///
/// The vertical range is derived from the placed vertices. Perfectly flat meshes are
/// given `MIN_MESH_THICKNESS` so they still register.
pub fn trimesh_from_indexed(
    vertices: &[f32],
    indices: &[u32],
    placement: &MeshPlacement,
) -> Result<Trimesh, ColliderError> {
    if vertices.len() % 3 != 0 {
        return Err(ColliderError::VertexBufferLength(vertices.len()));
    }
    if indices.len() % 3 != 0 {
        return Err(ColliderError::IndexBufferLength(indices.len()));
    }
    if indices.is_empty() {
        return Err(ColliderError::EmptyTrimesh);
    }

    let placed: Vec<Vector3<f32>> = vertices
        .chunks_exact(3)
        .map(|v| placement.transform_point(Point3::new(v[0], v[1], v[2])).coords)
        .collect();

    let vertex = |index: u32| {
        placed
            .get(index as usize)
            .copied()
            .ok_or(ColliderError::IndexOutOfRange {
                index,
                vertex_count: placed.len(),
            })
    };

    let triangles_3d = indices
        .chunks_exact(3)
        .map(|t| Ok(Triangle3::new(vertex(t[0])?, vertex(t[1])?, vertex(t[2])?)))
        .collect::<Result<Vec<_>, ColliderError>>()?;

    let mut mesh = Trimesh::from_triangles_3d(triangles_3d);
    if mesh.max_y - mesh.min_y < MIN_MESH_THICKNESS {
        mesh.max_y = mesh.min_y + MIN_MESH_THICKNESS;
    }
    Ok(mesh)
}
