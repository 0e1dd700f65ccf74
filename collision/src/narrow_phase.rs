use nalgebra::Vector2;

use super::{
    settings::GEOM_EPS,
    types::{Aabb, Collider, Cylinder, Obb, PushOut, Triangle2, Trimesh},
};

/// Fallback push axis used when the separating direction is undefined (coincident centers).
const FALLBACK_AXIS: Vector2<f32> = Vector2::new(1.0, 0.0);

/// Test the agent circle at `p` against a single static collider and return its push-out.
///
/// Vertical overlap is the caller's job; this only looks at the XZ footprint.
/// `walkable_slope_cos` is used by trimeshes with 3D data to skip floor triangles.
pub fn push_out_circle(
    p: Vector2<f32>,
    radius: f32,
    collider: &Collider,
    walkable_slope_cos: f32,
) -> Option<PushOut> {
    match collider {
        Collider::Aabb(b) => circle_vs_aabb(p, radius, b),
        Collider::Cylinder(c) => circle_vs_cylinder(p, radius, c),
        Collider::Obb(o) => circle_vs_obb(p, radius, o),
        Collider::Trimesh(m) => circle_vs_trimesh(p, radius, m, walkable_slope_cos),
    }
}

/// Circle vs axis-aligned box.
pub fn circle_vs_aabb(p: Vector2<f32>, radius: f32, b: &Aabb) -> Option<PushOut> {
    circle_vs_rect(p, radius, b.min_x, b.min_z, b.max_x, b.max_z)
}

/// Circle vs rectangle `[min_x, max_x] × [min_z, max_z]`.
///
/// - Outside: push from the closest point on the rectangle toward the center.
/// - Inside: push out through the nearest face, far enough to clear the full radius.
pub fn circle_vs_rect(
    p: Vector2<f32>,
    radius: f32,
    min_x: f32,
    min_z: f32,
    max_x: f32,
    max_z: f32,
) -> Option<PushOut> {
    let closest = Vector2::new(p.x.clamp(min_x, max_x), p.y.clamp(min_z, max_z));
    let delta = p - closest;
    let dist_sq = delta.norm_squared();

    if dist_sq >= radius * radius {
        return None;
    }

    if dist_sq > GEOM_EPS {
        let dist = dist_sq.sqrt();
        return Some(PushOut::new(delta / dist, radius - dist));
    }

    // Center inside (or on the boundary): pick the face with the smallest exit distance.
    // Ties keep the first face in -X, +X, -Z, +Z order.
    let faces = [
        (p.x - min_x, Vector2::new(-1.0, 0.0)),
        (max_x - p.x, Vector2::new(1.0, 0.0)),
        (p.y - min_z, Vector2::new(0.0, -1.0)),
        (max_z - p.y, Vector2::new(0.0, 1.0)),
    ];
    let (exit, normal) = faces
        .into_iter()
        .fold(faces[0], |best, face| if face.0 < best.0 { face } else { best });

    Some(PushOut::new(normal, exit.max(0.0) + radius))
}

/// Circle vs vertical cylinder (circle-circle in XZ).
pub fn circle_vs_cylinder(p: Vector2<f32>, radius: f32, c: &Cylinder) -> Option<PushOut> {
    circle_vs_circle(p, radius, Vector2::new(c.cx, c.cz), c.radius)
}

/// Circle vs circle. Coincident centers push along a fixed axis.
pub fn circle_vs_circle(
    p: Vector2<f32>,
    radius: f32,
    center: Vector2<f32>,
    other_radius: f32,
) -> Option<PushOut> {
    let sum = radius + other_radius;
    let delta = p - center;
    let dist_sq = delta.norm_squared();

    if dist_sq >= sum * sum {
        return None;
    }

    if dist_sq > GEOM_EPS {
        let dist = dist_sq.sqrt();
        Some(PushOut::new(delta / dist, sum - dist))
    } else {
        Some(PushOut::new(FALLBACK_AXIS, sum))
    }
}

/// Circle vs yaw-rotated box: an AABB test in the box's local frame plus a change of basis.
pub fn circle_vs_obb(p: Vector2<f32>, radius: f32, o: &Obb) -> Option<PushOut> {
    let local = o.to_local(p.x, p.y);
    let hit = circle_vs_rect(local, radius, -o.half_w, -o.half_d, o.half_w, o.half_d)?;
    Some(PushOut::new(o.rotate_to_world(hit.normal), hit.depth))
}

/// Circle vs a single XZ triangle.
///
/// - Center inside: always collides, pushed to the nearest edge with `depth = radius + d`,
///   which clears the whole triangle.
/// - Center outside: collides only when the closest edge point is within `radius`.
///
/// Zero-area triangles (vertical walls seen from above) have no inside and behave like
/// their edge segments.
pub fn circle_vs_triangle(p: Vector2<f32>, radius: f32, tri: &Triangle2) -> Option<PushOut> {
    let [a, b, c] = tri.vertices();

    let mut best: Option<(f32, Vector2<f32>, Vector2<f32>)> = None;
    for (e0, e1) in [(a, b), (b, c), (c, a)] {
        let edge = e1 - e0;
        let len_sq = edge.norm_squared();
        if len_sq <= GEOM_EPS {
            continue;
        }
        let t = ((p - e0).dot(&edge) / len_sq).clamp(0.0, 1.0);
        let q = e0 + edge * t;
        let d_sq = (p - q).norm_squared();
        if best.is_none_or(|(best_sq, _, _)| d_sq < best_sq) {
            best = Some((d_sq, q, edge));
        }
    }
    let (dist_sq, closest, edge) = best?;

    let inside = point_in_triangle(p, a, b, c);
    if !inside && dist_sq >= radius * radius {
        return None;
    }

    let dist = dist_sq.sqrt();
    if inside {
        // Push from the center toward (and past) the nearest edge.
        let normal = if dist_sq > GEOM_EPS {
            (closest - p) / dist
        } else {
            edge_outward_normal(edge, closest, (a + b + c) / 3.0)
        };
        Some(PushOut::new(normal, radius + dist))
    } else {
        let normal = if dist_sq > GEOM_EPS {
            (p - closest) / dist
        } else {
            edge_outward_normal(edge, closest, (a + b + c) / 3.0)
        };
        Some(PushOut::new(normal, radius - dist))
    }
}

/// Circle vs every triangle of a mesh, keeping the deepest push-out.
///
/// With 3D data, upward-facing walkable triangles are skipped: they support the agent
/// vertically and must not slide it off their edges.
pub fn circle_vs_trimesh(
    p: Vector2<f32>,
    radius: f32,
    mesh: &Trimesh,
    walkable_slope_cos: f32,
) -> Option<PushOut> {
    let mut deepest: Option<PushOut> = None;
    for (i, tri) in mesh.triangles.iter().enumerate() {
        let is_floor = mesh
            .triangles_3d
            .as_ref()
            .and_then(|tris| tris.get(i))
            .is_some_and(|t| t.is_walkable(walkable_slope_cos));
        if is_floor {
            continue;
        }

        if let Some(hit) = circle_vs_triangle(p, radius, tri) {
            if deepest.is_none_or(|d| hit.depth > d.depth) {
                deepest = Some(hit);
            }
        }
    }
    deepest
}

/// Same-winding containment test. Degenerate (zero-area) triangles contain nothing.
fn point_in_triangle(p: Vector2<f32>, a: Vector2<f32>, b: Vector2<f32>, c: Vector2<f32>) -> bool {
    if cross(b - a, c - a).abs() <= GEOM_EPS {
        return false;
    }
    let d1 = cross(b - a, p - a);
    let d2 = cross(c - b, p - b);
    let d3 = cross(a - c, p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Unit normal of `edge` pointing away from `interior`.
fn edge_outward_normal(edge: Vector2<f32>, on_edge: Vector2<f32>, interior: Vector2<f32>) -> Vector2<f32> {
    let len_sq = edge.norm_squared();
    if len_sq <= GEOM_EPS {
        return FALLBACK_AXIS;
    }
    let n = Vector2::new(-edge.y, edge.x) / len_sq.sqrt();
    if n.dot(&(interior - on_edge)) > 0.0 { -n } else { n }
}

#[inline]
fn cross(u: Vector2<f32>, v: Vector2<f32>) -> f32 {
    u.x * v.y - u.y * v.x
}
