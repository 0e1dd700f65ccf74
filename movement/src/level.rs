use std::collections::HashMap;

use collision::{
    Aabb, Collider, ColliderError, CollisionWorld, Cylinder, MeshPlacement, Obb,
    trimesh_from_indexed,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Collision geometry for one model, shared by all its placements.
///
/// `verts` is `[x0, y0, z0, x1, ...]` in model space (Y up); `tris` indexes into it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDef {
    pub verts: Vec<f32>,
    pub tris: Vec<u32>,
}

fn default_scale() -> f32 {
    1.0
}

/// A static obstacle as described by level data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObstacleDef {
    /// Axis-aligned box from two opposite corners `[x, y, z]`.
    Box { min: [f32; 3], max: [f32; 3] },
    Cylinder {
        x: f32,
        z: f32,
        radius: f32,
        min_y: f32,
        max_y: f32,
    },
    OrientedBox {
        x: f32,
        z: f32,
        half_width: f32,
        half_depth: f32,
        yaw_degrees: f32,
        min_y: f32,
        max_y: f32,
    },
    /// Placed instance of a model from [`LevelDef::meshes`].
    Mesh {
        model: String,
        x: f32,
        y: f32,
        z: f32,
        #[serde(default)]
        rot_x: f32,
        #[serde(default)]
        rot_y: f32,
        #[serde(default)]
        rot_z: f32,
        #[serde(default = "default_scale")]
        scale: f32,
    },
}

/// Static collision content of a level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    #[serde(default)]
    pub obstacles: Vec<ObstacleDef>,
    /// Model collision geometry keyed by model path.
    #[serde(default)]
    pub meshes: HashMap<String, MeshDef>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid level description: {0}")]
    Json(#[from] serde_json::Error),
}

impl LevelDef {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Why an obstacle was left out of the collision world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SkipReason {
    #[error("unknown model `{0}`")]
    UnknownModel(String),
    #[error(transparent)]
    Collider(#[from] ColliderError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedObstacle {
    /// Position in [`LevelDef::obstacles`].
    pub obstacle: usize,
    pub reason: SkipReason,
}

/// Summary of a level population pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub registered: usize,
    pub skipped: Vec<SkippedObstacle>,
}

/// Register every obstacle of `level` into `world`.
///
/// Malformed obstacles are logged and skipped; they never abort loading, so visual
/// placement of the rest of the level is unaffected by bad collision data.
pub fn load_level(world: &mut CollisionWorld, level: &LevelDef) -> LoadReport {
    let mut report = LoadReport::default();

    for (i, def) in level.obstacles.iter().enumerate() {
        match build_collider(def, &level.meshes).and_then(|c| Ok(world.register(c)?)) {
            Ok(_) => report.registered += 1,
            Err(reason) => {
                log::warn!("Skipping obstacle {i}: {reason}");
                report.skipped.push(SkippedObstacle {
                    obstacle: i,
                    reason,
                });
            }
        }
    }

    let stats = world.stats();
    log::info!(
        "Level collision loaded: {} registered, {} skipped ({} colliders over {} cells, {} oversized)",
        report.registered,
        report.skipped.len(),
        stats.colliders,
        stats.cells,
        stats.oversized
    );
    report
}

/// Convert one obstacle description into a collider.
pub fn build_collider(
    def: &ObstacleDef,
    meshes: &HashMap<String, MeshDef>,
) -> Result<Collider, SkipReason> {
    let collider = match *def {
        ObstacleDef::Box { min, max } => {
            Collider::Aabb(Aabb::new(min[0], min[2], max[0], max[2], min[1], max[1]))
        }
        ObstacleDef::Cylinder {
            x,
            z,
            radius,
            min_y,
            max_y,
        } => Collider::Cylinder(Cylinder::new(x, z, radius, min_y, max_y)),
        ObstacleDef::OrientedBox {
            x,
            z,
            half_width,
            half_depth,
            yaw_degrees,
            min_y,
            max_y,
        } => Collider::Obb(Obb::from_yaw(
            x,
            z,
            half_width,
            half_depth,
            yaw_degrees.to_radians(),
            min_y,
            max_y,
        )),
        ObstacleDef::Mesh {
            ref model,
            x,
            y,
            z,
            rot_x,
            rot_y,
            rot_z,
            scale,
        } => {
            let mesh = meshes
                .get(model)
                .ok_or_else(|| SkipReason::UnknownModel(model.clone()))?;
            let placement = MeshPlacement::from_euler_degrees(
                Vector3::new(x, y, z),
                Vector3::new(rot_x, rot_y, rot_z),
                scale,
            );
            Collider::Trimesh(trimesh_from_indexed(&mesh.verts, &mesh.tris, &placement)?)
        }
    };
    Ok(collider)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    const LEVEL: &str = r#"{
        "obstacles": [
            { "type": "box", "min": [0, 0, 0], "max": [2, 1, 2] },
            { "type": "cylinder", "x": 5, "z": 5, "radius": 0.5, "min_y": 0, "max_y": 3 },
            { "type": "oriented_box", "x": -4, "z": 0, "half_width": 1, "half_depth": 0.5,
              "yaw_degrees": 30, "min_y": 0, "max_y": 2 },
            { "type": "mesh", "model": "world/ramp.m2", "x": 10, "y": 0, "z": 10, "rot_y": 90 },
            { "type": "mesh", "model": "world/missing.m2", "x": 0, "y": 0, "z": 0 },
            { "type": "box", "min": [0, 1, 0], "max": [1, 1, 1] }
        ],
        "meshes": {
            "world/ramp.m2": {
                "verts": [0, 0, 0, 0, 0, 4, 4, 1, 0, 4, 1, 4],
                "tris": [0, 1, 2, 2, 1, 3]
            }
        }
    }"#;

    #[test]
    fn parses_every_obstacle_kind() {
        let level = LevelDef::from_json(LEVEL).unwrap();
        assert_eq!(level.obstacles.len(), 6);
        assert!(matches!(
            level.obstacles[3],
            ObstacleDef::Mesh { scale, rot_y, .. } if scale == 1.0 && rot_y == 90.0
        ));
        assert_eq!(level.meshes["world/ramp.m2"].tris.len(), 6);
    }

    #[test]
    fn malformed_obstacles_are_skipped_not_fatal() {
        let level = LevelDef::from_json(LEVEL).unwrap();
        let mut world = CollisionWorld::new();
        let report = load_level(&mut world, &level);

        assert_eq!(report.registered, 4);
        assert_eq!(world.len(), 4);
        assert_eq!(
            report.skipped,
            vec![
                SkippedObstacle {
                    obstacle: 4,
                    reason: SkipReason::UnknownModel("world/missing.m2".into()),
                },
                SkippedObstacle {
                    obstacle: 5,
                    reason: SkipReason::Collider(ColliderError::DegenerateVerticalRange {
                        min_y: 1.0,
                        max_y: 1.0
                    }),
                },
            ]
        );
    }

    #[test]
    fn box_corners_map_to_xz_and_y_ranges() {
        let c = build_collider(
            &ObstacleDef::Box {
                min: [1.0, 2.0, 3.0],
                max: [4.0, 5.0, 6.0],
            },
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(c, Collider::Aabb(Aabb::new(1.0, 3.0, 4.0, 6.0, 2.0, 5.0)));
    }

    #[test]
    fn placed_mesh_lands_in_world_space() {
        let level = LevelDef::from_json(LEVEL).unwrap();
        let mut world = CollisionWorld::new();
        load_level(&mut world, &level);

        // Ramp rotated 90° about +Y around (10, 0, 10): model +X maps to world -Z,
        // so the ramp occupies x ∈ [10, 14], z ∈ [6, 10].
        let Some(Collider::Trimesh(mesh)) = world.collider(3) else {
            panic!("expected the ramp trimesh at index 3");
        };
        let bounds = Collider::Trimesh(mesh.clone()).xz_bounds();
        assert!((bounds.min_x - 10.0).abs() < 1.0e-4);
        assert!((bounds.max_x - 14.0).abs() < 1.0e-4);
        assert!((bounds.min_z - 6.0).abs() < 1.0e-4);
        assert!((bounds.max_z - 10.0).abs() < 1.0e-4);
    }

    struct CaptureLog(Mutex<Vec<(log::Level, String, String)>>);

    impl log::Log for CaptureLog {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &log::Record) {
            if let Ok(mut records) = self.0.lock() {
                records.push((
                    record.level(),
                    record.target().to_owned(),
                    record.args().to_string(),
                ));
            }
        }
        fn flush(&self) {}
    }

    static CAPTURE: CaptureLog = CaptureLog(Mutex::new(Vec::new()));

    #[test]
    fn rejected_obstacle_is_warned_once_by_the_loader() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Trace);

        let level = LevelDef::from_json(
            r#"{ "obstacles": [
                { "type": "box", "min": [0, 0, 0], "max": [1, 1, 1] },
                { "type": "box", "min": [2, 0, 0], "max": [3, 1, 1] },
                { "type": "box", "min": [4, 0, 0], "max": [5, 1, 1] },
                { "type": "cylinder", "x": 0, "z": 9, "radius": 1, "min_y": 2, "max_y": 2 }
            ] }"#,
        )
        .unwrap();
        let report = load_level(&mut CollisionWorld::new(), &level);
        assert_eq!(report.skipped.len(), 1);

        let records = CAPTURE.0.lock().unwrap();
        let warns: Vec<_> = records
            .iter()
            .filter(|(level, _, _)| *level == log::Level::Warn)
            .collect();
        assert_eq!(
            warns
                .iter()
                .filter(|(_, target, msg)| target == "movement::level"
                    && msg.starts_with("Skipping obstacle 3:"))
                .count(),
            1
        );
        assert!(warns.iter().all(|(_, target, _)| !target.starts_with("collision")));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            LevelDef::from_json("{ \"obstacles\": [ { \"type\": \"sphere\" } ] }"),
            Err(LevelError::Json(_))
        ));
    }
}
