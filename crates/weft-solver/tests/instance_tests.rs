//! Configuration, façade and shared-handle tests for weft-solver.

use std::path::PathBuf;
use std::thread;

use approx::assert_relative_eq;
use weft_contact::{ColliderShape, GroundPlane, SphereCollider};
use weft_math::Vec3;
use weft_mesh::GridSpec;
use weft_solver::instance::DEFAULT_SURFACE_PATH;
use weft_solver::{
    ClothInstance, ClothModel, ColliderSpec, Method, SceneConfig, SimulationConfig,
    SimulationHandle,
};
use weft_types::{NodeId, WeftError};

fn small_grid() -> ClothModel {
    ClothModel::Grid(GridSpec {
        rows: 6,
        cols: 6,
        density: 4.0,
    })
}

fn instance(method: Method) -> ClothInstance {
    ClothInstance::new(small_grid(), method, SimulationConfig::default()).unwrap()
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn default_parameters() {
    let config = SimulationConfig::default();
    assert_relative_eq!(config.explicit_euler.time_step, 0.001);
    assert_eq!(config.explicit_euler.substeps, 25);
    assert_relative_eq!(config.explicit_euler.gravity.y, -9.8 / 25.0);
    assert_relative_eq!(config.symplectic_euler.time_step, 0.01);
    assert_eq!(config.pbd.substeps, 25);
    assert_relative_eq!(config.pbd.time_step, 1.0 / 60.0 / 25.0);
    assert_relative_eq!(config.xpbd.compliance.shear, 0.3);
    assert_relative_eq!(config.projective_dynamics.stiffness.structural, 10000.0);
    assert_eq!(config.projective_dynamics.iterations, 1);
    assert_eq!(config.implicit_newton.max_iterations, 1);
    assert_relative_eq!(config.implicit_newton.gravity.y, -9.8);
    assert!(config.validate().is_ok());
}

#[test]
fn partial_table_keeps_other_defaults() {
    let text = r#"
        [projective_dynamics]
        time_step = 0.005

        [xpbd.compliance]
        shear = 0.1
    "#;
    let config = SimulationConfig::from_toml(text).unwrap();
    let defaults = SimulationConfig::default();

    assert_relative_eq!(config.projective_dynamics.time_step, 0.005);
    assert_eq!(config.projective_dynamics.iterations, 1);
    assert_relative_eq!(config.xpbd.compliance.shear, 0.1);
    assert_relative_eq!(config.xpbd.compliance.structural, 1e-4);
    assert_eq!(config.pbd, defaults.pbd);
    assert_eq!(config.implicit_newton, defaults.implicit_newton);
}

#[test]
fn toml_round_trip() {
    let mut config = SimulationConfig::default();
    config.implicit_newton.max_iterations = 4;
    config.symplectic_euler.gravity = Vec3::new(0.0, -1.0, 0.5);

    let text = config.to_toml().unwrap();
    let parsed = SimulationConfig::from_toml(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn zero_time_step_is_rejected() {
    let result = SimulationConfig::from_toml("[pbd]\ntime_step = 0.0\n");
    assert!(matches!(result, Err(WeftError::InvalidConfig(_))));
}

#[test]
fn zero_substeps_are_rejected() {
    let mut config = SimulationConfig::default();
    config.explicit_euler.substeps = 0;
    assert!(matches!(config.validate(), Err(WeftError::InvalidConfig(_))));
    assert!(ClothInstance::new(small_grid(), Method::ExplicitEuler, config).is_err());
}

#[test]
fn malformed_toml_is_invalid_config() {
    let result = SimulationConfig::from_toml("[pbd\nsubsteps = 3");
    assert!(matches!(result, Err(WeftError::InvalidConfig(_))));
}

#[test]
fn scene_file_describes_a_full_run() {
    let text = r#"
        method = "pbd"
        frames = 10
        unpin_after = 5

        [model]
        kind = "grid"
        rows = 5
        cols = 5

        [[colliders]]
        type = "sphere"
        radius = 3.0

        [[colliders]]
        type = "ground"
        height = -2.0

        [simulation.pbd]
        substeps = 10
    "#;
    let scene = SceneConfig::from_toml(text).unwrap();

    assert_eq!(scene.method, Method::Pbd);
    assert_eq!(scene.frames, 10);
    assert_eq!(scene.unpin_after, Some(5));
    assert_eq!(
        scene.model,
        ClothModel::Grid(GridSpec {
            rows: 5,
            cols: 5,
            density: GridSpec::default().density,
        })
    );
    assert_eq!(scene.simulation.pbd.substeps, 10);
    assert_eq!(scene.colliders.len(), 2);

    let sphere = scene.colliders[0].build().unwrap();
    match sphere.shape() {
        ColliderShape::Sphere { center, radius } => {
            assert_eq!(center, SphereCollider::default().center);
            assert_relative_eq!(radius, 3.0);
        }
        other => panic!("expected a sphere, got {other:?}"),
    }
    assert_eq!(
        scene.colliders[1].build().unwrap().shape(),
        ColliderShape::Ground { height: -2.0 }
    );
}

#[test]
fn scene_loads_from_disk() {
    let path = std::env::temp_dir().join(format!("weft-scene-{}.toml", std::process::id()));
    std::fs::write(&path, "method = \"implicit_newton\"\nframes = 3\n").unwrap();
    let scene = SceneConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(scene.method, Method::ImplicitNewton);
    assert_eq!(scene.frames, 3);
    assert_eq!(scene.model, ClothModel::default());
}

#[test]
fn missing_scene_file_is_io_error() {
    let result = SceneConfig::load("/definitely/not/here.toml");
    assert!(matches!(result, Err(WeftError::Io(_))));
}

// ─── Collider Spec Tests ──────────────────────────────────────

#[test]
fn every_default_collider_builds() {
    for kind in ["sphere", "capsule", "box", "ground", "swept_sphere", "swept_sphere_triangle"] {
        let spec = ColliderSpec::default_of(kind).unwrap();
        assert!(spec.build().is_ok(), "{kind} failed to build");
    }
    assert!(matches!(
        ColliderSpec::default_of("torus"),
        Err(WeftError::InvalidConfig(_))
    ));
}

#[test]
fn coincident_capsule_poles_are_a_geometry_error() {
    let spec = ColliderSpec::Capsule {
        top: Some(Vec3::new(0.0, 1.0, 0.0)),
        bottom: Some(Vec3::new(0.0, 1.0, 0.0)),
        radius: Some(0.5),
    };
    assert!(matches!(spec.build(), Err(WeftError::Geometry(_))));
}

#[test]
fn collider_spec_json_uses_type_tag() {
    let spec: ColliderSpec =
        serde_json::from_str(r#"{"type":"box","half_extents":[1.0,2.0,3.0]}"#).unwrap();
    assert_eq!(
        spec,
        ColliderSpec::Box {
            center: None,
            half_extents: Some(Vec3::new(1.0, 2.0, 3.0)),
        }
    );
}

#[test]
fn sphere_mesh_with_missing_file_still_builds() {
    let spec = ColliderSpec::SphereMesh {
        path: PathBuf::from("no/such/model.obj"),
        scale: None,
        translation: None,
    };
    let collider = spec.build().unwrap();
    assert!(matches!(collider.shape(), ColliderShape::Composite { .. }));
}

// ─── Method Tests ─────────────────────────────────────────────

#[test]
fn method_names_parse() {
    assert_eq!("PBD".parse::<Method>().unwrap(), Method::Pbd);
    assert_eq!("xpbd".parse::<Method>().unwrap(), Method::Xpbd);
    assert_eq!("implicit_newton".parse::<Method>().unwrap(), Method::ImplicitNewton);
    assert_eq!("Projective-Dynamics".parse::<Method>().unwrap(), Method::ProjectiveDynamics);
    for method in Method::ALL {
        assert_eq!(method.to_string().parse::<Method>().unwrap(), method);
    }
}

#[test]
fn unknown_method_is_rejected() {
    let result = "verlet".parse::<Method>();
    assert!(matches!(result, Err(WeftError::UnknownMethod(name)) if name == "verlet"));
    assert!(matches!(
        ClothInstance::create("grid", "rk4"),
        Err(WeftError::UnknownMethod(_))
    ));
}

#[test]
fn integrator_names_match_methods() {
    let config = SimulationConfig::default();
    for method in Method::ALL {
        assert_eq!(method.integrator(&config).name(), method.as_str());
    }
}

// ─── Cloth Model Tests ────────────────────────────────────────

#[test]
fn cloth_model_parses_shapes() {
    assert_eq!("grid".parse::<ClothModel>().unwrap(), ClothModel::default());
    assert_eq!(
        "tshirt".parse::<ClothModel>().unwrap(),
        ClothModel::Surface {
            path: PathBuf::from(DEFAULT_SURFACE_PATH)
        }
    );
    assert_eq!(
        "assets/skirt.OBJ".parse::<ClothModel>().unwrap(),
        ClothModel::Surface {
            path: PathBuf::from("assets/skirt.OBJ")
        }
    );
    assert!(matches!(
        "cube".parse::<ClothModel>(),
        Err(WeftError::InvalidConfig(_))
    ));
}

#[test]
fn missing_surface_gives_an_empty_cloth_every_method_can_step() {
    for method in Method::ALL {
        let model = ClothModel::Surface {
            path: PathBuf::from("no/such/garment.obj"),
        };
        let mut instance =
            ClothInstance::new(model, method, SimulationConfig::default()).unwrap();
        assert!(instance.cloth().is_empty());
        assert!(instance.update().is_ok(), "{method} failed on an empty cloth");
    }
}

// ─── Instance Tests ───────────────────────────────────────────

#[test]
fn create_default_grid() {
    let instance = ClothInstance::create("grid", "SymplecticEuler").unwrap();
    assert_eq!(instance.cloth().node_count(), 1600);
    assert_eq!(instance.method(), Method::SymplecticEuler);
    assert_eq!(instance.frame(), 0);
    assert!(instance.colliders().is_empty());
}

#[test]
fn update_advances_frames_and_moves_cloth() {
    let mut instance = instance(Method::SymplecticEuler);
    let before = instance.world_positions();
    for _ in 0..3 {
        let result = instance.update().unwrap();
        assert_eq!(result.substeps, 25);
    }
    assert_eq!(instance.frame(), 3);

    let after = instance.world_positions();
    let lowest_before = before.iter().map(|p| p.y).fold(f32::MAX, f32::min);
    let lowest_after = after.iter().map(|p| p.y).fold(f32::MAX, f32::min);
    assert!(lowest_after < lowest_before);
}

#[test]
fn world_positions_include_origin() {
    let instance = instance(Method::Pbd);
    let world = instance.world_positions();
    let origin = instance.cloth().origin;
    assert_eq!(world[0], instance.cloth().nodes[0].position + origin);
}

#[test]
fn restart_returns_to_rest_and_repins() {
    let mut instance = instance(Method::SymplecticEuler);
    instance.add_collider(Box::new(GroundPlane::default()));
    let initial = instance.world_positions();

    instance.unpin();
    for _ in 0..5 {
        instance.update().unwrap();
    }
    assert_eq!(instance.cloth().pinned_count(), 0);

    instance.restart();
    assert_eq!(instance.frame(), 0);
    assert_eq!(instance.world_positions(), initial);
    assert_eq!(instance.colliders().len(), 1);
    for id in &instance.cloth().anchors {
        let node = instance.cloth().node(*id);
        assert!(node.is_fixed);
        assert!(node.mass.is_infinite());
        assert_eq!(node.inv_mass, 0.0);
    }
    assert!(instance.cloth().nodes.iter().all(|n| n.velocity == Vec3::ZERO));
}

#[test]
fn restart_undoes_direct_edits() {
    let mut instance = instance(Method::Xpbd);
    let rest = instance.cloth().node(NodeId(14)).position;
    instance.cloth_mut().node_mut(NodeId(14)).position.y += 0.5;
    instance.update().unwrap();
    assert_ne!(instance.cloth().node(NodeId(14)).position, rest);

    instance.restart();
    assert_eq!(instance.cloth().node(NodeId(14)).position, rest);
}

#[test]
fn unpin_under_pbd_restores_unit_mass() {
    let mut instance = instance(Method::Pbd);
    instance.unpin();
    assert_eq!(instance.cloth().pinned_count(), 0);
    assert!(instance.cloth().nodes.iter().all(|n| n.inv_mass == 1.0));
}

#[test]
fn unpin_under_euler_keeps_mass() {
    let mut instance = instance(Method::ExplicitEuler);
    instance.restart();
    instance.unpin();
    let anchor = instance.cloth().anchors[0];
    let node = instance.cloth().node(anchor);
    assert!(!node.is_fixed);
    assert!(node.mass.is_infinite());
}

#[test]
fn colliders_keep_registration_order() {
    let mut instance = instance(Method::ProjectiveDynamics);
    instance.add_collider(Box::new(SphereCollider::default()));
    instance.add_collider(Box::new(GroundPlane::default()));
    let names: Vec<&str> = instance.colliders().as_slice().iter().map(|c| c.name()).collect();
    assert_eq!(names, ["sphere", "ground"]);
}

#[test]
fn ground_stops_a_falling_cloth() {
    let mut instance = instance(Method::Pbd);
    let floor = 6.9;
    instance.add_collider(Box::new(GroundPlane::new(floor)));
    instance.unpin();

    let mut touched = false;
    for _ in 0..60 {
        let result = instance.update().unwrap();
        touched |= !result.contacts.is_empty();
    }
    assert!(touched);
    assert!(instance.world_positions().iter().all(|p| p.y >= floor - 1e-3));
}

#[test]
fn rebuild_drops_colliders() {
    let mut instance = instance(Method::ImplicitNewton);
    instance.add_collider(Box::new(SphereCollider::default()));
    instance.update().unwrap();

    instance.rebuild().unwrap();
    assert!(instance.colliders().is_empty());
    assert_eq!(instance.frame(), 0);
    assert_eq!(instance.cloth().node_count(), 36);
}

#[test]
fn rebuild_with_switches_method_and_model() {
    let mut instance = instance(Method::ExplicitEuler);
    let model = ClothModel::Grid(GridSpec {
        rows: 3,
        cols: 4,
        density: 4.0,
    });
    instance.rebuild_with(model.clone(), Method::Xpbd).unwrap();

    assert_eq!(instance.method(), Method::Xpbd);
    assert_eq!(instance.model(), &model);
    assert_eq!(instance.cloth().node_count(), 12);
    instance.update().unwrap();
}

// ─── Handle Tests ─────────────────────────────────────────────

#[test]
fn handle_is_shared_across_threads() {
    let handle = SimulationHandle::new(instance(Method::Xpbd));
    let worker = handle.clone();
    thread::spawn(move || {
        for _ in 0..3 {
            worker.update().unwrap();
        }
    })
    .join()
    .unwrap();

    assert_eq!(handle.lock().frame(), 3);
}

#[test]
fn snapshot_copies_positions_and_normals() {
    let handle = SimulationHandle::new(instance(Method::SymplecticEuler));
    handle.update().unwrap();
    let (positions, normals) = handle.snapshot();

    assert_eq!(positions.len(), 36);
    assert_eq!(normals.len(), 36);
    for n in &normals {
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-3);
    }
}

#[test]
fn handle_restart_and_rebuild() {
    let handle = SimulationHandle::new(instance(Method::ProjectiveDynamics));
    handle.add_collider(Box::new(GroundPlane::default()));
    handle.update().unwrap();
    handle.restart();
    assert_eq!(handle.lock().frame(), 0);
    assert_eq!(handle.lock().colliders().len(), 1);

    handle.rebuild().unwrap();
    assert!(handle.lock().colliders().is_empty());
}
