//! Integration tests for weft-solver.

use approx::assert_relative_eq;
use weft_contact::GroundPlane;
use weft_math::{Vec2, Vec3};
use weft_mesh::generators::grid;
use weft_mesh::{ClothMesh, GridSpec, Node, Spring, SpringKind};
use weft_solver::coefficients::{assign_coefficients, remove_bending};
use weft_solver::coloring::SpringBatches;
use weft_solver::config::{
    ExplicitEulerConfig, ImplicitNewtonConfig, PbdConfig, ProjectiveDynamicsConfig,
    SymplecticEulerConfig, XpbdConfig,
};
use weft_solver::forces::spring_forces;
use weft_solver::{
    ClothInstance, ClothIntegrator, ClothModel, EulerIntegrator, ImplicitNewtonIntegrator, Method,
    PositionBasedIntegrator, ProjectiveDynamicsIntegrator, SimulationConfig, SpringCoefficients,
};
use weft_types::{NodeId, WeftError};

/// Two nodes one unit apart joined by a structural spring, with the second
/// node then dragged out to `stretched_x`.
fn stretched_pair(stretched_x: f32) -> ClothMesh {
    let nodes = vec![
        Node::new(Vec3::ZERO, Vec2::ZERO),
        Node::new(Vec3::X, Vec2::ZERO),
    ];
    let springs = vec![Spring::new(&nodes, NodeId(0), NodeId(1), SpringKind::Structural)];
    let mut cloth = ClothMesh::from_parts(nodes, springs, Vec::new(), Vec3::ZERO).unwrap();
    cloth.nodes[1].position.x = stretched_x;
    cloth
}

fn single_node() -> ClothMesh {
    let nodes = vec![Node::new(Vec3::ZERO, Vec2::ZERO)];
    ClothMesh::from_parts(nodes, Vec::new(), Vec::new(), Vec3::ZERO).unwrap()
}

fn small_grid() -> ClothModel {
    ClothModel::Grid(GridSpec {
        rows: 5,
        cols: 5,
        density: 4.0,
    })
}

// ─── Coloring Tests ───────────────────────────────────────────

#[test]
fn batches_never_share_a_node() {
    let cloth = grid(6, 6, 4.0);
    let pairs: Vec<(u32, u32)> = cloth.springs.iter().map(|s| (s.a.0, s.b.0)).collect();
    let batches = SpringBatches::color(&pairs, cloth.node_count());

    let mut seen = vec![0usize; pairs.len()];
    for batch in batches.batches() {
        let mut touched = vec![false; cloth.node_count()];
        for &s in batch {
            let (a, b) = pairs[s];
            assert!(!touched[a as usize], "node {a} appears twice in a batch");
            assert!(!touched[b as usize], "node {b} appears twice in a batch");
            touched[a as usize] = true;
            touched[b as usize] = true;
            seen[s] += 1;
        }
    }
    assert!(seen.iter().all(|&c| c == 1), "every spring must land in exactly one batch");
    assert_eq!(batches.len(), pairs.len());
}

#[test]
fn star_past_64_colors_gets_singleton_batches() {
    let pairs: Vec<(u32, u32)> = (1..=70).map(|i| (0, i)).collect();
    let batches = SpringBatches::color(&pairs, 71);

    assert_eq!(batches.batch_count(), 70);
    assert!(batches.batches().all(|b| b.len() == 1));
    assert_eq!(batches.len(), 70);
}

#[test]
fn empty_spring_list_has_no_batches() {
    let batches = SpringBatches::color(&[], 4);
    assert_eq!(batches.batch_count(), 0);
    assert!(batches.is_empty());
    assert_eq!(batches.batches().count(), 0);
}

// ─── Coefficient Tests ────────────────────────────────────────

#[test]
fn zero_coefficient_prunes_kind() {
    let mut cloth = grid(4, 4, 4.0);
    let pruned = assign_coefficients(&mut cloth, &SpringCoefficients::new(1000.0, 50.0, 0.0));

    assert_eq!(pruned, 16);
    assert_eq!(cloth.spring_count(), 42);
    assert!(cloth.springs.iter().all(|s| s.kind != SpringKind::Bending));
    for s in &cloth.springs {
        let expected = if s.kind == SpringKind::Structural { 1000.0 } else { 50.0 };
        assert_relative_eq!(s.coefficient, expected);
    }
}

#[test]
fn remove_bending_keeps_the_rest() {
    let mut cloth = grid(4, 4, 4.0);
    assert_eq!(remove_bending(&mut cloth), 16);
    assert_eq!(cloth.spring_count(), 42);
}

#[test]
fn pbd_prepare_drops_bending_and_locks_pins() {
    let mut cloth = grid(4, 4, 4.0);
    let mut pbd = PositionBasedIntegrator::pbd(&PbdConfig::default());
    pbd.prepare(&mut cloth).unwrap();

    assert_eq!(cloth.spring_count(), 42);
    assert!(cloth.springs.iter().all(|s| s.coefficient == 0.0));
    for id in &cloth.anchors {
        let node = cloth.node(*id);
        assert!(node.is_fixed);
        assert_eq!(node.inv_mass, 0.0);
    }
    assert!(pbd.batch_count() > 0);
}

#[test]
fn xpbd_prepare_keeps_bending_with_compliance() {
    let mut cloth = grid(4, 4, 4.0);
    let mut xpbd = PositionBasedIntegrator::xpbd(&XpbdConfig::default());
    xpbd.prepare(&mut cloth).unwrap();

    assert_eq!(cloth.spring_count(), 58);
    let bending = cloth
        .springs
        .iter()
        .find(|s| s.kind == SpringKind::Bending)
        .unwrap();
    assert_relative_eq!(bending.coefficient, 1e-4);
}

// ─── Force Tests ──────────────────────────────────────────────

#[test]
fn spring_forces_cancel_in_total() {
    let mut cloth = grid(5, 5, 4.0);
    assign_coefficients(&mut cloth, &SpringCoefficients::default());
    for (i, node) in cloth.nodes.iter_mut().enumerate() {
        node.position += Vec3::new(0.01 * (i % 3) as f32, -0.02 * (i % 5) as f32, 0.005);
    }

    let total = spring_forces(&cloth).into_iter().fold(Vec3::ZERO, |acc, f| acc + f);
    assert!(total.length() < 1e-2, "net internal force {total:?}");
}

#[test]
fn stretched_spring_pulls_ends_together() {
    let mut cloth = stretched_pair(2.0);
    cloth.springs[0].coefficient = 10.0;

    let forces = spring_forces(&cloth);
    assert_relative_eq!(forces[0].x, 10.0, epsilon = 1e-4);
    assert_relative_eq!(forces[1].x, -10.0, epsilon = 1e-4);
}

// ─── Euler Tests ──────────────────────────────────────────────

#[test]
fn update_before_prepare_is_rejected() {
    let mut cloth = grid(3, 3, 4.0);
    let mut integrators: Vec<Box<dyn ClothIntegrator>> = vec![
        Box::new(EulerIntegrator::explicit(&ExplicitEulerConfig::default())),
        Box::new(EulerIntegrator::symplectic(&SymplecticEulerConfig::default())),
        Box::new(PositionBasedIntegrator::pbd(&PbdConfig::default())),
        Box::new(PositionBasedIntegrator::xpbd(&XpbdConfig::default())),
        Box::new(ProjectiveDynamicsIntegrator::new(&ProjectiveDynamicsConfig::default())),
        Box::new(ImplicitNewtonIntegrator::new(&ImplicitNewtonConfig::default())),
    ];
    for integrator in &mut integrators {
        let result = integrator.update(&mut cloth);
        assert!(
            matches!(result, Err(WeftError::NotPrepared(_))),
            "{} accepted an update before prepare",
            integrator.name()
        );
    }
}

#[test]
fn explicit_moves_with_old_velocity() {
    let mut cloth = single_node();
    let config = ExplicitEulerConfig {
        time_step: 0.1,
        substeps: 1,
        gravity: Vec3::new(0.0, -10.0, 0.0),
        ..ExplicitEulerConfig::default()
    };
    let mut euler = EulerIntegrator::explicit(&config);
    euler.prepare(&mut cloth).unwrap();
    euler.update(&mut cloth).unwrap();

    assert_relative_eq!(cloth.nodes[0].position.y, 0.0);
    assert_relative_eq!(cloth.nodes[0].velocity.y, -1.0, epsilon = 1e-6);
}

#[test]
fn symplectic_moves_with_new_velocity() {
    let mut cloth = single_node();
    let config = SymplecticEulerConfig {
        time_step: 0.1,
        substeps: 1,
        gravity: Vec3::new(0.0, -10.0, 0.0),
        ..SymplecticEulerConfig::default()
    };
    let mut euler = EulerIntegrator::symplectic(&config);
    euler.prepare(&mut cloth).unwrap();
    let result = euler.update(&mut cloth).unwrap();

    assert_relative_eq!(cloth.nodes[0].velocity.y, -1.0, epsilon = 1e-6);
    assert_relative_eq!(cloth.nodes[0].position.y, -0.1, epsilon = 1e-6);
    assert_eq!(result.substeps, 1);
}

#[test]
fn pinned_nodes_hold_for_a_thousand_substeps() {
    for method in Method::ALL {
        let mut instance =
            ClothInstance::new(small_grid(), method, SimulationConfig::default()).unwrap();
        instance.add_collider(Box::new(GroundPlane::default()));
        let anchors = instance.cloth().anchors.clone();
        let start: Vec<Vec3> = anchors.iter().map(|id| instance.cloth().node(*id).position).collect();

        let mut substeps = 0u32;
        while substeps < 1000 {
            let result = instance.update().unwrap();
            substeps += result.substeps;
        }

        for (id, p) in anchors.iter().zip(&start) {
            assert_eq!(instance.cloth().node(*id).position, *p, "{method} moved anchor {id:?}");
        }
    }
}

// ─── Position-Based Tests ─────────────────────────────────────

fn weightless_pbd() -> PbdConfig {
    PbdConfig {
        gravity: Vec3::ZERO,
        substeps: 1,
        ..PbdConfig::default()
    }
}

#[test]
fn pbd_restores_rest_length_in_one_substep() {
    let mut cloth = stretched_pair(2.0);
    let mut pbd = PositionBasedIntegrator::pbd(&weightless_pbd());
    pbd.prepare(&mut cloth).unwrap();
    pbd.substep(&mut cloth).unwrap();

    assert_relative_eq!(cloth.nodes[0].position.x, 0.5, epsilon = 1e-5);
    assert_relative_eq!(cloth.nodes[1].position.x, 1.5, epsilon = 1e-5);
}

#[test]
fn pbd_pinned_end_takes_no_correction() {
    let mut cloth = stretched_pair(2.0);
    cloth.nodes[0].pin();
    let mut pbd = PositionBasedIntegrator::pbd(&weightless_pbd());
    pbd.prepare(&mut cloth).unwrap();
    pbd.substep(&mut cloth).unwrap();

    assert_eq!(cloth.nodes[0].position, Vec3::ZERO);
    assert_relative_eq!(cloth.nodes[1].position.x, 1.0, epsilon = 1e-5);
}

#[test]
fn substep_requires_prepare() {
    let mut cloth = stretched_pair(2.0);
    let pbd = PositionBasedIntegrator::pbd(&PbdConfig::default());
    assert!(matches!(pbd.substep(&mut cloth), Err(WeftError::NotPrepared(_))));
}

#[test]
fn xpbd_residual_shrinks_step_by_step() {
    let mut cloth = stretched_pair(2.0);
    let config = XpbdConfig {
        gravity: Vec3::ZERO,
        substeps: 1,
        ..XpbdConfig::default()
    };
    let mut xpbd = PositionBasedIntegrator::xpbd(&config);
    xpbd.prepare(&mut cloth).unwrap();

    let mut previous = f64::MAX;
    for _ in 0..8 {
        let result = xpbd.update(&mut cloth).unwrap();
        assert!(result.residual > 0.0);
        assert!(result.residual < previous, "{} !< {previous}", result.residual);
        previous = result.residual;
    }
}

#[test]
fn pbd_unpin_restores_unit_mass() {
    let mut cloth = grid(3, 3, 4.0);
    let mut pbd = PositionBasedIntegrator::pbd(&PbdConfig::default());
    pbd.prepare(&mut cloth).unwrap();
    pbd.unpin(&mut cloth);

    assert_eq!(cloth.pinned_count(), 0);
    assert!(cloth.nodes.iter().all(|n| n.inv_mass == 1.0));
}

// ─── Projective Dynamics Tests ────────────────────────────────

#[test]
fn pd_rest_state_is_a_fixed_point() {
    let mut cloth = stretched_pair(1.0);
    let config = ProjectiveDynamicsConfig {
        gravity: Vec3::ZERO,
        ..ProjectiveDynamicsConfig::default()
    };
    let mut pd = ProjectiveDynamicsIntegrator::new(&config);
    pd.prepare(&mut cloth).unwrap();
    pd.update(&mut cloth).unwrap();

    assert_relative_eq!(cloth.nodes[0].position.x, 0.0, epsilon = 1e-4);
    assert_relative_eq!(cloth.nodes[1].position.x, 1.0, epsilon = 1e-4);
}

#[test]
fn pd_stretched_spring_contracts() {
    let mut cloth = stretched_pair(2.0);
    let config = ProjectiveDynamicsConfig {
        gravity: Vec3::ZERO,
        ..ProjectiveDynamicsConfig::default()
    };
    let mut pd = ProjectiveDynamicsIntegrator::new(&config);
    pd.prepare(&mut cloth).unwrap();
    let result = pd.update(&mut cloth).unwrap();

    let length = cloth.nodes[1].position.x - cloth.nodes[0].position.x;
    assert!(length < 2.0 && length >= 1.0 - 1e-4, "length {length}");
    assert_eq!(result.iterations, 1);
}

#[test]
fn pd_gravity_lowers_free_nodes() {
    let mut cloth = grid(4, 4, 4.0);
    let mut pd = ProjectiveDynamicsIntegrator::new(&ProjectiveDynamicsConfig::default());
    pd.prepare(&mut cloth).unwrap();
    let before: Vec<Vec3> = cloth.nodes.iter().map(|n| n.position).collect();
    pd.update(&mut cloth).unwrap();

    for (node, p) in cloth.nodes.iter().zip(&before) {
        if node.is_fixed {
            assert_eq!(node.position, *p);
        } else {
            assert!(node.position.y < p.y);
        }
    }
}

#[test]
fn pd_empty_cloth_steps_trivially() {
    let mut cloth = ClothMesh::empty();
    let mut pd = ProjectiveDynamicsIntegrator::new(&ProjectiveDynamicsConfig::default());
    pd.prepare(&mut cloth).unwrap();
    let result = pd.update(&mut cloth).unwrap();
    assert_eq!(result.iterations, 0);
    assert!(result.converged);
}

// ─── Implicit Newton Tests ────────────────────────────────────

#[test]
fn newton_analyzes_the_pattern_once() {
    let mut cloth = grid(4, 4, 4.0);
    let mut newton = ImplicitNewtonIntegrator::new(&ImplicitNewtonConfig::default());
    newton.prepare(&mut cloth).unwrap();
    for _ in 0..5 {
        let result = newton.update(&mut cloth).unwrap();
        assert_eq!(result.iterations, 1);
    }
    assert_eq!(newton.analysis_count(), 1);
}

#[test]
fn newton_gravity_lowers_free_nodes() {
    let mut cloth = grid(4, 4, 4.0);
    let mut newton = ImplicitNewtonIntegrator::new(&ImplicitNewtonConfig::default());
    newton.prepare(&mut cloth).unwrap();
    let before: Vec<Vec3> = cloth.nodes.iter().map(|n| n.position).collect();
    newton.update(&mut cloth).unwrap();

    for (node, p) in cloth.nodes.iter().zip(&before) {
        if node.is_fixed {
            assert_eq!(node.position, *p);
        } else {
            assert!(node.position.y < p.y);
            assert!(node.velocity.y < 0.0);
        }
    }
}

#[test]
fn newton_nan_position_is_a_numerical_failure() {
    let mut cloth = grid(4, 4, 4.0);
    let mut newton = ImplicitNewtonIntegrator::new(&ImplicitNewtonConfig::default());
    newton.prepare(&mut cloth).unwrap();
    cloth.nodes[5].position.x = f32::NAN;

    let result = newton.update(&mut cloth);
    assert!(matches!(result, Err(WeftError::NumericalFailure(_))), "{result:?}");
}

#[test]
fn newton_more_iterations_reduce_the_residual() {
    let mut cloth = stretched_pair(2.0);
    let config = ImplicitNewtonConfig {
        gravity: Vec3::ZERO,
        max_iterations: 6,
        tolerance: 0.0,
        ..ImplicitNewtonConfig::default()
    };
    let mut newton = ImplicitNewtonIntegrator::new(&config);
    newton.prepare(&mut cloth).unwrap();
    let result = newton.update(&mut cloth).unwrap();

    assert!(result.iterations > 1 && result.iterations <= 6);
    let length = cloth.nodes[1].position.x - cloth.nodes[0].position.x;
    assert!(length < 2.0);
}

#[test]
fn newton_steps_through_a_compressed_spring() {
    let mut cloth = stretched_pair(0.01);
    let mut newton = ImplicitNewtonIntegrator::new(&ImplicitNewtonConfig::default());
    newton.prepare(&mut cloth).unwrap();

    let result = newton.update(&mut cloth);
    assert!(result.is_ok(), "{result:?}");
    let length = cloth.nodes[1].position.x - cloth.nodes[0].position.x;
    assert!(length > 0.01 && length < 1.0, "length {length}");

    for _ in 0..10 {
        newton.update(&mut cloth).unwrap();
    }
    assert!(cloth.nodes.iter().all(|n| n.position.is_finite()));
    assert_eq!(newton.analysis_count(), 1);
}

#[test]
fn newton_steps_through_a_crumpled_grid() {
    let mut cloth = grid(4, 4, 4.0);
    let mut newton = ImplicitNewtonIntegrator::new(&ImplicitNewtonConfig::default());
    newton.prepare(&mut cloth).unwrap();
    for node in cloth.nodes.iter_mut().filter(|n| !n.is_fixed) {
        node.position *= 0.3;
    }

    for _ in 0..3 {
        let result = newton.update(&mut cloth);
        assert!(result.is_ok(), "{result:?}");
    }
    assert!(cloth.nodes.iter().all(|n| n.position.is_finite()));
}

#[test]
fn newton_empty_cloth_steps_trivially() {
    let mut cloth = ClothMesh::empty();
    let mut newton = ImplicitNewtonIntegrator::new(&ImplicitNewtonConfig::default());
    newton.prepare(&mut cloth).unwrap();
    assert!(newton.update(&mut cloth).unwrap().converged);
    assert_eq!(newton.analysis_count(), 0);
}
