//! Integration tests for weft-mesh.

use approx::assert_relative_eq;
use weft_math::{Vec2, Vec3};
use weft_mesh::generators::{grid, GridSpec, GRID_ORIGIN};
use weft_mesh::obj::{from_obj_file, parse_obj};
use weft_mesh::{ClothMesh, Node, Spring, SpringKind};
use weft_types::{NodeId, WeftError};

fn two_node_mesh(distance: f32) -> ClothMesh {
    let nodes = vec![
        Node::new(Vec3::ZERO, Vec2::ZERO),
        Node::new(Vec3::new(distance, 0.0, 0.0), Vec2::ZERO),
    ];
    let springs = vec![Spring::new(&nodes, NodeId(0), NodeId(1), SpringKind::Structural)];
    ClothMesh::from_parts(nodes, springs, Vec::new(), Vec3::ZERO).unwrap()
}

// ─── Grid Tests ───────────────────────────────────────────────

#[test]
fn grid_counts() {
    let cloth = grid(4, 4, 4.0);
    let stats = cloth.stats();
    assert_eq!(stats.nodes, 16);
    assert_eq!(stats.triangles, 18);
    assert_eq!(stats.springs_by_kind[SpringKind::Structural.as_index()], 24);
    assert_eq!(stats.springs_by_kind[SpringKind::ShearA.as_index()], 9);
    assert_eq!(stats.springs_by_kind[SpringKind::ShearB.as_index()], 9);
    assert_eq!(stats.springs_by_kind[SpringKind::Bending.as_index()], 16);
    assert_eq!(stats.springs, 58);
    assert!(cloth.validate().is_ok());
}

#[test]
fn default_grid_spec() {
    let spec = GridSpec::default();
    assert_eq!((spec.rows, spec.cols), (40, 40));
    assert_relative_eq!(spec.density, 4.0);
}

#[test]
fn grid_positions_and_uvs() {
    let cloth = grid(4, 4, 4.0);
    let node = &cloth.nodes[4 + 2];
    assert_relative_eq!(node.position, Vec3::new(0.5, 0.0, -0.25));
    assert_relative_eq!(node.tex_coord, Vec2::new(2.0 / 3.0, 1.0 / 3.0));
    assert_eq!(cloth.origin, GRID_ORIGIN);
}

#[test]
fn grid_pins_first_row_corners() {
    let cloth = grid(4, 5, 4.0);
    assert_eq!(cloth.anchors, vec![NodeId(0), NodeId(4)]);
    assert!(cloth.nodes[0].is_fixed);
    assert!(cloth.nodes[4].is_fixed);
    assert_eq!(cloth.pinned_count(), 2);
}

#[test]
fn built_grid_has_zero_inverse_mass_exactly_on_anchors() {
    let cloth = grid(4, 5, 4.0);
    for node in &cloth.nodes {
        assert_eq!(node.inv_mass == 0.0, node.is_fixed);
        assert_eq!(node.mass.is_infinite(), node.is_fixed);
    }
}

#[test]
fn rest_length_matches_initial_distance() {
    let cloth = grid(5, 5, 4.0);
    for spring in &cloth.springs {
        let pa = cloth.nodes[spring.a.index()].initial_position;
        let pb = cloth.nodes[spring.b.index()].initial_position;
        assert_relative_eq!(spring.rest_length, pa.distance(pb), epsilon = 1e-6);
        let expected = match spring.kind {
            SpringKind::Structural => 0.25,
            SpringKind::ShearA | SpringKind::ShearB => 0.25 * 2.0_f32.sqrt(),
            SpringKind::Bending => 0.5,
        };
        assert_relative_eq!(spring.rest_length, expected, epsilon = 1e-6);
    }
}

#[test]
fn rest_length_survives_deformation() {
    let mut cloth = grid(3, 3, 4.0);
    let before: Vec<f32> = cloth.springs.iter().map(|s| s.rest_length).collect();
    for node in &mut cloth.nodes {
        node.position *= 3.0;
    }
    cloth.compute_normals();
    cloth.restart();
    let after: Vec<f32> = cloth.springs.iter().map(|s| s.rest_length).collect();
    assert_eq!(before, after);
}

#[test]
fn empty_grid() {
    let cloth = grid(0, 4, 4.0);
    assert!(cloth.is_empty());
    assert_eq!(cloth.triangle_count(), 0);
}

#[test]
fn grid_tangents_follow_u_direction() {
    let cloth = grid(4, 4, 4.0);
    for node in &cloth.nodes {
        assert_relative_eq!(node.tangent, Vec3::X, epsilon = 1e-5);
    }
}

// ─── Normal Tests ─────────────────────────────────────────────

#[test]
fn flat_grid_normals_point_down() {
    let mut cloth = grid(4, 4, 4.0);
    cloth.compute_normals();
    for node in &cloth.nodes {
        assert_relative_eq!(node.normal, -Vec3::Y, epsilon = 1e-6);
    }
}

#[test]
fn grid_cells_wind_from_the_next_column() {
    let cloth = grid(3, 3, 1.0);
    assert_eq!(cloth.triangle(0), [1, 0, 3]);
    assert_eq!(cloth.triangle(1), [4, 1, 3]);
}

#[test]
fn compute_normals_is_idempotent() {
    let mut cloth = grid(5, 5, 4.0);
    for (i, node) in cloth.nodes.iter_mut().enumerate() {
        node.position.y = (i as f32 * 0.7).sin() * 0.3;
    }
    cloth.compute_normals();
    let first: Vec<Vec3> = cloth.nodes.iter().map(|n| n.normal).collect();
    cloth.compute_normals();
    for (a, n) in first.iter().zip(&cloth.nodes) {
        assert_eq!(*a, n.normal);
    }
}

#[test]
fn isolated_node_normal_stays_zero() {
    let mut cloth = two_node_mesh(1.0);
    cloth.compute_normals();
    assert_eq!(cloth.nodes[0].normal, Vec3::ZERO);
}

// ─── World Position / Restart Tests ───────────────────────────

#[test]
fn world_position_roundtrip() {
    let mut cloth = grid(3, 3, 4.0);
    let id = NodeId(4);
    let world = cloth.world_position(id);
    assert_relative_eq!(world, GRID_ORIGIN + cloth.nodes[4].position);

    cloth.set_world_position(id, Vec3::new(1.0, 2.0, 3.0));
    assert_relative_eq!(cloth.nodes[4].position, Vec3::new(1.0, -5.0, 3.0));
    assert_relative_eq!(cloth.world_position(id), Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn restart_resets_state_and_repins_anchors() {
    let mut cloth = grid(4, 4, 4.0);
    for node in &mut cloth.nodes {
        node.position += Vec3::new(0.0, -1.0, 0.0);
        node.velocity = Vec3::ONE;
        node.force = Vec3::ONE;
        node.unpin();
    }
    cloth.nodes[7].pin();

    cloth.restart();

    for node in &cloth.nodes {
        assert_eq!(node.position, node.initial_position);
        assert_eq!(node.old_position, node.initial_position);
        assert_eq!(node.velocity, Vec3::ZERO);
        assert_eq!(node.force, Vec3::ZERO);
        assert_eq!(node.normal, Vec3::ZERO);
    }
    for &anchor in &cloth.anchors {
        let node = cloth.node(anchor);
        assert!(node.is_fixed);
        assert!(node.mass.is_infinite());
        assert_eq!(node.inv_mass, 0.0);
    }
    assert!(!cloth.nodes[7].is_fixed);
}

// ─── Spring / Node Tests ──────────────────────────────────────

#[test]
fn stretched_spring_pulls_endpoints_together() {
    let mut cloth = two_node_mesh(1.0);
    cloth.springs[0].coefficient = 100.0;
    cloth.nodes[1].position.x = 1.5;
    let f = cloth.springs[0].force_on_a(&cloth.nodes).unwrap();
    assert_relative_eq!(f, Vec3::new(50.0, 0.0, 0.0), epsilon = 1e-4);
    assert_relative_eq!(cloth.springs[0].stretch(&cloth.nodes), 0.5, epsilon = 1e-6);
}

#[test]
fn spring_damping_opposes_separation() {
    let mut cloth = two_node_mesh(1.0);
    cloth.springs[0].coefficient = 0.0;
    cloth.nodes[1].velocity = Vec3::new(2.0, 0.0, 0.0);
    let f = cloth.springs[0].force_on_a(&cloth.nodes).unwrap();
    // Node b moving away drags node a along +X.
    assert_relative_eq!(f, Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-5);
}

#[test]
fn coincident_spring_has_no_force() {
    let cloth = two_node_mesh(0.0);
    assert!(cloth.springs[0].force_on_a(&cloth.nodes).is_none());
}

#[test]
fn explicit_integration_uses_old_velocity() {
    let mut node = Node::new(Vec3::ZERO, Vec2::ZERO);
    node.velocity = Vec3::X;
    node.add_force(Vec3::new(0.0, -10.0, 0.0));
    node.explicit_integrate(0.1);
    assert_relative_eq!(node.position, Vec3::new(0.1, 0.0, 0.0));
    assert_relative_eq!(node.velocity, Vec3::new(1.0, -1.0, 0.0));
    assert_eq!(node.force, Vec3::ZERO);
}

#[test]
fn symplectic_integration_uses_new_velocity() {
    let mut node = Node::new(Vec3::ZERO, Vec2::ZERO);
    node.add_force(Vec3::new(0.0, -10.0, 0.0));
    node.symplectic_integrate(0.1);
    assert_relative_eq!(node.velocity, Vec3::new(0.0, -1.0, 0.0));
    assert_relative_eq!(node.position, Vec3::new(0.0, -0.1, 0.0));
}

#[test]
fn fixed_node_does_not_integrate() {
    let mut node = Node::new(Vec3::ONE, Vec2::ZERO);
    node.pin();
    node.velocity = Vec3::X;
    node.add_force(Vec3::Y);
    node.explicit_integrate(1.0);
    node.symplectic_integrate(1.0);
    assert_eq!(node.position, Vec3::ONE);
    assert_eq!(node.force, Vec3::ZERO);
}

#[test]
fn infinite_mass_node_has_no_weight() {
    let mut node = Node::new(Vec3::ZERO, Vec2::ZERO);
    node.pin_immovable();
    assert_eq!(node.weight(Vec3::new(0.0, -9.8, 0.0)), Vec3::ZERO);
    node.unpin_with_unit_mass();
    assert_relative_eq!(node.weight(Vec3::new(0.0, -9.8, 0.0)), Vec3::new(0.0, -9.8, 0.0));
}

// ─── Validation Tests ─────────────────────────────────────────

#[test]
fn validate_catches_oob_triangle() {
    let mut cloth = grid(2, 2, 1.0);
    cloth.triangles.push(99);
    cloth.triangles.push(0);
    cloth.triangles.push(1);
    assert!(cloth.validate().is_err());
}

#[test]
fn validate_catches_partial_triangle() {
    let mut cloth = grid(2, 2, 1.0);
    cloth.triangles.push(0);
    assert!(cloth.validate().is_err());
}

#[test]
fn retain_springs_reports_removed() {
    let mut cloth = grid(4, 4, 4.0);
    let removed = cloth.retain_springs(|s| s.kind != SpringKind::Bending);
    assert_eq!(removed, 16);
    assert_eq!(cloth.spring_count(), 42);
}

// ─── OBJ Import Tests ─────────────────────────────────────────

const QUAD_OBJ: &str = "\
# two triangles sharing an edge
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

#[test]
fn obj_import_counts() {
    let cloth = parse_obj(QUAD_OBJ).unwrap();
    assert_eq!(cloth.node_count(), 4);
    assert_eq!(cloth.triangle_count(), 2);
    assert_eq!(cloth.spring_count(), 6);
    assert!(cloth.springs.iter().all(|s| s.kind == SpringKind::Structural));
    assert_eq!(cloth.origin, Vec3::ZERO);
    assert_eq!(cloth.anchors, vec![NodeId(0)]);
    assert!(cloth.grid.is_none());
}

#[test]
fn obj_import_keeps_uvs_and_tangents() {
    let cloth = parse_obj(QUAD_OBJ).unwrap();
    assert_relative_eq!(cloth.nodes[2].tex_coord, Vec2::new(1.0, 1.0));
    for node in &cloth.nodes {
        assert_relative_eq!(node.tangent, Vec3::X, epsilon = 1e-5);
    }
}

#[test]
fn obj_uv_seam_splits_nodes() {
    let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vt 0.5 0.5
f 1/1 2/2 3/3
f 1/4 3/3 2/2
";
    let cloth = parse_obj(text).unwrap();
    assert_eq!(cloth.node_count(), 4);
    assert_eq!(cloth.nodes[0].position, cloth.nodes[3].position);
}

#[test]
fn obj_ignores_quads_and_unknown_records() {
    let text = "\
o cloth
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
s off
f 1 2 3 4
f 1 2 3
";
    let cloth = parse_obj(text).unwrap();
    assert_eq!(cloth.triangle_count(), 1);
    assert_eq!(cloth.node_count(), 3);
}

#[test]
fn obj_pins_node_ten_when_present() {
    let mut text = String::new();
    for i in 0..12 {
        text.push_str(&format!("v {} {} 0\n", i, i % 2));
    }
    for t in 0..4 {
        let b = t * 3 + 1;
        text.push_str(&format!("f {} {} {}\n", b, b + 1, b + 2));
    }
    let cloth = parse_obj(&text).unwrap();
    assert_eq!(cloth.node_count(), 12);
    assert_eq!(cloth.anchors, vec![NodeId(0), NodeId(10)]);
    assert!(cloth.nodes[10].is_fixed);
}

#[test]
fn obj_out_of_range_index_is_invalid() {
    let text = "v 0 0 0\nv 1 0 0\nf 1 2 3\n";
    let err = parse_obj(text).unwrap_err();
    assert!(matches!(err, WeftError::InvalidMesh(_)));
}

#[test]
fn obj_bad_number_is_parse_error() {
    let err = parse_obj("v 0 zero 0\n").unwrap_err();
    assert!(matches!(err, WeftError::Parse { line: 1, .. }));
}

#[test]
fn missing_obj_file_yields_empty_mesh() {
    let cloth = from_obj_file("/nonexistent/path/to/tshirt.obj");
    assert!(cloth.is_empty());
    assert_eq!(cloth.triangle_count(), 0);
}
