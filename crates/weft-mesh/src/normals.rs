//! Vertex normal computation from triangle data.
//!
//! Computes area-weighted vertex normals by accumulating
//! face normals from each adjacent triangle.

use weft_math::Vec3;
use weft_types::constants::NORMAL_EPSILON;

use crate::cloth::ClothMesh;

/// Recompute node normals from triangle geometry (area-weighted).
///
/// Each triangle's unnormalized face normal `(p1 − p0) × (p2 − p0)` is
/// accumulated at its three nodes in stored winding order, then the result
/// is normalized. Nodes whose accumulated normal is shorter than
/// `NORMAL_EPSILON` keep it unnormalized, so isolated nodes stay zero.
pub fn compute_normals(mesh: &mut ClothMesh) {
    for node in &mut mesh.nodes {
        node.normal = Vec3::ZERO;
    }

    for t in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(t);
        let (a, b, c) = (a as usize, b as usize, c as usize);

        let p0 = mesh.nodes[a].position;
        let face = (mesh.nodes[b].position - p0).cross(mesh.nodes[c].position - p0);

        mesh.nodes[a].normal += face;
        mesh.nodes[b].normal += face;
        mesh.nodes[c].normal += face;
    }

    for node in &mut mesh.nodes {
        let len = node.normal.length();
        if len > NORMAL_EPSILON {
            node.normal /= len;
        }
    }
}
