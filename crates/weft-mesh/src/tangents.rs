//! Per-node tangents from UV parameterization.

use weft_math::Vec3;
use weft_types::constants::TANGENT_DET_EPSILON;

use crate::node::Node;

/// Accumulates the UV tangent of every triangle into its nodes and
/// finalizes each node's averaged, normalized tangent.
///
/// For a triangle with edges `E1 = p1 − p0`, `E2 = p2 − p0` and UV deltas
/// `ΔUV1`, `ΔUV2` the tangent is `(ΔUV2.y·E1 − ΔUV1.y·E2) / det` with
/// `det = ΔUV1.x·ΔUV2.y − ΔUV2.x·ΔUV1.y`. A near-zero determinant uses a
/// factor of 1. Nodes touched by no triangle get `(1, 0, 0)`.
pub fn compute_tangents(nodes: &mut [Node], triangles: &[u32]) {
    for node in nodes.iter_mut() {
        node.tangent_sum = Vec3::ZERO;
        node.tangent_count = 0;
    }

    for tri in triangles.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let tangent = triangle_tangent(&nodes[i0], &nodes[i1], &nodes[i2]);
        for i in [i0, i1, i2] {
            nodes[i].tangent_sum += tangent;
            nodes[i].tangent_count += 1;
        }
    }

    for node in nodes.iter_mut() {
        node.tangent = if node.tangent_count > 0 {
            (node.tangent_sum / node.tangent_count as f32)
                .try_normalize()
                .unwrap_or(Vec3::X)
        } else {
            Vec3::X
        };
    }
}

fn triangle_tangent(n0: &Node, n1: &Node, n2: &Node) -> Vec3 {
    let e1 = n1.position - n0.position;
    let e2 = n2.position - n0.position;
    let duv1 = n1.tex_coord - n0.tex_coord;
    let duv2 = n2.tex_coord - n0.tex_coord;

    let det = duv1.x * duv2.y - duv2.x * duv1.y;
    let f = if det.abs() < TANGENT_DET_EPSILON {
        1.0
    } else {
        1.0 / det
    };
    (e1 * duv2.y - e2 * duv1.y) * f
}
