//! Procedural cloth generators.
//!
//! The grid generator produces a deterministic, resolution-configurable
//! rectangular cloth with structural, shear and bending springs.

use serde::{Deserialize, Serialize};
use weft_math::{Vec2, Vec3};
use weft_types::constants::{DEFAULT_GRID_DENSITY, DEFAULT_GRID_NODES};
use weft_types::NodeId;

use crate::cloth::{ClothMesh, GridShape};
use crate::node::Node;
use crate::spring::SpringKind;
use crate::tangents::compute_tangents;

/// World-space origin of grid-built cloths.
pub const GRID_ORIGIN: Vec3 = Vec3::new(0.0, 7.0, 0.0);

/// Grid dimensions in nodes, with `density` nodes per unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    pub density: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: DEFAULT_GRID_NODES,
            cols: DEFAULT_GRID_NODES,
            density: DEFAULT_GRID_DENSITY,
        }
    }
}

/// Generates a flat cloth in the local XZ plane.
///
/// Node `(r, c)` has index `r·cols + c`, local position
/// `(c/density, 0, −r/density)` and UV `(c/(cols−1), r/(rows−1))`.
/// The mesh origin is [`GRID_ORIGIN`] and nodes `0` and `cols − 1` are
/// anchored. Each cell emits `[(r, c+1), (r, c), (r+1, c)]` and
/// `[(r+1, c+1), (r, c+1), (r+1, c)]`, so the flat cloth faces −Y.
///
/// # Example
/// ```
/// use weft_mesh::generators::grid;
/// let cloth = grid(4, 4, 4.0);
/// assert_eq!(cloth.node_count(), 16);
/// assert_eq!(cloth.triangle_count(), 18);
/// ```
pub fn grid(rows: usize, cols: usize, density: f32) -> ClothMesh {
    let mut mesh = ClothMesh {
        origin: GRID_ORIGIN,
        grid: Some(GridShape {
            rows,
            cols,
            density,
        }),
        ..ClothMesh::default()
    };
    if rows == 0 || cols == 0 {
        return mesh;
    }

    let u_span = (cols.max(2) - 1) as f32;
    let v_span = (rows.max(2) - 1) as f32;

    mesh.nodes.reserve(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let position = Vec3::new(c as f32 / density, 0.0, -(r as f32) / density);
            let uv = Vec2::new(c as f32 / u_span, r as f32 / v_span);
            mesh.nodes.push(Node::new(position, uv));
        }
    }

    let id = |r: usize, c: usize| NodeId::from(r * cols + c);

    for r in 0..rows {
        for c in 0..cols {
            if r + 1 < rows {
                mesh.add_spring(id(r, c), id(r + 1, c), SpringKind::Structural);
            }
            if c + 1 < cols {
                mesh.add_spring(id(r, c), id(r, c + 1), SpringKind::Structural);
            }
            if r + 1 < rows && c + 1 < cols {
                mesh.add_spring(id(r + 1, c), id(r, c + 1), SpringKind::ShearA);
                mesh.add_spring(id(r, c), id(r + 1, c + 1), SpringKind::ShearB);

                mesh.triangles
                    .extend([id(r, c + 1).0, id(r, c).0, id(r + 1, c).0]);
                mesh.triangles
                    .extend([id(r + 1, c + 1).0, id(r, c + 1).0, id(r + 1, c).0]);
            }
            if r + 2 < rows {
                mesh.add_spring(id(r, c), id(r + 2, c), SpringKind::Bending);
            }
            if c + 2 < cols {
                mesh.add_spring(id(r, c), id(r, c + 2), SpringKind::Bending);
            }
        }
    }

    compute_tangents(&mut mesh.nodes, &mesh.triangles);

    mesh.add_anchor(NodeId(0));
    mesh.add_anchor(NodeId::from(cols - 1));

    tracing::info!(
        rows,
        cols,
        nodes = mesh.node_count(),
        springs = mesh.spring_count(),
        triangles = mesh.triangle_count(),
        "grid cloth built"
    );
    mesh
}

/// Generates a grid from a [`GridSpec`].
pub fn grid_from_spec(spec: &GridSpec) -> ClothMesh {
    grid(spec.rows, spec.cols, spec.density)
}
