//! # weft-math
//!
//! Linear algebra primitives for the weft cloth engine.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, `Mat3`, etc.)
//! - Sparse matrix representation (CSR), fixed sparsity patterns and a
//!   Cholesky solver interface backed by `faer`
//! - Barycentric frames and simplex projection for triangle queries

pub mod faer_solver;
pub mod simplex;
pub mod sparse;

pub use faer_solver::{FaerSolver, Factorization};
pub use simplex::{project_to_simplex, TriangleFrame};
pub use sparse::{CsrMatrix, SparseSolver, SparsityPattern};

// Re-export glam types as the canonical math types for weft.
pub use glam::{Mat3, Vec2, Vec3};

/// Outer product `a bᵀ`.
#[inline]
pub fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}
