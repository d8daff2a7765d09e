//! Sparse symmetric solver backed by `faer`.
//!
//! Implements the [`SparseSolver`] trait with one of two factorizations:
//! supernodal LLᵀ for positive-definite systems and LDLᵀ for symmetric
//! systems that may be indefinite. The solver operates in f64 internally
//! for numerical robustness but accepts and returns f32 at the interface
//! boundary.
//!
//! ## Workflow
//! 1. `analyze(matrix)`: CSR→CSC, symbolic analysis (kept)
//! 2. `factorize(matrix)`: numeric factorization reusing the symbolic analysis
//! 3. `solve(rhs, solution)`: forward/backward substitution
//!
//! Projective dynamics factorizes once with LLᵀ. Implicit Newton refreshes
//! values and calls `factorize` every frame with the same structure; its
//! Jacobian loses definiteness under compression, so it uses LDLᵀ.

use faer::dyn_stack::{MemBuffer, MemStack};
use faer::linalg::cholesky::ldlt::factor::LdltRegularization;
use faer::linalg::solvers::Solve;
use faer::sparse::linalg::cholesky::{
    factorize_symbolic_cholesky, CholeskySymbolicParams, LdltRef, SymbolicCholesky,
    SymmetricOrdering,
};
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::sparse::{SparseColMat, SparseColMatRef, Triplet};
use faer::{get_global_parallelism, Conj, Mat, Side};

use crate::sparse::{CsrMatrix, SparseSolver};

/// Numeric factorization used by a [`FaerSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Factorization {
    /// Cholesky LLᵀ. Fails on a non-positive pivot.
    #[default]
    Llt,
    /// LDLᵀ without pivoting. Accepts indefinite matrices, fails only on an
    /// exactly zero pivot.
    Ldlt,
}

enum Symbolic {
    Llt(SymbolicLlt<usize>),
    Ldlt(SymbolicCholesky<usize>),
}

enum Numeric {
    Llt(Llt<usize, f64>),
    /// Factor values laid out by the matching [`SymbolicCholesky`].
    Ldlt(Vec<f64>),
}

/// Sparse symmetric solver using `faer`.
pub struct FaerSolver {
    kind: Factorization,
    /// Symbolic analysis of the last analyzed structure.
    symbolic: Option<Symbolic>,
    /// Structure the symbolic analysis was computed for.
    structure: Option<(Vec<usize>, Vec<usize>)>,
    /// Cached numeric factorization.
    factorization: Option<Numeric>,
    /// Matrix dimension (N×N).
    dimension: usize,
    /// Number of symbolic analyses performed.
    analyses: usize,
}

impl FaerSolver {
    /// Creates a new LLᵀ solver (unfactorized).
    pub fn new() -> Self {
        Self::with_factorization(Factorization::Llt)
    }

    /// Creates a new LDLᵀ solver (unfactorized).
    pub fn ldlt() -> Self {
        Self::with_factorization(Factorization::Ldlt)
    }

    pub fn with_factorization(kind: Factorization) -> Self {
        Self {
            kind,
            symbolic: None,
            structure: None,
            factorization: None,
            dimension: 0,
            analyses: 0,
        }
    }

    pub fn factorization_kind(&self) -> Factorization {
        self.kind
    }

    /// How many times the symbolic analysis has run.
    pub fn analysis_count(&self) -> usize {
        self.analyses
    }

    /// Convert our CSR matrix (f32) to faer's CSC matrix (f64).
    fn csr_to_csc_f64(matrix: &CsrMatrix) -> Result<SparseColMat<usize, f64>, String> {
        let mut triplets: Vec<Triplet<usize, usize, f64>> =
            Vec::with_capacity(matrix.values.len());
        for row in 0..matrix.rows {
            for idx in matrix.row_ptr[row]..matrix.row_ptr[row + 1] {
                let col = matrix.col_idx[idx];
                let val = matrix.values[idx] as f64;
                triplets.push(Triplet { row, col, val });
            }
        }

        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets)
            .map_err(|e| format!("Failed to construct faer CSC matrix: {e:?}"))
    }

    fn check_square(matrix: &CsrMatrix) -> Result<(), String> {
        if matrix.rows != matrix.cols {
            return Err(format!(
                "Matrix must be square, got {}×{}",
                matrix.rows, matrix.cols
            ));
        }
        if matrix.rows == 0 {
            return Err("Cannot factorize empty matrix".into());
        }
        Ok(())
    }

    fn structure_matches(&self, matrix: &CsrMatrix) -> bool {
        match &self.structure {
            Some((row_ptr, col_idx)) => {
                self.dimension == matrix.rows
                    && *row_ptr == matrix.row_ptr
                    && *col_idx == matrix.col_idx
            }
            None => false,
        }
    }

    /// Numeric LDLᵀ into `values`, resized to the factor's layout.
    fn factorize_ldlt(
        symbolic: &SymbolicCholesky<usize>,
        matrix: SparseColMatRef<'_, usize, f64>,
        mut values: Vec<f64>,
    ) -> Result<Vec<f64>, String> {
        values.clear();
        values.resize(symbolic.len_val(), 0.0);

        let par = get_global_parallelism();
        let mut mem = MemBuffer::try_new(
            symbolic.factorize_numeric_ldlt_scratch::<f64>(par, Default::default()),
        )
        .map_err(|e| format!("LDLᵀ workspace allocation failed: {e:?}"))?;

        symbolic
            .factorize_numeric_ldlt(
                &mut values,
                matrix,
                Side::Upper,
                LdltRegularization::default(),
                par,
                MemStack::new(&mut mem),
                Default::default(),
            )
            .map_err(|e| format!("LDLᵀ factorization failed: {e:?}"))?;
        Ok(values)
    }
}

impl Default for FaerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerSolver {
    fn analyze(&mut self, matrix: &CsrMatrix) -> Result<(), String> {
        Self::check_square(matrix)?;

        let csc = Self::csr_to_csc_f64(matrix)?;
        let symbolic = match self.kind {
            Factorization::Llt => SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
                .map(Symbolic::Llt),
            Factorization::Ldlt => factorize_symbolic_cholesky(
                csc.symbolic().as_ref(),
                Side::Upper,
                SymmetricOrdering::Amd,
                CholeskySymbolicParams::default(),
            )
            .map(Symbolic::Ldlt),
        }
        .map_err(|e| format!("Symbolic analysis failed: {e:?}"))?;

        self.symbolic = Some(symbolic);
        self.structure = Some((matrix.row_ptr.clone(), matrix.col_idx.clone()));
        self.dimension = matrix.rows;
        self.factorization = None;
        self.analyses += 1;
        Ok(())
    }

    fn factorize(&mut self, matrix: &CsrMatrix) -> Result<(), String> {
        Self::check_square(matrix)?;
        if matrix.values.iter().any(|v| !v.is_finite()) {
            self.factorization = None;
            return Err("Matrix contains non-finite values".into());
        }

        if !self.structure_matches(matrix) {
            self.analyze(matrix)?;
        }
        let csc = Self::csr_to_csc_f64(matrix)?;
        let previous = self.factorization.take();

        let numeric = match &self.symbolic {
            Some(Symbolic::Llt(symbolic)) => {
                Llt::try_new_with_symbolic(symbolic.clone(), csc.as_ref(), Side::Upper)
                    .map(Numeric::Llt)
                    .map_err(|e| format!("Cholesky factorization failed: {e:?}"))?
            }
            Some(Symbolic::Ldlt(symbolic)) => {
                let buffer = match previous {
                    Some(Numeric::Ldlt(values)) => values,
                    _ => Vec::new(),
                };
                Numeric::Ldlt(Self::factorize_ldlt(symbolic, csc.as_ref(), buffer)?)
            }
            None => return Err("Symbolic analysis missing".into()),
        };

        self.factorization = Some(numeric);
        Ok(())
    }

    fn solve(&self, rhs: &[f32], solution: &mut [f32]) -> Result<(), String> {
        let numeric = self
            .factorization
            .as_ref()
            .ok_or_else(|| "Solver not factorized. Call factorize() first.".to_string())?;

        if rhs.len() != self.dimension {
            return Err(format!(
                "RHS length ({}) != matrix dimension ({})",
                rhs.len(),
                self.dimension
            ));
        }
        if solution.len() != self.dimension {
            return Err(format!(
                "Solution length ({}) != matrix dimension ({})",
                solution.len(),
                self.dimension
            ));
        }

        let rhs_f64: Mat<f64> = Mat::from_fn(self.dimension, 1, |i, _| rhs[i] as f64);

        let sol = match (numeric, &self.symbolic) {
            (Numeric::Llt(llt), _) => llt.solve(&rhs_f64),
            (Numeric::Ldlt(values), Some(Symbolic::Ldlt(symbolic))) => {
                let par = get_global_parallelism();
                let mut mem =
                    MemBuffer::try_new(symbolic.solve_in_place_scratch::<f64>(1, par))
                        .map_err(|e| format!("Solve workspace allocation failed: {e:?}"))?;
                let mut x = rhs_f64;
                LdltRef::new(symbolic, values).solve_in_place_with_conj(
                    Conj::No,
                    x.as_mut(),
                    par,
                    MemStack::new(&mut mem),
                );
                x
            }
            (Numeric::Ldlt(_), _) => return Err("LDLᵀ factor has no matching analysis".into()),
        };

        for (i, out) in solution.iter_mut().enumerate() {
            let value = sol[(i, 0)];
            if !value.is_finite() {
                return Err(format!("Solve produced a non-finite value at row {i}"));
            }
            *out = value as f32;
        }

        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}
