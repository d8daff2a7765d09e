//! Sparse matrix representation and solver interface.
//!
//! Provides a CSR (Compressed Sparse Row) matrix, a fixed sparsity pattern
//! that can be refilled with new values every frame, and a trait for
//! sparse symmetric solvers that separates symbolic analysis from numeric
//! factorization.

use serde::{Deserialize, Serialize};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order. This is the standard
/// format for sparse linear algebra libraries (faer, SuiteSparse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<f32>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f32)]) -> Self {
        let pattern =
            SparsityPattern::from_entries(rows, cols, triplets.iter().map(|&(r, c, _)| (r, c)));
        let mut matrix = pattern.zeros();
        for &(r, c, v) in triplets {
            if let Some(slot) = pattern.slot(r, c) {
                matrix.values[slot] += v;
            }
        }
        matrix
    }

    /// Returns the stored value at `(row, col)`, or zero if absent.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        if row >= self.rows {
            return 0.0;
        }
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_idx[start..end].binary_search(&col) {
            Ok(offset) => self.values[start + offset],
            Err(_) => 0.0,
        }
    }

    /// Computes `out = self * x`.
    pub fn mul_vec(&self, x: &[f32], out: &mut [f32]) {
        for (row, out_r) in out.iter_mut().enumerate().take(self.rows) {
            let mut acc = 0.0;
            for idx in self.row_ptr[row]..self.row_ptr[row + 1] {
                acc += self.values[idx] * x[self.col_idx[idx]];
            }
            *out_r = acc;
        }
    }
}

/// The structure of a sparse matrix without its values.
///
/// Built once from the set of coupled entries; each frame the owner writes
/// values through [`slot`](Self::slot) and hands the result to a solver.
/// Entries are unique and sorted by column within each row, so two matrices
/// produced from the same pattern always share their structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparsityPattern {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl SparsityPattern {
    /// Builds a pattern from `(row, col)` pairs. Duplicates collapse into one
    /// entry; pairs outside the matrix bounds are ignored.
    pub fn from_entries(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        let mut per_row: Vec<Vec<usize>> = vec![Vec::new(); rows];
        for (r, c) in entries {
            if r < rows && c < cols {
                per_row[r].push(c);
            }
        }

        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::new();
        row_ptr.push(0);
        for row in &mut per_row {
            row.sort_unstable();
            row.dedup();
            col_idx.extend_from_slice(row);
            row_ptr.push(col_idx.len());
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of structural entries.
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Position of `(row, col)` in the value array, if it is part of the pattern.
    pub fn slot(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows {
            return None;
        }
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        self.col_idx[start..end]
            .binary_search(&col)
            .ok()
            .map(|offset| start + offset)
    }

    /// A matrix with this structure and all values zero.
    pub fn zeros(&self) -> CsrMatrix {
        CsrMatrix {
            rows: self.rows,
            cols: self.cols,
            row_ptr: self.row_ptr.clone(),
            col_idx: self.col_idx.clone(),
            values: vec![0.0; self.col_idx.len()],
        }
    }

    /// Returns true if `matrix` has exactly this structure.
    pub fn matches(&self, matrix: &CsrMatrix) -> bool {
        self.rows == matrix.rows
            && self.cols == matrix.cols
            && self.row_ptr == matrix.row_ptr
            && self.col_idx == matrix.col_idx
    }
}

/// Trait for sparse symmetric positive-definite solvers.
///
/// The symbolic analysis (ordering, fill-in) depends only on the structure
/// and is kept across calls to [`factorize`](Self::factorize) as long as the
/// structure does not change.
pub trait SparseSolver {
    /// Run the symbolic analysis for the structure of `matrix`.
    fn analyze(&mut self, matrix: &CsrMatrix) -> Result<(), String>;

    /// Numeric factorization. Reuses the symbolic analysis when the
    /// structure matches, otherwise analyzes first.
    fn factorize(&mut self, matrix: &CsrMatrix) -> Result<(), String>;

    /// Solve Ax = b using the pre-computed factorization.
    /// Returns x in the provided output buffer.
    fn solve(&self, rhs: &[f32], solution: &mut [f32]) -> Result<(), String>;

    /// Returns true if the solver holds a valid factorization.
    fn is_factorized(&self) -> bool;
}
