//! Sparse system assembly for the projective and implicit integrators.
//!
//! Projective dynamics uses one constant N×N matrix per coordinate axis:
//!
//! ```text
//! A = M/h² + Σₛ kₛ · Lₛ
//! ```
//!
//! where `Lₛ` is the graph Laplacian of spring `s` (`+1` on both diagonal
//! entries, `−1` on the coupling entries).
//!
//! Implicit Newton uses a 3N×3N Jacobian whose structure is fixed by the
//! spring topology. [`NewtonLayout`] records, once, where every spring block
//! and every mass entry lives in the value array, so refilling the matrix
//! each frame is a scatter into known slots.

use weft_math::{CsrMatrix, Mat3, SparsityPattern};
use weft_mesh::Spring;
use weft_types::{WeftError, WeftResult};

/// Assemble the projective dynamics system matrix `A = M/h² + Σ k L`.
///
/// # Arguments
/// * `mass`: Per-node mass (length N)
/// * `dt`: Timestep
/// * `springs`: Springs with their stiffness in `coefficient`
pub fn assemble_projective_matrix(mass: &[f32], dt: f32, springs: &[Spring]) -> CsrMatrix {
    let n = mass.len();
    let inv_dt2 = 1.0 / (dt * dt);

    let mut triplets: Vec<(usize, usize, f32)> = Vec::with_capacity(n + springs.len() * 4);

    // Mass term: M/h² on the diagonal
    for (i, &m) in mass.iter().enumerate() {
        triplets.push((i, i, m * inv_dt2));
    }

    // Stiffness term
    for spring in springs {
        let (a, b) = (spring.a.index(), spring.b.index());
        let k = spring.coefficient;
        triplets.push((a, a, k));
        triplets.push((a, b, -k));
        triplets.push((b, a, -k));
        triplets.push((b, b, k));
    }

    CsrMatrix::from_triplets(n, n, &triplets)
}

/// Slot offsets of one 3×3 block, row-major.
type BlockSlots = [usize; 9];

/// Fixed structure of the implicit Newton Jacobian.
#[derive(Debug, Clone)]
pub struct NewtonLayout {
    pattern: SparsityPattern,
    /// Per spring: blocks (a,a), (a,b), (b,a), (b,b).
    spring_slots: Vec<[BlockSlots; 4]>,
    /// Per node: the three diagonal entries.
    mass_slots: Vec<[usize; 3]>,
}

impl NewtonLayout {
    /// Builds the 3N×3N pattern: a full 3×3 diagonal block per node and the
    /// four 3×3 blocks coupling the ends of every spring.
    pub fn new(node_count: usize, springs: &[Spring]) -> WeftResult<Self> {
        let dim = node_count * 3;
        let mut entries = Vec::with_capacity(node_count * 9 + springs.len() * 36);
        for i in 0..node_count {
            push_block(&mut entries, i, i);
        }
        for spring in springs {
            let (a, b) = (spring.a.index(), spring.b.index());
            push_block(&mut entries, a, a);
            push_block(&mut entries, a, b);
            push_block(&mut entries, b, a);
            push_block(&mut entries, b, b);
        }
        let pattern = SparsityPattern::from_entries(dim, dim, entries);

        let spring_slots = springs
            .iter()
            .map(|s| -> WeftResult<[BlockSlots; 4]> {
                let (a, b) = (s.a.index(), s.b.index());
                Ok([
                    block_slots(&pattern, a, a)?,
                    block_slots(&pattern, a, b)?,
                    block_slots(&pattern, b, a)?,
                    block_slots(&pattern, b, b)?,
                ])
            })
            .collect::<WeftResult<Vec<_>>>()?;

        let mass_slots = (0..node_count)
            .map(|i| -> WeftResult<[usize; 3]> {
                let slot = |k: usize| {
                    pattern.slot(i * 3 + k, i * 3 + k).ok_or_else(|| missing_entry(i, i))
                };
                Ok([slot(0)?, slot(1)?, slot(2)?])
            })
            .collect::<WeftResult<Vec<_>>>()?;

        Ok(Self {
            pattern,
            spring_slots,
            mass_slots,
        })
    }

    pub fn pattern(&self) -> &SparsityPattern {
        &self.pattern
    }

    /// A zero matrix with the Jacobian structure.
    pub fn zeros(&self) -> CsrMatrix {
        self.pattern.zeros()
    }

    /// Overwrites `matrix` with `Σ ±Bₛ + M`, where `Bₛ` is each spring's
    /// current `jacobian` block.
    pub fn fill(&self, matrix: &mut CsrMatrix, springs: &[Spring], mass: &[f32]) {
        matrix.values.iter_mut().for_each(|v| *v = 0.0);

        for (spring, slots) in springs.iter().zip(&self.spring_slots) {
            let block = spring.jacobian;
            scatter(matrix, &slots[0], &block, 1.0);
            scatter(matrix, &slots[1], &block, -1.0);
            scatter(matrix, &slots[2], &block, -1.0);
            scatter(matrix, &slots[3], &block, 1.0);
        }

        for (slots, &m) in self.mass_slots.iter().zip(mass) {
            for &slot in slots {
                matrix.values[slot] += m;
            }
        }
    }
}

fn push_block(entries: &mut Vec<(usize, usize)>, a: usize, b: usize) {
    for i in 0..3 {
        for j in 0..3 {
            entries.push((a * 3 + i, b * 3 + j));
        }
    }
}

fn block_slots(pattern: &SparsityPattern, a: usize, b: usize) -> WeftResult<BlockSlots> {
    let mut slots = [0usize; 9];
    for i in 0..3 {
        for j in 0..3 {
            slots[i * 3 + j] = pattern
                .slot(a * 3 + i, b * 3 + j)
                .ok_or_else(|| missing_entry(a, b))?;
        }
    }
    Ok(slots)
}

fn missing_entry(a: usize, b: usize) -> WeftError {
    WeftError::InvalidMesh(format!("Jacobian block ({a}, {b}) is outside the pattern"))
}

fn scatter(matrix: &mut CsrMatrix, slots: &BlockSlots, block: &Mat3, sign: f32) {
    for i in 0..3 {
        for j in 0..3 {
            matrix.values[slots[i * 3 + j]] += sign * block.col(j)[i];
        }
    }
}
