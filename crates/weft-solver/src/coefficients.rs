//! Spring coefficient assignment and pruning.

use weft_mesh::{ClothMesh, SpringKind};

use crate::config::SpringCoefficients;

/// Writes the per-kind coefficient into every spring, then removes springs
/// whose coefficient is zero. Returns the number removed.
pub fn assign_coefficients(cloth: &mut ClothMesh, coefficients: &SpringCoefficients) -> usize {
    for spring in &mut cloth.springs {
        spring.coefficient = coefficients.for_kind(spring.kind);
    }
    let pruned = cloth.retain_springs(|s| s.coefficient != 0.0);
    let by_kind = cloth.stats().springs_by_kind;
    tracing::info!(
        structural = by_kind[SpringKind::Structural.as_index()],
        shear = by_kind[SpringKind::ShearA.as_index()] + by_kind[SpringKind::ShearB.as_index()],
        bending = by_kind[SpringKind::Bending.as_index()],
        pruned,
        "spring coefficients assigned"
    );
    pruned
}

/// Removes every bending spring. Returns the number removed.
pub fn remove_bending(cloth: &mut ClothMesh) -> usize {
    let removed = cloth.retain_springs(|s| s.kind != SpringKind::Bending);
    tracing::info!(removed, remaining = cloth.spring_count(), "bending springs removed");
    removed
}
