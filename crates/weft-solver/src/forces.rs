//! Parallel spring force accumulation.
//!
//! Springs are split across threads; every thread writes into its own
//! per-node buffer and the buffers are summed at the end, so no two threads
//! ever add into the same node.

use rayon::prelude::*;
use weft_math::Vec3;
use weft_mesh::ClothMesh;

/// Net Hookean plus damping force from all springs, per node.
pub fn spring_forces(cloth: &ClothMesh) -> Vec<Vec3> {
    let n = cloth.nodes.len();
    let nodes = &cloth.nodes;
    cloth
        .springs
        .par_iter()
        .fold(
            || vec![Vec3::ZERO; n],
            |mut acc, spring| {
                if let Some(f) = spring.force_on_a(nodes) {
                    acc[spring.a.index()] += f;
                    acc[spring.b.index()] -= f;
                }
                acc
            },
        )
        .reduce(
            || vec![Vec3::ZERO; n],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
                a
            },
        )
}

/// Adds each node's weight under `gravity` and the spring forces to the
/// node force accumulators.
pub fn accumulate_forces(cloth: &mut ClothMesh, gravity: Vec3) {
    let springs = spring_forces(cloth);
    cloth
        .nodes
        .par_iter_mut()
        .zip(springs.par_iter())
        .for_each(|(node, &f)| {
            let weight = node.weight(gravity);
            node.add_force(weight + f);
        });
}

/// Overwrites node forces with `gravity · mass + springs`, using the masses
/// cached by an integrator instead of the node masses.
pub(crate) fn set_forces_with_masses(cloth: &mut ClothMesh, masses: &[f32], gravity: Vec3) {
    let springs = spring_forces(cloth);
    cloth
        .nodes
        .par_iter_mut()
        .zip(masses.par_iter())
        .zip(springs.par_iter())
        .for_each(|((node, &m), &f)| node.force = gravity * m + f);
}
