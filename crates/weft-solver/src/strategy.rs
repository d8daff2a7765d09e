//! Integrator strategy trait: the core abstraction for time integration.
//!
//! Every integrator implements this trait, so a [`ClothInstance`](crate::ClothInstance)
//! can swap between force-based, position-based, projective and implicit
//! schemes without knowing which one it holds.

use weft_contact::{Collider, ColliderSet, ContactResult};
use weft_mesh::ClothMesh;
use weft_types::WeftResult;

/// Result of one `update` call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepResult {
    /// Substeps advanced.
    pub substeps: u32,
    /// Solver iterations performed across all substeps.
    pub iterations: u32,
    /// Integrator-specific residual. Newton reports the norm of its
    /// residual vector, projective dynamics the relative change of the last
    /// global solve, the others the RMS spring stretch.
    pub residual: f64,
    /// Whether the residual met the integrator's tolerance.
    pub converged: bool,
    /// Merged contact report of every collider pass.
    pub contacts: ContactResult,
    /// Wall-clock time for this update (seconds).
    pub wall_time: f64,
}

/// Trait for cloth time integrators.
///
/// The instance calls these methods in order:
///
/// ```text
/// integrator.prepare(&mut cloth)?;
/// loop {
///     integrator.update(&mut cloth)?;
/// }
/// ```
///
/// `prepare` assigns spring coefficients, prunes springs the method does not
/// use and builds any cached system. Calling `update` first returns
/// [`WeftError::NotPrepared`](weft_types::WeftError::NotPrepared).
pub trait ClothIntegrator: Send {
    /// One-time preparation of `cloth` for this method.
    fn prepare(&mut self, cloth: &mut ClothMesh) -> WeftResult<()>;

    /// Advances the cloth by one frame.
    fn update(&mut self, cloth: &mut ClothMesh) -> WeftResult<StepResult>;

    /// Releases every pinned node.
    fn unpin(&self, cloth: &mut ClothMesh);

    /// Colliders in registration order.
    fn colliders(&self) -> &ColliderSet;

    /// Appends a collider. It is resolved after all earlier ones.
    fn add_collider(&mut self, collider: Box<dyn Collider>);

    /// Returns the integrator's name.
    fn name(&self) -> &str;
}

/// Root-mean-square of `current length − rest length` over all springs.
pub fn stretch_residual(cloth: &ClothMesh) -> f64 {
    if cloth.springs.is_empty() {
        return 0.0;
    }
    let sum: f64 = cloth
        .springs
        .iter()
        .map(|s| {
            let c = s.stretch(&cloth.nodes) as f64;
            c * c
        })
        .sum();
    (sum / cloth.springs.len() as f64).sqrt()
}

/// Clears the pin flag of every node, keeping masses.
pub(crate) fn clear_pins(cloth: &mut ClothMesh) {
    let mut released = 0usize;
    for node in cloth.nodes.iter_mut().filter(|n| n.is_fixed) {
        node.unpin();
        released += 1;
    }
    tracing::debug!(released, "nodes unpinned");
}
