//! Position-based dynamics (PBD) and its compliant extension (XPBD).
//!
//! Each substep:
//! 1. **Predict**: `v += g·dt`, `x_old = x`, `x += v·dt` for movable nodes
//! 2. **Project**: one Gauss-Seidel pass over the distance constraints,
//!    `Δλ = −C / (w₁ + w₂ + α)` with `α = compliance / dt²`
//! 3. **Collide**: every collider in registration order
//! 4. **Velocities**: `v = (x − x_old) / dt`
//!
//! The constraint pass runs batch by batch; springs within a batch touch
//! disjoint nodes and are projected in parallel.

use std::time::Instant;

use rayon::prelude::*;
use weft_contact::{Collider, ColliderSet, ContactResult};
use weft_math::Vec3;
use weft_mesh::{ClothMesh, Node, Spring};
use weft_types::{WeftError, WeftResult};

use crate::coefficients::{assign_coefficients, remove_bending};
use crate::coloring::SpringBatches;
use crate::config::{PbdConfig, SpringCoefficients, XpbdConfig};
use crate::strategy::{stretch_residual, ClothIntegrator, StepResult};

/// Rigid or compliant distance constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionBasedVariant {
    /// Zero compliance, bending springs removed.
    Pbd,
    /// Per-kind compliance, all springs kept.
    Xpbd,
}

/// A single node displacement produced by a constraint.
type Correction = (usize, Vec3, usize, Vec3);

pub struct PositionBasedIntegrator {
    variant: PositionBasedVariant,
    time_step: f32,
    substeps: u32,
    gravity: Vec3,
    compliance: SpringCoefficients,
    batches: SpringBatches,
    colliders: ColliderSet,
    prepared: bool,
}

impl PositionBasedIntegrator {
    pub fn pbd(config: &PbdConfig) -> Self {
        Self {
            variant: PositionBasedVariant::Pbd,
            time_step: config.time_step,
            substeps: config.substeps,
            gravity: config.gravity,
            compliance: SpringCoefficients::new(0.0, 0.0, 0.0),
            batches: SpringBatches::default(),
            colliders: ColliderSet::new(),
            prepared: false,
        }
    }

    pub fn xpbd(config: &XpbdConfig) -> Self {
        Self {
            variant: PositionBasedVariant::Xpbd,
            time_step: config.time_step,
            substeps: config.substeps,
            gravity: config.gravity,
            compliance: config.compliance,
            batches: SpringBatches::default(),
            colliders: ColliderSet::new(),
            prepared: false,
        }
    }

    pub fn variant(&self) -> PositionBasedVariant {
        self.variant
    }

    /// Number of conflict-free spring batches built by `prepare`.
    pub fn batch_count(&self) -> usize {
        self.batches.batch_count()
    }

    /// Advances one substep and returns the contact report of its collider pass.
    pub fn substep(&self, cloth: &mut ClothMesh) -> WeftResult<ContactResult> {
        if !self.prepared {
            return Err(WeftError::NotPrepared(self.name().to_string()));
        }
        let dt = self.time_step;

        self.predict(cloth, dt);
        self.project_constraints(cloth, dt);
        let contacts = self.colliders.resolve_all(cloth);

        let inv_dt = 1.0 / dt;
        cloth
            .nodes
            .par_iter_mut()
            .filter(|n| n.inv_mass != 0.0)
            .for_each(|n| n.velocity = (n.position - n.old_position) * inv_dt);

        Ok(contacts)
    }

    fn predict(&self, cloth: &mut ClothMesh, dt: f32) {
        let gravity = self.gravity;
        cloth
            .nodes
            .par_iter_mut()
            .filter(|n| n.inv_mass != 0.0)
            .for_each(|n| {
                n.velocity += gravity * dt;
                n.old_position = n.position;
                n.position += n.velocity * dt;
            });
    }

    fn project_constraints(&self, cloth: &mut ClothMesh, dt: f32) {
        let inv_dt2 = 1.0 / (dt * dt);
        for batch in self.batches.batches() {
            let corrections: Vec<Correction> = {
                let nodes = &cloth.nodes;
                let springs = &cloth.springs;
                batch
                    .par_iter()
                    .filter_map(|&s| project_spring(&springs[s], nodes, inv_dt2))
                    .collect()
            };
            for (a, da, b, db) in corrections {
                cloth.nodes[a].position += da;
                cloth.nodes[b].position += db;
            }
        }
    }
}

/// Displacements that restore `spring` toward its rest length.
fn project_spring(spring: &Spring, nodes: &[Node], inv_dt2: f32) -> Option<Correction> {
    let (a, b) = (spring.a.index(), spring.b.index());
    let (n1, n2) = (&nodes[a], &nodes[b]);
    let w_sum = n1.inv_mass + n2.inv_mass;
    if w_sum == 0.0 {
        return None;
    }

    let delta = n1.position - n2.position;
    let len = delta.length();
    if len == 0.0 {
        return None;
    }
    let dir = delta / len;

    let alpha = spring.coefficient * inv_dt2;
    let correction = -(len - spring.rest_length) / (w_sum + alpha);
    Some((
        a,
        dir * (correction * n1.inv_mass),
        b,
        dir * (-correction * n2.inv_mass),
    ))
}

impl ClothIntegrator for PositionBasedIntegrator {
    fn prepare(&mut self, cloth: &mut ClothMesh) -> WeftResult<()> {
        match self.variant {
            PositionBasedVariant::Pbd => {
                remove_bending(cloth);
                for spring in &mut cloth.springs {
                    spring.coefficient = 0.0;
                }
            }
            PositionBasedVariant::Xpbd => {
                assign_coefficients(cloth, &self.compliance);
            }
        }

        for node in cloth.nodes.iter_mut().filter(|n| n.is_fixed) {
            node.pin_immovable();
        }

        let pairs: Vec<(u32, u32)> = cloth.springs.iter().map(|s| (s.a.0, s.b.0)).collect();
        self.batches = SpringBatches::color(&pairs, cloth.node_count());
        self.prepared = true;

        tracing::info!(
            method = self.name(),
            nodes = cloth.node_count(),
            springs = cloth.spring_count(),
            batches = self.batches.batch_count(),
            "integrator prepared"
        );
        Ok(())
    }

    fn update(&mut self, cloth: &mut ClothMesh) -> WeftResult<StepResult> {
        let start = Instant::now();
        let mut contacts = ContactResult::default();
        for _ in 0..self.substeps {
            contacts = contacts.merge(self.substep(cloth)?);
        }

        let residual = stretch_residual(cloth);
        tracing::debug!(method = self.name(), residual, contacts = contacts.resolved_count, "update");

        Ok(StepResult {
            substeps: self.substeps,
            iterations: self.substeps,
            residual,
            converged: true,
            contacts,
            wall_time: start.elapsed().as_secs_f64(),
        })
    }

    /// Releases pinned nodes and restores their unit mass, making them
    /// movable again under the inverse-mass weighting.
    fn unpin(&self, cloth: &mut ClothMesh) {
        let mut released = 0usize;
        for node in cloth.nodes.iter_mut().filter(|n| n.is_fixed) {
            node.unpin_with_unit_mass();
            released += 1;
        }
        tracing::debug!(released, "nodes unpinned");
    }

    fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    fn add_collider(&mut self, collider: Box<dyn Collider>) {
        self.colliders.push(collider);
    }

    fn name(&self) -> &str {
        match self.variant {
            PositionBasedVariant::Pbd => "PBD",
            PositionBasedVariant::Xpbd => "XPBD",
        }
    }
}
