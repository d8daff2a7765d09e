//! Force-based integrators: explicit (forward) and symplectic (semi-implicit) Euler.
//!
//! Each update runs `substeps` iterations of:
//! 1. **Forces**: gravity plus spring Hooke and damping forces
//! 2. **Integrate**: per-node Euler update of the free nodes
//! 3. **Collide**: every collider in registration order

use std::time::Instant;

use rayon::prelude::*;
use weft_contact::{Collider, ColliderSet, ContactResult};
use weft_math::Vec3;
use weft_mesh::ClothMesh;
use weft_types::{WeftError, WeftResult};

use crate::coefficients::assign_coefficients;
use crate::config::{ExplicitEulerConfig, SpringCoefficients, SymplecticEulerConfig};
use crate::forces::accumulate_forces;
use crate::strategy::{clear_pins, stretch_residual, ClothIntegrator, StepResult};

/// Which Euler variant advances the nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EulerScheme {
    /// `x += v·dt` with the old velocity, then `v += a·dt`.
    Explicit,
    /// `v += a·dt`, then `x += v·dt` with the new velocity.
    Symplectic,
}

/// Mass-spring integrator using one of the Euler schemes.
pub struct EulerIntegrator {
    scheme: EulerScheme,
    time_step: f32,
    substeps: u32,
    gravity: Vec3,
    stiffness: SpringCoefficients,
    colliders: ColliderSet,
    prepared: bool,
}

impl EulerIntegrator {
    pub fn explicit(config: &ExplicitEulerConfig) -> Self {
        Self {
            scheme: EulerScheme::Explicit,
            time_step: config.time_step,
            substeps: config.substeps,
            gravity: config.gravity,
            stiffness: config.stiffness,
            colliders: ColliderSet::new(),
            prepared: false,
        }
    }

    pub fn symplectic(config: &SymplecticEulerConfig) -> Self {
        Self {
            scheme: EulerScheme::Symplectic,
            time_step: config.time_step,
            substeps: config.substeps,
            gravity: config.gravity,
            stiffness: config.stiffness,
            colliders: ColliderSet::new(),
            prepared: false,
        }
    }

    pub fn scheme(&self) -> EulerScheme {
        self.scheme
    }

    fn substep(&self, cloth: &mut ClothMesh) -> ContactResult {
        accumulate_forces(cloth, self.gravity);

        let dt = self.time_step;
        match self.scheme {
            EulerScheme::Explicit => cloth
                .nodes
                .par_iter_mut()
                .for_each(|node| node.explicit_integrate(dt)),
            EulerScheme::Symplectic => cloth
                .nodes
                .par_iter_mut()
                .for_each(|node| node.symplectic_integrate(dt)),
        }

        self.colliders.resolve_all(cloth)
    }
}

impl ClothIntegrator for EulerIntegrator {
    fn prepare(&mut self, cloth: &mut ClothMesh) -> WeftResult<()> {
        assign_coefficients(cloth, &self.stiffness);
        self.prepared = true;
        tracing::info!(
            method = self.name(),
            nodes = cloth.node_count(),
            springs = cloth.spring_count(),
            dt = self.time_step,
            substeps = self.substeps,
            "integrator prepared"
        );
        Ok(())
    }

    fn update(&mut self, cloth: &mut ClothMesh) -> WeftResult<StepResult> {
        if !self.prepared {
            return Err(WeftError::NotPrepared(self.name().to_string()));
        }

        let start = Instant::now();
        let mut contacts = ContactResult::default();
        for _ in 0..self.substeps {
            contacts = contacts.merge(self.substep(cloth));
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

    fn unpin(&self, cloth: &mut ClothMesh) {
        clear_pins(cloth);
    }

    fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    fn add_collider(&mut self, collider: Box<dyn Collider>) {
        self.colliders.push(collider);
    }

    fn name(&self) -> &str {
        match self.scheme {
            EulerScheme::Explicit => "ExplicitEuler",
            EulerScheme::Symplectic => "SymplecticEuler",
        }
    }
}
