//! Projective Dynamics integrator.
//!
//! Implements the local-global iteration for mass-spring cloth:
//! 1. **Inertia**: `y = x + v·dt + (f/m)·dt²`
//! 2. **Local step**: move both ends of every spring halfway toward its
//!    rest length
//! 3. **Contacts**: colliders run on the cloth; each displacement they make
//!    enters the right-hand side as a penalty
//! 4. **Global step**: solve the constant SPD system `A·x = b` per axis
//! 5. **Finalize**: free nodes take the solution, `v = (x − x_old)/dt`
//!
//! `A` depends only on topology, masses and the timestep, so it is
//! factorized once in `prepare`.

use std::time::Instant;

use rayon::prelude::*;
use weft_contact::{Collider, ColliderSet, ContactResult};
use weft_math::{FaerSolver, SparseSolver, Vec3};
use weft_mesh::ClothMesh;
use weft_types::constants::{DEFAULT_NODE_MASS, EPSILON};
use weft_types::{WeftError, WeftResult};

use crate::assembly::assemble_projective_matrix;
use crate::coefficients::assign_coefficients;
use crate::config::ProjectiveDynamicsConfig;
use crate::strategy::{clear_pins, ClothIntegrator, StepResult};

/// Projective dynamics with a prefactored sparse Cholesky system.
pub struct ProjectiveDynamicsIntegrator {
    config: ProjectiveDynamicsConfig,
    /// Sparse Cholesky solver with cached factorization.
    solver: FaerSolver,
    /// Per-node mass captured at prepare time.
    mass: Vec<f32>,
    colliders: ColliderSet,
    prepared: bool,
}

impl ProjectiveDynamicsIntegrator {
    pub fn new(config: &ProjectiveDynamicsConfig) -> Self {
        Self {
            config: config.clone(),
            solver: FaerSolver::new(),
            mass: Vec::new(),
            colliders: ColliderSet::new(),
            prepared: false,
        }
    }

    /// Builds the right-hand side for the current iterate `x`.
    fn assemble_rhs(&self, x: &[Vec3], inertia_term: &[Vec3], cloth: &ClothMesh) -> Vec<Vec3> {
        let mut rhs = inertia_term.to_vec();

        for spring in &cloth.springs {
            let (a, b) = (spring.a.index(), spring.b.index());
            let (p1, p2) = (x[a], x[b]);
            let delta = p1 - p2;
            let len = delta.length();
            let projected = if len > EPSILON {
                let half = delta / len * ((len - spring.rest_length) * 0.5);
                (p1 - half) - (p2 + half)
            } else {
                Vec3::ZERO
            };
            rhs[a] += projected * spring.coefficient;
            rhs[b] -= projected * spring.coefficient;
        }

        let k_c = self.config.collision_stiffness;
        for (r, node) in rhs.iter_mut().zip(&cloth.nodes) {
            if node.position != node.old_position {
                *r += (node.position - node.old_position) * k_c;
            }
        }
        rhs
    }

    /// Solves `A·x = rhs` axis by axis into `out`.
    fn solve_axes(&self, rhs: &[Vec3], out: &mut [Vec3]) -> WeftResult<()> {
        let n = rhs.len();
        let mut b = vec![0.0_f32; n];
        let mut sol = vec![0.0_f32; n];
        for axis in 0..3 {
            for (bi, r) in b.iter_mut().zip(rhs) {
                *bi = r[axis];
            }
            self.solver.solve(&b, &mut sol).map_err(|e| {
                WeftError::NumericalFailure(format!("projective solve (axis {axis}): {e}"))
            })?;
            for (o, &s) in out.iter_mut().zip(&sol) {
                o[axis] = s;
            }
        }
        Ok(())
    }
}

impl ClothIntegrator for ProjectiveDynamicsIntegrator {
    fn prepare(&mut self, cloth: &mut ClothMesh) -> WeftResult<()> {
        assign_coefficients(cloth, &self.config.stiffness);

        // Anchors re-pinned by a restart carry infinite mass; the system
        // treats every node as finite.
        self.mass = cloth
            .nodes
            .iter()
            .map(|n| if n.mass.is_finite() { n.mass } else { DEFAULT_NODE_MASS })
            .collect();

        if !cloth.is_empty() {
            let matrix = assemble_projective_matrix(&self.mass, self.config.time_step, &cloth.springs);
            self.solver.factorize(&matrix).map_err(|e| {
                WeftError::NumericalFailure(format!("Cholesky factorization failed: {e}"))
            })?;
        }

        self.prepared = true;
        tracing::info!(
            method = self.name(),
            nodes = cloth.node_count(),
            springs = cloth.spring_count(),
            dt = self.config.time_step,
            "integrator prepared"
        );
        Ok(())
    }

    fn update(&mut self, cloth: &mut ClothMesh) -> WeftResult<StepResult> {
        if !self.prepared {
            return Err(WeftError::NotPrepared(self.name().to_string()));
        }
        if cloth.node_count() != self.mass.len() {
            return Err(WeftError::InvalidMesh(format!(
                "cloth has {} nodes, integrator was prepared for {}",
                cloth.node_count(),
                self.mass.len()
            )));
        }

        let start = Instant::now();
        if cloth.is_empty() {
            return Ok(StepResult {
                substeps: 1,
                converged: true,
                ..StepResult::default()
            });
        }

        let dt = self.config.time_step;
        let inv_dt2 = 1.0 / (dt * dt);
        let gravity = self.config.gravity;

        // Save previous positions, apply external forces, predict
        cloth
            .nodes
            .par_iter_mut()
            .zip(self.mass.par_iter())
            .for_each(|(node, &m)| {
                node.old_position = node.position;
                node.force = gravity * m;
                node.inertia = node.position + node.velocity * dt + node.force / m * dt * dt;
            });

        let inertia_term: Vec<Vec3> = cloth
            .nodes
            .iter()
            .zip(&self.mass)
            .map(|(node, &m)| node.inertia * (m * inv_dt2))
            .collect();
        let mut x: Vec<Vec3> = cloth.nodes.iter().map(|n| n.inertia).collect();
        let mut solution = vec![Vec3::ZERO; x.len()];

        let mut contacts = ContactResult::default();
        let mut iterations = 0_u32;
        let mut residual = f64::MAX;

        for iter in 0..self.config.iterations {
            contacts = contacts.merge(self.colliders.resolve_all(cloth));
            let rhs = self.assemble_rhs(&x, &inertia_term, cloth);

            if let Err(err) = self.solve_axes(&rhs, &mut solution) {
                for node in &mut cloth.nodes {
                    node.position = node.old_position;
                }
                return Err(err);
            }

            // Relative change ||x_new − x|| / ||x||
            let (diff_sq, norm_sq) = solution.iter().zip(&x).fold((0.0_f64, 0.0_f64), |(d, n), (s, o)| {
                (d + (*s - *o).length_squared() as f64, n + o.length_squared() as f64)
            });
            residual = if norm_sq > 1e-12 {
                (diff_sq / norm_sq).sqrt()
            } else {
                diff_sq.sqrt()
            };

            x.copy_from_slice(&solution);
            iterations = iter + 1;
            if residual < self.config.tolerance {
                break;
            }
        }

        // Update free nodes and their velocities
        cloth
            .nodes
            .par_iter_mut()
            .zip(x.par_iter())
            .filter(|(node, _)| !node.is_fixed)
            .for_each(|(node, &p)| {
                node.position = p;
                node.velocity = (node.position - node.old_position) / dt;
            });

        tracing::debug!(method = self.name(), iterations, residual, "update");

        Ok(StepResult {
            substeps: 1,
            iterations,
            residual,
            converged: residual < self.config.tolerance,
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
        "ProjectiveDynamics"
    }
}
