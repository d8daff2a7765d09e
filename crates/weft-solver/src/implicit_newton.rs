//! Implicit Euler integrator solved with Newton's method.
//!
//! Per iteration:
//! 1. **Forces**: gravity plus spring forces at the current positions
//! 2. **Residual**: `G = M(x − x_old − v·dt) − F·dt²` (zero on pinned nodes)
//! 3. **Jacobian**: per-spring block
//!    `k·dt²·((1 − L/l)·I + L/l³·d·dᵀ) + c·dt·u·uᵀ` scattered with ± signs,
//!    plus `M`
//! 4. **Solve**: `J·Δx = −G`, numeric LDLᵀ refactorization reusing the symbolic
//!    analysis from `prepare`
//! 5. **Update**: free nodes move by `Δx`, `v = (x − x_old)/dt`
//!
//! Colliders run once after the iterations.

use std::time::Instant;

use rayon::prelude::*;
use weft_contact::{Collider, ColliderSet};
use weft_math::{outer, CsrMatrix, FaerSolver, Mat3, SparseSolver, Vec3};
use weft_mesh::{ClothMesh, Node, Spring};
use weft_types::constants::{DEFAULT_NODE_MASS, EPSILON};
use weft_types::{WeftError, WeftResult};

use crate::assembly::NewtonLayout;
use crate::coefficients::assign_coefficients;
use crate::config::ImplicitNewtonConfig;
use crate::forces::set_forces_with_masses;
use crate::strategy::{clear_pins, ClothIntegrator, StepResult};

/// Implicit Newton integrator with a fixed Jacobian sparsity pattern.
pub struct ImplicitNewtonIntegrator {
    config: ImplicitNewtonConfig,
    solver: FaerSolver,
    layout: Option<NewtonLayout>,
    matrix: CsrMatrix,
    /// Per-node mass captured at prepare time.
    mass: Vec<f32>,
    colliders: ColliderSet,
    prepared: bool,
}

impl ImplicitNewtonIntegrator {
    pub fn new(config: &ImplicitNewtonConfig) -> Self {
        Self {
            config: config.clone(),
            solver: FaerSolver::ldlt(),
            layout: None,
            matrix: CsrMatrix::new(0, 0),
            mass: Vec::new(),
            colliders: ColliderSet::new(),
            prepared: false,
        }
    }

    /// Symbolic analyses run so far. Stays at one while the topology is fixed.
    pub fn analysis_count(&self) -> usize {
        self.solver.analysis_count()
    }

    /// One Newton iteration. Returns the residual norm measured before the solve.
    fn iterate(&mut self, cloth: &mut ClothMesh, layout: &NewtonLayout) -> WeftResult<f64> {
        let dt = self.config.time_step;
        set_forces_with_masses(cloth, &self.mass, self.config.gravity);

        cloth
            .nodes
            .par_iter_mut()
            .zip(self.mass.par_iter())
            .for_each(|(node, &m)| {
                node.residual = if node.is_fixed {
                    Vec3::ZERO
                } else {
                    (node.position - node.old_position - node.prev_velocity * dt) * m
                        - node.force * (dt * dt)
                };
            });
        let norm = cloth
            .nodes
            .iter()
            .map(|n| n.residual.length_squared() as f64)
            .sum::<f64>()
            .sqrt();

        {
            let ClothMesh { nodes, springs, .. } = cloth;
            let nodes = nodes.as_slice();
            springs
                .par_iter_mut()
                .for_each(|s| s.jacobian = jacobian_block(s, nodes, dt));
        }
        layout.fill(&mut self.matrix, &cloth.springs, &self.mass);

        self.solver
            .factorize(&self.matrix)
            .map_err(|e| WeftError::NumericalFailure(format!("Jacobian factorization: {e}")))?;

        let rhs: Vec<f32> = cloth
            .nodes
            .iter()
            .flat_map(|n| (-n.residual).to_array())
            .collect();
        let mut delta = vec![0.0_f32; rhs.len()];
        self.solver
            .solve(&rhs, &mut delta)
            .map_err(|e| WeftError::NumericalFailure(format!("Newton solve: {e}")))?;

        cloth
            .nodes
            .par_iter_mut()
            .zip(delta.par_chunks_exact(3))
            .filter(|(node, _)| !node.is_fixed)
            .for_each(|(node, d)| {
                node.position += Vec3::new(d[0], d[1], d[2]);
                node.velocity = (node.position - node.old_position) / dt;
            });

        Ok(norm)
    }
}

/// Stiffness and damping block of `spring` for the current positions.
/// Zero for a collapsed spring.
fn jacobian_block(spring: &Spring, nodes: &[Node], dt: f32) -> Mat3 {
    let d = nodes[spring.b.index()].position - nodes[spring.a.index()].position;
    let len = d.length();
    if len < EPSILON {
        return Mat3::ZERO;
    }
    let u = d / len;
    let rest = spring.rest_length;
    let stiffness =
        Mat3::IDENTITY * (1.0 - rest / len) + outer(d, d) * (rest / (len * len * len));
    stiffness * (spring.coefficient * dt * dt) + outer(u, u) * (spring.damping * dt)
}

impl ClothIntegrator for ImplicitNewtonIntegrator {
    fn prepare(&mut self, cloth: &mut ClothMesh) -> WeftResult<()> {
        assign_coefficients(cloth, &self.config.stiffness);

        self.mass = cloth
            .nodes
            .iter()
            .map(|n| if n.mass.is_finite() { n.mass } else { DEFAULT_NODE_MASS })
            .collect();

        if !cloth.is_empty() {
            let layout = NewtonLayout::new(cloth.node_count(), &cloth.springs)?;
            self.matrix = layout.zeros();
            self.solver.analyze(&self.matrix).map_err(|e| {
                WeftError::NumericalFailure(format!("symbolic analysis failed: {e}"))
            })?;
            tracing::info!(
                dimension = self.matrix.rows,
                nnz = layout.pattern().nnz(),
                "Jacobian pattern analyzed"
            );
            self.layout = Some(layout);
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
        let Some(layout) = self.layout.take() else {
            return Ok(StepResult {
                substeps: 1,
                converged: true,
                ..StepResult::default()
            });
        };

        for node in &mut cloth.nodes {
            node.old_position = node.position;
            node.prev_velocity = node.velocity;
        }

        let mut iterations = 0_u32;
        let mut residual = f64::MAX;
        let mut outcome = Ok(());
        while iterations < self.config.max_iterations {
            match self.iterate(cloth, &layout) {
                Ok(norm) => {
                    residual = norm;
                    iterations += 1;
                    if residual <= self.config.tolerance {
                        break;
                    }
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.layout = Some(layout);

        if let Err(err) = outcome {
            for node in &mut cloth.nodes {
                node.position = node.old_position;
                node.velocity = node.prev_velocity;
            }
            tracing::warn!(method = self.name(), error = %err, "update failed, state restored");
            return Err(err);
        }

        let contacts = self.colliders.resolve_all(cloth);
        tracing::debug!(method = self.name(), iterations, residual, "update");

        Ok(StepResult {
            substeps: 1,
            iterations,
            residual,
            converged: residual <= self.config.tolerance,
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
        "ImplicitNewton"
    }
}
