//! # weft-solver
//!
//! Time integration for mass-spring cloth.
//!
//! ## Key Types
//!
//! - [`ClothIntegrator`]: pluggable integrator trait
//! - [`EulerIntegrator`]: explicit and symplectic Euler
//! - [`PositionBasedIntegrator`]: PBD and XPBD with colored constraint batches
//! - [`ProjectiveDynamicsIntegrator`]: local/global solver with a prefactored system
//! - [`ImplicitNewtonIntegrator`]: implicit Euler with a fixed Jacobian pattern
//! - [`ClothInstance`]: one cloth plus one integrator; [`SimulationHandle`]
//!   shares it across threads
//! - [`SimulationConfig`] / [`SceneConfig`]: TOML-loadable parameters

pub mod assembly;
pub mod coefficients;
pub mod coloring;
pub mod config;
pub mod euler;
pub mod forces;
pub mod handle;
pub mod implicit_newton;
pub mod instance;
pub mod position_based;
pub mod projective_dynamics;
pub mod strategy;

pub use config::{ColliderSpec, SceneConfig, SimulationConfig, SpringCoefficients};
pub use euler::{EulerIntegrator, EulerScheme};
pub use handle::SimulationHandle;
pub use implicit_newton::ImplicitNewtonIntegrator;
pub use instance::{ClothInstance, ClothModel, Method};
pub use position_based::{PositionBasedIntegrator, PositionBasedVariant};
pub use projective_dynamics::ProjectiveDynamicsIntegrator;
pub use strategy::{ClothIntegrator, StepResult};
