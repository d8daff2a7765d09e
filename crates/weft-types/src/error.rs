//! Error types for the weft engine.
//!
//! Fallible runtime operations return `WeftResult<T>`. Geometry that cannot
//! be simulated at all (a capsule without an axis) is reported through the
//! separate [`GeometryError`] so callers can treat it as fatal.

use thiserror::Error;

/// Collider geometry that cannot be constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The two endpoints of a capsule or swept sphere coincide.
    #[error("Degenerate axis: endpoints coincide at ({x}, {y}, {z})")]
    DegenerateAxis { x: f32, y: f32, z: f32 },

    /// A radius is zero, negative or not finite.
    #[error("Invalid radius: {0}")]
    InvalidRadius(f32),
}

/// Unified error type for the weft engine.
#[derive(Debug, Error)]
pub enum WeftError {
    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A text input (mesh, sphere-mesh, config) could not be parsed.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The integrator has not run its preparation step yet.
    #[error("Integrator '{0}' was updated before prepare()")]
    NotPrepared(String),

    /// Factorization failed or the solve produced non-finite values.
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    /// An unrecognized integration method name.
    #[error("Unknown integration method: {0}")]
    UnknownMethod(String),

    /// Collider geometry error.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Convenience alias for `Result<T, WeftError>`.
pub type WeftResult<T> = Result<T, WeftError>;
