//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²), applied along −Y.
pub const GRAVITY: f32 = 9.8;

/// Default node mass.
pub const DEFAULT_NODE_MASS: f32 = 1.0;

/// Default spring damping coefficient.
pub const DEFAULT_SPRING_DAMPING: f32 = 5.0;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f32 = 1.0e-7;

/// Below this length an accumulated normal is left unnormalized.
pub const NORMAL_EPSILON: f32 = 1.0e-5;

/// UV determinant below which a triangle's tangent uses a unit factor.
pub const TANGENT_DET_EPSILON: f32 = 1.0e-6;

/// Velocity scale applied after a contact against rigid primitives.
pub const DEFAULT_FRICTION: f32 = 0.8;

/// Velocity scale applied after a ground contact.
pub const GROUND_FRICTION: f32 = 0.9;

/// Default grid resolution (nodes per side).
pub const DEFAULT_GRID_NODES: usize = 40;

/// Default grid density (nodes per unit length).
pub const DEFAULT_GRID_DENSITY: f32 = 4.0;

/// Index of the extra anchor pinned on imported surfaces.
pub const SURFACE_ANCHOR_INDEX: usize = 10;
