//! Simulated particle state.

use weft_math::{Vec2, Vec3};
use weft_types::constants::DEFAULT_NODE_MASS;

/// A single cloth particle.
///
/// Holds the full kinematic state plus scratch fields used by individual
/// integrators (`residual` for implicit Newton, `inertia` for projective
/// dynamics). `inv_mass` is zero for nodes that cannot move under the
/// mass-weighted position solvers.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: Vec3,
    pub old_position: Vec3,
    pub initial_position: Vec3,
    pub velocity: Vec3,
    pub prev_velocity: Vec3,
    pub acceleration: Vec3,
    pub force: Vec3,
    pub mass: f32,
    pub inv_mass: f32,
    pub is_fixed: bool,
    pub tex_coord: Vec2,
    pub tangent_sum: Vec3,
    pub tangent_count: u32,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub residual: Vec3,
    pub inertia: Vec3,
}

impl Node {
    /// Creates a free node at rest with unit mass.
    pub fn new(position: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            old_position: position,
            initial_position: position,
            velocity: Vec3::ZERO,
            prev_velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            force: Vec3::ZERO,
            mass: DEFAULT_NODE_MASS,
            inv_mass: 1.0 / DEFAULT_NODE_MASS,
            is_fixed: false,
            tex_coord,
            tangent_sum: Vec3::ZERO,
            tangent_count: 0,
            tangent: Vec3::X,
            normal: Vec3::ZERO,
            residual: Vec3::ZERO,
            inertia: position,
        }
    }

    /// Flags the node as pinned without touching its mass.
    #[inline]
    pub fn pin(&mut self) {
        self.is_fixed = true;
    }

    /// Pins the node and gives it infinite mass.
    #[inline]
    pub fn pin_immovable(&mut self) {
        self.is_fixed = true;
        self.mass = f32::INFINITY;
        self.inv_mass = 0.0;
    }

    /// Clears the pin flag. Mass is left as is.
    #[inline]
    pub fn unpin(&mut self) {
        self.is_fixed = false;
    }

    /// Clears the pin flag and restores unit mass.
    #[inline]
    pub fn unpin_with_unit_mass(&mut self) {
        self.is_fixed = false;
        self.mass = DEFAULT_NODE_MASS;
        self.inv_mass = 1.0 / DEFAULT_NODE_MASS;
    }

    /// Weight of the node under `gravity`. Infinite-mass nodes weigh nothing.
    #[inline]
    pub fn weight(&self, gravity: Vec3) -> Vec3 {
        if self.mass.is_finite() {
            gravity * self.mass
        } else {
            Vec3::ZERO
        }
    }

    #[inline]
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Forward Euler: advance position with the old velocity, then velocity
    /// with the current force. The accumulated force is cleared.
    pub fn explicit_integrate(&mut self, dt: f32) {
        if !self.is_fixed {
            self.position += self.velocity * dt;
            self.acceleration = self.force * self.inv_mass;
            self.velocity += self.acceleration * dt;
        }
        self.force = Vec3::ZERO;
    }

    /// Semi-implicit Euler: advance velocity first, then position with the
    /// new velocity. The accumulated force is cleared.
    pub fn symplectic_integrate(&mut self, dt: f32) {
        if !self.is_fixed {
            self.acceleration = self.force * self.inv_mass;
            self.velocity += self.acceleration * dt;
            self.position += self.velocity * dt;
        }
        self.force = Vec3::ZERO;
    }

    /// Returns the node to its initial position at rest.
    pub fn reset(&mut self) {
        self.position = self.initial_position;
        self.old_position = self.initial_position;
        self.inertia = self.initial_position;
        self.velocity = Vec3::ZERO;
        self.prev_velocity = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
        self.force = Vec3::ZERO;
        self.normal = Vec3::ZERO;
        self.residual = Vec3::ZERO;
        self.is_fixed = false;
    }
}
