//! Analytical sphere collision.
//!
//! Nodes closer to the center than `radius · 1.15` are pushed radially
//! out to that distance.

use weft_math::Vec3;
use weft_mesh::ClothMesh;
use weft_types::constants::DEFAULT_FRICTION;

use crate::collider::{Collider, ColliderShape};
use crate::response::{push_out_of_sphere, resolve_nodes, ContactResult};

/// Safe-distance inflation applied to the sphere radius.
pub const SPHERE_INFLATION: f32 = 1.15;

/// Analytical sphere collision.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereCollider {
    /// Center of the sphere.
    pub center: Vec3,
    /// Radius of the sphere.
    pub radius: f32,
    pub friction: f32,
}

impl SphereCollider {
    /// Creates a new sphere collider.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            friction: DEFAULT_FRICTION,
        }
    }

    /// Where `p` must move to, if it is inside the safe radius.
    pub fn project(&self, p: Vec3) -> Option<Vec3> {
        push_out_of_sphere(p, self.center, self.radius * SPHERE_INFLATION)
    }
}

impl Default for SphereCollider {
    fn default() -> Self {
        Self::new(Vec3::new(5.0, 0.0, -3.0), 2.0)
    }
}

impl Collider for SphereCollider {
    fn resolve(&self, cloth: &mut ClothMesh) -> ContactResult {
        resolve_nodes(cloth, self.friction, |p| self.project(p))
    }

    fn shape(&self) -> ColliderShape {
        ColliderShape::Sphere {
            center: self.center,
            radius: self.radius,
        }
    }

    fn name(&self) -> &str {
        "sphere"
    }
}
