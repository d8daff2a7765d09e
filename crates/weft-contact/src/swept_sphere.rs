//! Swept sphere: the convex hull of two spheres of different radii.

use weft_math::Vec3;
use weft_mesh::ClothMesh;
use weft_types::constants::DEFAULT_FRICTION;

use crate::collider::{Collider, ColliderShape};
use crate::response::{push_out_of_sphere, resolve_nodes, ContactResult};

const SWEPT_INFLATION: f32 = 1.05;

/// Tapered capsule between `(center1, radius1)` and `(center2, radius2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SweptSphereCollider {
    pub center1: Vec3,
    pub radius1: f32,
    pub center2: Vec3,
    pub radius2: f32,
    pub friction: f32,
}

impl SweptSphereCollider {
    pub fn new(center1: Vec3, radius1: f32, center2: Vec3, radius2: f32) -> Self {
        Self {
            center1,
            radius1,
            center2,
            radius2,
            friction: DEFAULT_FRICTION,
        }
    }

    /// Where `p` must move to, if it is inside the swept volume.
    ///
    /// The end spheres are tested first. Otherwise the contact sphere along
    /// the shaft is found from the taper-corrected parameter
    /// `t = (c1P·c1c2 + (r2 − r1)·r1) / (|c1c2|² − (r2 − r1)²)`, clamped to
    /// `[0, 1]`.
    pub fn project(&self, p: Vec3) -> Option<Vec3> {
        if let Some(target) = push_out_of_sphere(p, self.center1, self.radius1 * SWEPT_INFLATION) {
            return Some(target);
        }
        if let Some(target) = push_out_of_sphere(p, self.center2, self.radius2 * SWEPT_INFLATION) {
            return Some(target);
        }

        let axis = self.center2 - self.center1;
        let dr = self.radius2 - self.radius1;
        let den = axis.length_squared() - dr * dr;
        if den <= 1e-12 {
            // One end sphere contains the other; the end tests cover it.
            return None;
        }
        let t = (((p - self.center1).dot(axis) + dr * self.radius1) / den).clamp(0.0, 1.0);
        let center = self.center1 + axis * t;
        let radius = self.radius1 + dr * t;
        push_out_of_sphere(p, center, radius * SWEPT_INFLATION)
    }
}

impl Default for SweptSphereCollider {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -1.0, -5.0), 1.0, Vec3::new(6.0, 1.0, -5.0), 2.0)
    }
}

impl Collider for SweptSphereCollider {
    fn resolve(&self, cloth: &mut ClothMesh) -> ContactResult {
        resolve_nodes(cloth, self.friction, |p| self.project(p))
    }

    fn shape(&self) -> ColliderShape {
        ColliderShape::SweptSphere {
            center1: self.center1,
            radius1: self.radius1,
            center2: self.center2,
            radius2: self.radius2,
        }
    }

    fn name(&self) -> &str {
        "swept_sphere"
    }
}
