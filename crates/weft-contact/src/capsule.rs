//! Capsule collision.
//!
//! The capsule is given by its two surface poles `top` and `bottom` and a
//! radius. The hemisphere centers sit one radius inward from each pole.

use weft_math::Vec3;
use weft_mesh::ClothMesh;
use weft_types::constants::DEFAULT_FRICTION;
use weft_types::GeometryError;

use crate::collider::{Collider, ColliderShape};
use crate::response::{resolve_nodes, ContactResult};

const CAPSULE_INFLATION: f32 = 1.05;

/// Capsule between two surface poles.
#[derive(Debug, Clone, PartialEq)]
pub struct CapsuleCollider {
    top: Vec3,
    bottom: Vec3,
    radius: f32,
    center_top: Vec3,
    center_bottom: Vec3,
    pub friction: f32,
}

impl CapsuleCollider {
    /// Builds a capsule. Coincident poles have no axis and are rejected.
    pub fn new(top: Vec3, bottom: Vec3, radius: f32) -> Result<Self, GeometryError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(GeometryError::InvalidRadius(radius));
        }
        let axis = bottom - top;
        let len = axis.length();
        if len < 1e-12 {
            return Err(GeometryError::DegenerateAxis {
                x: top.x,
                y: top.y,
                z: top.z,
            });
        }
        let n = axis / len;
        Ok(Self {
            top,
            bottom,
            radius,
            center_top: top + n * radius,
            center_bottom: bottom - n * radius,
            friction: DEFAULT_FRICTION,
        })
    }

    pub fn top(&self) -> Vec3 {
        self.top
    }

    pub fn bottom(&self) -> Vec3 {
        self.bottom
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Hemisphere centers `(top, bottom)`.
    pub fn hemisphere_centers(&self) -> (Vec3, Vec3) {
        (self.center_top, self.center_bottom)
    }

    /// Where `p` must move to, if it is inside the capsule's safe distance.
    ///
    /// The safe distance is `radius · 1.05` along the shaft. Near the caps
    /// it falls back to the smaller of the top-cap test (closest point within
    /// a radius of the top hemisphere center) and the inflated bottom-cap
    /// test (closest point within a radius of the bottom pole).
    pub fn project(&self, p: Vec3) -> Option<Vec3> {
        let ab = self.center_bottom - self.center_top;
        let f = (p - self.center_top).dot(ab) / ab.dot(ab);
        let c = self.center_top + ab * f.clamp(0.0, 1.0);

        let offset = p - c;
        let dist = offset.length();
        let r = self.radius;

        let top_test = if (c - self.center_top).length() < r { dist } else { r };
        let bottom_test = if (c - self.bottom).length() < r { dist } else { r };

        let mut safe = r * CAPSULE_INFLATION;
        if top_test < r || bottom_test < r {
            safe = if top_test < bottom_test {
                top_test
            } else {
                bottom_test * CAPSULE_INFLATION
            };
        }

        if dist < safe {
            let dir = if dist > 1e-30 { offset / dist } else { Vec3::Y };
            Some(c + dir * safe)
        } else {
            None
        }
    }
}

impl Default for CapsuleCollider {
    fn default() -> Self {
        Self {
            top: Vec3::new(5.0, 2.0, -4.0),
            bottom: Vec3::new(5.0, -8.0, -4.0),
            radius: 2.0,
            center_top: Vec3::new(5.0, 0.0, -4.0),
            center_bottom: Vec3::new(5.0, -6.0, -4.0),
            friction: DEFAULT_FRICTION,
        }
    }
}

impl Collider for CapsuleCollider {
    fn resolve(&self, cloth: &mut ClothMesh) -> ContactResult {
        resolve_nodes(cloth, self.friction, |p| self.project(p))
    }

    fn shape(&self) -> ColliderShape {
        ColliderShape::Capsule {
            top: self.top,
            bottom: self.bottom,
            radius: self.radius,
        }
    }

    fn name(&self) -> &str {
        "capsule"
    }
}
