//! Axis-aligned box collision.
//!
//! Nodes inside the box expanded by a small margin are pushed out through
//! the nearest face plane. This is a per-node approximation: a node near an
//! edge can leave through a different face than it entered.

use weft_math::Vec3;
use weft_mesh::ClothMesh;
use weft_types::constants::DEFAULT_FRICTION;

use crate::collider::{Collider, ColliderShape};
use crate::response::{resolve_nodes, ContactResult};

/// Margin added on every side when testing containment.
pub const BOX_MARGIN: f32 = 0.15;

const BOX_INFLATION: f32 = 1.05;

/// Axis-aligned bounding box collider.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxCollider {
    /// Center of the box.
    pub center: Vec3,
    /// Half-extents along each axis.
    pub half_extents: Vec3,
    pub friction: f32,
}

impl BoxCollider {
    /// Creates a new box collider.
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            friction: DEFAULT_FRICTION,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Where `p` must move to, if it lies in the expanded box.
    pub fn project(&self, p: Vec3) -> Option<Vec3> {
        let min = self.min();
        let max = self.max();
        let lo = min - Vec3::splat(BOX_MARGIN);
        let hi = max + Vec3::splat(BOX_MARGIN);
        if !(p.cmpgt(lo).all() && p.cmplt(hi).all()) {
            return None;
        }

        let faces = [
            ((p.x - min.x).abs(), Vec3::NEG_X),
            ((max.x - p.x).abs(), Vec3::X),
            ((p.y - min.y).abs(), Vec3::NEG_Y),
            ((max.y - p.y).abs(), Vec3::Y),
            ((p.z - min.z).abs(), Vec3::NEG_Z),
            ((max.z - p.z).abs(), Vec3::Z),
        ];
        let (distance, normal) = faces
            .iter()
            .skip(1)
            .fold(faces[0], |best, &face| if face.0 < best.0 { face } else { best });

        Some(p + normal * (distance * BOX_INFLATION))
    }
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self::new(Vec3::new(5.0, 0.0, -3.0), Vec3::splat(2.0))
    }
}

impl Collider for BoxCollider {
    fn resolve(&self, cloth: &mut ClothMesh) -> ContactResult {
        resolve_nodes(cloth, self.friction, |p| self.project(p))
    }

    fn shape(&self) -> ColliderShape {
        ColliderShape::Box {
            center: self.center,
            half_extents: self.half_extents,
        }
    }

    fn name(&self) -> &str {
        "aabb"
    }
}
