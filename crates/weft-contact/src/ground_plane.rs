//! Ground plane collision.
//!
//! Prevents nodes from falling below a horizontal plane at `y = height`.

use weft_math::Vec3;
use weft_mesh::ClothMesh;
use weft_types::constants::GROUND_FRICTION;

use crate::collider::{Collider, ColliderShape};
use crate::response::{resolve_nodes, ContactResult};

/// Clearance above the plane for corrected nodes.
pub const GROUND_CLEARANCE: f32 = 0.01;

/// Ground plane collision at a fixed world Y height.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPlane {
    /// Height of the ground plane (Y coordinate).
    pub height: f32,
    pub friction: f32,
}

impl GroundPlane {
    /// Creates a new ground plane at the given height.
    pub fn new(height: f32) -> Self {
        Self {
            height,
            friction: GROUND_FRICTION,
        }
    }

    pub fn project(&self, p: Vec3) -> Option<Vec3> {
        (p.y < self.height).then(|| Vec3::new(p.x, self.height + GROUND_CLEARANCE, p.z))
    }
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self::new(-10.0)
    }
}

impl Collider for GroundPlane {
    fn resolve(&self, cloth: &mut ClothMesh) -> ContactResult {
        resolve_nodes(cloth, self.friction, |p| self.project(p))
    }

    fn shape(&self) -> ColliderShape {
        ColliderShape::Ground {
            height: self.height,
        }
    }

    fn name(&self) -> &str {
        "ground"
    }
}
