//! The collider interface and the ordered collider list an integrator owns.

use serde::{Deserialize, Serialize};
use weft_math::Vec3;
use weft_mesh::ClothMesh;

use crate::response::ContactResult;

/// Read-only geometry of a collider, for renderers and inspection tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderShape {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    Capsule {
        top: Vec3,
        bottom: Vec3,
        radius: f32,
    },
    Box {
        center: Vec3,
        half_extents: Vec3,
    },
    Ground {
        height: f32,
    },
    SweptSphere {
        center1: Vec3,
        radius1: f32,
        center2: Vec3,
        radius2: f32,
    },
    SweptSphereTriangle {
        centers: [Vec3; 3],
        radii: [f32; 3],
    },
    Composite {
        parts: Vec<ColliderShape>,
    },
}

/// A rigid obstacle the cloth cannot penetrate.
///
/// `resolve` moves every free node found inside the obstacle to its safe
/// boundary and damps its velocity. Implementations must leave pinned nodes
/// untouched.
pub trait Collider: Send + Sync {
    /// Push penetrating nodes out and report what was done.
    fn resolve(&self, cloth: &mut ClothMesh) -> ContactResult;

    /// Geometry description.
    fn shape(&self) -> ColliderShape;

    /// Returns the collider name.
    fn name(&self) -> &str;
}

/// Colliders in registration order. Append-only.
#[derive(Default)]
pub struct ColliderSet {
    colliders: Vec<Box<dyn Collider>>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, collider: Box<dyn Collider>) {
        tracing::debug!(collider = collider.name(), "collider registered");
        self.colliders.push(collider);
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn as_slice(&self) -> &[Box<dyn Collider>] {
        &self.colliders
    }

    /// Resolves every collider in order and merges the results.
    pub fn resolve_all(&self, cloth: &mut ClothMesh) -> ContactResult {
        self.colliders
            .iter()
            .fold(ContactResult::default(), |acc, c| acc.merge(c.resolve(cloth)))
    }
}

impl std::fmt::Debug for ColliderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.colliders.iter().map(|c| c.name()))
            .finish()
    }
}
