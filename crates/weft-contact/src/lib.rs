//! # weft-contact
//!
//! Analytic collision response between the cloth and rigid obstacles.
//!
//! Every collider implements [`Collider`]: it scans the free nodes of a
//! [`ClothMesh`](weft_mesh::ClothMesh) in parallel, moves penetrating nodes
//! to the obstacle's inflated boundary and damps their velocity.
//!
//! Primitives: sphere, capsule, axis-aligned box, ground plane, swept sphere
//! and swept-sphere triangle. [`SphereMeshCollider`] composes the last two
//! from a text description.

pub mod box_collider;
pub mod capsule;
pub mod collider;
pub mod ground_plane;
pub mod response;
pub mod sphere;
pub mod sphere_mesh;
pub mod swept_sphere;
pub mod swept_sphere_tri;

pub use box_collider::BoxCollider;
pub use capsule::CapsuleCollider;
pub use collider::{Collider, ColliderSet, ColliderShape};
pub use ground_plane::GroundPlane;
pub use response::ContactResult;
pub use sphere::SphereCollider;
pub use sphere_mesh::SphereMeshCollider;
pub use swept_sphere::SweptSphereCollider;
pub use swept_sphere_tri::{ContactSphere, SweptSphereTriCollider};
