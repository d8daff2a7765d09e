//! # weft-mesh
//!
//! Mass-spring cloth topology: nodes, springs and triangles held in an
//! index-addressed arena.
//!
//! ## Key Types
//!
//! - [`ClothMesh`]: the arena. Owns nodes, springs, triangles, the world
//!   origin and the build-time anchors.
//! - [`Node`] / [`Spring`]: particle state and distance constraints.
//! - Builders: [`generators::grid`] and [`obj::parse_obj`].

pub mod cloth;
pub mod generators;
pub mod node;
pub mod normals;
pub mod obj;
pub mod spring;
pub mod tangents;

pub use cloth::{ClothMesh, GridShape, MeshStats};
pub use generators::GridSpec;
pub use node::Node;
pub use spring::{Spring, SpringKind};
