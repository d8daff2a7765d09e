//! # weft-types
//!
//! Shared vocabulary for the weft cloth simulation crates: typed
//! node handles, default constants and error types.
//!
//! This crate has no domain logic.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{GeometryError, WeftError, WeftResult};
pub use ids::NodeId;
