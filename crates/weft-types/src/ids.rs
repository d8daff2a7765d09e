//! Strongly-typed handles into the cloth arena.
//!
//! Springs refer to their end nodes through `NodeId` instead of references,
//! so the node storage can be mutated freely while springs are iterated.

use serde::{Deserialize, Serialize};

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for NodeId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<usize> for NodeId {
    fn from(val: usize) -> Self {
        Self(val as u32)
    }
}
