//! The cloth arena: nodes, springs and triangles.

use weft_math::Vec3;
use weft_types::{NodeId, WeftError, WeftResult};

use crate::node::Node;
use crate::spring::{Spring, SpringKind};

/// Dimensions of a grid-built cloth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
    pub density: f32,
}

/// A mass-spring cloth.
///
/// Node positions are stored relative to `origin`; world position is
/// `origin + position`. Springs and triangles refer to nodes by index.
#[derive(Debug, Clone, Default)]
pub struct ClothMesh {
    pub nodes: Vec<Node>,
    pub springs: Vec<Spring>,
    /// Flat triangle indices: `[t0v0, t0v1, t0v2, t1v0, ...]`.
    pub triangles: Vec<u32>,
    pub origin: Vec3,
    /// Nodes pinned at build time and re-pinned by [`restart`](Self::restart).
    pub anchors: Vec<NodeId>,
    /// Set when the mesh came from the grid generator.
    pub grid: Option<GridShape>,
}

/// Counts reported after a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshStats {
    pub nodes: usize,
    pub triangles: usize,
    pub springs: usize,
    /// Indexed by [`SpringKind::as_index`].
    pub springs_by_kind: [usize; 4],
    pub pinned: usize,
}

impl ClothMesh {
    /// An empty mesh at the world origin.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assembles a mesh from prebuilt parts and validates it.
    pub fn from_parts(
        nodes: Vec<Node>,
        springs: Vec<Spring>,
        triangles: Vec<u32>,
        origin: Vec3,
    ) -> WeftResult<Self> {
        let mesh = Self {
            nodes,
            springs,
            triangles,
            origin,
            anchors: Vec::new(),
            grid: None,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The three node indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [u32; 3] {
        let base = t * 3;
        [
            self.triangles[base],
            self.triangles[base + 1],
            self.triangles[base + 2],
        ]
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Adds a spring whose rest length is the current distance of its ends.
    pub fn add_spring(&mut self, a: NodeId, b: NodeId, kind: SpringKind) {
        let spring = Spring::new(&self.nodes, a, b, kind);
        self.springs.push(spring);
    }

    /// Pins `id` with infinite mass at build time. [`restart`](Self::restart)
    /// re-pins it the same way.
    pub fn add_anchor(&mut self, id: NodeId) {
        self.nodes[id.index()].pin_immovable();
        if !self.anchors.contains(&id) {
            self.anchors.push(id);
        }
    }

    /// Keeps only the springs for which `keep` returns true.
    /// Returns the number of springs removed.
    pub fn retain_springs(&mut self, keep: impl FnMut(&Spring) -> bool) -> usize {
        let before = self.springs.len();
        self.springs.retain(keep);
        before - self.springs.len()
    }

    /// World-space position of node `id`.
    #[inline]
    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.origin + self.nodes[id.index()].position
    }

    /// Moves node `id` so that its world-space position is `world`.
    #[inline]
    pub fn set_world_position(&mut self, id: NodeId, world: Vec3) {
        let origin = self.origin;
        self.nodes[id.index()].position = world - origin;
    }

    /// Resets every node to its initial position at rest and re-pins the
    /// anchors with infinite mass. Pins added at run time are dropped.
    pub fn restart(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
        for &id in &self.anchors {
            if let Some(node) = self.nodes.get_mut(id.index()) {
                node.pin_immovable();
            }
        }
        tracing::debug!(nodes = self.nodes.len(), anchors = self.anchors.len(), "cloth restarted");
    }

    /// Recomputes per-node normals from the triangles.
    pub fn compute_normals(&mut self) {
        crate::normals::compute_normals(self);
    }

    /// Number of nodes currently pinned.
    pub fn pinned_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_fixed).count()
    }

    pub fn stats(&self) -> MeshStats {
        let mut springs_by_kind = [0usize; 4];
        for spring in &self.springs {
            springs_by_kind[spring.kind.as_index()] += 1;
        }
        MeshStats {
            nodes: self.node_count(),
            triangles: self.triangle_count(),
            springs: self.spring_count(),
            springs_by_kind,
            pinned: self.pinned_count(),
        }
    }

    /// Validates mesh integrity.
    ///
    /// Checks:
    /// - Triangle index count is divisible by 3
    /// - Triangle and spring indices are within bounds
    /// - Anchors refer to existing nodes
    pub fn validate(&self) -> WeftResult<()> {
        let n = self.nodes.len();

        if self.triangles.len() % 3 != 0 {
            return Err(WeftError::InvalidMesh(
                "Index count is not divisible by 3".into(),
            ));
        }

        for (i, &idx) in self.triangles.iter().enumerate() {
            if idx as usize >= n {
                return Err(WeftError::InvalidMesh(format!(
                    "Index {} at position {} is out of range (node count: {})",
                    idx, i, n
                )));
            }
        }

        for (i, spring) in self.springs.iter().enumerate() {
            if spring.a.index() >= n || spring.b.index() >= n {
                return Err(WeftError::InvalidMesh(format!(
                    "Spring {} connects {}-{} but node count is {}",
                    i, spring.a.0, spring.b.0, n
                )));
            }
        }

        if let Some(anchor) = self.anchors.iter().find(|a| a.index() >= n) {
            return Err(WeftError::InvalidMesh(format!(
                "Anchor {} is out of range (node count: {})",
                anchor.0, n
            )));
        }

        Ok(())
    }
}
