//! Distance constraints between node pairs.

use serde::{Deserialize, Serialize};
use weft_math::{Mat3, Vec3};
use weft_types::constants::{DEFAULT_SPRING_DAMPING, EPSILON};
use weft_types::NodeId;

use crate::node::Node;

/// Role of a spring in the cloth topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpringKind {
    /// Grid neighbors, or a triangle edge on imported surfaces.
    Structural,
    /// Anti-diagonal of a grid cell.
    ShearA,
    /// Main diagonal of a grid cell.
    ShearB,
    /// Nodes two apart along a grid row or column.
    Bending,
}

impl SpringKind {
    pub const ALL: [SpringKind; 4] = [
        SpringKind::Structural,
        SpringKind::ShearA,
        SpringKind::ShearB,
        SpringKind::Bending,
    ];

    pub fn as_index(self) -> usize {
        match self {
            SpringKind::Structural => 0,
            SpringKind::ShearA => 1,
            SpringKind::ShearB => 2,
            SpringKind::Bending => 3,
        }
    }
}

/// A spring between nodes `a` and `b`.
///
/// `coefficient` is a stiffness for the force and projective integrators and
/// a compliance for XPBD. It is assigned by the integrator's preparation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    pub a: NodeId,
    pub b: NodeId,
    /// Distance between the endpoints at construction. Never recomputed.
    pub rest_length: f32,
    pub coefficient: f32,
    pub damping: f32,
    pub kind: SpringKind,
    /// Per-frame 3×3 stiffness block used by implicit Newton.
    pub jacobian: Mat3,
}

impl Spring {
    /// Creates a spring whose rest length is the current distance between
    /// `a` and `b` in `nodes`.
    pub fn new(nodes: &[Node], a: NodeId, b: NodeId, kind: SpringKind) -> Self {
        let rest_length = nodes[a.index()]
            .position
            .distance(nodes[b.index()].position);
        Self {
            a,
            b,
            rest_length,
            coefficient: 0.0,
            damping: DEFAULT_SPRING_DAMPING,
            kind,
            jacobian: Mat3::ZERO,
        }
    }

    /// Current length minus rest length.
    pub fn stretch(&self, nodes: &[Node]) -> f32 {
        nodes[self.a.index()]
            .position
            .distance(nodes[self.b.index()].position)
            - self.rest_length
    }

    /// Hookean plus axial damping force acting on `a`; `b` receives the
    /// negation. Returns `None` for a (near) zero-length spring.
    pub fn force_on_a(&self, nodes: &[Node]) -> Option<Vec3> {
        let na = &nodes[self.a.index()];
        let nb = &nodes[self.b.index()];
        let delta = nb.position - na.position;
        let len = delta.length();
        if len < EPSILON {
            return None;
        }
        let dir = delta / len;
        let relative_speed = (nb.velocity - na.velocity).dot(dir);
        Some(dir * ((len - self.rest_length) * self.coefficient + relative_speed * self.damping))
    }
}
