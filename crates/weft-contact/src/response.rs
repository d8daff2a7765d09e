//! Contact outcome reporting and the shared per-node resolution driver.

use rayon::prelude::*;
use weft_math::Vec3;
use weft_mesh::ClothMesh;

/// Result of contact response.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactResult {
    /// Number of nodes moved.
    pub resolved_count: u32,
    /// Largest single correction applied.
    pub max_penetration: f32,
    /// Sum of all correction lengths.
    pub total_correction: f32,
}

impl ContactResult {
    fn single(depth: f32) -> Self {
        Self {
            resolved_count: 1,
            max_penetration: depth,
            total_correction: depth,
        }
    }

    /// Combines two results.
    pub fn merge(self, other: Self) -> Self {
        Self {
            resolved_count: self.resolved_count + other.resolved_count,
            max_penetration: self.max_penetration.max(other.max_penetration),
            total_correction: self.total_correction + other.total_correction,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resolved_count == 0
    }
}

/// Runs `project` on the world position of every free node in parallel.
///
/// When `project` returns a target, the node is moved there and its
/// velocity is scaled by `friction`. Pinned nodes are skipped.
pub fn resolve_nodes<F>(cloth: &mut ClothMesh, friction: f32, project: F) -> ContactResult
where
    F: Fn(Vec3) -> Option<Vec3> + Sync,
{
    let origin = cloth.origin;
    cloth
        .nodes
        .par_iter_mut()
        .filter(|node| !node.is_fixed)
        .map(|node| {
            let world = origin + node.position;
            match project(world) {
                Some(target) => {
                    node.position = target - origin;
                    node.velocity *= friction;
                    ContactResult::single(target.distance(world))
                }
                None => ContactResult::default(),
            }
        })
        .reduce(ContactResult::default, ContactResult::merge)
}

/// Pushes `p` radially out of the sphere `(center, safe_radius)`.
///
/// Returns `None` when `p` is already at or beyond `safe_radius`. A point at
/// the exact center is pushed along +Y.
#[inline]
pub fn push_out_of_sphere(p: Vec3, center: Vec3, safe_radius: f32) -> Option<Vec3> {
    let d = p - center;
    let dist_sq = d.length_squared();
    if dist_sq >= safe_radius * safe_radius {
        return None;
    }
    let dir = if dist_sq > 1e-30 {
        d / dist_sq.sqrt()
    } else {
        Vec3::Y
    };
    Some(center + dir * safe_radius)
}
