//! Barycentric coordinates on a triangle and projection onto the
//! probability simplex.

use glam::Vec3;

/// Euclidean projection of `v` onto `{w : w ≥ 0, w.x + w.y + w.z = 1}`.
///
/// Sort-based: find the largest `ρ` with `u_ρ − (Σ_{j≤ρ} u_j − 1)/(ρ+1) > 0`
/// over the descending-sorted components, shift by that threshold and clamp.
/// The result is renormalized; an all-zero result falls back to `(1, 0, 0)`.
pub fn project_to_simplex(v: Vec3) -> Vec3 {
    let mut u = [v.x, v.y, v.z];
    u.sort_by(|a, b| b.total_cmp(a));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (j, &uj) in u.iter().enumerate() {
        cumulative += uj;
        let t = (cumulative - 1.0) / (j as f32 + 1.0);
        if uj - t > 0.0 {
            theta = t;
        }
    }

    let w = Vec3::new(
        (v.x - theta).max(0.0),
        (v.y - theta).max(0.0),
        (v.z - theta).max(0.0),
    );
    let sum = w.x + w.y + w.z;
    if sum > 1e-12 && sum.is_finite() {
        w / sum
    } else {
        Vec3::X
    }
}

/// Precomputed edge frame of a triangle `(a, b, c)` for barycentric queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleFrame {
    pub origin: Vec3,
    pub edge0: Vec3,
    pub edge1: Vec3,
    d00: f32,
    d01: f32,
    d11: f32,
    inv_den: f32,
}

impl TriangleFrame {
    /// Denominators with magnitude below this are treated as degenerate.
    pub const DEGENERATE_EPSILON: f32 = 1.0e-12;

    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let edge0 = b - a;
        let edge1 = c - a;
        let d00 = edge0.dot(edge0);
        let d01 = edge0.dot(edge1);
        let d11 = edge1.dot(edge1);
        let den = d00 * d11 - d01 * d01;
        let inv_den = if den.abs() < Self::DEGENERATE_EPSILON {
            0.0
        } else {
            1.0 / den
        };
        Self {
            origin: a,
            edge0,
            edge1,
            d00,
            d01,
            d11,
            inv_den,
        }
    }

    /// True when the three points are (nearly) collinear.
    pub fn is_degenerate(&self) -> bool {
        self.inv_den == 0.0
    }

    /// Unclamped barycentrics `(u, v, w)` of the projection of `p` onto the
    /// triangle plane.
    pub fn barycentric(&self, p: Vec3) -> Vec3 {
        let d2 = p - self.origin;
        let d20 = d2.dot(self.edge0);
        let d21 = d2.dot(self.edge1);
        let v = (self.d11 * d20 - self.d01 * d21) * self.inv_den;
        let w = (self.d00 * d21 - self.d01 * d20) * self.inv_den;
        Vec3::new(1.0 - v - w, v, w)
    }

    /// Barycentrics of the plane projection, clamped onto the triangle.
    /// Degenerate triangles return `(1, 0, 0)`.
    pub fn clamped_barycentric(&self, p: Vec3) -> Vec3 {
        if self.is_degenerate() {
            return Vec3::X;
        }
        project_to_simplex(self.barycentric(p))
    }
}
