//! Swept-sphere triangle: the volume swept by a sphere whose center and
//! radius are interpolated barycentrically over three control spheres.
//!
//! For a query point `p` the contact sphere maximizes the penetration
//! function `φ(b) = r(b) − |p − c(b)|` over the barycentric simplex.

use weft_math::{project_to_simplex, TriangleFrame, Vec3};
use weft_mesh::ClothMesh;
use weft_types::constants::DEFAULT_FRICTION;

use crate::collider::{Collider, ColliderShape};
use crate::response::{push_out_of_sphere, resolve_nodes, ContactResult};

const TRI_INFLATION: f32 = 1.05;
/// Nodes farther than this multiple of the largest radius from the control
/// plane are skipped.
const PLANE_CUTOFF: f32 = 1.2;

const EDGE_ITERATIONS: usize = 24;
const INTERIOR_ITERATIONS: usize = 25;
const LINE_SEARCH_STEPS: usize = 8;
const INITIAL_STEP: f32 = 0.5;
const STEP_SHRINK: f32 = 0.5;
const ARMIJO: f32 = 1e-6;

/// The best interpolated sphere for a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSphere {
    pub center: Vec3,
    pub radius: f32,
    pub barycentric: Vec3,
    /// `radius − |p − center|`; positive means `p` is inside.
    pub penetration: f32,
}

/// Swept-sphere triangle collider.
#[derive(Debug, Clone, PartialEq)]
pub struct SweptSphereTriCollider {
    centers: [Vec3; 3],
    radii: [f32; 3],
    frame: TriangleFrame,
    bound_center: Vec3,
    bound_radius_sq: f32,
    pub friction: f32,
}

impl SweptSphereTriCollider {
    pub fn new(c1: Vec3, r1: f32, c2: Vec3, r2: f32, c3: Vec3, r3: f32) -> Self {
        let centers = [c1, c2, c3];
        let radii = [r1, r2, r3];

        let bound_center = (c1 + c2 + c3) / 3.0;
        let bound_radius = centers
            .iter()
            .zip(radii)
            .map(|(c, r)| c.distance(bound_center) + r)
            .fold(0.0_f32, f32::max)
            * TRI_INFLATION;

        Self {
            centers,
            radii,
            frame: TriangleFrame::new(c1, c2, c3),
            bound_center,
            bound_radius_sq: bound_radius * bound_radius,
            friction: DEFAULT_FRICTION,
        }
    }

    pub fn centers(&self) -> [Vec3; 3] {
        self.centers
    }

    pub fn radii(&self) -> [f32; 3] {
        self.radii
    }

    fn max_radius(&self) -> f32 {
        self.radii[0].max(self.radii[1]).max(self.radii[2])
    }

    /// Center and radius at barycentric `b`, and `φ(b)` for `p`.
    fn eval(&self, p: Vec3, b: Vec3) -> (Vec3, f32, f32) {
        let c = self.centers[0] * b.x + self.centers[1] * b.y + self.centers[2] * b.z;
        let r = self.radii[0] * b.x + self.radii[1] * b.y + self.radii[2] * b.z;
        (c, r, r - p.distance(c))
    }

    /// Finds the interpolated sphere that contains `p` most deeply.
    ///
    /// Candidates: the three control spheres, a golden-section maximum on
    /// each edge, and a projected-gradient ascent over the interior started
    /// from the clamped plane projection of `p`. The best candidate wins.
    pub fn closest_sphere(&self, p: Vec3) -> ContactSphere {
        let mut best: Option<ContactSphere> = None;
        let mut consider = |b: Vec3| {
            let (center, radius, penetration) = self.eval(p, b);
            if best.map_or(true, |s| penetration > s.penetration) {
                best = Some(ContactSphere {
                    center,
                    radius,
                    barycentric: b,
                    penetration,
                });
            }
        };

        consider(Vec3::X);
        consider(Vec3::Y);
        consider(Vec3::Z);

        for (i, j) in [(0usize, 1usize), (1, 2), (2, 0)] {
            let t = self.maximize_on_edge(p, i, j);
            let mut b = [0.0_f32; 3];
            b[i] = 1.0 - t;
            b[j] = t;
            consider(Vec3::from_array(b));
        }

        consider(self.interior_ascent(p));

        best.unwrap_or(ContactSphere {
            center: self.centers[0],
            radius: self.radii[0],
            barycentric: Vec3::X,
            penetration: self.radii[0] - p.distance(self.centers[0]),
        })
    }

    /// Golden-section search for the edge parameter maximizing `φ`.
    fn maximize_on_edge(&self, p: Vec3, i: usize, j: usize) -> f32 {
        let phi_at = |t: f32| {
            let t = t.clamp(0.0, 1.0);
            let c = self.centers[i] * (1.0 - t) + self.centers[j] * t;
            let r = (1.0 - t) * self.radii[i] + t * self.radii[j];
            r - p.distance(c)
        };

        let gr = (5.0_f32.sqrt() - 1.0) * 0.5;
        let (mut a, mut b) = (0.0_f32, 1.0_f32);
        let mut c1 = b - gr * (b - a);
        let mut c2 = a + gr * (b - a);
        let mut f1 = phi_at(c1);
        let mut f2 = phi_at(c2);
        for _ in 0..EDGE_ITERATIONS {
            if f1 < f2 {
                a = c1;
                c1 = c2;
                f1 = f2;
                c2 = a + gr * (b - a);
                f2 = phi_at(c2);
            } else {
                b = c2;
                c2 = c1;
                f2 = f1;
                c1 = b - gr * (b - a);
                f1 = phi_at(c1);
            }
        }
        (0.5 * (a + b)).clamp(0.0, 1.0)
    }

    /// Projected-gradient ascent of `φ` with backtracking line search.
    fn interior_ascent(&self, p: Vec3) -> Vec3 {
        let mut b = self.frame.clamped_barycentric(p);

        for _ in 0..INTERIOR_ITERATIONS {
            let (c, _, phi) = self.eval(p, b);
            let d = p - c;
            let len = d.length();
            let u = if len > 1e-12 { d / len } else { Vec3::Y };
            let g = Vec3::new(
                self.radii[0] + u.dot(self.centers[0]),
                self.radii[1] + u.dot(self.centers[1]),
                self.radii[2] + u.dot(self.centers[2]),
            );
            let g_norm1 = g.x.abs() + g.y.abs() + g.z.abs();

            let mut alpha = INITIAL_STEP;
            let mut accepted = false;
            for _ in 0..LINE_SEARCH_STEPS {
                let trial = project_to_simplex(b + g * alpha);
                let (_, _, phi_trial) = self.eval(p, trial);
                if phi_trial >= phi + ARMIJO * alpha * g_norm1 {
                    b = trial;
                    accepted = true;
                    break;
                }
                alpha *= STEP_SHRINK;
            }
            if !accepted {
                break;
            }
        }
        b
    }

    /// Where `p` must move to, if it is inside the swept volume.
    pub fn project(&self, p: Vec3) -> Option<Vec3> {
        if p.distance_squared(self.bound_center) > self.bound_radius_sq {
            return None;
        }

        for (c, r) in self.centers.iter().zip(self.radii) {
            if let Some(target) = push_out_of_sphere(p, *c, r * TRI_INFLATION) {
                return Some(target);
            }
        }

        if let Some(n) = self.frame.edge0.cross(self.frame.edge1).try_normalize() {
            let plane_distance = (p - self.frame.origin).dot(n).abs();
            if plane_distance > self.max_radius() * PLANE_CUTOFF {
                return None;
            }
        }

        let sphere = self.closest_sphere(p);
        push_out_of_sphere(p, sphere.center, sphere.radius * TRI_INFLATION)
    }
}

impl Default for SweptSphereTriCollider {
    fn default() -> Self {
        Self::new(
            Vec3::new(0.0, -1.0, -5.0),
            1.0,
            Vec3::new(8.0, 1.0, -5.0),
            1.0,
            Vec3::new(4.0, -3.0, -5.0),
            1.0,
        )
    }
}

impl Collider for SweptSphereTriCollider {
    fn resolve(&self, cloth: &mut ClothMesh) -> ContactResult {
        resolve_nodes(cloth, self.friction, |p| self.project(p))
    }

    fn shape(&self) -> ColliderShape {
        ColliderShape::SweptSphereTriangle {
            centers: self.centers,
            radii: self.radii,
        }
    }

    fn name(&self) -> &str {
        "swept_sphere_triangle"
    }
}
