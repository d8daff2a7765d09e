//! Composite collider built from a sphere-mesh description file.
//!
//! File format (whitespace separated, `#` comments and blank lines skipped):
//!
//! ```text
//! numSpheres numTriangles numEdges
//! cx cy cz r          # numSpheres lines
//! i j k               # triangle of spheres
//! i j                 # edge of spheres
//! ```
//!
//! After the sphere block every line is read as a list of sphere indices and
//! consumed three at a time as triangles; a trailing pair becomes an edge.
//! The declared triangle and edge counts are informational.

use std::path::Path;

use weft_math::Vec3;
use weft_mesh::ClothMesh;
use weft_types::{WeftError, WeftResult};

use crate::collider::{Collider, ColliderShape};
use crate::response::ContactResult;
use crate::swept_sphere::SweptSphereCollider;
use crate::swept_sphere_tri::SweptSphereTriCollider;

/// Scale applied to sphere centers and radii by [`SphereMeshCollider::load`].
pub const DEFAULT_SPHERE_MESH_SCALE: f32 = 10.0;

/// Translation applied after scaling by [`SphereMeshCollider::load`].
pub const DEFAULT_SPHERE_MESH_TRANSLATION: Vec3 = Vec3::new(3.0, 0.0, -2.0);

/// Ordered list of swept-sphere triangles and swept spheres.
#[derive(Default)]
pub struct SphereMeshCollider {
    triangles: usize,
    edges: usize,
    primitives: Vec<Box<dyn Collider>>,
}

impl SphereMeshCollider {
    /// Loads a sphere mesh with the default scale and translation.
    ///
    /// Unreadable or malformed files are logged and produce an empty
    /// collider.
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::load_with(path, DEFAULT_SPHERE_MESH_SCALE, DEFAULT_SPHERE_MESH_TRANSLATION)
    }

    pub fn load_with(path: impl AsRef<Path>, scale: f32, translation: Vec3) -> Self {
        let path = path.as_ref();
        let result = std::fs::read_to_string(path)
            .map_err(WeftError::from)
            .and_then(|text| Self::parse(&text, scale, translation));
        match result {
            Ok(collider) => collider,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "failed to load sphere mesh");
                Self::default()
            }
        }
    }

    /// Parses sphere-mesh text.
    ///
    /// Header and sphere-line errors are returned. Out-of-range index tuples
    /// and leftover single indices are logged and skipped.
    pub fn parse(text: &str, scale: f32, translation: Vec3) -> WeftResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let (header_line, header) = lines.next().ok_or_else(|| WeftError::Parse {
            line: 0,
            message: "missing header".into(),
        })?;
        let counts: Vec<i64> = header
            .split_whitespace()
            .take(3)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|e| WeftError::Parse {
                line: header_line,
                message: format!("bad header: {e}"),
            })?;
        let (n_spheres, n_tris, n_edges) = match counts.as_slice() {
            &[s, t, e] if s > 0 && t >= 0 && e >= 0 => (s as usize, t, e),
            _ => {
                return Err(WeftError::Parse {
                    line: header_line,
                    message: "expected numSpheres>0 numTriangles>=0 numEdges>=0".into(),
                })
            }
        };

        let mut centers = Vec::with_capacity(n_spheres);
        let mut radii = Vec::with_capacity(n_spheres);
        for k in 0..n_spheres {
            let (line, text) = lines.next().ok_or_else(|| WeftError::Parse {
                line: header_line,
                message: format!("expected {n_spheres} sphere lines, found {k}"),
            })?;
            let values: Vec<f32> = text
                .split_whitespace()
                .take(4)
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|e| WeftError::Parse {
                    line,
                    message: format!("bad sphere: {e}"),
                })?;
            let &[cx, cy, cz, r] = values.as_slice() else {
                return Err(WeftError::Parse {
                    line,
                    message: "sphere line needs cx cy cz r".into(),
                });
            };
            centers.push(Vec3::new(cx, cy, cz) * scale + translation);
            radii.push(r * scale);
        }

        let mut collider = Self::default();
        let in_range = |i: i64| i >= 0 && (i as usize) < n_spheres;

        for (line, text) in lines {
            let indices: Vec<i64> = text
                .split_whitespace()
                .map_while(|t| t.parse().ok())
                .collect();

            let mut chunks = indices.chunks_exact(3);
            for tri in chunks.by_ref() {
                let (a, b, c) = (tri[0], tri[1], tri[2]);
                if !(in_range(a) && in_range(b) && in_range(c)) {
                    tracing::warn!(line, a, b, c, n_spheres, "triangle indices out of range, skipped");
                    continue;
                }
                let (a, b, c) = (a as usize, b as usize, c as usize);
                collider.push_triangle(SweptSphereTriCollider::new(
                    centers[a], radii[a], centers[b], radii[b], centers[c], radii[c],
                ));
            }

            match chunks.remainder() {
                [] => {}
                &[a, b] => {
                    if in_range(a) && in_range(b) {
                        let (a, b) = (a as usize, b as usize);
                        collider.push_edge(SweptSphereCollider::new(
                            centers[a], radii[a], centers[b], radii[b],
                        ));
                    } else {
                        tracing::warn!(line, a, b, n_spheres, "edge indices out of range, skipped");
                    }
                }
                rest => {
                    tracing::warn!(line, leftover = rest.len(), "line partially ignored");
                }
            }
        }

        tracing::info!(
            spheres = n_spheres,
            triangles_declared = n_tris,
            triangles = collider.triangles,
            edges_declared = n_edges,
            edges = collider.edges,
            "sphere mesh loaded"
        );
        Ok(collider)
    }

    fn push_triangle(&mut self, tri: SweptSphereTriCollider) {
        self.triangles += 1;
        self.primitives.push(Box::new(tri));
    }

    fn push_edge(&mut self, edge: SweptSphereCollider) {
        self.edges += 1;
        self.primitives.push(Box::new(edge));
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles
    }

    pub fn edge_count(&self) -> usize {
        self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn primitives(&self) -> &[Box<dyn Collider>] {
        &self.primitives
    }
}

impl Collider for SphereMeshCollider {
    fn resolve(&self, cloth: &mut ClothMesh) -> ContactResult {
        self.primitives
            .iter()
            .fold(ContactResult::default(), |acc, p| acc.merge(p.resolve(cloth)))
    }

    fn shape(&self) -> ColliderShape {
        ColliderShape::Composite {
            parts: self.primitives.iter().map(|p| p.shape()).collect(),
        }
    }

    fn name(&self) -> &str {
        "sphere_mesh"
    }
}
