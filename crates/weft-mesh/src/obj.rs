//! Triangulated surface import from a restricted Wavefront OBJ subset.
//!
//! Supported records: `v x y z`, `vt u v` and triangular faces
//! `f v/vt v/vt v/vt`. Other records and non-triangular faces are skipped.
//! Face corners sharing both position and UV index become one node.

use std::collections::HashMap;
use std::path::Path;

use weft_math::{Vec2, Vec3};
use weft_types::constants::SURFACE_ANCHOR_INDEX;
use weft_types::{NodeId, WeftError, WeftResult};

use crate::cloth::ClothMesh;
use crate::node::Node;
use crate::spring::SpringKind;
use crate::tangents::compute_tangents;

/// Loads a surface from `path`.
///
/// A file that cannot be read is logged and yields an empty mesh.
/// Malformed contents are logged the same way.
pub fn from_obj_file(path: impl AsRef<Path>) -> ClothMesh {
    let path = path.as_ref();
    match load_obj(path) {
        Ok(mesh) => mesh,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "failed to load surface mesh");
            ClothMesh::empty()
        }
    }
}

/// Loads a surface from `path`, reporting failures to the caller.
pub fn load_obj(path: impl AsRef<Path>) -> WeftResult<ClothMesh> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_obj(&text)
}

/// Builds a cloth from OBJ text.
///
/// Three structural springs are added per triangle; edges shared between
/// triangles get one spring per triangle. Node 0 and node 10 (when present)
/// are anchored. The origin is the world origin.
pub fn parse_obj(text: &str) -> WeftResult<ClothMesh> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut corners: Vec<(usize, (usize, Option<usize>))> = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = line_no + 1;
        let mut tokens = raw.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_vec3(tokens, line)?),
            Some("vt") => uvs.push(parse_vec2(tokens, line)?),
            Some("f") => {
                let refs: Vec<&str> = tokens.collect();
                if refs.len() != 3 {
                    continue;
                }
                for r in refs {
                    corners.push((line, parse_corner(r, line)?));
                }
            }
            _ => {}
        }
    }

    let mut mesh = ClothMesh::empty();
    let mut dedup: HashMap<(usize, Option<usize>), u32> = HashMap::new();

    for (line, (v, vt)) in corners {
        let key = (v, vt);
        let index = match dedup.get(&key) {
            Some(&index) => index,
            None => {
                let position = *positions.get(v).ok_or_else(|| {
                    WeftError::InvalidMesh(format!(
                        "line {line}: position index {} out of range ({} positions)",
                        v + 1,
                        positions.len()
                    ))
                })?;
                let uv = match vt {
                    Some(t) => *uvs.get(t).ok_or_else(|| {
                        WeftError::InvalidMesh(format!(
                            "line {line}: uv index {} out of range ({} uvs)",
                            t + 1,
                            uvs.len()
                        ))
                    })?,
                    None => Vec2::ZERO,
                };
                let index = mesh.nodes.len() as u32;
                mesh.nodes.push(Node::new(position, uv));
                dedup.insert(key, index);
                index
            }
        };
        mesh.triangles.push(index);
    }

    for t in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(t);
        mesh.add_spring(NodeId(a), NodeId(b), SpringKind::Structural);
        mesh.add_spring(NodeId(b), NodeId(c), SpringKind::Structural);
        mesh.add_spring(NodeId(c), NodeId(a), SpringKind::Structural);
    }

    compute_tangents(&mut mesh.nodes, &mesh.triangles);

    if !mesh.nodes.is_empty() {
        mesh.add_anchor(NodeId(0));
    }
    if mesh.nodes.len() > SURFACE_ANCHOR_INDEX {
        mesh.add_anchor(NodeId::from(SURFACE_ANCHOR_INDEX));
    }

    tracing::info!(
        positions = positions.len(),
        uvs = uvs.len(),
        nodes = mesh.node_count(),
        triangles = mesh.triangle_count(),
        "surface cloth imported"
    );
    Ok(mesh)
}

fn parse_float(token: Option<&str>, line: usize, what: &str) -> WeftResult<f32> {
    let token = token.ok_or_else(|| WeftError::Parse {
        line,
        message: format!("missing {what}"),
    })?;
    token.parse::<f32>().map_err(|e| WeftError::Parse {
        line,
        message: format!("bad {what} '{token}': {e}"),
    })
}

fn parse_vec3<'a>(mut tokens: impl Iterator<Item = &'a str>, line: usize) -> WeftResult<Vec3> {
    let x = parse_float(tokens.next(), line, "x")?;
    let y = parse_float(tokens.next(), line, "y")?;
    let z = parse_float(tokens.next(), line, "z")?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut tokens: impl Iterator<Item = &'a str>, line: usize) -> WeftResult<Vec2> {
    let u = parse_float(tokens.next(), line, "u")?;
    let v = parse_float(tokens.next(), line, "v")?;
    Ok(Vec2::new(u, v))
}

/// Parses `v`, `v/vt` or `v/vt/vn` into zero-based `(v, vt)`.
fn parse_corner(token: &str, line: usize) -> WeftResult<(usize, Option<usize>)> {
    let mut parts = token.split('/');
    let v = parse_index(parts.next(), line)?.ok_or_else(|| WeftError::Parse {
        line,
        message: format!("face corner '{token}' has no position index"),
    })?;
    let vt = parse_index(parts.next(), line)?;
    Ok((v, vt))
}

fn parse_index(part: Option<&str>, line: usize) -> WeftResult<Option<usize>> {
    match part {
        None | Some("") => Ok(None),
        Some(s) => {
            let one_based = s.parse::<usize>().map_err(|e| WeftError::Parse {
                line,
                message: format!("bad index '{s}': {e}"),
            })?;
            if one_based == 0 {
                return Err(WeftError::Parse {
                    line,
                    message: "indices are 1-based".into(),
                });
            }
            Ok(Some(one_based - 1))
        }
    }
}
