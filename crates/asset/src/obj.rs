//! OBJ parser producing one mesh per object (`o`/`g`) with material groups
//! (`usemtl`). Supports positions, normals, texture coordinates, negative
//! indices and polygon faces (fan triangulated).

use std::{
    collections::HashMap,
    io::{self, BufRead},
};

use anyhow::{Context, Result, anyhow};

use crate::mesh::{MeshData, MeshVertex};

/// Index range of one object's mesh drawn with one material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialGroup {
    /// Name given to `usemtl`, `None` before any `usemtl`.
    pub material: Option<String>,
    pub start: u32,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjObject {
    pub name: String,
    pub mesh: MeshData,
    /// Non-empty groups in index order. Always at least one.
    pub groups: Vec<MaterialGroup>,
}

impl ObjObject {
    /// Distinct material names in first-use order, one per slot.
    pub fn material_names(&self) -> Vec<Option<String>> {
        let mut names: Vec<Option<String>> = Vec::new();
        for g in &self.groups {
            if !names.contains(&g.material) {
                names.push(g.material.clone());
            }
        }
        names
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjScene {
    pub objects: Vec<ObjObject>,
    /// Libraries named by `mtllib`, in file order.
    pub material_libs: Vec<String>,
}

impl ObjScene {
    pub fn vertex_count(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.triangle_count()).sum()
    }

    /// Whether `mtllib` names `file`. A file without `mtllib` accepts any library.
    pub fn names_library(&self, file: &str) -> bool {
        self.material_libs.is_empty() || self.material_libs.iter().any(|lib| lib == file)
    }
}

/// Parse OBJ from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> Result<ObjScene> {
    parse_obj(reader)
}

/// Parse OBJ from raw bytes (as downloaded).
pub fn load_obj_from_bytes(bytes: &[u8]) -> Result<ObjScene> {
    load_obj_from_reader(io::Cursor::new(bytes))
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> Result<ObjScene> {
    load_obj_from_reader(io::Cursor::new(contents))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct Key(usize, Option<usize>, Option<usize>);

/// Object under construction. Vertices are deduplicated per object.
struct ObjectBuilder {
    name: String,
    unique: HashMap<Key, u32>,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    groups: Vec<MaterialGroup>,
    has_normals: bool,
}

impl ObjectBuilder {
    fn new(name: String, material: Option<String>) -> Self {
        Self {
            name,
            unique: HashMap::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            groups: vec![MaterialGroup {
                material,
                start: 0,
                count: 0,
            }],
            has_normals: false,
        }
    }

    fn use_material(&mut self, material: Option<String>) {
        let start = self.indices.len() as u32;
        match self.groups.last_mut() {
            // Nothing drawn with the previous material yet: just rename it.
            Some(last) if last.count == 0 => last.material = material,
            _ => self.groups.push(MaterialGroup {
                material,
                start,
                count: 0,
            }),
        }
    }

    fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
        if let Some(last) = self.groups.last_mut() {
            last.count += 3;
        }
    }

    fn finish(self) -> Option<ObjObject> {
        if self.indices.is_empty() {
            return None;
        }
        let mut mesh = MeshData::new(self.vertices, self.indices);
        if !self.has_normals {
            mesh.compute_normals();
        }
        let groups = self.groups.into_iter().filter(|g| g.count > 0).collect();
        Some(ObjObject {
            name: self.name,
            mesh,
            groups,
        })
    }
}

fn parse_obj<R: BufRead>(reader: R) -> Result<ObjScene> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();

    let mut scene = ObjScene::default();
    let mut material: Option<String> = None;
    let mut current = ObjectBuilder::new(String::new(), None);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let tag = parts
            .next()
            .ok_or_else(|| anyhow!("Malformed OBJ line {}: '{}'", line_no + 1, trimmed))?;

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                texcoords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                normals.push([nx, ny, nz]);
            }
            "f" => {
                let mut face: Vec<u32> = Vec::new();
                for part in parts {
                    let (vi, vti, vni) = parse_face_vertex(
                        part,
                        positions.len(),
                        texcoords.len(),
                        normals.len(),
                        line_no,
                    )?;
                    let key = Key(vi, vti, vni);
                    let index = match current.unique.get(&key) {
                        Some(&idx) => idx,
                        None => {
                            let position = positions[vi];
                            let uv = vti.map(|i| texcoords[i]).unwrap_or([0.0, 0.0]);
                            let normal = match vni {
                                Some(i) => {
                                    current.has_normals = true;
                                    normals[i]
                                }
                                None => [0.0, 0.0, 1.0],
                            };

                            let idx = u32::try_from(current.vertices.len())
                                .map_err(|_| anyhow!("Too many vertices in OBJ (>{})", u32::MAX))?;
                            current.vertices.push(MeshVertex::new(position, normal, uv));
                            current.unique.insert(key, idx);
                            idx
                        }
                    };
                    face.push(index);
                }

                if face.len() < 3 {
                    continue;
                }
                for tri in 1..(face.len() - 1) {
                    current.push_triangle(face[0], face[tri], face[tri + 1]);
                }
            }
            "o" | "g" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let next = ObjectBuilder::new(name, material.clone());
                if let Some(obj) = std::mem::replace(&mut current, next).finish() {
                    scene.objects.push(obj);
                }
            }
            "usemtl" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                material = (!name.is_empty()).then_some(name);
                current.use_material(material.clone());
            }
            "mtllib" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                if !name.is_empty() {
                    scene.material_libs.push(name);
                }
            }
            _ => {
                // s/l/p and vendor extensions are not rendered.
            }
        }
    }

    if let Some(obj) = current.finish() {
        scene.objects.push(obj);
    }

    if scene.objects.is_empty() {
        anyhow::bail!("OBJ contained no triangles");
    }

    Ok(scene)
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32> {
    let token = value.ok_or_else(|| anyhow!("Missing {} on line {}", what, line_no + 1))?;
    token
        .parse::<f32>()
        .with_context(|| format!("Failed to parse {} on line {}", what, line_no + 1))
}

fn parse_face_vertex(
    token: &str,
    pos_count: usize,
    tex_count: usize,
    norm_count: usize,
    line_no: usize,
) -> Result<(usize, Option<usize>, Option<usize>)> {
    let mut split = token.split('/');
    let pos = split
        .next()
        .ok_or_else(|| anyhow!("Malformed face element '{}' on line {}", token, line_no + 1))?;
    let pos_idx = resolve_index(pos, pos_count, line_no)?;

    let tex_idx = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, tex_count, line_no)?),
        _ => None,
    };

    let norm_idx = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, norm_count, line_no)?),
        _ => None,
    };

    Ok((pos_idx, tex_idx, norm_idx))
}

/// 1-based (or negative, relative to the end) OBJ index to a 0-based one.
fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw = token
        .parse::<i64>()
        .with_context(|| format!("Invalid index '{}' on line {}", token, line_no + 1))?;
    if raw == 0 {
        anyhow::bail!("OBJ indices are 1-based; found 0 on line {}", line_no + 1);
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        anyhow::bail!(
            "OBJ index {} resolved out of bounds (len={}) on line {}",
            raw,
            len,
            line_no + 1
        );
    }

    Ok(idx as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let scene = load_obj_from_str(src).expect("parse triangle");
        assert_eq!(scene.objects.len(), 1);
        let mesh = &scene.objects[0].mesh;
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices.len(), 3);
        assert_eq!(scene.objects[0].groups[0].material, None);
    }

    #[test]
    fn objects_and_material_groups() {
        let src = "mtllib Mesh.mtl
            v 0 0 0
            v 1 0 0
            v 1 1 0
            v 0 1 0
            o first
            usemtl red
            f 1 2 3
            usemtl blue
            f 1 3 4
            o second
            f -4 -3 -2 -1
        ";
        let scene = load_obj_from_str(src).expect("parse");
        assert_eq!(scene.material_libs, vec!["Mesh.mtl".to_string()]);
        assert!(scene.names_library("Mesh.mtl"));
        assert!(!scene.names_library("Other.mtl"));
        assert!(ObjScene::default().names_library("Other.mtl"));
        assert_eq!(scene.objects.len(), 2);

        let first = &scene.objects[0];
        assert_eq!(first.name, "first");
        assert_eq!(
            first.groups,
            vec![
                MaterialGroup { material: Some("red".into()), start: 0, count: 3 },
                MaterialGroup { material: Some("blue".into()), start: 3, count: 3 },
            ]
        );

        // Material carries over into the next object; the quad is fan-split.
        let second = &scene.objects[1];
        assert_eq!(second.mesh.triangle_count(), 2);
        assert_eq!(second.groups.len(), 1);
        assert_eq!(second.groups[0].material.as_deref(), Some("blue"));
        assert_eq!(second.material_names(), vec![Some("blue".to_string())]);
    }

    #[test]
    fn missing_normals_are_computed() {
        let scene = load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").expect("parse");
        let n = scene.objects[0].mesh.vertices[0].normal;
        assert_eq!(n, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = load_obj_from_str("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
        assert!(load_obj_from_str("# nothing\n").is_err());
    }
}
