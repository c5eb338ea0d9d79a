use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{Material, Mesh, Model, ModelVertex};

#[derive(Debug, Default)]
struct ObjData {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
    vertices: Vec<ModelVertex>,
    // (position, tex_coord, normal) index triple to emitted vertex
    vertex_lookup: HashMap<(usize, Option<usize>, Option<usize>), u32>,
}

// OBJ indices are 1-based; negative ones count back from the end.
fn resolve_index(token: Option<&&str>, len: usize) -> Result<Option<usize>> {
    let Some(token) = token.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let index: i64 = token
        .parse()
        .with_context(|| format!("Invalid face index '{}'", token))?;
    let resolved = if index < 0 { len as i64 + index } else { index - 1 };
    if resolved < 0 || resolved as usize >= len {
        anyhow::bail!("Face index {} out of range", index);
    }
    Ok(Some(resolved as usize))
}

impl ObjData {
    fn process_face(&mut self, face_tokens: &[&str]) -> Result<()> {
        let mut vertex_indices = Vec::with_capacity(face_tokens.len());

        for vertex_str in face_tokens {
            let parts: Vec<&str> = vertex_str.split('/').collect();

            let position = resolve_index(parts.first(), self.positions.len())?
                .ok_or_else(|| anyhow::anyhow!("Invalid position index"))?;
            let tex_coord = resolve_index(parts.get(1), self.tex_coords.len())?;
            let normal = resolve_index(parts.get(2), self.normals.len())?;

            let key = (position, tex_coord, normal);
            let index = match self.vertex_lookup.get(&key) {
                Some(&idx) => idx,
                None => {
                    let idx = self.vertices.len() as u32;
                    self.vertices.push(ModelVertex {
                        position: self.positions[position],
                        tex_coords: tex_coord.map(|i| self.tex_coords[i]).unwrap_or([0.0, 0.0]),
                        normal: normal.map(|i| self.normals[i]).unwrap_or([0.0, 1.0, 0.0]),
                    });
                    self.vertex_lookup.insert(key, idx);
                    idx
                }
            };
            vertex_indices.push(index);
        }

        // Fan triangulation, faces are assumed convex
        for i in 1..(vertex_indices.len() - 1) {
            self.indices.push(vertex_indices[0]);
            self.indices.push(vertex_indices[i]);
            self.indices.push(vertex_indices[i + 1]);
        }

        Ok(())
    }
}

fn parse_floats<const N: usize>(tokens: &[&str]) -> Result<Option<[f32; N]>> {
    if tokens.len() < N {
        return Ok(None);
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token.parse::<f32>()?;
    }
    Ok(Some(out))
}

pub(super) fn load(path: &Path) -> Result<Model> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut obj = ObjData::default();

    for line in BufReader::new(file).lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&keyword, rest)) = tokens.split_first() else {
            continue;
        };

        match keyword {
            "v" => {
                if let Some(p) = parse_floats::<3>(rest)? {
                    obj.positions.push(p);
                }
            }
            "vt" => {
                if let Some(t) = parse_floats::<2>(rest)? {
                    obj.tex_coords.push(t);
                }
            }
            "vn" => {
                if let Some(n) = parse_floats::<3>(rest)? {
                    obj.normals.push(n);
                }
            }
            "f" if rest.len() >= 3 => obj.process_face(rest)?,
            _ => {}
        }
    }

    if obj.indices.is_empty() {
        anyhow::bail!("No faces found in OBJ file {}", path.display());
    }

    let mesh = Mesh {
        name: path.file_stem().and_then(|s| s.to_str()).unwrap_or("").to_string(),
        vertices: obj.vertices,
        indices: obj.indices,
        material_index: 0,
    };

    Ok(Model::new(
        mesh.name.clone(),
        vec![mesh],
        vec![Material::default()],
    ))
}
