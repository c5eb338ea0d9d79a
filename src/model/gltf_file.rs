use anyhow::Result;
use glam::{Mat3, Mat4, Vec3};
use std::path::Path;

use super::{Material, Mesh, Model, ModelVertex};

fn read_mesh(
    mesh: &gltf::Mesh,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    material_count: usize,
    meshes: &mut Vec<Mesh>,
) -> Result<()> {
    let normal_matrix = Mat3::from_mat4(world).inverse().transpose();

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| anyhow::anyhow!("No position data"))?
            .collect();

        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|iter| iter.collect())
            .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);

        let tex_coords: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

        let indices: Vec<u32> = reader
            .read_indices()
            .map(|iter| iter.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        let vertices = positions
            .iter()
            .zip(tex_coords.iter())
            .zip(normals.iter())
            .map(|((pos, tex), norm)| ModelVertex {
                position: world.transform_point3(Vec3::from(*pos)).to_array(),
                tex_coords: *tex,
                normal: (normal_matrix * Vec3::from(*norm))
                    .normalize_or_zero()
                    .to_array(),
            })
            .collect();

        let material_index = primitive
            .material()
            .index()
            .filter(|&i| i < material_count)
            .unwrap_or(0);

        meshes.push(Mesh {
            name: mesh.name().unwrap_or("").to_string(),
            vertices,
            indices,
            material_index,
        });
    }
    Ok(())
}

// Node transforms are baked into the vertices; a mesh used by several
// nodes is emitted once per node.
fn read_node(
    node: gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    material_count: usize,
    meshes: &mut Vec<Mesh>,
) -> Result<()> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        read_mesh(&mesh, world, buffers, material_count, meshes)?;
    }
    for child in node.children() {
        read_node(child, world, buffers, material_count, meshes)?;
    }
    Ok(())
}

pub(super) fn load(path: &Path) -> Result<Model> {
    let (document, buffers, _images) = gltf::import(path)?;

    let mut materials: Vec<Material> = document
        .materials()
        .map(|material| Material {
            name: material.name().unwrap_or("").to_string(),
            base_color: material.pbr_metallic_roughness().base_color_factor(),
        })
        .collect();

    // Primitives without a material index fall back to slot 0
    if materials.is_empty() {
        materials.push(Material::default());
    }

    let mut meshes = Vec::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                read_node(node, Mat4::IDENTITY, &buffers, materials.len(), &mut meshes)?;
            }
        }
        None => {
            for mesh in document.meshes() {
                read_mesh(&mesh, Mat4::IDENTITY, &buffers, materials.len(), &mut meshes)?;
            }
        }
    }

    if meshes.is_empty() {
        return Err(anyhow::anyhow!("No meshes found in GLTF file"));
    }

    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("").to_string();
    Ok(Model::new(name, meshes, materials))
}
