mod gltf_file;
mod mesh;
mod obj;

pub use mesh::{Material, Mesh, ModelVertex};

use anyhow::Result;
use glam::Vec3;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn valid(&self) -> bool {
        self.radius >= 0.0
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
}

impl Model {
    pub fn new(name: String, meshes: Vec<Mesh>, materials: Vec<Material>) -> Self {
        let mut bounds_min = [f32::INFINITY; 3];
        let mut bounds_max = [f32::NEG_INFINITY; 3];
        for (min, max) in meshes.iter().filter_map(Mesh::bounds) {
            for i in 0..3 {
                bounds_min[i] = bounds_min[i].min(min[i]);
                bounds_max[i] = bounds_max[i].max(max[i]);
            }
        }
        Self {
            name,
            meshes,
            materials,
            bounds_min,
            bounds_max,
        }
    }

    /// Sphere enclosing the bounding box. Radius is negative for a model
    /// without vertices.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        if self.bounds_min[0] > self.bounds_max[0] {
            return BoundingSphere {
                center: Vec3::ZERO,
                radius: -1.0,
            };
        }
        let min = Vec3::from(self.bounds_min);
        let max = Vec3::from(self.bounds_max);
        BoundingSphere {
            center: (min + max) * 0.5,
            radius: (max - min).length() * 0.5,
        }
    }

    pub fn material_for(&self, mesh: &Mesh) -> &Material {
        self.materials
            .get(mesh.material_index)
            .or_else(|| self.materials.first())
            .unwrap_or(&DEFAULT_MATERIAL)
    }

    /// Appends `other` as a sibling, like adding a child to a group node.
    pub fn merge(&mut self, other: Model) {
        let offset = self.materials.len();
        self.materials.extend(other.materials);
        self.meshes.extend(other.meshes.into_iter().map(|mut mesh| {
            mesh.material_index += offset;
            mesh
        }));
        for i in 0..3 {
            self.bounds_min[i] = self.bounds_min[i].min(other.bounds_min[i]);
            self.bounds_max[i] = self.bounds_max[i].max(other.bounds_max[i]);
        }
    }
}

static DEFAULT_MATERIAL: Material = Material {
    name: String::new(),
    base_color: [0.8, 0.8, 0.8, 1.0],
};

/// Loads a single model file, choosing the reader from the extension.
pub fn read_node_file<P: AsRef<Path>>(path: P) -> Result<Model> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("");

    match extension.to_lowercase().as_str() {
        "glb" | "gltf" => gltf_file::load(path),
        "obj" => obj::load(path),
        _ => Err(anyhow::anyhow!("Unsupported model format: {}", extension)),
    }
}

/// Loads every path and merges the ones that succeed. `None` when nothing
/// could be read.
pub fn read_node_files(paths: &[PathBuf]) -> Option<Model> {
    let mut loaded: Option<Model> = None;
    for path in paths {
        match read_node_file(path) {
            Ok(model) => {
                log::info!("Loaded model {} ({} meshes)", path.display(), model.meshes.len());
                match loaded.as_mut() {
                    Some(group) => group.merge(model),
                    None => loaded = Some(model),
                }
            }
            Err(err) => log::warn!("Could not load {}: {:#}", path.display(), err),
        }
    }
    loaded
}

/// Resolves the scene to show: the given paths first, then the default asset.
pub fn load_scene(paths: &[PathBuf], default_model: &Path) -> Option<Model> {
    read_node_files(paths).or_else(|| {
        log::info!("Trying default model {}", default_model.display());
        read_node_file(default_model)
            .map_err(|err| log::debug!("Default model unavailable: {:#}", err))
            .ok()
    })
}
