pub mod transform;

pub use transform::Transform;

use glam::Vec3;

use crate::hmd::HmdSession;
use crate::model::{BoundingSphere, Model};

pub struct SceneNode {
    pub model: Model,
    pub transform: Transform,
}

/// The renderable graph the viewer draws every frame.
pub struct SceneRoot {
    pub nodes: Vec<SceneNode>,
    /// Per-eye render resolution requested by the HMD.
    pub eye_resolution: (u32, u32),
    pub world_units_per_metre: f32,
}

impl SceneRoot {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            eye_resolution: (0, 0),
            world_units_per_metre: 1.0,
        }
    }

    pub fn add_child(&mut self, model: Model, transform: Transform) {
        self.nodes.push(SceneNode { model, transform });
    }

    /// World-space bound over every node, scale included.
    pub fn bound(&self) -> BoundingSphere {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for node in &self.nodes {
            let local = node.model.bounding_sphere();
            if !local.valid() {
                continue;
            }
            let matrix = node.transform.to_matrix();
            let center = matrix.transform_point3(local.center);
            let radius = local.radius * node.transform.scale.abs().max_element();
            min = min.min(center - Vec3::splat(radius));
            max = max.max(center + Vec3::splat(radius));
        }
        if min.x > max.x {
            return BoundingSphere {
                center: Vec3::ZERO,
                radius: -1.0,
            };
        }
        BoundingSphere {
            center: (min + max) * 0.5,
            radius: (max - min).max_element() * 0.5,
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().map(|node| node.model.meshes.len()).sum()
    }
}

impl Default for SceneRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the scene root for a loaded model and an open HMD session.
pub trait SceneComposer<S> {
    fn compose(&self, model: Model, session: &S) -> SceneRoot;
}

/// Places the model under a root sized for the session's eye targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct VrSceneComposer;

impl<S: HmdSession> SceneComposer<S> for VrSceneComposer {
    fn compose(&self, model: Model, session: &S) -> SceneRoot {
        let mut root = SceneRoot::new();
        root.eye_resolution = session.eye_resolution();
        root.world_units_per_metre = session.params().world_units_per_metre;

        log::debug!(
            "Composing scene for '{}' at {}x{} per eye",
            model.name,
            root.eye_resolution.0,
            root.eye_resolution.1
        );
        root.add_child(model, Transform::new());
        root
    }
}
