use glam::{Mat4, Vec3};

use crate::model::BoundingSphere;

// Smallest near/far ratio used when fitting planes to the scene.
const NEAR_FAR_RATIO: f32 = 0.0005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearFarMode {
    /// Fit the clip planes to the scene bound every frame.
    ComputeFromBounds,
    /// Keep the configured clip planes.
    Fixed,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    viewport: Viewport,
    near: f32,
    far: f32,
    near_far_mode: NearFarMode,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            eye: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fovy: 45.0,
            viewport: Viewport::new(0, 0, 1, 1),
            near: 0.1,
            far: 100.0,
            near_far_mode: NearFarMode::ComputeFromBounds,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport.width = width;
            self.viewport.height = height;
        }
    }

    pub fn clip_planes(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
    }

    pub fn near_far_mode(&self) -> NearFarMode {
        self.near_far_mode
    }

    pub fn set_near_far_mode(&mut self, mode: NearFarMode) {
        self.near_far_mode = mode;
    }

    /// Refits the clip planes to `bound` unless they are fixed.
    pub fn update_clip_planes(&mut self, bound: &BoundingSphere) {
        if self.near_far_mode == NearFarMode::Fixed || !bound.valid() {
            return;
        }
        let forward = (self.target - self.eye).normalize_or_zero();
        let distance = (bound.center - self.eye).dot(forward);
        let far = distance + bound.radius;
        if far <= 0.0 {
            // Scene entirely behind the eye
            return;
        }
        let near = (distance - bound.radius).max(far * NEAR_FAR_RATIO);
        self.near = near;
        self.far = far;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.viewport.aspect(),
            self.near,
            self.far,
        )
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
