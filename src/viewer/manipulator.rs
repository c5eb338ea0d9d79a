use glam::Vec3;

use super::Camera;
use crate::event::{Key, PointerButton, ViewerEvent};
use crate::model::BoundingSphere;

const ROTATE_SENSITIVITY: f32 = 0.5; // degrees per pixel
const ZOOM_SENSITIVITY: f32 = 0.01; // per pixel of vertical drag
const SCROLL_ZOOM_STEP: f32 = 0.1;
const PAN_SENSITIVITY: f32 = 0.002;
const MIN_DISTANCE: f32 = 1e-3;
const MAX_PITCH: f32 = 89.0;

/// Drives the mirror camera from pointer input.
///
/// The viewer offers every event to the manipulator before the registered
/// handlers; a consumed event is not passed on.
pub trait CameraManipulator {
    /// Resets to a view that frames `bound`.
    fn home(&mut self, bound: &BoundingSphere, camera: &Camera);

    fn handle(&mut self, event: &ViewerEvent) -> bool;

    fn update_camera(&self, camera: &mut Camera);
}

/// Orbits around a center point. Left drag rotates, right drag and the
/// wheel zoom, middle drag pans, space returns home.
#[derive(Debug, Clone)]
pub struct TrackballManipulator {
    center: Vec3,
    distance: f32,
    yaw: f32,
    pitch: f32,
    home: (Vec3, f32),
    dragging: Option<PointerButton>,
    last_pointer: Option<(f32, f32)>,
}

impl TrackballManipulator {
    pub fn new() -> Self {
        Self {
            center: Vec3::ZERO,
            distance: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            home: (Vec3::ZERO, 1.0),
            dragging: None,
            last_pointer: None,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn eye(&self) -> Vec3 {
        self.center + self.direction() * self.distance
    }

    // Unit vector from the center towards the eye; yaw 0 and pitch 0 look down -Z
    fn direction(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos())
    }

    fn go_home(&mut self) {
        (self.center, self.distance) = self.home;
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).max(MIN_DISTANCE);
    }

    fn drag(&mut self, button: PointerButton, dx: f32, dy: f32) {
        match button {
            PointerButton::Left => {
                self.yaw -= dx * ROTATE_SENSITIVITY;
                self.pitch = (self.pitch + dy * ROTATE_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
            }
            PointerButton::Right => self.zoom((1.0 + dy * ZOOM_SENSITIVITY).max(0.1)),
            PointerButton::Middle => {
                let forward = -self.direction();
                let right = forward.cross(Vec3::Y).normalize_or_zero();
                let up = right.cross(forward);
                let scale = self.distance * PAN_SENSITIVITY;
                self.center += (up * dy - right * dx) * scale;
            }
            PointerButton::Other => {}
        }
    }
}

impl Default for TrackballManipulator {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraManipulator for TrackballManipulator {
    fn home(&mut self, bound: &BoundingSphere, camera: &Camera) {
        self.home = if bound.valid() && bound.radius > 0.0 {
            // Far enough for the whole sphere to fit the vertical field of view
            let half_fov = (camera.fovy * 0.5).to_radians();
            (bound.center, bound.radius / half_fov.sin())
        } else {
            (Vec3::ZERO, 1.0)
        };
        self.go_home();
        log::debug!(
            "Trackball home: center {:?}, distance {:.3}",
            self.center,
            self.distance
        );
    }

    fn handle(&mut self, event: &ViewerEvent) -> bool {
        match event {
            ViewerEvent::PointerButton { button, pressed } => {
                self.dragging = pressed.then_some(*button);
                false
            }
            ViewerEvent::PointerMove { x, y } => {
                let previous = self.last_pointer.replace((*x, *y));
                match (self.dragging, previous) {
                    (Some(button), Some((px, py))) => {
                        self.drag(button, x - px, y - py);
                        true
                    }
                    _ => false,
                }
            }
            ViewerEvent::Scroll { dy, .. } => {
                self.zoom((1.0 - dy * SCROLL_ZOOM_STEP).max(0.1));
                true
            }
            ViewerEvent::KeyDown(Key::Space) => {
                self.go_home();
                true
            }
            _ => false,
        }
    }

    fn update_camera(&self, camera: &mut Camera) {
        camera.eye = self.eye();
        camera.target = self.center;
        camera.up = Vec3::Y;
    }
}
