pub mod openxr_device;

use anyhow::Result;

use crate::window::{ContextTraits, GraphicsContext};

/// Fixed parameters an HMD session is opened with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmdParams {
    pub near_clip: f32,
    pub far_clip: f32,
    pub world_units_per_metre: f32,
    pub samples: u32,
}

impl Default for HmdParams {
    fn default() -> Self {
        Self {
            near_clip: 0.01,
            far_clip: 10000.0,
            world_units_per_metre: 1.0,
            samples: 4,
        }
    }
}

/// Entry point to a VR runtime.
pub trait HmdRuntime {
    type Session: HmdSession;

    /// Capability check with no lasting side effects.
    fn presence_detected(&self) -> bool;

    /// Opens the device. Implementations log the specific cause on failure.
    fn initialize(&self, params: &HmdParams) -> Result<Self::Session>;
}

/// An open connection to the HMD.
pub trait HmdSession {
    fn params(&self) -> &HmdParams;

    /// Recommended render size of one eye.
    fn eye_resolution(&self) -> (u32, u32);

    fn suggested_context_traits(&self) -> ContextTraits;

    /// One-time setup once the context becomes usable.
    fn on_realize(&mut self, context: &mut dyn GraphicsContext) -> Result<()>;

    fn reset_sensor_orientation(&mut self);

    /// Releases everything the session holds in `context`. Must run after
    /// the render loop returned and before the context is dropped.
    fn shutdown(self, context: &mut dyn GraphicsContext)
    where
        Self: Sized;
}
