use anyhow::Result;

use crate::event::EventQueue;
use crate::scene::SceneRoot;
use crate::viewer::Camera;

/// Settings a graphics context is created from.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextTraits {
    pub window_name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub double_buffer: bool,
    pub vsync: bool,
    pub window_decoration: bool,
}

impl Default for ContextTraits {
    fn default() -> Self {
        Self {
            window_name: String::new(),
            x: 50,
            y: 50,
            width: 1280,
            height: 720,
            samples: 0,
            double_buffer: true,
            vsync: true,
            window_decoration: true,
        }
    }
}

/// Which buffers are cleared at the start of each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const NONE: Self = Self { color: false, depth: false };
    pub const COLOR_DEPTH: Self = Self { color: true, depth: true };
}

impl Default for ClearMask {
    fn default() -> Self {
        Self::COLOR_DEPTH
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

/// The windowing side of a context.
pub trait GraphicsWindow {
    /// Pulls pending OS events into the event queue. Returns whether the
    /// queue has anything to process.
    fn check_events(&mut self) -> bool;

    fn event_queue(&mut self) -> &mut EventQueue;

    /// Default close handling: hides the window and releases the rendering
    /// context. The context is unusable afterwards.
    fn close(&mut self);
}

pub trait GraphicsContext {
    fn traits(&self) -> &ContextTraits;

    fn is_valid(&self) -> bool;

    fn is_realized(&self) -> bool;

    /// Turns the constructed context into a usable surface.
    fn realize(&mut self) -> Result<()>;

    /// Returns `false` once the context has been released.
    fn make_current(&mut self) -> bool;

    fn set_clear_color(&mut self, color: [f32; 4]);

    fn clear_color(&self) -> [f32; 4];

    fn set_clear_mask(&mut self, mask: ClearMask);

    fn clear_mask(&self) -> ClearMask;

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetId>;

    fn release_render_target(&mut self, id: RenderTargetId);

    fn draw(&mut self, scene: &SceneRoot, camera: &Camera) -> Result<()>;

    /// `None` for contexts without a window (offscreen buffers).
    fn as_window_mut(&mut self) -> Option<&mut dyn GraphicsWindow>;
}

/// Creates graphics contexts from traits.
pub trait ContextFactory {
    type Context: GraphicsContext;

    fn create_graphics_context(&mut self, traits: &ContextTraits) -> Result<Self::Context>;
}
