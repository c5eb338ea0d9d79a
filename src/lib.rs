pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod gfx;
pub mod handlers;
pub mod hmd;
pub mod model;
pub mod scene;
pub mod viewer;
pub mod window;

pub use app::run;
pub use config::{Args, ViewerConfig};
pub use error::{Outcome, StartupError};
pub use event::{EventQueue, Key, ViewerEvent};
pub use hmd::{HmdParams, HmdRuntime, HmdSession};
pub use scene::{SceneComposer, SceneRoot, VrSceneComposer};
pub use viewer::{intercept_close_request, LoopState, Viewer, ViewerOptions};
pub use window::{ContextFactory, ContextTraits, GraphicsContext, GraphicsWindow};
