mod camera;
mod intercept;
mod manipulator;

pub use camera::{Camera, NearFarMode, Viewport};
pub use intercept::intercept_close_request;
pub use manipulator::{CameraManipulator, TrackballManipulator};

use anyhow::Result;
use std::time::Instant;

use crate::event::{Key, ViewerEvent};
use crate::handlers::EventHandler;
use crate::hmd::HmdSession;
use crate::model::BoundingSphere;
use crate::scene::SceneRoot;
use crate::window::GraphicsContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// How frames are scheduled.
///
/// Only single-threaded execution is offered: neither the windowing layer
/// nor the VR runtime allow the context to be used from two threads, so
/// every traversal runs on the thread that owns the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadingModel {
    #[default]
    SingleThreaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerOptions {
    pub threading: ThreadingModel,
    /// Key whose press stops the loop.
    pub key_event_sets_done: Option<Key>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            threading: ThreadingModel::SingleThreaded,
            key_event_sets_done: Some(Key::Escape),
        }
    }
}

/// Runs once, when the context is realized.
pub trait RealizeOperation<S> {
    fn realize(&mut self, context: &mut dyn GraphicsContext, session: &mut S) -> Result<()>;
}

/// Hands the freshly realized context to the HMD session.
#[derive(Debug, Default, Clone, Copy)]
pub struct HmdRealizeOperation;

impl<S: HmdSession> RealizeOperation<S> for HmdRealizeOperation {
    fn realize(&mut self, context: &mut dyn GraphicsContext, session: &mut S) -> Result<()> {
        session.on_realize(context)
    }
}

/// Render loop over a borrowed graphics context.
///
/// Each frame runs realize (first frame only), event, update and rendering
/// traversals in that order. The event traversal rewrites a pending close
/// request into a quit before the default handling sees it, so the loop
/// never closes the window itself while interception is active.
pub struct Viewer<'c, C: GraphicsContext, S> {
    context: &'c mut C,
    session: S,
    options: ViewerOptions,
    intercept_close: bool,
    camera: Camera,
    manipulator: Option<Box<dyn CameraManipulator>>,
    manipulator_homed: bool,
    realize_operation: Option<Box<dyn RealizeOperation<S>>>,
    scene: Option<SceneRoot>,
    handlers: Vec<Box<dyn EventHandler<S>>>,
    state: LoopState,
    realized: bool,
    frame_number: u64,
    start: Instant,
}

impl<'c, C: GraphicsContext, S> Viewer<'c, C, S> {
    pub fn new(context: &'c mut C, session: S, options: ViewerOptions) -> Self {
        let intercept_close = context.is_valid() && context.as_window_mut().is_some();
        if !intercept_close {
            log::warn!("Graphics context has no usable window, close requests will not be intercepted");
        }

        Self {
            context,
            session,
            options,
            intercept_close,
            camera: Camera::new(),
            manipulator: None,
            manipulator_homed: false,
            realize_operation: None,
            scene: None,
            handlers: Vec::new(),
            state: LoopState::Running,
            realized: false,
            frame_number: 0,
            start: Instant::now(),
        }
    }

    pub fn threading_model(&self) -> ThreadingModel {
        self.options.threading
    }

    pub fn intercepts_close(&self) -> bool {
        self.intercept_close
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The manipulator is homed on the scene bound before the next update.
    pub fn set_camera_manipulator(&mut self, manipulator: impl CameraManipulator + 'static) {
        self.manipulator = Some(Box::new(manipulator));
        self.manipulator_homed = false;
    }

    pub fn set_realize_operation(&mut self, operation: impl RealizeOperation<S> + 'static) {
        self.realize_operation = Some(Box::new(operation));
    }

    pub fn set_scene_data(&mut self, scene: SceneRoot) {
        self.scene = Some(scene);
        self.manipulator_homed = false;
    }

    pub fn scene_data(&self) -> Option<&SceneRoot> {
        self.scene.as_ref()
    }

    pub fn add_event_handler(&mut self, handler: impl EventHandler<S> + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn done(&self) -> bool {
        self.state == LoopState::Stopped
    }

    pub fn set_done(&mut self) {
        self.stop("stop requested");
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Runs frames until the loop stops.
    pub fn run(&mut self) {
        log::info!("Entering render loop");
        while !self.done() {
            self.frame();
        }
        log::info!("Render loop finished after {} frames", self.frame_number);
    }

    pub fn frame(&mut self) {
        if self.done() {
            return;
        }
        if !self.realized {
            self.realize();
            if self.done() {
                return;
            }
        }

        self.event_traversal();
        if self.done() {
            return;
        }
        self.update_traversal();
        self.rendering_traversals();
        self.frame_number += 1;
    }

    /// Realizes the context and runs the realize operation once.
    pub fn realize(&mut self) {
        if self.realized {
            return;
        }
        self.realized = true;

        if !self.context.is_realized() {
            if let Err(err) = self.context.realize() {
                log::error!("Failed to realize graphics context: {:#}", err);
                self.stop("context could not be realized");
                return;
            }
        }

        if let Some(mut operation) = self.realize_operation.take() {
            if let Err(err) = operation.realize(&mut *self.context, &mut self.session) {
                log::error!("Realize operation failed: {:#}", err);
            }
        }
    }

    pub fn event_traversal(&mut self) {
        let intercept = self.intercept_close;
        if let Some(window) = self.context.as_window_mut() {
            if window.check_events() && intercept && intercept_close_request(window.event_queue()) {
                log::debug!("Close request rewritten to quit on frame {}", self.frame_number);
            }
        }
        self.default_event_traversal();
    }

    fn default_event_traversal(&mut self) {
        let intercept = self.intercept_close;
        let events = match self.context.as_window_mut() {
            Some(window) => {
                let queue = window.event_queue();
                // Close requests left over after interception wait for the next frame
                let (deferred, events): (Vec<_>, Vec<_>) = queue
                    .take_events()
                    .into_iter()
                    .partition(|event| intercept && matches!(event, ViewerEvent::CloseWindow));
                for event in deferred {
                    queue.push(event);
                }
                events
            }
            None => Vec::new(),
        };

        for event in &events {
            if let ViewerEvent::Resize { width, height } = event {
                self.camera.resize(*width, *height);
            }

            self.dispatch(event);

            match event {
                ViewerEvent::QuitApplication => self.stop("quit requested"),
                ViewerEvent::KeyDown(key) if Some(*key) == self.options.key_event_sets_done => {
                    self.stop("exit key pressed")
                }
                ViewerEvent::CloseWindow => {
                    if let Some(window) = self.context.as_window_mut() {
                        window.close();
                    }
                    self.stop("window closed");
                }
                _ => {}
            }
        }

        let frame = ViewerEvent::Frame {
            number: self.frame_number,
            time: self.start.elapsed().as_secs_f64(),
        };
        self.dispatch(&frame);
    }

    fn dispatch(&mut self, event: &ViewerEvent) {
        if let Some(manipulator) = self.manipulator.as_mut() {
            if manipulator.handle(event) {
                return;
            }
        }
        for handler in &mut self.handlers {
            if handler.handle(event, &mut self.session) {
                break;
            }
        }
    }

    fn update_traversal(&mut self) {
        let bound = self.scene.as_ref().map(SceneRoot::bound);
        if let Some(manipulator) = self.manipulator.as_mut() {
            if !self.manipulator_homed {
                let bound = bound.unwrap_or(BoundingSphere {
                    center: glam::Vec3::ZERO,
                    radius: -1.0,
                });
                manipulator.home(&bound, &self.camera);
                self.manipulator_homed = true;
            }
            manipulator.update_camera(&mut self.camera);
        }
        if let Some(bound) = bound {
            self.camera.update_clip_planes(&bound);
        }
    }

    fn rendering_traversals(&mut self) {
        let empty;
        let scene = match &self.scene {
            Some(scene) => scene,
            None => {
                empty = SceneRoot::new();
                &empty
            }
        };
        if let Err(err) = self.context.draw(scene, &self.camera) {
            log::error!("Frame {} failed to render: {:#}", self.frame_number, err);
        }
    }

    fn stop(&mut self, reason: &str) {
        if self.state == LoopState::Running {
            log::info!("Render loop stopping: {}", reason);
            self.state = LoopState::Stopped;
        }
    }

    /// Ends the loop's ownership of the session so it can be shut down.
    pub fn into_session(self) -> S {
        self.session
    }
}
