#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use hmd_model_viewer::event::{EventQueue, ViewerEvent};
use hmd_model_viewer::handlers::EventHandler;
use hmd_model_viewer::hmd::{HmdParams, HmdRuntime, HmdSession};
use hmd_model_viewer::scene::SceneRoot;
use hmd_model_viewer::viewer::Camera;
use hmd_model_viewer::window::{
    ClearMask, ContextFactory, ContextTraits, GraphicsContext, GraphicsWindow, RenderTargetDesc,
    RenderTargetId,
};

pub const CUBE_OBJ: &str = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
f 1 2 3 4
f 5 6 7 8
f 1 2 6 5
f 2 3 7 6
f 3 4 8 7
f 4 1 5 8
";

/// Ordered record of every collaborator call, shared by all mocks of a test.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.borrow_mut().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.borrow().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.count(call) > 0
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.0.borrow().iter().position(|c| c == call)
    }

    pub fn last_position(&self, call: &str) -> Option<usize> {
        self.0.borrow().iter().rposition(|c| c == call)
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Context whose window delivers one scripted batch of events per
/// `check_events`. Once the script runs out it delivers a quit so loops
/// always end.
pub struct MockContext {
    pub log: CallLog,
    traits: ContextTraits,
    frames: VecDeque<Vec<ViewerEvent>>,
    queue: EventQueue,
    has_window: bool,
    valid: bool,
    realized: bool,
    fail_realize: bool,
    clear_color: [f32; 4],
    clear_mask: ClearMask,
    targets: Vec<RenderTargetId>,
    next_target: u32,
}

impl MockContext {
    pub fn new(log: CallLog, frames: Vec<Vec<ViewerEvent>>) -> Self {
        Self {
            log,
            traits: ContextTraits::default(),
            frames: frames.into(),
            queue: EventQueue::new(),
            has_window: true,
            valid: true,
            realized: false,
            fail_realize: false,
            clear_color: [0.0; 4],
            clear_mask: ClearMask::NONE,
            targets: Vec::new(),
            next_target: 0,
        }
    }

    pub fn with_traits(mut self, traits: ContextTraits) -> Self {
        self.traits = traits;
        self
    }

    pub fn without_window(mut self) -> Self {
        self.has_window = false;
        self
    }

    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    pub fn failing_realize(mut self) -> Self {
        self.fail_realize = true;
        self
    }

    pub fn live_targets(&self) -> &[RenderTargetId] {
        &self.targets
    }

    pub fn pending(&self) -> Vec<ViewerEvent> {
        self.queue.copy_events()
    }
}

impl GraphicsWindow for MockContext {
    fn check_events(&mut self) -> bool {
        self.log.push("check_events");
        match self.frames.pop_front() {
            Some(events) => {
                for event in events {
                    self.queue.push(event);
                }
            }
            None => {
                self.log.push("script exhausted");
                self.queue.push(ViewerEvent::QuitApplication);
            }
        }
        !self.queue.is_empty()
    }

    fn event_queue(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    fn close(&mut self) {
        self.log.push("close");
        self.valid = false;
    }
}

impl GraphicsContext for MockContext {
    fn traits(&self) -> &ContextTraits {
        &self.traits
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn is_realized(&self) -> bool {
        self.realized
    }

    fn realize(&mut self) -> Result<()> {
        self.log.push("realize");
        if self.fail_realize {
            return Err(anyhow!("no display"));
        }
        self.realized = true;
        Ok(())
    }

    fn make_current(&mut self) -> bool {
        self.valid
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.log.push(format!("set_clear_color {:?}", color));
        self.clear_color = color;
    }

    fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    fn set_clear_mask(&mut self, mask: ClearMask) {
        self.clear_mask = mask;
    }

    fn clear_mask(&self) -> ClearMask {
        self.clear_mask
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetId> {
        if !self.valid {
            return Err(anyhow!("context released"));
        }
        self.log.push(format!("create_target {}", desc.label));
        let id = RenderTargetId(self.next_target);
        self.next_target += 1;
        self.targets.push(id);
        Ok(id)
    }

    fn release_render_target(&mut self, id: RenderTargetId) {
        self.log.push("release_target");
        self.targets.retain(|t| *t != id);
    }

    fn draw(&mut self, _scene: &SceneRoot, camera: &Camera) -> Result<()> {
        self.log.push("draw");
        let viewport = camera.viewport();
        self.log.push(format!("viewport {}x{}", viewport.width, viewport.height));
        Ok(())
    }

    fn as_window_mut(&mut self) -> Option<&mut dyn GraphicsWindow> {
        if self.has_window {
            Some(self)
        } else {
            None
        }
    }
}

pub struct MockSession {
    log: CallLog,
    params: HmdParams,
    targets: Vec<RenderTargetId>,
}

impl MockSession {
    pub fn new(log: CallLog, params: HmdParams) -> Self {
        Self {
            log,
            params,
            targets: Vec::new(),
        }
    }
}

impl HmdSession for MockSession {
    fn params(&self) -> &HmdParams {
        &self.params
    }

    fn eye_resolution(&self) -> (u32, u32) {
        (1000, 1100)
    }

    fn suggested_context_traits(&self) -> ContextTraits {
        ContextTraits {
            window_name: "suggested".to_string(),
            width: 1000,
            height: 550,
            ..ContextTraits::default()
        }
    }

    fn on_realize(&mut self, context: &mut dyn GraphicsContext) -> Result<()> {
        self.log.push("session.on_realize");
        for eye in ["left", "right"] {
            let desc = RenderTargetDesc {
                label: eye.to_string(),
                width: 1000,
                height: 1100,
                samples: self.params.samples,
            };
            self.targets.push(context.create_render_target(&desc)?);
        }
        Ok(())
    }

    fn reset_sensor_orientation(&mut self) {
        self.log.push("session.reset");
    }

    fn shutdown(self, context: &mut dyn GraphicsContext) {
        self.log
            .push(format!("session.shutdown valid={}", context.is_valid()));
        for id in self.targets {
            context.release_render_target(id);
        }
    }
}

pub struct MockRuntime {
    pub log: CallLog,
    pub present: bool,
    pub init_fails: bool,
}

impl MockRuntime {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            present: true,
            init_fails: false,
        }
    }
}

impl HmdRuntime for MockRuntime {
    type Session = MockSession;

    fn presence_detected(&self) -> bool {
        self.log.push("runtime.presence");
        self.present
    }

    fn initialize(&self, params: &HmdParams) -> Result<MockSession> {
        self.log.push("runtime.initialize");
        if self.init_fails {
            return Err(anyhow!("device busy"));
        }
        Ok(MockSession::new(self.log.clone(), *params))
    }
}

pub struct MockFactory {
    pub log: CallLog,
    pub fails: bool,
    pub frames: Vec<Vec<ViewerEvent>>,
}

impl MockFactory {
    pub fn new(log: CallLog, frames: Vec<Vec<ViewerEvent>>) -> Self {
        Self {
            log,
            fails: false,
            frames,
        }
    }
}

impl ContextFactory for MockFactory {
    type Context = MockContext;

    fn create_graphics_context(&mut self, traits: &ContextTraits) -> Result<MockContext> {
        self.log.push(format!("factory.create {}", traits.window_name));
        if self.fails {
            return Err(anyhow!("no adapter"));
        }
        Ok(MockContext::new(self.log.clone(), std::mem::take(&mut self.frames))
            .with_traits(traits.clone()))
    }
}

/// Records what it sees; optionally consumes one kind of event.
pub struct RecordingHandler {
    pub seen: Rc<RefCell<Vec<ViewerEvent>>>,
    pub consumes: Option<ViewerEvent>,
}

impl RecordingHandler {
    pub fn new() -> (Self, Rc<RefCell<Vec<ViewerEvent>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                seen: seen.clone(),
                consumes: None,
            },
            seen,
        )
    }

    pub fn consuming(event: ViewerEvent) -> (Self, Rc<RefCell<Vec<ViewerEvent>>>) {
        let (mut handler, seen) = Self::new();
        handler.consumes = Some(event);
        (handler, seen)
    }
}

impl<S> EventHandler<S> for RecordingHandler {
    fn handle(&mut self, event: &ViewerEvent, _session: &mut S) -> bool {
        self.seen.borrow_mut().push(event.clone());
        self.consumes.as_ref() == Some(event)
    }
}
