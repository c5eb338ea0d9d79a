use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as WinitKey, NamedKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Space,
    Enter,
    Char(char),
    Other,
}

impl Key {
    pub fn from_winit(key: &WinitKey) -> Self {
        match key {
            WinitKey::Named(NamedKey::Escape) => Key::Escape,
            WinitKey::Named(NamedKey::Space) => Key::Space,
            WinitKey::Named(NamedKey::Enter) => Key::Enter,
            WinitKey::Character(text) => text
                .chars()
                .next()
                .map(|c| Key::Char(c.to_ascii_lowercase()))
                .unwrap_or(Key::Other),
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
    Other,
}

/// Events delivered to the viewer by the window system.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerMove { x: f32, y: f32 },
    PointerButton { button: PointerButton, pressed: bool },
    Scroll { dx: f32, dy: f32 },
    Resize { width: u32, height: u32 },
    /// The OS asked for the window to be closed.
    CloseWindow,
    /// Orderly termination of the render loop.
    QuitApplication,
    /// Emitted by the viewer once per frame after the queued events.
    Frame { number: u64, time: f64 },
}

impl ViewerEvent {
    /// Translates the winit events the viewer cares about.
    pub fn from_winit(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::CloseRequested => Some(ViewerEvent::CloseWindow),
            WindowEvent::Resized(size) => Some(ViewerEvent::Resize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput { event, .. } => {
                let key = Key::from_winit(&event.logical_key);
                Some(match event.state {
                    ElementState::Pressed => ViewerEvent::KeyDown(key),
                    ElementState::Released => ViewerEvent::KeyUp(key),
                })
            }
            WindowEvent::CursorMoved { position, .. } => Some(ViewerEvent::PointerMove {
                x: position.x as f32,
                y: position.y as f32,
            }),
            WindowEvent::MouseInput { state, button, .. } => Some(ViewerEvent::PointerButton {
                button: match button {
                    MouseButton::Left => PointerButton::Left,
                    MouseButton::Right => PointerButton::Right,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => PointerButton::Other,
                },
                pressed: *state == ElementState::Pressed,
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                    MouseScrollDelta::PixelDelta(p) => (p.x as f32, p.y as f32),
                };
                Some(ViewerEvent::Scroll { dx, dy })
            }
            _ => None,
        }
    }
}

/// Ordered queue of pending window events.
///
/// The quit signal is kept apart from the queued events: raising it several
/// times before the next drain still yields a single `QuitApplication`.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<ViewerEvent>,
    quit_requested: bool,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ViewerEvent) {
        self.events.push(event);
    }

    pub fn close_window(&mut self) {
        self.push(ViewerEvent::CloseWindow);
    }

    pub fn copy_events(&self) -> Vec<ViewerEvent> {
        self.events.clone()
    }

    pub fn set_events(&mut self, events: Vec<ViewerEvent>) {
        self.events = events;
    }

    pub fn quit_application(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.quit_requested
    }

    /// Drains the queue. A raised quit signal is appended as one trailing
    /// `QuitApplication` and cleared.
    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        let mut events = std::mem::take(&mut self.events);
        if std::mem::take(&mut self.quit_requested) {
            events.push(ViewerEvent::QuitApplication);
        }
        events
    }
}
