use crate::event::{EventQueue, ViewerEvent};

/// Rewrites the first pending `CloseWindow` into the quit signal.
///
/// Default close handling releases the rendering context. After this call
/// the loop leaves through the quit path instead and the context stays valid
/// for the cleanup that follows the loop. At most one close request is
/// rewritten per call; later ones stay queued, in order.
///
/// Returns whether a close request was rewritten.
pub fn intercept_close_request(queue: &mut EventQueue) -> bool {
    let mut events = queue.copy_events();
    let Some(index) = events
        .iter()
        .position(|event| matches!(event, ViewerEvent::CloseWindow))
    else {
        return false;
    };

    events.remove(index);
    queue.set_events(events);
    queue.quit_application();
    true
}
