mod common;

use anyhow::{anyhow, Result};
use std::cell::Cell;
use std::rc::Rc;

use common::{CallLog, MockContext, MockSession, RecordingHandler};
use hmd_model_viewer::event::{Key, ViewerEvent};
use hmd_model_viewer::handlers::HmdEventHandler;
use hmd_model_viewer::hmd::{HmdParams, HmdSession};
use hmd_model_viewer::viewer::{
    HmdRealizeOperation, LoopState, RealizeOperation, ThreadingModel, Viewer, ViewerOptions,
};
use hmd_model_viewer::window::GraphicsContext;

fn session(log: &CallLog) -> MockSession {
    MockSession::new(log.clone(), HmdParams::default())
}

struct CountingRealize(Rc<Cell<u32>>);

impl RealizeOperation<MockSession> for CountingRealize {
    fn realize(&mut self, _context: &mut dyn GraphicsContext, _session: &mut MockSession) -> Result<()> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

struct FailingRealize;

impl RealizeOperation<MockSession> for FailingRealize {
    fn realize(&mut self, _context: &mut dyn GraphicsContext, _session: &mut MockSession) -> Result<()> {
        Err(anyhow!("eye buffers unavailable"))
    }
}

#[test_log::test]
fn test_close_request_stops_loop_within_one_frame() {
    let log = CallLog::default();
    let mut context = MockContext::new(
        log.clone(),
        vec![vec![ViewerEvent::KeyDown(Key::Char('a')), ViewerEvent::CloseWindow]],
    );

    let (handler, seen) = RecordingHandler::new();
    {
        let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
        assert!(viewer.intercepts_close());
        viewer.add_event_handler(handler);

        viewer.frame();
        assert_eq!(viewer.state(), LoopState::Stopped);
        // Update and render are skipped for the stopping frame
        assert_eq!(viewer.frame_number(), 0);

        viewer.frame();
        assert_eq!(viewer.frame_number(), 0);
    }

    assert!(!log.contains("close"));
    assert!(!log.contains("draw"));
    assert!(context.is_valid());

    let seen = seen.borrow();
    assert_eq!(seen[0], ViewerEvent::KeyDown(Key::Char('a')));
    assert_eq!(seen[1], ViewerEvent::QuitApplication);
    assert!(matches!(seen[2], ViewerEvent::Frame { number: 0, .. }));
    assert!(!seen.contains(&ViewerEvent::CloseWindow));
}

#[test_log::test]
fn test_second_close_in_same_frame_stays_queued() {
    let log = CallLog::default();
    let mut context = MockContext::new(
        log.clone(),
        vec![vec![
            ViewerEvent::CloseWindow,
            ViewerEvent::KeyDown(Key::Space),
            ViewerEvent::CloseWindow,
        ]],
    );

    let (handler, seen) = RecordingHandler::new();
    {
        let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
        viewer.add_event_handler(handler);
        viewer.run();
        assert!(viewer.done());
    }

    assert!(!log.contains("close"));
    assert!(context.is_valid());
    assert_eq!(context.pending(), vec![ViewerEvent::CloseWindow]);
    assert!(!seen.borrow().contains(&ViewerEvent::CloseWindow));
    assert!(seen.borrow().contains(&ViewerEvent::KeyDown(Key::Space)));
}

#[test_log::test]
fn test_escape_stops_loop() {
    let log = CallLog::default();
    let mut context = MockContext::new(
        log.clone(),
        vec![vec![], vec![ViewerEvent::KeyDown(Key::Escape)], vec![]],
    );

    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    viewer.run();

    assert_eq!(viewer.frame_number(), 1);
    drop(viewer);
    assert_eq!(log.count("draw"), 1);
    assert!(!log.contains("script exhausted"));
}

#[test_log::test]
fn test_exit_key_can_be_disabled() {
    let log = CallLog::default();
    let mut context = MockContext::new(log.clone(), vec![vec![ViewerEvent::KeyDown(Key::Escape)]]);

    let options = ViewerOptions {
        key_event_sets_done: None,
        ..ViewerOptions::default()
    };
    let mut viewer = Viewer::new(&mut context, session(&log), options);
    viewer.frame();
    assert_eq!(viewer.state(), LoopState::Running);
    assert_eq!(viewer.threading_model(), ThreadingModel::SingleThreaded);
}

#[test_log::test]
fn test_context_without_window_runs_default_traversal_only() {
    let log = CallLog::default();
    let mut context = MockContext::new(log.clone(), vec![vec![ViewerEvent::CloseWindow]]).without_window();

    let (handler, seen) = RecordingHandler::new();
    {
        let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
        assert!(!viewer.intercepts_close());
        viewer.add_event_handler(handler);

        for _ in 0..3 {
            viewer.frame();
        }
        assert_eq!(viewer.state(), LoopState::Running);
        assert_eq!(viewer.frame_number(), 3);

        viewer.set_done();
        assert!(viewer.done());
    }

    assert!(!log.contains("check_events"));
    assert_eq!(log.count("draw"), 3);
    let frames = seen
        .borrow()
        .iter()
        .filter(|e| matches!(e, ViewerEvent::Frame { .. }))
        .count();
    assert_eq!(frames, 3);
}

#[test_log::test]
fn test_invalid_context_uses_default_close_handling() {
    let log = CallLog::default();
    let mut context = MockContext::new(log.clone(), vec![vec![ViewerEvent::CloseWindow]]).invalid();

    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    assert!(!viewer.intercepts_close());
    viewer.frame();
    assert!(viewer.done());
    drop(viewer);

    assert_eq!(log.count("close"), 1);
}

#[test_log::test]
fn test_realize_operation_runs_once() {
    let log = CallLog::default();
    let mut context = MockContext::new(log.clone(), vec![vec![], vec![], vec![]]);
    let count = Rc::new(Cell::new(0));

    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    viewer.set_realize_operation(CountingRealize(count.clone()));
    viewer.run();

    assert_eq!(count.get(), 1);
    assert_eq!(viewer.frame_number(), 3);
    drop(viewer);
    assert_eq!(log.count("realize"), 1);
    assert_eq!(log.count("draw"), 3);
    assert!(log.contains("script exhausted"));
}

#[test_log::test]
fn test_hmd_realize_operation_sets_up_session() {
    let log = CallLog::default();
    let mut context = MockContext::new(log.clone(), vec![vec![ViewerEvent::QuitApplication]]);

    let session = {
        let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
        viewer.set_realize_operation(HmdRealizeOperation);
        viewer.run();
        viewer.into_session()
    };
    assert_eq!(log.count("session.on_realize"), 1);
    assert_eq!(context.live_targets().len(), 2);

    session.shutdown(&mut context);
    assert!(context.live_targets().is_empty());
    assert!(log.contains("session.shutdown valid=true"));
}

#[test_log::test]
fn test_failing_realize_operation_keeps_loop_running() {
    let log = CallLog::default();
    let mut context = MockContext::new(log.clone(), vec![vec![]]);

    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    viewer.set_realize_operation(FailingRealize);
    viewer.frame();
    assert_eq!(viewer.state(), LoopState::Running);
    assert_eq!(viewer.frame_number(), 1);
}

#[test_log::test]
fn test_unrealizable_context_stops_loop() {
    let log = CallLog::default();
    let mut context = MockContext::new(log.clone(), vec![vec![]]).failing_realize();

    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    viewer.run();
    assert!(viewer.done());
    drop(viewer);

    assert!(!log.contains("check_events"));
    assert!(!log.contains("draw"));
}

#[test_log::test]
fn test_handlers_run_in_order_and_can_consume() {
    let log = CallLog::default();
    let mut context = MockContext::new(
        log.clone(),
        vec![vec![ViewerEvent::KeyDown(Key::Char('x')), ViewerEvent::KeyUp(Key::Char('x'))]],
    );

    let (first, first_seen) = RecordingHandler::consuming(ViewerEvent::KeyDown(Key::Char('x')));
    let (second, second_seen) = RecordingHandler::new();

    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    viewer.add_event_handler(first);
    viewer.add_event_handler(second);
    viewer.frame();

    assert_eq!(first_seen.borrow()[0], ViewerEvent::KeyDown(Key::Char('x')));
    assert_eq!(first_seen.borrow()[1], ViewerEvent::KeyUp(Key::Char('x')));

    let second_seen = second_seen.borrow();
    assert!(!second_seen.contains(&ViewerEvent::KeyDown(Key::Char('x'))));
    assert_eq!(second_seen[0], ViewerEvent::KeyUp(Key::Char('x')));
    assert!(matches!(second_seen[1], ViewerEvent::Frame { number: 0, .. }));
}

#[test_log::test]
fn test_r_resets_sensor_orientation() {
    let log = CallLog::default();
    let mut context = MockContext::new(log.clone(), vec![vec![ViewerEvent::KeyDown(Key::Char('r'))]]);

    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    viewer.add_event_handler(HmdEventHandler);
    viewer.frame();
    drop(viewer);

    assert_eq!(log.count("session.reset"), 1);
}

#[test_log::test]
fn test_resize_updates_camera_viewport() {
    let log = CallLog::default();
    let mut context = MockContext::new(
        log.clone(),
        vec![vec![ViewerEvent::Resize { width: 800, height: 600 }]],
    );

    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    viewer.frame();
    let viewport = viewer.camera().viewport();
    assert_eq!((viewport.width, viewport.height), (800, 600));
}

#[test_log::test]
fn test_trackball_homes_outside_model_and_orbits_on_drag() {
    use assert_fs::prelude::*;
    use hmd_model_viewer::event::PointerButton;
    use hmd_model_viewer::model::read_node_file;
    use hmd_model_viewer::scene::{SceneComposer, VrSceneComposer};
    use hmd_model_viewer::viewer::TrackballManipulator;

    let temp = assert_fs::TempDir::new().unwrap();
    let cube = temp.child("cube.obj");
    cube.write_str(common::CUBE_OBJ).unwrap();
    let model = read_node_file(cube.path()).unwrap();

    let log = CallLog::default();
    let mut context = MockContext::new(
        log.clone(),
        vec![
            vec![],
            vec![
                ViewerEvent::PointerMove { x: 100.0, y: 100.0 },
                ViewerEvent::PointerButton {
                    button: PointerButton::Left,
                    pressed: true,
                },
                ViewerEvent::PointerMove { x: 180.0, y: 110.0 },
            ],
        ],
    );

    let (handler, seen) = RecordingHandler::new();
    let mut viewer = Viewer::new(&mut context, session(&log), ViewerOptions::default());
    let scene = VrSceneComposer.compose(model, viewer.session());
    let bound = scene.bound();
    viewer.set_scene_data(scene);
    viewer.set_camera_manipulator(TrackballManipulator::new());
    viewer.add_event_handler(handler);

    viewer.frame();
    let home_eye = viewer.camera().eye;
    assert!(home_eye.distance(bound.center) > bound.radius);
    assert_eq!(viewer.camera().target, bound.center);

    viewer.frame();
    let orbited_eye = viewer.camera().eye;
    assert!(orbited_eye.distance(home_eye) > 0.1);
    assert!(orbited_eye.distance(bound.center) > bound.radius);
    approx::assert_relative_eq!(
        orbited_eye.distance(bound.center),
        home_eye.distance(bound.center),
        epsilon = 1e-4
    );

    // The drag was consumed by the manipulator
    let seen = seen.borrow();
    assert!(!seen.contains(&ViewerEvent::PointerMove { x: 180.0, y: 110.0 }));
    assert!(seen.contains(&ViewerEvent::PointerMove { x: 100.0, y: 100.0 }));
}
