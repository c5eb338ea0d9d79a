use crate::config::ViewerConfig;
use crate::error::{Outcome, StartupError};
use crate::handlers::{HmdEventHandler, StatsHandler};
use crate::hmd::{HmdRuntime, HmdSession};
use crate::model;
use crate::scene::SceneComposer;
use crate::viewer::{
    HmdRealizeOperation, NearFarMode, ThreadingModel, TrackballManipulator, Viewer, ViewerOptions,
    Viewport,
};
use crate::window::{ClearMask, ContextFactory, GraphicsContext};

const STATS_TARGET_FPS: u32 = 90;

/// Loads the scene, opens the HMD and its mirror window, runs the render
/// loop and shuts the session down against the still-open context.
pub fn run<R, F>(
    config: &ViewerConfig,
    runtime: &R,
    contexts: &mut F,
    composer: &dyn SceneComposer<R::Session>,
) -> Result<Outcome, StartupError>
where
    R: HmdRuntime,
    R::Session: 'static,
    F: ContextFactory,
{
    let Some(model) = model::load_scene(&config.paths, &config.default_model) else {
        log::info!(
            "No model could be loaded and didn't find {}, terminating..",
            config.default_model.display()
        );
        return Ok(Outcome::NothingToDisplay);
    };
    log::info!("Loaded '{}' with {} meshes", model.name, model.meshes.len());

    if !runtime.presence_detected() {
        let err = StartupError::NoHmd;
        log::error!("{}", err);
        return Err(err);
    }

    let session = runtime.initialize(&config.hmd).map_err(|cause| {
        // The session has already reported the cause
        log::debug!("HMD session could not be initialized: {:#}", cause);
        StartupError::SessionInit(cause)
    })?;

    let mut traits = session.suggested_context_traits();
    traits.window_name = config.window_title.clone();

    let mut context = contexts.create_graphics_context(&traits).map_err(|cause| {
        log::error!("Error, GraphicsWindow has not been created successfully: {:#}", cause);
        StartupError::ContextCreation(cause)
    })?;

    let (width, height) = (context.traits().width, context.traits().height);
    context.set_clear_color(config.clear_color);
    context.set_clear_mask(ClearMask::COLOR_DEPTH);

    let session = {
        let options = ViewerOptions {
            threading: ThreadingModel::SingleThreaded,
            ..ViewerOptions::default()
        };
        let mut viewer = Viewer::new(&mut context, session, options);

        let camera = viewer.camera_mut();
        camera.set_viewport(Viewport::new(0, 0, width, height));
        camera.set_clip_planes(config.hmd.near_clip, config.hmd.far_clip);
        camera.set_near_far_mode(NearFarMode::Fixed);

        viewer.set_camera_manipulator(TrackballManipulator::new());
        viewer.set_realize_operation(HmdRealizeOperation);

        let scene = composer.compose(model, viewer.session());
        viewer.set_scene_data(scene);

        viewer.add_event_handler(StatsHandler::new(STATS_TARGET_FPS));
        viewer.add_event_handler(HmdEventHandler);

        viewer.run();
        viewer.into_session()
    };

    session.shutdown(&mut context);
    log::info!("HMD session shut down");
    drop(context);

    Ok(Outcome::Completed)
}
