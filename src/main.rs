use clap::Parser;
use hmd_model_viewer::{
    config::{self, Args, ViewerConfig},
    error,
    gfx::WgpuContextFactory,
    hmd::openxr_device::OpenXrRuntime,
    scene::VrSceneComposer,
};

fn main() {
    config::init_logging();
    let config = ViewerConfig::from(Args::parse());

    let runtime = OpenXrRuntime::new();
    let mut contexts = WgpuContextFactory;
    let result = hmd_model_viewer::run(&config, &runtime, &mut contexts, &VrSceneComposer);

    std::process::exit(error::exit_code(&result));
}
