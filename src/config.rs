use clap::Parser;
use std::path::PathBuf;

use crate::hmd::HmdParams;

pub const DEFAULT_MODEL: &str = "cow.obj";
pub const WINDOW_TITLE: &str = "HmdModelViewer";
pub const CLEAR_COLOR: [f32; 4] = [0.2, 0.2, 0.4, 1.0];
/// Used when the filter variable is unset, so startup reports are visible.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Logger settings read from `var`, falling back to [`DEFAULT_LOG_FILTER`].
pub fn logger_env(var: &str) -> env_logger::Env<'_> {
    env_logger::Env::default().filter_or(var, DEFAULT_LOG_FILTER)
}

pub fn init_logging() {
    env_logger::Builder::from_env(logger_env(env_logger::DEFAULT_FILTER_ENV)).init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Shows models on a head mounted display", long_about = None)]
pub struct Args {
    /// Model files to load (.obj, .gltf, .glb)
    pub paths: Vec<PathBuf>,

    /// Loaded when none of the given paths can be read
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub default_model: PathBuf,

    #[arg(long, default_value_t = 0.01)]
    pub near_clip: f32,

    #[arg(long, default_value_t = 10000.0)]
    pub far_clip: f32,

    #[arg(long, default_value_t = 1.0)]
    pub units_per_metre: f32,

    /// Multisample count of the eye buffers
    #[arg(long, default_value_t = 4)]
    pub samples: u32,

    /// Mirror window title
    #[arg(long, default_value = WINDOW_TITLE)]
    pub title: String,
}

/// Everything `app::run` needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub paths: Vec<PathBuf>,
    pub default_model: PathBuf,
    pub hmd: HmdParams,
    pub window_title: String,
    pub clear_color: [f32; 4],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            default_model: PathBuf::from(DEFAULT_MODEL),
            hmd: HmdParams::default(),
            window_title: WINDOW_TITLE.to_string(),
            clear_color: CLEAR_COLOR,
        }
    }
}

impl From<Args> for ViewerConfig {
    fn from(args: Args) -> Self {
        Self {
            paths: args.paths,
            default_model: args.default_model,
            hmd: HmdParams {
                near_clip: args.near_clip,
                far_clip: args.far_clip,
                world_units_per_metre: args.units_per_metre,
                samples: args.samples,
            },
            window_title: args.title,
            clear_color: CLEAR_COLOR,
        }
    }
}
