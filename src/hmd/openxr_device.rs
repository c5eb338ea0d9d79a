use anyhow::Result;
use openxr as xr;

use super::{HmdParams, HmdRuntime, HmdSession};
use crate::window::{ContextTraits, GraphicsContext, RenderTargetDesc, RenderTargetId};

const APP_NAME: &str = "hmd-model-viewer";

fn create_instance(entry: &xr::Entry) -> Result<xr::Instance> {
    let available_extensions = entry
        .enumerate_extensions()
        .map_err(|err| anyhow::anyhow!("Failed to enumerate OpenXR extensions: {}", err))?;

    let mut enabled_extensions = xr::ExtensionSet::default();
    enabled_extensions.khr_vulkan_enable2 = available_extensions.khr_vulkan_enable2;

    let app_info = xr::ApplicationInfo {
        application_name: APP_NAME,
        application_version: 0,
        engine_name: APP_NAME,
        engine_version: 0,
    };

    entry
        .create_instance(&app_info, &enabled_extensions, &[])
        .map_err(|err| anyhow::anyhow!("Failed to create OpenXR instance: {}", err))
}

fn supports_stereo(instance: &xr::Instance, system: xr::SystemId) -> bool {
    instance
        .enumerate_view_configurations(system)
        .map(|configs| configs.contains(&xr::ViewConfigurationType::PRIMARY_STEREO))
        .unwrap_or(false)
}

/// OpenXR loader linked into the binary.
pub struct OpenXrRuntime {
    entry: xr::Entry,
}

impl OpenXrRuntime {
    pub fn new() -> Self {
        Self {
            entry: xr::Entry::linked(),
        }
    }
}

impl Default for OpenXrRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl HmdRuntime for OpenXrRuntime {
    type Session = OpenXrSession;

    fn presence_detected(&self) -> bool {
        let instance = match create_instance(&self.entry) {
            Ok(instance) => instance,
            Err(err) => {
                log::debug!("No OpenXR runtime: {}", err);
                return false;
            }
        };
        match instance.system(xr::FormFactor::HEAD_MOUNTED_DISPLAY) {
            Ok(system) => supports_stereo(&instance, system),
            Err(err) => {
                log::debug!("No head mounted display: {}", err);
                false
            }
        }
    }

    fn initialize(&self, params: &HmdParams) -> Result<OpenXrSession> {
        let init = || -> Result<OpenXrSession> {
            let instance = create_instance(&self.entry)?;
            let system = instance
                .system(xr::FormFactor::HEAD_MOUNTED_DISPLAY)
                .map_err(|err| anyhow::anyhow!("Failed to get system ID: {}", err))?;

            if !instance
                .enumerate_environment_blend_modes(system, xr::ViewConfigurationType::PRIMARY_STEREO)
                .unwrap_or_default()
                .iter()
                .any(|&blend_mode| blend_mode == xr::EnvironmentBlendMode::OPAQUE)
            {
                return Err(anyhow::anyhow!("OpenXR opaque blend mode not supported"));
            }

            let views = instance
                .enumerate_view_configuration_views(system, xr::ViewConfigurationType::PRIMARY_STEREO)
                .map_err(|err| anyhow::anyhow!("Failed to get view configuration: {}", err))?;
            let view = views
                .first()
                .copied()
                .ok_or_else(|| anyhow::anyhow!("Runtime reported no stereo views"))?;

            if let Ok(props) = instance.properties() {
                let version = props.runtime_version;
                log::info!(
                    "OpenXR runtime: {} {}.{}.{}",
                    props.runtime_name,
                    version.major(),
                    version.minor(),
                    version.patch()
                );
            }
            if let Ok(props) = instance.system_properties(system) {
                log::info!("HMD: {}", props.system_name);
            }

            let samples = params.samples.min(view.max_swapchain_sample_count.max(1));
            Ok(OpenXrSession {
                instance,
                params: HmdParams { samples, ..*params },
                eye_resolution: (
                    view.recommended_image_rect_width,
                    view.recommended_image_rect_height,
                ),
                eye_targets: Vec::new(),
            })
        };

        init().map_err(|err| {
            log::error!("Error: Unable to initialize the OpenXR session: {:#}", err);
            err
        })
    }
}

pub struct OpenXrSession {
    instance: xr::Instance,
    params: HmdParams,
    eye_resolution: (u32, u32),
    eye_targets: Vec<RenderTargetId>,
}

impl HmdSession for OpenXrSession {
    fn params(&self) -> &HmdParams {
        &self.params
    }

    fn eye_resolution(&self) -> (u32, u32) {
        self.eye_resolution
    }

    fn suggested_context_traits(&self) -> ContextTraits {
        mirror_traits(self.eye_resolution)
    }

    fn on_realize(&mut self, context: &mut dyn GraphicsContext) -> Result<()> {
        if !context.make_current() {
            return Err(anyhow::anyhow!("Graphics context is not usable"));
        }
        let (width, height) = self.eye_resolution;
        for eye in ["left", "right"] {
            let id = context.create_render_target(&RenderTargetDesc {
                label: format!("{} eye", eye),
                width,
                height,
                samples: self.params.samples,
            })?;
            self.eye_targets.push(id);
        }
        log::info!(
            "Created eye targets {}x{} with {} samples",
            width,
            height,
            self.params.samples
        );
        Ok(())
    }

    fn reset_sensor_orientation(&mut self) {
        // OpenXR recenters through the runtime's own UI
        log::info!("Sensor reset requested; use the runtime's recenter action");
    }

    fn shutdown(mut self, context: &mut dyn GraphicsContext) {
        if context.make_current() {
            for id in self.eye_targets.drain(..) {
                context.release_render_target(id);
            }
        } else if !self.eye_targets.is_empty() {
            log::error!("Graphics context released before HMD shutdown, eye targets leaked");
        }
        log::info!("Shutting down OpenXR instance");
        drop(self.instance);
    }
}

/// Desktop mirror window: both eyes side by side at half resolution.
pub fn mirror_traits(eye_resolution: (u32, u32)) -> ContextTraits {
    let (eye_width, eye_height) = eye_resolution;
    ContextTraits {
        width: eye_width.max(2),
        height: (eye_height / 2).max(1),
        samples: 0,
        vsync: false,
        ..ContextTraits::default()
    }
}
