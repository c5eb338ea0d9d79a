mod pipeline;

use anyhow::{anyhow, Context as _, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowBuilder},
};

use crate::event::{EventQueue, ViewerEvent};
use crate::scene::SceneRoot;
use crate::viewer::Camera;
use crate::window::{
    ClearMask, ContextFactory, ContextTraits, GraphicsContext, GraphicsWindow, RenderTargetDesc,
    RenderTargetId,
};
use pipeline::{GpuMesh, MirrorPipeline};

const RENDER_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Desktop windows backed by winit and wgpu.
#[derive(Debug, Default)]
pub struct WgpuContextFactory;

impl ContextFactory for WgpuContextFactory {
    type Context = WgpuContext;

    fn create_graphics_context(&mut self, traits: &ContextTraits) -> Result<WgpuContext> {
        WgpuContext::new(traits)
    }
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    pipeline: MirrorPipeline,
    meshes: Option<Vec<GpuMesh>>,
    render_targets: HashMap<RenderTargetId, wgpu::Texture>,
    next_target: u32,
}

impl GpuState {
    async fn new(window: Arc<Window>, traits: &ContextTraits) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            dx12_shader_compiler: Default::default(),
            flags: wgpu::InstanceFlags::empty(),
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("Failed to find appropriate adapter"))?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Mirror Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if traits.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: if traits.double_buffer { 2 } else { 1 },
        };
        surface.configure(&device, &config);
        log::debug!("Surface configured: {:?} {}x{}", format, config.width, config.height);

        let depth_view = pipeline::create_depth_view(&device, config.width, config.height);
        let pipeline = MirrorPipeline::new(&device, format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            pipeline,
            meshes: None,
            render_targets: HashMap::new(),
            next_target: 0,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = pipeline::create_depth_view(&self.device, width, height);
    }

    fn draw(
        &mut self,
        scene: &SceneRoot,
        camera: &Camera,
        clear_color: [f32; 4],
        clear_mask: ClearMask,
    ) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring the next frame");
                return Ok(());
            }
            Err(err) => return Err(anyhow!("Failed to acquire frame: {}", err)),
        };

        let meshes = self
            .meshes
            .get_or_insert_with(|| self.pipeline.upload(&self.device, scene));
        self.pipeline.write_camera(&self.queue, camera);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Mirror Encoder"),
            });

        {
            let [r, g, b, a] = clear_color;
            let color_load = if clear_mask.color {
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                })
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if clear_mask.depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mirror Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Viewport has to stay inside the attachment
            let viewport = camera.viewport();
            let x = (viewport.x.max(0) as u32).min(self.config.width - 1);
            let y = (viewport.y.max(0) as u32).min(self.config.height - 1);
            let width = viewport.width.clamp(1, self.config.width - x);
            let height = viewport.height.clamp(1, self.config.height - y);
            render_pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);

            self.pipeline.render(&mut render_pass, meshes);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetId> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(anyhow!(
                "Render target '{}' has unsupported size {}x{} (max {})",
                desc.label,
                desc.width,
                desc.height,
                max
            ));
        }
        let sample_count = if desc.samples >= 4 { 4 } else { 1 };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: RENDER_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let id = RenderTargetId(self.next_target);
        self.next_target += 1;
        self.render_targets.insert(id, texture);
        log::debug!(
            "Created render target {:?} '{}' {}x{} x{}",
            id,
            desc.label,
            desc.width,
            desc.height,
            sample_count
        );
        Ok(id)
    }
}

/// A winit window with a wgpu surface.
///
/// Events are pumped on demand by [`GraphicsWindow::check_events`] instead
/// of handing control to the event loop, so the viewer keeps driving frames.
pub struct WgpuContext {
    traits: ContextTraits,
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    gpu: Option<GpuState>,
    events: EventQueue,
    clear_color: [f32; 4],
    clear_mask: ClearMask,
    realized: bool,
}

impl WgpuContext {
    pub fn new(traits: &ContextTraits) -> Result<Self> {
        let event_loop =
            EventLoop::new().map_err(|e| anyhow!("Failed to create event loop: {}", e))?;

        let window = WindowBuilder::new()
            .with_title(traits.window_name.clone())
            .with_inner_size(PhysicalSize::new(traits.width.max(1), traits.height.max(1)))
            .with_position(PhysicalPosition::new(traits.x, traits.y))
            .with_decorations(traits.window_decoration)
            .with_visible(false)
            .build(&event_loop)
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let gpu = pollster::block_on(GpuState::new(window.clone(), traits))?;
        log::info!(
            "Created window '{}' {}x{}",
            traits.window_name,
            gpu.config.width,
            gpu.config.height
        );

        Ok(Self {
            traits: traits.clone(),
            event_loop,
            window,
            gpu: Some(gpu),
            events: EventQueue::new(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_mask: ClearMask::default(),
            realized: false,
        })
    }
}

impl GraphicsWindow for WgpuContext {
    fn check_events(&mut self) -> bool {
        let window_id = self.window.id();
        let events = &mut self.events;
        let mut resized = None;

        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _elwt| {
                if let Event::WindowEvent { window_id: id, event } = event {
                    if id != window_id {
                        return;
                    }
                    if let WindowEvent::Resized(size) = &event {
                        resized = Some((size.width, size.height));
                    }
                    if let Some(event) = ViewerEvent::from_winit(&event) {
                        events.push(event);
                    }
                }
            });
        if let PumpStatus::Exit(code) = status {
            log::warn!("Window event loop exited with code {}", code);
        }

        if let (Some((width, height)), Some(gpu)) = (resized, self.gpu.as_mut()) {
            gpu.resize(width, height);
        }
        !self.events.is_empty()
    }

    fn event_queue(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    fn close(&mut self) {
        if self.gpu.take().is_some() {
            log::info!("Closing window '{}'", self.traits.window_name);
        }
        self.window.set_visible(false);
    }
}

impl GraphicsContext for WgpuContext {
    fn traits(&self) -> &ContextTraits {
        &self.traits
    }

    fn is_valid(&self) -> bool {
        self.gpu.is_some()
    }

    fn is_realized(&self) -> bool {
        self.realized && self.gpu.is_some()
    }

    fn realize(&mut self) -> Result<()> {
        if self.gpu.is_none() {
            return Err(anyhow!("Graphics context has been released"));
        }
        self.window.set_visible(true);
        self.realized = true;
        Ok(())
    }

    fn make_current(&mut self) -> bool {
        self.gpu.is_some()
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
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
        self.gpu
            .as_mut()
            .ok_or_else(|| anyhow!("Graphics context has been released"))?
            .create_render_target(desc)
    }

    fn release_render_target(&mut self, id: RenderTargetId) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        match gpu.render_targets.remove(&id) {
            Some(texture) => texture.destroy(),
            None => log::warn!("Unknown render target {:?}", id),
        }
    }

    fn draw(&mut self, scene: &SceneRoot, camera: &Camera) -> Result<()> {
        let (clear_color, clear_mask) = (self.clear_color(), self.clear_mask());
        match self.gpu.as_mut() {
            Some(gpu) => gpu.draw(scene, camera, clear_color, clear_mask),
            None => Ok(()),
        }
    }

    fn as_window_mut(&mut self) -> Option<&mut dyn GraphicsWindow> {
        Some(self)
    }
}
