use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::gfx::{ProgramId, Slots, Topology, VertexLayoutId};
use crate::paint::Color;

use super::context::{GpuBuffer, GpuLayout, GpuProgram, GpuStage};
use super::surface::{apply_resize, choose_alpha_mode, choose_surface_format, classify_surface_error};
use super::{GpuInit, SurfaceErrorAction};

/// A draw recorded by `draw_indexed` and replayed by `present`.
#[derive(Debug, Copy, Clone)]
pub(super) struct PendingDraw {
    pub layout: VertexLayoutId,
    pub program: ProgramId,
    pub topology: Topology,
    pub first_index: u32,
    pub index_count: u32,
}

/// wgpu device, window surface and every resource created through
/// [`GraphicsContext`](crate::gfx::GraphicsContext).
///
/// Draws issued during a frame are recorded and replayed in a single render
/// pass when the frame is presented. The recording buffer is reused across
/// frames.
pub struct Gpu<'w> {
    pub(super) window: &'w Window,
    pub(super) surface: wgpu::Surface<'w>,
    pub(super) device: wgpu::Device,
    pub(super) queue: wgpu::Queue,
    pub(super) config: wgpu::SurfaceConfiguration,
    pub(super) size: PhysicalSize<u32>,

    pub(super) stages: Slots<GpuStage>,
    pub(super) programs: Slots<GpuProgram>,
    pub(super) buffers: Slots<GpuBuffer>,
    pub(super) layouts: Slots<GpuLayout>,

    pub(super) current_program: Option<ProgramId>,
    pub(super) bound_layout: Option<VertexLayoutId>,

    pub(super) viewport: (u32, u32),
    pub(super) clear_color: Color,
    pub(super) clear_requested: bool,
    pub(super) draws: Vec<PendingDraw>,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode: choose_alpha_mode(&caps.alpha_modes, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        if size.width > 0 && size.height > 0 {
            surface.configure(&device, &config);
        }

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            size,
            stages: Slots::new(),
            programs: Slots::new(),
            buffers: Slots::new(),
            layouts: Slots::new(),
            current_program: None,
            bound_layout: None,
            viewport: (size.width, size.height),
            clear_color: Color::new(0.0, 0.0, 0.0, 0.0),
            clear_requested: false,
            draws: Vec::new(),
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn window(&self) -> &'w Window {
        self.window
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        apply_resize(&self.surface, &self.device, &mut self.config, new_size);
    }

    /// Acquires the surface texture, or says what to do instead.
    pub(super) fn acquire(&mut self) -> std::result::Result<wgpu::SurfaceTexture, SurfaceErrorAction> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(err) => {
                let action = classify_surface_error(&err);
                log::warn!("surface acquisition failed: {err} ({action:?})");
                if action == SurfaceErrorAction::Reconfigured && self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(&self.device, &self.config);
                }
                Err(action)
            }
        }
    }
}
