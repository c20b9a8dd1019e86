mod panel;

use anyhow::{Context as _, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};
use wobble_assets::{DEFAULT_MAX_SIZE, EnvironmentMap};
use wobble_mesh::{IndexedMesh, build_icosphere};
use wobble_render_wgpu::{OrbitCamera, Viewport, WobbleRenderer};
use wobble_shading::{FrameClock, SceneSettings, neighbour_shift_ok};

#[derive(Parser)]
#[command(name = "wobble-desktop", about = "Wobbling sphere viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Equirectangular environment image (PNG, JPEG or HDR)
    #[arg(long)]
    environment: Option<PathBuf>,

    /// YAML preset to start from
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Icosphere subdivision level
    #[arg(long, default_value = "50")]
    detail: u32,

    /// Icosphere radius
    #[arg(long, default_value = "2.5")]
    radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Everything that survives losing the GPU.
struct AppState {
    settings: SceneSettings,
    camera: OrbitCamera,
    clock: FrameClock,
    drag: Option<Drag>,
    mesh: IndexedMesh,
    environment: EnvironmentMap,
}

impl AppState {
    fn new(settings: SceneSettings, mesh: IndexedMesh, environment: EnvironmentMap) -> Self {
        Self {
            settings,
            camera: OrbitCamera::default(),
            clock: FrameClock::new(),
            drag: None,
            mesh,
            environment,
        }
    }

    /// Start or end an orbit drag. Presses over the panel belong to egui, but
    /// a release always ends the drag wherever the pointer is.
    fn pointer_button(&mut self, button: MouseButton, pressed: bool, over_panel: bool) {
        let drag = match button {
            MouseButton::Left => Some(Drag::Rotate),
            MouseButton::Right | MouseButton::Middle => Some(Drag::Pan),
            _ => None,
        };
        if !pressed {
            if drag == self.drag {
                self.drag = None;
            }
        } else if !over_panel {
            self.drag = drag.or(self.drag);
        }
    }

    fn update(&mut self) {
        self.settings.wobble.time = self.clock.elapsed();
        self.camera.update();
    }
}

/// GPU-side state, created once the window exists.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    viewport: Viewport,
    renderer: WobbleRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, state: &mut AppState) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Wobble")
            .with_inner_size(LogicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("wobble_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let samples = state.settings.renderer.msaa_samples;
        if !adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(samples)
        {
            tracing::warn!("{samples}x MSAA unsupported for {surface_format:?}, rendering without");
            state.settings.renderer.msaa_samples = 1;
        }

        let size = window.inner_size();
        let viewport = Viewport::new(
            size.width,
            size.height,
            window.scale_factor() as f32,
            state.settings.renderer.max_pixel_ratio,
        );
        let (width, height) = viewport.render_size();
        let (surface_width, surface_height) = viewport.surface_size();

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: surface_width,
            height: surface_height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        state.camera.aspect = viewport.aspect();

        let renderer = WobbleRenderer::new(
            &device,
            &queue,
            surface_format,
            width,
            height,
            &state.mesh,
            &state.environment,
            &state.settings,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend, rendering {width}x{height} at pixel ratio {}",
            adapter.get_info().backend.to_str(),
            viewport.pixel_ratio()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            viewport,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, viewport: Viewport, camera: &mut OrbitCamera) {
        self.viewport = viewport;
        let (surface_width, surface_height) = viewport.surface_size();
        self.config.width = surface_width;
        self.config.height = surface_height;
        self.surface.configure(&self.device, &self.config);
        let (width, height) = viewport.render_size();
        self.renderer.resize(&self.device, width, height);
        camera.aspect = viewport.aspect();
    }

    fn redraw(&mut self, egui_ctx: &EguiContext, state: &mut AppState) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            if panel::draw_panel(ctx, &mut state.settings) {
                tracing::trace!("settings changed");
            }
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &state.camera,
            &state.settings,
        );

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
        self.window.request_redraw();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &mut self.state) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if let WindowEvent::MouseInput { button, state, .. } = event {
            self.state
                .pointer_button(button, state == ElementState::Pressed, response.consumed);
        }
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                let viewport = Viewport::new(
                    new_size.width,
                    new_size.height,
                    gpu.window.scale_factor() as f32,
                    self.state.settings.renderer.max_pixel_ratio,
                );
                gpu.resize(viewport, &mut self.state.camera);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let viewport = Viewport {
                    scale_factor: scale_factor as f32,
                    ..gpu.viewport
                };
                gpu.resize(viewport, &mut self.state.camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                self.state.camera.zoom(steps);
            }
            WindowEvent::RedrawRequested => {
                self.state.update();
                gpu.redraw(&self.egui_ctx, &mut self.state);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        let DeviceEvent::MouseMotion { delta } = event else {
            return;
        };
        let Some(gpu) = &self.gpu else {
            return;
        };
        let height = gpu.window.inner_size().height as f32;
        let (dx, dy) = (delta.0 as f32, delta.1 as f32);
        match self.state.drag {
            Some(Drag::Rotate) => self.state.camera.rotate(dx, dy, height),
            Some(Drag::Pan) => self.state.camera.pan(dx, dy, height),
            None => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("wobble-desktop starting");

    let settings = match &cli.preset {
        Some(path) => SceneSettings::load_preset(path)?,
        None => SceneSettings::default(),
    };

    let mesh = build_icosphere(cli.radius, cli.detail);
    match mesh.min_edge_length() {
        Some(edge) if neighbour_shift_ok(edge) => {
            tracing::debug!("shortest edge {edge:.4}, neighbour step fits");
        }
        Some(edge) => tracing::warn!(
            "shortest edge {edge:.4} is close to the neighbour step; normals may look faceted"
        ),
        None => anyhow::bail!("icosphere has no triangles"),
    }

    let environment = EnvironmentMap::load_or_procedural(cli.environment.as_deref(), DEFAULT_MAX_SIZE);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(settings, mesh, environment));
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_defaults() {
        Cli::command().debug_assert();
        let cli = Cli::try_parse_from(["wobble-desktop"]).unwrap();
        assert_eq!(cli.detail, 50);
        assert_eq!(cli.radius, 2.5);
        assert!(cli.environment.is_none());
    }

    fn test_state() -> AppState {
        AppState::new(
            SceneSettings::default(),
            build_icosphere(1.0, 1),
            EnvironmentMap::procedural(),
        )
    }

    #[test]
    fn release_over_panel_ends_drag() {
        let mut state = test_state();
        state.pointer_button(MouseButton::Left, true, false);
        assert_eq!(state.drag, Some(Drag::Rotate));
        state.pointer_button(MouseButton::Left, false, true);
        assert_eq!(state.drag, None);
    }

    #[test]
    fn press_over_panel_does_not_start_drag() {
        let mut state = test_state();
        state.pointer_button(MouseButton::Right, true, true);
        assert_eq!(state.drag, None);
        state.pointer_button(MouseButton::Right, true, false);
        assert_eq!(state.drag, Some(Drag::Pan));
        // Releasing a different button keeps the pan going.
        state.pointer_button(MouseButton::Left, false, false);
        assert_eq!(state.drag, Some(Drag::Pan));
    }

    #[test]
    fn state_update_drives_time() {
        let mut state = test_state();
        std::thread::sleep(std::time::Duration::from_millis(2));
        state.update();
        assert!(state.settings.wobble.time > 0.0);
    }
}
