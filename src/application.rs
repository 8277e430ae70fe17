//! # Application Module
//!
//! The window shell and frame loop. Owns the graphics device and runs the
//! whole per-frame pipeline on the event-loop thread:
//!
//! 1. advance the camera from accumulated input,
//! 2. compute the required chunk set,
//! 3. dispatch generation for missing chunks,
//! 4. install finished meshes within the frame's time budget,
//! 5. prune chunks that left the required set,
//! 6. draw the frustum-visible remainder.
//!
//! Graphics initialization is deferred: window and device come up after
//! `resumed`, are sent back through the event-loop proxy, and the running
//! state is built from them.

use std::sync::Arc;

use cgmath::Deg;
use web_time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::camera::{Camera, CameraController, Projection};
use crate::rendering::frustum::Frustum;
use crate::rendering::{ChunkBuffers, TerrainRenderer};
use crate::streaming::{ChunkGenerator, ChunkScheduler, ChunkStore, INSTALL_BUDGET_MS};
use crate::world::noise_field::NoiseField;
use crate::world::required::required_chunks;

/// Graphics resources created during deferred initialization.
pub struct Graphics {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

/// Builds [`Graphics`] once the event loop is running and hands it back
/// through the proxy.
pub struct GraphicsBuilder {
    event_loop_proxy: Option<EventLoopProxy<Graphics>>,
}

impl GraphicsBuilder {
    /// Creates a builder that will report through `event_loop_proxy`.
    pub fn new(event_loop_proxy: EventLoopProxy<Graphics>) -> Self {
        GraphicsBuilder {
            event_loop_proxy: Some(event_loop_proxy),
        }
    }

    fn build_and_send(&mut self, event_loop: &ActiveEventLoop) {
        let Some(proxy) = self.event_loop_proxy.take() else {
            // Already built once; resumed can fire again on some platforms.
            return;
        };

        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title("voxel streamer"))
                .expect("failed to create window"),
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .expect("failed to create surface");

        let graphics = pollster::block_on(async move {
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .expect("no compatible adapter");

            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                    trace: wgpu::Trace::Off,
                })
                .await
                .expect("failed to acquire device");

            let size = window.inner_size();
            let surface_caps = surface.get_capabilities(&adapter);
            let surface_format = surface_caps
                .formats
                .iter()
                .find(|f| f.is_srgb())
                .copied()
                .unwrap_or(surface_caps.formats[0]);
            let surface_config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: surface_format,
                width: size.width.max(1),
                height: size.height.max(1),
                present_mode: surface_caps.present_modes[0],
                alpha_mode: surface_caps.alpha_modes[0],
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            };
            surface.configure(&device, &surface_config);

            Graphics {
                window,
                surface,
                surface_config,
                device,
                queue,
            }
        });

        if proxy.send_event(graphics).is_err() {
            log::error!("event loop closed before graphics were ready");
        }
    }
}

/// Graphics initialization state.
pub enum MaybeGraphics {
    /// Waiting for the event loop to come up.
    Builder(GraphicsBuilder),
    /// Resources handed off to the running state.
    Moved,
}

/// Top-level application driven by the winit event loop.
pub struct Application {
    graphics: MaybeGraphics,
    state: Option<RunningState>,
}

impl Application {
    /// Creates the application in its pre-graphics state.
    pub fn new(event_loop_proxy: EventLoopProxy<Graphics>) -> Self {
        Application {
            graphics: MaybeGraphics::Builder(GraphicsBuilder::new(event_loop_proxy)),
            state: None,
        }
    }
}

/// Everything the frame loop needs once graphics are up.
struct RunningState {
    graphics: Graphics,
    renderer: TerrainRenderer,
    camera: Camera,
    controller: CameraController,
    projection: Projection,
    scheduler: ChunkScheduler,
    store: ChunkStore<ChunkBuffers>,
    last_frame: Instant,
    last_diagnostics: Instant,
}

impl RunningState {
    fn new(graphics: Graphics) -> Self {
        let renderer = TerrainRenderer::new(
            &graphics.device,
            &graphics.queue,
            &graphics.surface_config,
        );
        let projection = Projection::new(
            graphics.surface_config.width,
            graphics.surface_config.height,
            Deg(45.0),
            0.1,
            10_000.0,
        );
        // Start above the terrain band, facing -Z.
        let camera = Camera::new((0.0, 100.0, 3.0), Deg(-90.0), Deg(0.0));
        let scheduler = ChunkScheduler::new(ChunkGenerator::Noise(NoiseField::new()));

        if let Err(error) = graphics
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| graphics.window.set_cursor_grab(CursorGrabMode::Confined))
        {
            log::warn!("cursor grab unavailable: {error}");
        }
        graphics.window.set_cursor_visible(false);

        RunningState {
            graphics,
            renderer,
            camera,
            controller: CameraController::new(),
            projection,
            scheduler,
            store: ChunkStore::new(),
            last_frame: Instant::now(),
            last_diagnostics: Instant::now(),
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.graphics.surface_config.width = size.width;
        self.graphics.surface_config.height = size.height;
        self.graphics
            .surface
            .configure(&self.graphics.device, &self.graphics.surface_config);
        self.projection.resize(size.width, size.height);
        self.renderer
            .resize(&self.graphics.device, &self.graphics.surface_config);
    }

    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        self.controller.update_camera(&mut self.camera, dt);

        let required = required_chunks(self.camera.position);

        let store = &self.store;
        self.scheduler.dispatch(&required, |pos| store.contains(pos));

        let device = &self.graphics.device;
        let chunk_layout = self.renderer.chunk_layout();
        self.store.install_ready(
            &required,
            Duration::from_millis(INSTALL_BUDGET_MS),
            self.scheduler.finished(),
            self.scheduler.pending(),
            |mesh| ChunkBuffers::upload(device, chunk_layout, mesh),
        );

        self.store.prune(&required);

        let view = self.camera.calc_matrix();
        let projection = self.projection.calc_matrix();
        let frustum = Frustum::from_view_projection(projection * view);
        self.renderer
            .update_globals(&self.graphics.queue, view, projection, self.camera.position);

        match self.renderer.render(
            &self.graphics.device,
            &self.graphics.queue,
            &self.graphics.surface,
            &self.store,
            &frustum,
        ) {
            Ok(chunks_drawn) => {
                if self.last_diagnostics.elapsed() >= Duration::from_secs(1) {
                    self.last_diagnostics = Instant::now();
                    log::debug!(
                        "tasks in flight: {}, pending: {}, active: {}, drawn: {}",
                        self.scheduler.in_flight_count(),
                        self.scheduler.pending().len(),
                        self.store.len(),
                        chunks_drawn,
                    );
                }
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.graphics.window.inner_size();
                self.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory, exiting");
                event_loop.exit();
            }
            Err(error) => {
                log::warn!("frame skipped: {error}");
            }
        }
    }
}

impl ApplicationHandler<Graphics> for Application {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let MaybeGraphics::Builder(builder) = &mut self.graphics {
            builder.build_and_send(event_loop);
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, graphics: Graphics) {
        self.state = Some(RunningState::new(graphics));
        self.graphics = MaybeGraphics::Moved;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            if matches!(event, WindowEvent::CloseRequested) {
                event_loop.exit();
            }
            return;
        };

        match event {
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::RedrawRequested => state.render_frame(event_loop),
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: key_state,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => {
                state.controller.process_keyboard(key, key_state);
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.controller.process_mouse(delta.0, delta.1);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.graphics.window.request_redraw();
        }
    }
}
