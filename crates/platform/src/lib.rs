//! Platform layer: winit event loop, GPU state, egui UI and the bridge
//! from the background model load to the UI thread.

mod input;
mod overlay;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use asset::{LoadEvent, LoadTask};
use renderer::{FilterParams, GpuState};
use viewer::{Shortcut, Viewer, ViewerConfig};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::Key,
    window::{Window, WindowId},
};

use input::OrbitInput;
use overlay::EguiLayer;
use ui::UiState;

/// Window and GPU options that are not part of the viewer configuration.
#[derive(Clone, Copy, Debug)]
pub struct WindowOptions {
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
}

/// Open the viewer window, load the configured model and run until the
/// window is closed.
pub fn run(config: ViewerConfig, options: WindowOptions) -> Result<()> {
    let event_loop = EventLoop::<LoadEvent>::with_user_event()
        .build()
        .context("Failed to create event loop")?;

    let mut app = App::new(Viewer::new(config), options);
    app.start_load(event_loop.create_proxy())?;

    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Gfx {
    window: Arc<Window>,
    gpu: GpuState,
    egui: EguiLayer,
}

struct App {
    viewer: Viewer,
    options: WindowOptions,
    gfx: Option<Gfx>,
    ui: UiState,
    orbit_input: OrbitInput,
    /// Keeps the loader alive; dropping it cancels the load.
    load: Option<LoadTask>,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(viewer: Viewer, options: WindowOptions) -> Self {
        Self {
            viewer,
            options,
            gfx: None,
            ui: UiState::default(),
            orbit_input: OrbitInput::default(),
            load: None,
            fatal: None,
        }
    }

    fn start_load(&mut self, proxy: EventLoopProxy<LoadEvent>) -> Result<()> {
        let config = self.viewer.config();
        log::info!(
            "Loading {} + {} from {}",
            config.obj_file,
            config.mtl_file,
            config.base_url
        );
        let source = asset::source_for(&config.base_url)?;
        let opts = config.load_options();
        self.viewer.begin_load();
        let task = LoadTask::spawn(source, opts, move |event| {
            // The loop is gone once the window closed; nothing left to notify.
            let _ = proxy.send_event(event);
        })?;
        self.load = Some(task);
        Ok(())
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Meshview")
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(window.clone(), self.options.backends))
            .context("Failed to initialise GPU")?;
        let egui = EguiLayer::new(&window, gpu.device(), gpu.surface_format());
        let (w, h) = gpu.size();
        self.viewer.resize(w, h);
        self.gfx = Some(Gfx { window, gpu, egui });
        Ok(())
    }

    fn handle_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Progress(p) => self.viewer.on_progress(p),
            LoadEvent::Finished(result) => {
                self.viewer.on_load_finished(result);
                self.load = None;
            }
        }
        self.upload_pending();
        if let Some(gfx) = &self.gfx {
            gfx.window.request_redraw();
        }
    }

    /// Move a freshly installed model onto the GPU, once graphics exist.
    fn upload_pending(&mut self) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        if let Some(upload) = self.viewer.take_upload() {
            gfx.gpu.upload_model(&upload.meshes, &upload.textures);
        }
    }

    fn on_key(&mut self, key: &Key) {
        let Key::Character(text) = key else {
            return;
        };
        if let Some(shortcut) = text.chars().next().and_then(Shortcut::from_char) {
            self.viewer.handle_shortcut(shortcut);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        self.viewer.tick();

        let viewer = &mut self.viewer;
        let ui_state = &mut self.ui;
        let frame = gfx
            .egui
            .run(&gfx.window, |ctx| ui::draw(ctx, viewer, ui_state));

        let filter = self.viewer.image_filter();
        let params = FilterParams {
            saturate: filter.saturate,
            contrast: filter.contrast,
            brightness: filter.brightness,
        };
        let egui = &mut gfx.egui;
        let result = gfx.gpu.render(
            &self.viewer.scene,
            &self.viewer.camera,
            params,
            |target| egui.paint(target, frame),
        );
        match result {
            Ok(()) => {}
            Err(err) if err.is_surface_lost() => gfx.gpu.recreate_surface(),
            Err(renderer::RendererError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface timeout, skipping frame");
            }
            Err(err) => {
                log::error!("Render failed: {err}");
                self.fatal = Some(err.into());
                event_loop.exit();
                return;
            }
        }
        gfx.window.request_redraw();
    }
}

impl ApplicationHandler<LoadEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        if let Err(err) = self.init_graphics(event_loop) {
            log::error!("{err:#}");
            self.fatal = Some(err);
            event_loop.exit();
            return;
        }
        self.upload_pending();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: LoadEvent) {
        self.handle_load_event(event);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        let consumed = gfx.egui.on_window_event(&gfx.window, &event);
        let over_ui = gfx.egui.pointer_over_ui();
        let wants_keyboard = gfx.egui.wants_keyboard();
        let height = gfx.gpu.size().1 as f32;

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                if let Some(task) = self.load.take() {
                    task.cancel();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::debug!("Resized: {}x{}", size.width, size.height);
                gfx.gpu.resize(size.width, size.height);
                let (w, h) = gfx.gpu.size();
                self.viewer.resize(w, h);
                gfx.window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {scale_factor:.3}");
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::KeyboardInput { event, .. }
                if !consumed
                    && !wants_keyboard
                    && event.state == ElementState::Pressed
                    && !event.repeat =>
            {
                self.on_key(&event.logical_key);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let allow = !consumed && !over_ui && self.viewer.is_loaded();
                self.orbit_input.on_button(button, state, allow);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.orbit_input.on_cursor_moved(
                    position.x,
                    position.y,
                    height,
                    &mut self.viewer.orbit,
                    &self.viewer.camera,
                );
            }
            WindowEvent::CursorLeft { .. } => self.orbit_input.on_cursor_left(),
            WindowEvent::MouseWheel { delta, .. } if !consumed && !over_ui => {
                self.orbit_input.on_wheel(delta, &mut self.viewer.orbit);
            }
            _ => {}
        }
    }
}
