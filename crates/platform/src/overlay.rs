//! egui integration: winit input in, wgpu paint jobs out.

use egui::{ClippedPrimitive, Context, TexturesDelta, ViewportId};
use egui_wgpu::ScreenDescriptor;
use renderer::Overlay;
use wgpu::{Device, TextureFormat};
use winit::{event::WindowEvent, window::Window};

pub struct EguiLayer {
    ctx: Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// One UI frame, tessellated and ready to paint.
pub struct UiFrame {
    primitives: Vec<ClippedPrimitive>,
    textures: TexturesDelta,
    pixels_per_point: f32,
}

impl EguiLayer {
    pub fn new(window: &Window, device: &Device, format: TextureFormat) -> Self {
        let ctx = Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            window.theme(),
            Some(device.limits().max_texture_dimension_2d as usize),
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Returns `true` if egui consumed the event.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn wants_keyboard(&self) -> bool {
        self.ctx.wants_keyboard_input()
    }

    pub fn pointer_over_ui(&self) -> bool {
        self.ctx.is_pointer_over_area() || self.ctx.wants_pointer_input()
    }

    pub fn run(&mut self, window: &Window, build: impl FnMut(&Context)) -> UiFrame {
        let input = self.state.take_egui_input(window);
        let output = self.ctx.run(input, build);
        self.state
            .handle_platform_output(window, output.platform_output);
        UiFrame {
            primitives: self.ctx.tessellate(output.shapes, output.pixels_per_point),
            textures: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        }
    }

    /// Paint `frame` over whatever the target already holds.
    pub fn paint(&mut self, target: Overlay<'_>, frame: UiFrame) {
        let screen = ScreenDescriptor {
            size_in_pixels: target.size,
            pixels_per_point: frame.pixels_per_point,
        };
        for (id, delta) in &frame.textures.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, delta);
        }
        let callbacks = self.renderer.update_buffers(
            target.device,
            target.queue,
            target.encoder,
            &frame.primitives,
            &screen,
        );
        if !callbacks.is_empty() {
            target.queue.submit(callbacks);
        }
        {
            let mut rpass = target
                .encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("EguiPass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();
            self.renderer
                .render(&mut rpass, &frame.primitives, &screen);
        }
        for id in &frame.textures.free {
            self.renderer.free_texture(id);
        }
    }
}
