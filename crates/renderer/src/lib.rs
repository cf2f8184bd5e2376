//! Renderer: wgpu init, model upload, scene pass into offscreen targets,
//! image-filter pass onto the surface, and an overlay hook for UI.
//! wgpu = 23.x, winit = 0.30.x

mod grid;
mod mesh;
mod pipelines;
mod post;
mod uniforms;

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use asset::{mesh::MeshData, texture::TextureData};
use corelib::{
    camera::Camera,
    material::{Material, MaterialSlot, TextureId},
    scene::{Grid, NodeId, Scene},
};
use glam::{Mat4, Vec3};
use thiserror::Error;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    Buffer, BufferBindingType, BufferUsages, CommandEncoder, CommandEncoderDescriptor, Device,
    DeviceDescriptor, Features, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PowerPreference, PresentMode, Queue, RenderPassColorAttachment, RenderPassDescriptor,
    Sampler, SamplerBindingType, ShaderStages, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureFormat, TextureSampleType, TextureUsages, TextureView,
    TextureViewDimension, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use grid::{Vertex, grid_lines};
pub use mesh::{GpuVertex, gpu_vertices};
pub use pipelines::PipelineKey;

use mesh::{GpuMesh, GpuTexture};
use pipelines::ScenePipelines;
use post::{FilterPass, FrameTargets};
use uniforms::{DrawUniform, FrameUniform};

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

impl RendererError {
    /// Lost/outdated surfaces are fixed by reconfiguring.
    pub fn is_surface_lost(&self) -> bool {
        matches!(self, RendererError::Surface(SurfaceError::Lost | SurfaceError::Outdated))
    }
}

/// Whole-frame color filter, factors of 1.0 leave the image unchanged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    pub saturate: f32,
    pub contrast: f32,
    pub brightness: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            saturate: 1.0,
            contrast: 1.0,
            brightness: 1.0,
        }
    }
}

/// Handed to the overlay callback after the filtered frame is written.
/// Overlays draw with `LoadOp::Load` on `view`.
pub struct Overlay<'a> {
    pub device: &'a Device,
    pub queue: &'a Queue,
    pub encoder: &'a mut CommandEncoder,
    pub view: &'a TextureView,
    pub size: [u32; 2],
}

/// Per-draw uniform buffer and the bind group that pairs it with a map.
struct DrawBinding {
    buffer: Buffer,
    bind_group: BindGroup,
    map: Option<TextureId>,
}

struct DrawItem {
    key: (NodeId, usize),
    pipeline: PipelineKey,
    indices: std::ops::Range<u32>,
    /// View-space depth of the mesh center; larger is closer.
    view_z: f32,
}

struct GridLines {
    grid: Grid,
    buffer: Buffer,
    count: u32,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_format: TextureFormat,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Frame uniform
    frame_buf: Buffer,
    frame_bg: BindGroup,
    draw_bgl: BindGroupLayout,

    pipelines: ScenePipelines,
    targets: FrameTargets,
    filter: FilterPass,

    // Model resources
    sampler: Sampler,
    white: GpuTexture,
    meshes: HashMap<NodeId, GpuMesh>,
    textures: Vec<GpuTexture>,
    draws: HashMap<(NodeId, usize), DrawBinding>,
    grid: Option<GridLines>,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> Result<Self, RendererError> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?}, {:?})", info.name, info.backend, info.device_type);

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Meshview Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RendererError::NoSurfaceFormat)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!("Surface configured: {surface_format:?} {width}x{height}");

        // ==== Bind group layouts ====
        let frame_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Frame BGL"),
            entries: &[uniform_entry::<FrameUniform>(0, ShaderStages::VERTEX_FRAGMENT)],
        });
        let draw_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Draw BGL"),
            entries: &[
                uniform_entry::<DrawUniform>(0, ShaderStages::VERTEX_FRAGMENT),
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame UBO"),
            contents: bytemuck::bytes_of(&FrameUniform::new(
                &Scene::new(),
                &Camera::new_perspective(Vec3::Z, Vec3::ZERO, Vec3::Y, 1.0, 0.1, 10.0, 1.0),
            )),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let frame_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame BG"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buf.as_entire_binding(),
            }],
        });

        let pipelines = ScenePipelines::new(&device, &frame_bgl, &draw_bgl);
        let targets = FrameTargets::new(&device, width, height);
        let filter = FilterPass::new(&device, surface_format, &targets);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Map Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let white = GpuTexture::upload(&device, &queue, &TextureData::solid("white", [255; 4]));

        Ok(Self {
            surface,
            surface_format,
            surface_config,
            device,
            queue,
            frame_buf,
            frame_bg,
            draw_bgl,
            pipelines,
            targets,
            filter,
            sampler,
            white,
            meshes: HashMap::new(),
            textures: Vec::new(),
            draws: HashMap::new(),
            grid: None,
            width,
            height,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.surface_format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Replace all model resources. `textures[i]` backs `TextureId(i)`.
    pub fn upload_model(&mut self, meshes: &[(NodeId, MeshData)], textures: &[TextureData]) {
        self.meshes.clear();
        self.draws.clear();
        self.textures = textures
            .iter()
            .map(|t| {
                if t.is_valid() {
                    GpuTexture::upload(&self.device, &self.queue, t)
                } else {
                    log::warn!("Texture '{}' has inconsistent pixel data, using white", t.name);
                    GpuTexture::upload(&self.device, &self.queue, &TextureData::solid(&t.name, [255; 4]))
                }
            })
            .collect();
        for (id, mesh) in meshes {
            if !mesh.is_valid() {
                log::warn!("Skipping empty mesh {id:?}");
                continue;
            }
            let gpu = GpuMesh::upload(&self.device, &format!("Mesh {}", id.0), mesh);
            self.meshes.insert(*id, gpu);
        }
        log::info!(
            "Uploaded {} meshes and {} textures",
            self.meshes.len(),
            self.textures.len()
        );
    }

    /// Resize: reconfigure surface & recreate offscreen targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        if (self.targets.width, self.targets.height) != (self.width, self.height) {
            self.targets = FrameTargets::new(&self.device, self.width, self.height);
            self.filter.retarget(&self.device, &self.targets);
        }
    }

    pub fn recreate_surface(&mut self) {
        log::warn!("Surface lost, reconfiguring {}x{}", self.width, self.height);
        self.resize(self.width, self.height);
    }

    /// Render one frame: scene pass, filter pass, then `overlay`.
    pub fn render<F>(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        filter: FilterParams,
        overlay: F,
    ) -> Result<(), RendererError>
    where
        F: FnOnce(Overlay<'_>),
    {
        self.queue.write_buffer(
            &self.frame_buf,
            0,
            bytemuck::bytes_of(&FrameUniform::new(scene, camera)),
        );
        self.sync_grid(scene.grid.as_ref());
        let items = self.prepare_draws(scene, camera);

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());
        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("MainEncoder"),
        });

        {
            let bg = scene.background;
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("ScenePass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &self.targets.color,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: bg.x as f64,
                            g: bg.y as f64,
                            b: bg.z as f64,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            rpass.set_bind_group(0, &self.frame_bg, &[]);

            if let Some(grid) = self.grid.as_ref().filter(|g| g.grid.visible) {
                rpass.set_pipeline(&self.pipelines.grid);
                rpass.set_vertex_buffer(0, grid.buffer.slice(..));
                rpass.draw(0..grid.count, 0..1);
            }

            for item in &items {
                let (Some(pipeline), Some(mesh), Some(binding)) = (
                    self.pipelines.cached(&item.pipeline),
                    self.meshes.get(&item.key.0),
                    self.draws.get(&item.key),
                ) else {
                    continue;
                };
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(1, &binding.bind_group, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
                let index_buf = if item.pipeline.lines {
                    &mesh.edge_buf
                } else {
                    &mesh.index_buf
                };
                rpass.set_index_buffer(index_buf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(item.indices.clone(), 0, 0..1);
            }
        }

        self.filter.run(&self.queue, &mut encoder, &view, filter);

        overlay(Overlay {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut encoder,
            view: &view,
            size: [self.width, self.height],
        });

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn sync_grid(&mut self, grid: Option<&Grid>) {
        let Some(grid) = grid else {
            self.grid = None;
            return;
        };
        if self.grid.as_ref().is_some_and(|g| g.grid == *grid) {
            return;
        }
        let vertices = grid_lines(grid);
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid VB"),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        self.grid = Some(GridLines {
            grid: grid.clone(),
            buffer,
            count: vertices.len() as u32,
        });
    }

    /// Write per-draw uniforms and order the draws: opaque first, then
    /// transparent back to front.
    fn prepare_draws(&mut self, scene: &Scene, camera: &Camera) -> Vec<DrawItem> {
        let Some(model) = scene.model.as_ref() else {
            return Vec::new();
        };
        let world = model.world_matrix();
        let view = camera.view();
        let mut items = Vec::new();

        for node in model.meshes() {
            let Some(mesh) = self.meshes.get(&node.id) else {
                continue;
            };
            let (edge_count, index_count) = (mesh.edge_count, mesh.index_count);
            let view_z = view.transform_point3(world.transform_point3(node.bounds.center())).z;

            let mut edges_drawn = false;
            for group in &node.groups {
                let slot_index = match node.material {
                    MaterialSlot::Single(_) => 0,
                    MaterialSlot::Multi(_) => group.material_index,
                };
                let Some(material) = node.material.for_group(group.material_index) else {
                    continue;
                };
                let pipeline = PipelineKey::for_material(material);
                let indices = if material.wireframe {
                    if edges_drawn {
                        continue;
                    }
                    edges_drawn = true;
                    0..edge_count
                } else {
                    let end = (group.start + group.count).min(index_count);
                    group.start.min(end)..end
                };
                let key = (node.id, slot_index);
                self.update_binding(key, world, material);
                items.push(DrawItem {
                    key,
                    pipeline,
                    indices,
                    view_z,
                });
            }
        }

        // Stable: opaque keep scene order.
        items.sort_by(|a, b| match (a.pipeline.blend, b.pipeline.blend) {
            (false, false) => std::cmp::Ordering::Equal,
            (false, true) => std::cmp::Ordering::Less,
            (true, false) => std::cmp::Ordering::Greater,
            (true, true) => a.view_z.total_cmp(&b.view_z),
        });
        self.pipelines
            .prepare(&self.device, items.iter().map(|i| i.pipeline));
        items
    }

    fn update_binding(&mut self, key: (NodeId, usize), world: Mat4, material: &Material) {
        let map = material
            .map
            .filter(|id| (id.0 as usize) < self.textures.len());
        let uniform = DrawUniform::new(world, material, map.is_some());

        let stale = self.draws.get(&key).is_none_or(|b| b.map != map);
        if stale {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Draw UBO"),
                size: std::mem::size_of::<DrawUniform>() as u64,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let texture = map
                .and_then(|id| self.textures.get(id.0 as usize))
                .unwrap_or(&self.white);
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Draw BG"),
                layout: &self.draw_bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            self.draws.insert(
                key,
                DrawBinding {
                    buffer,
                    bind_group,
                    map,
                },
            );
        }
        if let Some(binding) = self.draws.get(&key) {
            self.queue
                .write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }
}

fn uniform_entry<T>(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}
