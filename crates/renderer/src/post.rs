//! Offscreen scene targets and the full-screen image-filter pass that
//! resolves them onto the surface.

use std::num::NonZeroU64;

use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites, CommandEncoder, Device,
    Extent3d, FragmentState, LoadOp, Operations, PipelineLayoutDescriptor, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    Sampler, SamplerBindingType, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp,
    TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType, TextureUsages,
    TextureView, TextureViewDescriptor, TextureViewDimension, VertexState, util::DeviceExt,
};

use crate::{
    FilterParams,
    pipelines::{DEPTH_FORMAT, SCENE_FORMAT},
    uniforms::FilterUniform,
};

/// Color + depth targets of the scene pass, sized like the surface.
pub struct FrameTargets {
    pub color: TextureView,
    pub depth: TextureView,
    pub width: u32,
    pub height: u32,
}

impl FrameTargets {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            color: target_view(
                device,
                "SceneColor",
                width,
                height,
                SCENE_FORMAT,
                TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            ),
            depth: target_view(
                device,
                "SceneDepth",
                width,
                height,
                DEPTH_FORMAT,
                TextureUsages::RENDER_ATTACHMENT,
            ),
            width,
            height,
        }
    }
}

fn target_view(
    device: &Device,
    label: &str,
    width: u32,
    height: u32,
    format: TextureFormat,
    usage: TextureUsages,
) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

pub struct FilterPass {
    pipeline: RenderPipeline,
    bgl: BindGroupLayout,
    sampler: Sampler,
    params: Buffer,
    bind_group: BindGroup,
    /// Write sRGB-encoded values because the surface will not encode them.
    encode_srgb: bool,
}

impl FilterPass {
    pub fn new(device: &Device, surface_format: TextureFormat, targets: &FrameTargets) -> Self {
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Filter WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/filter.wgsl").into()),
        });
        let bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Filter BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<FilterUniform>() as u64
                        ),
                    },
                    count: None,
                },
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
        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Filter PipelineLayout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Filter Pipeline"),
            layout: Some(&layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Filter Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let encode_srgb = !surface_format.is_srgb();
        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Filter UBO"),
            contents: bytemuck::bytes_of(&uniform(FilterParams::default(), encode_srgb)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let bind_group = create_bind_group(device, &bgl, &params, &targets.color, &sampler);
        Self {
            pipeline,
            bgl,
            sampler,
            params,
            bind_group,
            encode_srgb,
        }
    }

    /// Rebind after the scene targets were recreated.
    pub fn retarget(&mut self, device: &Device, targets: &FrameTargets) {
        self.bind_group = create_bind_group(device, &self.bgl, &self.params, &targets.color, &self.sampler);
    }

    pub fn run(
        &self,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        output: &TextureView,
        filter: FilterParams,
    ) {
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(&uniform(filter, self.encode_srgb)));
        let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("FilterPass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(wgpu::Color::BLACK),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

fn uniform(filter: FilterParams, encode_srgb: bool) -> FilterUniform {
    FilterUniform {
        params: [
            filter.saturate,
            filter.contrast,
            filter.brightness,
            if encode_srgb { 1.0 } else { 0.0 },
        ],
    }
}

fn create_bind_group(
    device: &Device,
    bgl: &BindGroupLayout,
    params: &Buffer,
    color: &TextureView,
    sampler: &Sampler,
) -> BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Filter BG"),
        layout: bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(color),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
