//! Render pipelines for the scene pass, keyed by the material state that
//! changes fixed-function setup.

use std::collections::HashMap;

use corelib::material::{Material, Side};
use wgpu::{
    BindGroupLayout, BlendState, ColorTargetState, ColorWrites, CompareFunction, DepthBiasState,
    DepthStencilState, Device, Face, FragmentState, PipelineLayout, PipelineLayoutDescriptor,
    PrimitiveState, PrimitiveTopology, RenderPipeline, RenderPipelineDescriptor, ShaderModule,
    ShaderModuleDescriptor, ShaderSource, StencilState, TextureFormat, VertexState,
};

use crate::{grid::Vertex, mesh::GpuVertex};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
/// Scene color is rendered tone-mapped but linear, then filtered.
pub const SCENE_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub lines: bool,
    pub blend: bool,
    pub depth_write: bool,
    pub cull: Option<Face>,
}

impl PipelineKey {
    pub fn for_material(material: &Material) -> Self {
        let cull = match material.side {
            Side::Front => Some(Face::Back),
            Side::Back => Some(Face::Front),
            Side::Double => None,
        };
        Self {
            lines: material.wireframe,
            blend: material.transparent,
            depth_write: material.depth_write,
            cull: if material.wireframe { None } else { cull },
        }
    }
}

pub struct ScenePipelines {
    mesh_shader: ShaderModule,
    mesh_layout: PipelineLayout,
    cache: HashMap<PipelineKey, RenderPipeline>,
    pub grid: RenderPipeline,
}

impl ScenePipelines {
    pub fn new(device: &Device, frame_bgl: &BindGroupLayout, draw_bgl: &BindGroupLayout) -> Self {
        let mesh_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Mesh WGSL"),
            source: ShaderSource::Wgsl(
                concat!(include_str!("shaders/common.wgsl"), include_str!("shaders/mesh.wgsl")).into(),
            ),
        });
        let line_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Line WGSL"),
            source: ShaderSource::Wgsl(
                concat!(include_str!("shaders/common.wgsl"), include_str!("shaders/line.wgsl")).into(),
            ),
        });
        let mesh_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &[frame_bgl, draw_bgl],
            push_constant_ranges: &[],
        });
        let line_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Line PipelineLayout"),
            bind_group_layouts: &[frame_bgl],
            push_constant_ranges: &[],
        });
        let grid = create(
            device,
            "Grid Pipeline",
            &line_layout,
            &line_shader,
            Vertex::LAYOUT,
            PipelineKey {
                lines: true,
                blend: false,
                depth_write: true,
                cull: None,
            },
        );
        Self {
            mesh_shader,
            mesh_layout,
            cache: HashMap::new(),
            grid,
        }
    }

    /// Mesh pipeline for `key`, created on first use.
    pub fn get(&mut self, device: &Device, key: PipelineKey) -> &RenderPipeline {
        self.cache.entry(key).or_insert_with(|| {
            log::debug!("Creating mesh pipeline {key:?}");
            create(
                device,
                "Mesh Pipeline",
                &self.mesh_layout,
                &self.mesh_shader,
                GpuVertex::LAYOUT,
                key,
            )
        })
    }

    /// Pipelines for all keys in `keys`, so draws can borrow them together.
    pub fn prepare(&mut self, device: &Device, keys: impl IntoIterator<Item = PipelineKey>) {
        for key in keys {
            self.get(device, key);
        }
    }

    pub fn cached(&self, key: &PipelineKey) -> Option<&RenderPipeline> {
        self.cache.get(key)
    }
}

fn create(
    device: &Device,
    label: &str,
    layout: &PipelineLayout,
    shader: &ShaderModule,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    key: PipelineKey,
) -> RenderPipeline {
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format: SCENE_FORMAT,
                blend: Some(if key.blend {
                    BlendState::ALPHA_BLENDING
                } else {
                    BlendState::REPLACE
                }),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: PrimitiveState {
            topology: if key.lines {
                PrimitiveTopology::LineList
            } else {
                PrimitiveTopology::TriangleList
            },
            cull_mode: key.cull,
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: key.depth_write,
            depth_compare: CompareFunction::LessEqual,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Vec3, material::Material};

    #[test]
    fn key_follows_material_state() {
        let textured = Material {
            side: Side::Double,
            ..Material::default()
        };
        let key = PipelineKey::for_material(&textured);
        assert_eq!(key.cull, None);
        assert!(!key.lines && !key.blend && key.depth_write);

        let translucent = Material {
            transparent: true,
            depth_write: false,
            ..Material::default()
        };
        let key = PipelineKey::for_material(&translucent);
        assert_eq!(key.cull, Some(Face::Back));
        assert!(key.blend && !key.depth_write);

        let key = PipelineKey::for_material(&Material::wireframe(Vec3::ONE));
        assert!(key.lines);
        assert_eq!(key.cull, None);
    }
}
