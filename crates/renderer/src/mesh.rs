//! GPU-resident meshes and textures.

use asset::{mesh::MeshData, texture::TextureData};
use bytemuck::{Pod, Zeroable};
use wgpu::{
    Buffer, BufferUsages, Device, Extent3d, Queue, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsages, TextureView, VertexBufferLayout, VertexStepMode,
    util::DeviceExt,
};

/// Interleaved mesh vertex as the mesh pipelines read it.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl GpuVertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<GpuVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

/// OBJ texture coordinates start at the bottom row; wgpu's at the top.
pub fn gpu_vertices(mesh: &MeshData) -> Vec<GpuVertex> {
    mesh.vertices
        .iter()
        .map(|v| GpuVertex {
            position: v.position,
            normal: v.normal,
            uv: [v.uv[0], 1.0 - v.uv[1]],
        })
        .collect()
}

pub struct GpuMesh {
    pub vertex_buf: Buffer,
    pub index_buf: Buffer,
    pub index_count: u32,
    /// Unique triangle edges, drawn as a line list for wireframe materials.
    pub edge_buf: Buffer,
    pub edge_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &Device, label: &str, mesh: &MeshData) -> Self {
        let vertices = gpu_vertices(mesh);
        let edges = mesh.edge_indices(0..mesh.indices.len());
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} VB")),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} IB")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: BufferUsages::INDEX,
        });
        let edge_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} edges")),
            contents: bytemuck::cast_slice(&edges),
            usage: BufferUsages::INDEX,
        });
        Self {
            vertex_buf,
            index_buf,
            index_count: mesh.indices.len() as u32,
            edge_buf,
            edge_count: edges.len() as u32,
        }
    }
}

pub struct GpuTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    pub view: TextureView,
}

impl GpuTexture {
    /// Upload RGBA8 pixels as an sRGB texture.
    pub fn upload(device: &Device, queue: &Queue, tex: &TextureData) -> Self {
        let size = Extent3d {
            width: tex.width.max(1),
            height: tex.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(&tex.name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &tex.data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(tex.bytes_per_pixel() * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::mesh::MeshVertex;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<GpuVertex>(), 32);
    }

    #[test]
    fn uv_v_is_flipped() {
        let mesh = MeshData::new(
            vec![MeshVertex::new([0.0; 3], [0.0, 1.0, 0.0], [0.25, 0.2])],
            vec![0, 0, 0],
        );
        let v = gpu_vertices(&mesh);
        assert_eq!(v[0].uv, [0.25, 0.8]);
    }
}
