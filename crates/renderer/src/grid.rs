//! Ground grid as a colored line list.

use bytemuck::{Pod, Zeroable};
use corelib::scene::Grid;
use wgpu::{VertexBufferLayout, VertexStepMode};

/// Vertex: position + color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
}

/// `divisions + 1` lines along each axis, the middle ones in the center color.
pub fn grid_lines(grid: &Grid) -> Vec<Vertex> {
    let half = grid.size / 2.0;
    let step = grid.size / grid.divisions.max(1) as f32;
    let center = grid.divisions / 2;
    let y = grid.height;
    let mut out = Vec::with_capacity((grid.divisions as usize + 1) * 4);
    for i in 0..=grid.divisions {
        let k = -half + i as f32 * step;
        let color = if i == center {
            grid.center_color
        } else {
            grid.line_color
        }
        .to_array();
        out.push(Vertex { pos: [-half, y, k], color });
        out.push(Vertex { pos: [half, y, k], color });
        out.push(Vertex { pos: [k, y, -half], color });
        out.push(Vertex { pos: [k, y, half], color });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::Vec3;

    #[test]
    fn grid_has_two_lines_per_division_step() {
        let grid = Grid::under_model(Vec3::new(10.0, 4.0, 6.0), true);
        let lines = grid_lines(&grid);
        assert_eq!(lines.len(), 21 * 4);
        assert!(lines.iter().all(|v| v.pos[1] == -2.0));
        let extent = lines.iter().map(|v| v.pos[0].abs()).fold(0.0f32, f32::max);
        assert!((extent - 7.5).abs() < 1e-5);
        // Exactly one line pair in the center color.
        let center = grid.center_color.to_array();
        assert_eq!(lines.iter().filter(|v| v.color == center).count(), 4);
    }
}
