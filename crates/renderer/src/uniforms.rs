//! CPU mirrors of the WGSL uniform blocks.

use bytemuck::{Pod, Zeroable};
use corelib::{
    camera::Camera,
    material::{Material, MaterialKind},
    scene::{LightKind, Scene},
};
use glam::{Mat4, Vec3};

/// Group 0 of every scene pipeline (`Frame` in `common.wgsl`).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub hemi_sky: [f32; 4],
    pub hemi_ground: [f32; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    pub params: [f32; 4],
}

impl FrameUniform {
    /// Sum the scene lights by kind. Several lights of one kind add up.
    pub fn new(scene: &Scene, camera: &Camera) -> Self {
        let mut ambient = Vec3::ZERO;
        let mut sky = Vec3::ZERO;
        let mut ground = Vec3::ZERO;
        let mut light_dir = Vec3::Y;
        let mut light_color = Vec3::ZERO;
        for light in &scene.lights {
            let radiance = light.color * light.intensity;
            match light.kind {
                LightKind::Ambient => ambient += radiance,
                LightKind::Hemisphere { ground: g } => {
                    sky += radiance;
                    ground += g * light.intensity;
                }
                LightKind::Directional { position } => {
                    // Directional lights point from `position` at the origin.
                    light_dir = position.normalize_or(Vec3::Y);
                    light_color += radiance;
                }
            }
        }
        Self {
            view_proj: camera.proj_view().to_cols_array_2d(),
            camera_pos: camera.eye.extend(1.0).to_array(),
            ambient: ambient.extend(0.0).to_array(),
            hemi_sky: sky.extend(0.0).to_array(),
            hemi_ground: ground.extend(0.0).to_array(),
            light_dir: light_dir.extend(0.0).to_array(),
            light_color: light_color.extend(0.0).to_array(),
            params: [scene.exposure, 0.0, 0.0, 0.0],
        }
    }
}

/// Group 1 binding 0 of the mesh pipelines (`Draw` in `mesh.wgsl`).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub params: [f32; 4],
}

impl DrawUniform {
    pub fn new(model: Mat4, material: &Material, has_map: bool) -> Self {
        let kind = match material.kind {
            MaterialKind::Phong => 0.0,
            MaterialKind::Standard => 1.0,
            MaterialKind::Basic => 2.0,
            MaterialKind::Unlit => 3.0,
        };
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: material.color.extend(material.opacity).to_array(),
            specular: material.specular.extend(material.shininess).to_array(),
            emissive: material.emissive.extend(0.0).to_array(),
            params: [
                kind,
                material.roughness,
                material.metalness,
                if has_map { 1.0 } else { 0.0 },
            ],
        }
    }
}

/// `filter_params` in `filter.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FilterUniform {
    pub params: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 176);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 192);
        assert_eq!(std::mem::size_of::<FilterUniform>(), 16);
    }

    #[test]
    fn default_scene_lights_are_summed() {
        let scene = Scene::new();
        let camera = Camera::new_perspective(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            1.0,
            0.1,
            100.0,
            1.0,
        );
        let u = FrameUniform::new(&scene, &camera);
        assert!((u.ambient[0] - 1.3).abs() < 1e-6);
        assert!((u.hemi_sky[1] - 0.8).abs() < 1e-6);
        assert!((u.light_color[2] - 0.5).abs() < 1e-6);
        assert_eq!(u.params[0], 0.4);
        let dir = Vec3::from_slice(&u.light_dir[..3]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn draw_uniform_carries_opacity_and_map_flag() {
        let m = Material {
            opacity: 0.4,
            ..Material::default()
        };
        let u = DrawUniform::new(Mat4::IDENTITY, &m, true);
        assert_eq!(u.color[3], 0.4);
        assert_eq!(u.params[3], 1.0);
        assert_eq!(u.params[0], 0.0);
    }
}
