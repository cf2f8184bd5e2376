//! Scene graph: a pivoted model made of mesh nodes, named lights and a
//! ground grid.

use crate::{
    CoreError, CoreResult, Mat4, Vec3,
    bounds::Aabb,
    material::{Material, MaterialSlot},
    transform::Transform,
};

/// Stable handle of a mesh node, unique within one [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Contiguous index range drawn with one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawGroup {
    pub start: u32,
    pub count: u32,
    pub material_index: usize,
}

#[derive(Clone, Debug)]
pub struct MeshNode {
    pub id: NodeId,
    pub name: String,
    /// Bounds in geometry space (before the pivot offset).
    pub bounds: Aabb,
    /// Unindexed vertex count, three per face, as shown to the user.
    pub vertex_count: usize,
    pub face_count: usize,
    pub groups: Vec<DrawGroup>,
    pub material: MaterialSlot,
}

impl MeshNode {
    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.material.iter_mut()
    }
}

/// Loaded geometry wrapped in a pivot so that rotation happens about the
/// bounding-box center.
#[derive(Clone, Debug)]
pub struct Model {
    /// User rotation; translation stays at the origin.
    pub pivot: Transform,
    /// Geometry offset inside the pivot (`-center`).
    pub offset: Vec3,
    /// Half-diagonal of the geometry bounds at load time.
    pub radius: f32,
    /// Geometry-space size at load time.
    pub size: Vec3,
    meshes: Vec<MeshNode>,
}

impl Model {
    /// Wrap `meshes` in a pivot centered on their combined bounds.
    pub fn new(meshes: Vec<MeshNode>) -> CoreResult<Self> {
        let bounds = meshes
            .iter()
            .fold(Aabb::EMPTY, |acc, m| acc.union(&m.bounds));
        if bounds.is_empty() {
            return Err(CoreError::DegenerateBounds);
        }
        Ok(Self {
            pivot: Transform::identity(),
            offset: -bounds.center(),
            radius: bounds.radius(),
            size: bounds.size(),
            meshes,
        })
    }

    /// Model-to-world matrix of the geometry (pivot * offset).
    pub fn world_matrix(&self) -> Mat4 {
        self.pivot.matrix() * Mat4::from_translation(self.offset)
    }

    /// World-space bounds, computed from the current rotation.
    pub fn world_bounds(&self) -> Aabb {
        let m = self.world_matrix();
        self.meshes
            .iter()
            .fold(Aabb::EMPTY, |acc, mesh| acc.union(&mesh.bounds.transformed(&m)))
    }

    pub fn set_rotation_degrees(&mut self, degrees: Vec3) {
        self.pivot.set_rotation_degrees(degrees);
    }

    pub fn meshes(&self) -> &[MeshNode] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [MeshNode] {
        &mut self.meshes
    }

    /// Every live material of every mesh.
    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.meshes.iter_mut().flat_map(|m| m.material.iter_mut())
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertex_count).sum()
    }

    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.face_count).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Ambient,
    Hemisphere { ground: Vec3 },
    Directional { position: Vec3 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    /// Stable tag used by the lighting controls to find the light.
    pub name: String,
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

pub const AMBIENT_LIGHT: &str = "ambient";
pub const HEMISPHERE_LIGHT: &str = "hemi";
pub const DIRECTIONAL_LIGHT: &str = "directional";

/// Line grid on the XZ plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub size: f32,
    pub divisions: u32,
    pub center_color: Vec3,
    pub line_color: Vec3,
    pub height: f32,
    pub visible: bool,
}

impl Grid {
    /// Grid under a model of the given size: 1.5x its footprint, at its base.
    pub fn under_model(size: Vec3, visible: bool) -> Self {
        Self {
            size: size.x.max(size.z) * 1.5,
            divisions: 20,
            center_color: rgb(0x00ff88),
            line_color: rgb(0x222225),
            height: -size.y / 2.0,
            visible,
        }
    }
}

pub struct Scene {
    pub background: Vec3,
    /// Tone-mapping exposure multiplier.
    pub exposure: f32,
    pub lights: Vec<Light>,
    pub model: Option<Model>,
    pub grid: Option<Grid>,
    next_node: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            background: rgb(0x0b0f14),
            exposure: 0.4,
            lights: vec![
                Light {
                    name: AMBIENT_LIGHT.into(),
                    kind: LightKind::Ambient,
                    color: Vec3::ONE,
                    intensity: 1.3,
                },
                Light {
                    name: HEMISPHERE_LIGHT.into(),
                    kind: LightKind::Hemisphere {
                        ground: rgb(0x444444),
                    },
                    color: Vec3::ONE,
                    intensity: 0.8,
                },
                Light {
                    name: DIRECTIONAL_LIGHT.into(),
                    kind: LightKind::Directional {
                        position: Vec3::new(100.0, 200.0, 100.0),
                    },
                    color: Vec3::ONE,
                    intensity: 0.5,
                },
            ],
            model: None,
            grid: None,
            next_node: 0,
        }
    }

    /// Allocate a fresh node id. Ids are never reused within a scene.
    pub fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub fn light_mut(&mut self, name: &str) -> Option<&mut Light> {
        self.lights.iter_mut().find(|l| l.name == name)
    }

    pub fn light(&self, name: &str) -> Option<&Light> {
        self.lights.iter().find(|l| l.name == name)
    }
}

/// `0xRRGGBB` sRGB hex color to linear RGB.
pub fn rgb(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn node(id: u32, min: Vec3, max: Vec3) -> MeshNode {
        MeshNode {
            id: NodeId(id),
            name: format!("mesh{id}"),
            bounds: Aabb::new(min, max),
            vertex_count: 3,
            face_count: 1,
            groups: Vec::new(),
            material: MaterialSlot::Single(Material::default()),
        }
    }

    #[test]
    fn model_is_recentered() {
        let model = Model::new(vec![
            node(0, Vec3::new(10.0, 0.0, 0.0), Vec3::new(15.0, 4.0, 6.0)),
            node(1, Vec3::new(15.0, 0.0, 0.0), Vec3::new(20.0, 2.0, 6.0)),
        ])
        .expect("model");
        assert_eq!(model.offset, Vec3::new(-15.0, -2.0, -3.0));
        let wb = model.world_bounds();
        assert_relative_eq!(wb.center().length(), 0.0, epsilon = 1e-5);
        assert_relative_eq!(wb.size().x, 10.0, epsilon = 1e-5);
        assert_eq!(model.vertex_count(), 6);
    }

    #[test]
    fn empty_model_is_rejected() {
        assert!(matches!(Model::new(Vec::new()), Err(CoreError::DegenerateBounds)));
    }

    #[test]
    fn grid_sits_under_model() {
        let grid = Grid::under_model(Vec3::new(10.0, 4.0, 6.0), true);
        assert_eq!(grid.size, 15.0);
        assert_eq!(grid.height, -2.0);
        assert_eq!(grid.divisions, 20);
    }

    #[test]
    fn default_lights_are_tagged() {
        let mut scene = Scene::new();
        assert!(scene.light(AMBIENT_LIGHT).is_some());
        assert!(scene.light_mut(DIRECTIONAL_LIGHT).is_some());
        assert_ne!(scene.allocate_node_id(), scene.allocate_node_id());
    }
}
