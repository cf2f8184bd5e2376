//! Surface materials as plain values. Cloning a material never duplicates
//! texture data: maps are referenced through [`TextureId`] handles.

use crate::Vec3;

/// Handle of a decoded texture owned by whoever loaded the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Which faces are rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Lit Blinn-Phong surface, as described by MTL libraries.
    Phong,
    /// Lit roughness/metalness surface.
    Standard,
    /// Flat color, ignores lights.
    Basic,
    /// Shadeless variant of a textured material, ignores lights.
    Unlit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    /// Linear RGB base color.
    pub color: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,
    pub shininess: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub map: Option<TextureId>,
    pub side: Side,
    pub wireframe: bool,
    pub transparent: bool,
    pub opacity: f32,
    pub depth_write: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: MaterialKind::Phong,
            color: Vec3::ONE,
            specular: Vec3::splat(0x11 as f32 / 255.0),
            emissive: Vec3::ZERO,
            shininess: 30.0,
            roughness: 1.0,
            metalness: 0.0,
            map: None,
            side: Side::Front,
            wireframe: false,
            transparent: false,
            opacity: 1.0,
            depth_write: true,
        }
    }
}

impl Material {
    /// Flat-colored wireframe material.
    pub fn wireframe(color: Vec3) -> Self {
        Self {
            name: "wireframe".into(),
            kind: MaterialKind::Basic,
            color,
            wireframe: true,
            ..Self::default()
        }
    }

    /// Lit, untextured material with fixed roughness and metalness.
    pub fn standard(color: Vec3, roughness: f32, metalness: f32) -> Self {
        Self {
            name: "solid".into(),
            kind: MaterialKind::Standard,
            color,
            roughness,
            metalness,
            side: Side::Double,
            ..Self::default()
        }
    }

    /// Shadeless copy of `base` keeping its map, side and transparency.
    pub fn unlit_from(base: &Material) -> Self {
        Self {
            name: base.name.clone(),
            kind: MaterialKind::Unlit,
            color: Vec3::ONE,
            map: base.map,
            side: base.side,
            transparent: base.transparent,
            opacity: base.opacity,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_unlit_variant(&self) -> bool {
        self.kind == MaterialKind::Unlit
    }
}

/// Material(s) assigned to one mesh node.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialSlot {
    Single(Material),
    /// One material per draw group, indexed by the group's material index.
    Multi(Vec<Material>),
}

impl MaterialSlot {
    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        match self {
            MaterialSlot::Single(m) => std::slice::from_ref(m).iter(),
            MaterialSlot::Multi(ms) => ms.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Material> {
        match self {
            MaterialSlot::Single(m) => std::slice::from_mut(m).iter_mut(),
            MaterialSlot::Multi(ms) => ms.iter_mut(),
        }
    }

    /// Material used by a draw group. A single material covers every group.
    pub fn for_group(&self, material_index: usize) -> Option<&Material> {
        match self {
            MaterialSlot::Single(m) => Some(m),
            MaterialSlot::Multi(ms) => ms.get(material_index),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MaterialSlot::Single(_) => 1,
            MaterialSlot::Multi(ms) => ms.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if both slots are single, or both are sequences of equal length.
    pub fn same_shape(&self, other: &MaterialSlot) -> bool {
        match (self, other) {
            (MaterialSlot::Single(_), MaterialSlot::Single(_)) => true,
            (MaterialSlot::Multi(a), MaterialSlot::Multi(b)) => a.len() == b.len(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlit_keeps_map_side_and_transparency() {
        let base = Material {
            map: Some(TextureId(3)),
            side: Side::Double,
            transparent: true,
            opacity: 0.25,
            ..Material::default()
        };
        let unlit = Material::unlit_from(&base);
        assert!(unlit.is_unlit_variant());
        assert_eq!(unlit.map, base.map);
        assert_eq!(unlit.side, base.side);
        assert!(unlit.transparent);
        assert_eq!(unlit.opacity, 0.25);
        assert_eq!(unlit.color, Vec3::ONE);
    }

    #[test]
    fn single_slot_covers_every_group() {
        let slot = MaterialSlot::Single(Material::default());
        assert!(slot.for_group(7).is_some());
        let multi = MaterialSlot::Multi(vec![Material::default()]);
        assert!(multi.for_group(1).is_none());
        assert!(!slot.same_shape(&multi));
    }
}
