//! Visualization modes: which material every mesh shows.

use corelib::{
    material::{Material, MaterialSlot},
    scene::{Model, rgb},
};

use crate::snapshot::MaterialSnapshot;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Materials as loaded.
    #[default]
    Textured,
    /// Flat green edges.
    Wireframe,
    /// Neutral lit gray.
    Solid,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Textured, ViewMode::Wireframe, ViewMode::Solid];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Textured => "Textured",
            ViewMode::Wireframe => "Wireframe",
            ViewMode::Solid => "Solid",
        }
    }

    /// Material that replaces every mesh's material(s), `None` for textured.
    fn override_material(self) -> Option<Material> {
        match self {
            ViewMode::Textured => None,
            ViewMode::Wireframe => Some(Material::wireframe(rgb(0x00ff88))),
            ViewMode::Solid => Some(Material::standard(rgb(0x888888), 0.6, 0.1)),
        }
    }
}

/// Swap the materials of every mesh for `mode`. Textured clones each
/// mesh's slot out of the snapshot; meshes without an entry keep theirs.
pub fn apply_mode(model: &mut Model, snapshot: &MaterialSnapshot, mode: ViewMode) {
    let replacement = mode.override_material();
    for mesh in model.meshes_mut() {
        match &replacement {
            Some(material) => mesh.material = MaterialSlot::Single(material.clone()),
            None => {
                if let Some(original) = snapshot.get(mesh.id) {
                    mesh.material = original.clone();
                }
            }
        }
    }
}
