//! Lighting controls: tone-mapping exposure, the two adjustable lights and
//! the unlit material swap.

use corelib::{
    material::{Material, MaterialSlot},
    scene::{AMBIENT_LIGHT, DIRECTIONAL_LIGHT, LightKind, Model, Scene},
};

use crate::snapshot::MaterialSnapshot;

/// Slider values in `0..=200`, applied as hundredths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingSettings {
    pub exposure: f32,
    pub ambient: f32,
    pub directional: f32,
    pub unlit: bool,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            exposure: 40.0,
            ambient: 130.0,
            directional: 50.0,
            unlit: false,
        }
    }
}

impl LightingSettings {
    pub fn exposure_value(&self) -> f32 {
        self.exposure * 0.01
    }

    pub fn ambient_value(&self) -> f32 {
        self.ambient * 0.01
    }

    pub fn directional_value(&self) -> f32 {
        self.directional * 0.01
    }
}

/// Push exposure and light intensities into the scene. Lights are found
/// by their name tag and must also be of the expected kind.
pub fn apply_lights(scene: &mut Scene, settings: &LightingSettings) {
    scene.exposure = settings.exposure_value();
    if let Some(light) = scene.light_mut(AMBIENT_LIGHT) {
        if light.kind == LightKind::Ambient {
            light.intensity = settings.ambient_value();
        }
    }
    if let Some(light) = scene.light_mut(DIRECTIONAL_LIGHT) {
        if matches!(light.kind, LightKind::Directional { .. }) {
            light.intensity = settings.directional_value();
        }
    }
}

/// Swap textured-derived materials to or from their unlit variant.
///
/// A live material is textured-derived when it is already the unlit
/// variant or has the same kind as its snapshot original; mode overrides
/// (wireframe, solid) are left alone. Slots are only touched when their
/// shape matches the snapshot's.
pub fn apply_unlit(model: &mut Model, snapshot: &MaterialSnapshot, unlit: bool) {
    for mesh in model.meshes_mut() {
        let Some(original) = snapshot.get(mesh.id) else {
            continue;
        };
        if !mesh.material.same_shape(original) {
            continue;
        }
        let swapped = match (&mesh.material, original) {
            (MaterialSlot::Single(current), MaterialSlot::Single(orig)) => {
                MaterialSlot::Single(swap_one(current, orig, unlit))
            }
            (MaterialSlot::Multi(current), MaterialSlot::Multi(orig)) => MaterialSlot::Multi(
                current
                    .iter()
                    .zip(orig)
                    .map(|(c, o)| swap_one(c, o, unlit))
                    .collect(),
            ),
            _ => continue,
        };
        mesh.material = swapped;
    }
}

fn swap_one(current: &Material, original: &Material, unlit: bool) -> Material {
    match (unlit, current.is_unlit_variant()) {
        (true, false) if current.kind == original.kind => Material::unlit_from(original),
        (false, true) => original.clone(),
        _ => current.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{build_model, tests::sample_assets};

    #[test]
    fn mismatched_slot_shape_is_left_untouched() {
        let mut scene = Scene::new();
        let (mut model, _) = build_model(&mut scene, sample_assets()).unwrap();
        let mut snapshot = MaterialSnapshot::new();
        snapshot.capture(&model);

        // The second mesh has two materials in the snapshot.
        let single = MaterialSlot::Single(Material::default());
        model.meshes_mut()[1].material = single.clone();
        apply_unlit(&mut model, &snapshot, true);
        assert_eq!(model.meshes()[1].material, single);
        assert!(model.meshes()[0].material.iter().all(Material::is_unlit_variant));

        let unlit = MaterialSlot::Single(Material::unlit_from(&Material::default()));
        model.meshes_mut()[1].material = unlit.clone();
        apply_unlit(&mut model, &snapshot, false);
        assert_eq!(model.meshes()[1].material, unlit);
        assert!(!model.meshes()[0].material.iter().any(Material::is_unlit_variant));
    }

    #[test]
    fn sliders_map_to_hundredths() {
        let mut scene = Scene::new();
        let settings = LightingSettings {
            exposure: 120.0,
            ambient: 0.0,
            directional: 200.0,
            unlit: false,
        };
        apply_lights(&mut scene, &settings);
        assert!((scene.exposure - 1.2).abs() < 1e-6);
        assert_eq!(scene.light(AMBIENT_LIGHT).map(|l| l.intensity), Some(0.0));
        assert_eq!(scene.light(DIRECTIONAL_LIGHT).map(|l| l.intensity), Some(2.0));
        // The hemisphere light has no slider.
        assert_eq!(scene.light("hemi").map(|l| l.intensity), Some(0.8));
    }
}
