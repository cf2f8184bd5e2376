//! Turns loaded assets into a scene [`Model`] plus the CPU-side buffers the
//! renderer uploads.

use anyhow::{Context, Result};
use asset::{LoadedAssets, mesh::MeshData, mtl::MtlMaterial, texture::TextureData};
use corelib::{
    Vec3,
    bounds::Aabb,
    material::{Material, MaterialKind, MaterialSlot, Side, TextureId},
    scene::{DrawGroup, MeshNode, Model, NodeId, Scene, srgb_to_linear},
};

/// Geometry and textures waiting for GPU upload. `TextureId(i)` is
/// `textures[i]`.
#[derive(Clone, Debug, Default)]
pub struct ModelAssets {
    pub meshes: Vec<(NodeId, MeshData)>,
    pub textures: Vec<TextureData>,
}

/// Build one mesh node per OBJ object. Every material is forced
/// double-sided.
pub fn build_model(scene: &mut Scene, assets: LoadedAssets) -> Result<(Model, ModelAssets)> {
    let mut nodes = Vec::with_capacity(assets.geometry.objects.len());
    let mut meshes = Vec::with_capacity(assets.geometry.objects.len());

    for object in &assets.geometry.objects {
        let Some((min, max)) = object.mesh.bounds() else {
            log::warn!("Skipping object '{}' without vertices", object.name);
            continue;
        };
        let names = object.material_names();
        let materials: Vec<Material> = names
            .iter()
            .map(|name| material_for(&assets, name.as_deref()))
            .collect();
        let groups = object
            .groups
            .iter()
            .map(|g| DrawGroup {
                start: g.start,
                count: g.count,
                material_index: names.iter().position(|n| *n == g.material).unwrap_or(0),
            })
            .collect();
        let material = match <[Material; 1]>::try_from(materials) {
            Ok([single]) => MaterialSlot::Single(single),
            Err(many) => MaterialSlot::Multi(many),
        };

        let id = scene.allocate_node_id();
        nodes.push(MeshNode {
            id,
            name: object.name.clone(),
            bounds: Aabb::new(Vec3::from(min), Vec3::from(max)),
            vertex_count: object.mesh.triangle_count() * 3,
            face_count: object.mesh.triangle_count(),
            groups,
            material,
        });
        meshes.push((id, object.mesh.clone()));
    }

    let model = Model::new(nodes).context("Model has no drawable geometry")?;
    log::info!(
        "Built model: {} meshes, {} vertices, {} faces, {} textures",
        model.meshes().len(),
        model.vertex_count(),
        model.face_count(),
        assets.textures.len()
    );
    Ok((
        model,
        ModelAssets {
            meshes,
            textures: assets.textures,
        },
    ))
}

fn material_for(assets: &LoadedAssets, name: Option<&str>) -> Material {
    let base = match name.and_then(|n| assets.materials.get(n)) {
        Some(mtl) => from_mtl(assets, mtl),
        None => {
            if let Some(n) = name {
                log::warn!("Material '{n}' not found in library, using default");
            }
            Material {
                name: name.unwrap_or_default().to_owned(),
                ..Material::default()
            }
        }
    };
    Material {
        side: Side::Double,
        ..base
    }
}

fn from_mtl(assets: &LoadedAssets, mtl: &MtlMaterial) -> Material {
    let defaults = Material::default();
    let opacity = mtl.dissolve.unwrap_or(1.0).clamp(0.0, 1.0);
    let map = mtl.diffuse_map.as_deref().and_then(|path| {
        let index = assets.texture_index(path);
        if index.is_none() {
            log::warn!("Texture '{path}' of material '{}' is unavailable", mtl.name);
        }
        index.map(|i| TextureId(i as u32))
    });
    Material {
        name: mtl.name.clone(),
        kind: MaterialKind::Phong,
        color: mtl.diffuse.map_or(defaults.color, linear),
        specular: mtl.specular.map_or(defaults.specular, linear),
        emissive: mtl.emissive.map_or(defaults.emissive, linear),
        shininess: mtl.shininess.unwrap_or(defaults.shininess),
        map,
        transparent: opacity < 1.0,
        opacity,
        ..defaults
    }
}

fn linear(c: [f32; 3]) -> Vec3 {
    Vec3::new(srgb_to_linear(c[0]), srgb_to_linear(c[1]), srgb_to_linear(c[2]))
}

#[cfg(test)]
pub(crate) mod tests {
    use asset::{mtl::load_mtl_from_str, obj::load_obj_from_str};

    use super::*;

    pub(crate) const MTL: &str = "\
newmtl skin
Kd 1 1 1
map_Kd skin.png

newmtl glass
Kd 0.5 0.5 0.5
d 0.25
";

    /// A 10 x 4 x 6 box split into two objects; the second uses two materials.
    pub(crate) const OBJ: &str = "\
mtllib Mesh.mtl
v -5 -2 -3
v 5 -2 -3
v 5 2 -3
v -5 2 3
v 5 2 3
v 5 -2 3
o front
usemtl skin
f 1 2 3
o back
f 4 5 6
usemtl glass
f 1 5 6
";

    pub(crate) fn sample_assets() -> LoadedAssets {
        LoadedAssets {
            materials: load_mtl_from_str(MTL).unwrap(),
            textures: vec![TextureData::solid("skin.png", [200, 100, 50, 255])],
            geometry: load_obj_from_str(OBJ).unwrap(),
        }
    }

    #[test]
    fn builds_nodes_with_single_and_multi_slots() {
        let mut scene = Scene::new();
        let (model, pending) = build_model(&mut scene, sample_assets()).unwrap();
        assert_eq!(model.meshes().len(), 2);
        assert_eq!(pending.meshes.len(), 2);
        assert_eq!(pending.textures.len(), 1);

        let front = &model.meshes()[0];
        let MaterialSlot::Single(skin) = &front.material else {
            panic!("expected a single material");
        };
        assert_eq!(skin.map, Some(TextureId(0)));
        assert_eq!(skin.side, Side::Double);
        assert!(!skin.transparent);

        let back = &model.meshes()[1];
        let MaterialSlot::Multi(mats) = &back.material else {
            panic!("expected a material per group");
        };
        assert_eq!(mats.len(), 2);
        assert!(mats[1].transparent);
        assert_eq!(mats[1].opacity, 0.25);
        assert_eq!(back.groups.len(), 2);
        assert_eq!(back.groups[1].material_index, 1);
        assert!(mats.iter().all(|m| m.side == Side::Double));
    }

    #[test]
    fn pivot_centers_the_model() {
        let mut scene = Scene::new();
        let (model, _) = build_model(&mut scene, sample_assets()).unwrap();
        let world = model.world_bounds();
        assert!(world.center().length() < 1e-5);
        assert_eq!(world.size(), Vec3::new(10.0, 4.0, 6.0));
    }

    #[test]
    fn vertex_count_is_three_per_face() {
        let mut scene = Scene::new();
        let (model, pending) = build_model(&mut scene, sample_assets()).unwrap();
        assert_eq!(model.face_count(), 3);
        assert_eq!(model.vertex_count(), 9);
        // GPU buffers keep the shared vertices.
        let uploaded: usize = pending.meshes.iter().map(|(_, m)| m.vertices.len()).sum();
        assert_eq!(uploaded, 7);
    }

    #[test]
    fn node_ids_are_unique() {
        let mut scene = Scene::new();
        let (model, _) = build_model(&mut scene, sample_assets()).unwrap();
        assert_ne!(model.meshes()[0].id, model.meshes()[1].id);
    }
}
