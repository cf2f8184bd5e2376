//! The [`Viewer`] controller: owns the scene, camera, orbit controller,
//! material snapshot and every UI-facing setting, and applies user actions
//! to them.

use anyhow::Result;
use asset::{LoadProgress, LoadedAssets};
use corelib::{
    Vec3,
    camera::Camera,
    orbit::OrbitController,
    scene::{Grid, Scene},
};

use crate::{
    model::{ModelAssets, build_model},
    config::ViewerConfig,
    framing::{self, CameraPose, ScaleLimits},
    image::{self, ImageFilter, ImageSettings},
    lighting::{self, LightingSettings},
    modes::{self, ViewMode},
    shortcuts::Shortcut,
    snapshot::MaterialSnapshot,
};

/// The single message shown on the error screen.
pub const LOAD_FAILED_MESSAGE: &str = "Could not load the model. Check your internet connection.";

#[derive(Clone, Debug, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading(LoadProgress),
    Ready,
    Failed(String),
}

/// Counts shown in the info overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModelInfo {
    pub vertices: usize,
    pub faces: usize,
    pub textures: usize,
}

pub struct Viewer {
    config: ViewerConfig,
    pub scene: Scene,
    pub camera: Camera,
    pub orbit: OrbitController,
    snapshot: MaterialSnapshot,
    mode: ViewMode,
    /// Model rotation slider values in degrees.
    rotation_deg: Vec3,
    image: ImageSettings,
    lighting: LightingSettings,
    show_grid: bool,
    status: LoadStatus,
    info: ModelInfo,
    pending_upload: Option<ModelAssets>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let camera = Camera::new_perspective(
            Vec3::splat(100.0),
            Vec3::ZERO,
            Vec3::Y,
            config.fov_rad(),
            0.1,
            50_000.0,
            1.0,
        );
        let defaults = config.defaults;
        Self {
            config,
            scene: Scene::new(),
            camera,
            orbit: OrbitController::new(),
            snapshot: MaterialSnapshot::new(),
            mode: ViewMode::default(),
            rotation_deg: defaults.rotation_deg,
            image: defaults.image,
            lighting: defaults.lighting,
            show_grid: true,
            status: LoadStatus::Idle,
            info: ModelInfo::default(),
            pending_upload: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loaded(&self) -> bool {
        self.scene.model.is_some()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn rotation_deg(&self) -> Vec3 {
        self.rotation_deg
    }

    pub fn image(&self) -> ImageSettings {
        self.image
    }

    pub fn lighting(&self) -> LightingSettings {
        self.lighting
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn info(&self) -> ModelInfo {
        self.info
    }

    pub fn snapshot(&self) -> &MaterialSnapshot {
        &self.snapshot
    }

    /// Filter the renderer applies to the composited frame.
    pub fn image_filter(&self) -> ImageFilter {
        self.image.filter()
    }

    pub fn grid_label(&self) -> &'static str {
        if self.show_grid { "GRID: ON" } else { "GRID: OFF" }
    }

    pub fn camera_label(&self) -> String {
        format!("CAM: {:.1}", self.camera.distance_to_target())
    }

    // ----- loading -----

    pub fn begin_load(&mut self) {
        self.status = LoadStatus::Loading(LoadProgress {
            loaded: 0,
            total: self.config.estimated_total_bytes,
            stage: asset::LoadStage::LoadingMaterials,
        });
    }

    pub fn on_progress(&mut self, progress: LoadProgress) {
        if matches!(self.status, LoadStatus::Idle | LoadStatus::Loading(_)) {
            self.status = LoadStatus::Loading(progress);
        }
    }

    /// Route the loader's final result. Failures are logged in full and
    /// surface as [`LOAD_FAILED_MESSAGE`].
    pub fn on_load_finished(&mut self, result: Result<LoadedAssets>) {
        let installed = result.and_then(|assets| self.install_assets(assets));
        if let Err(err) = installed {
            log::error!("Error loading model: {err:#}");
            self.status = LoadStatus::Failed(LOAD_FAILED_MESSAGE.into());
        }
    }

    /// Build the model, snapshot its materials, frame it and apply every
    /// current setting.
    pub fn install_assets(&mut self, assets: LoadedAssets) -> Result<()> {
        let (model, upload) = build_model(&mut self.scene, assets)?;
        self.snapshot.capture(&model);
        self.info = ModelInfo {
            vertices: model.vertex_count(),
            faces: model.face_count(),
            textures: upload.textures.len(),
        };

        let limits = ScaleLimits::for_radius(model.radius);
        self.camera.set_clip_planes(limits.near, limits.far);
        self.orbit
            .set_distance_limits(limits.min_distance, limits.max_distance);
        self.scene.grid = Some(Grid::under_model(model.size, self.show_grid));
        self.scene.model = Some(model);
        self.pending_upload = Some(upload);
        self.mode = ViewMode::Textured;

        self.frame(|viewer, bounds| {
            framing::initial_view(bounds, viewer.config.fov_rad(), &viewer.config.initial_view)
        });
        self.set_rotation(self.rotation_deg);
        self.set_lighting(self.lighting);
        self.set_image(self.image);
        self.status = LoadStatus::Ready;
        Ok(())
    }

    /// Geometry and textures of the freshly installed model, once.
    pub fn take_upload(&mut self) -> Option<ModelAssets> {
        self.pending_upload.take()
    }

    // ----- visualization mode -----

    pub fn set_mode(&mut self, mode: ViewMode) {
        let Some(model) = self.scene.model.as_mut() else {
            return;
        };
        modes::apply_mode(model, &self.snapshot, mode);
        self.mode = mode;
        if mode == ViewMode::Textured && self.lighting.unlit {
            lighting::apply_unlit(model, &self.snapshot, true);
        }
        self.reapply_opacity();
        log::debug!("View mode: {}", mode.label());
    }

    // ----- camera -----

    pub fn fit_view(&mut self) {
        self.frame(|viewer, bounds| framing::fit_view(bounds, viewer.config.fov_rad()));
    }

    pub fn top_view(&mut self) {
        self.frame(|_, bounds| framing::top_view(bounds));
    }

    pub fn front_view(&mut self) {
        self.frame(|_, bounds| framing::front_view(bounds));
    }

    fn frame(&mut self, pose: impl FnOnce(&Self, &corelib::bounds::Aabb) -> CameraPose) {
        let Some(model) = self.scene.model.as_ref() else {
            return;
        };
        let bounds = model.world_bounds();
        let pose = pose(self, &bounds);
        self.camera.eye = pose.position;
        self.camera.target = pose.target;
        self.orbit.stop();
        self.orbit.target = pose.target;
        self.orbit.update(&mut self.camera);
    }

    /// Per-frame camera step. Returns `true` while damped motion remains.
    pub fn tick(&mut self) -> bool {
        self.orbit.update(&mut self.camera)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    // ----- grid -----

    /// Flip grid visibility. The flag flips even before a model exists.
    pub fn toggle_grid(&mut self) {
        self.show_grid = !self.show_grid;
        if let Some(grid) = self.scene.grid.as_mut() {
            grid.visible = self.show_grid;
        }
    }

    // ----- transform -----

    pub fn set_rotation(&mut self, degrees: Vec3) {
        self.rotation_deg = degrees;
        if let Some(model) = self.scene.model.as_mut() {
            model.set_rotation_degrees(degrees);
        }
    }

    pub fn reset_transform(&mut self) {
        self.set_rotation(self.config.defaults.rotation_deg);
    }

    // ----- image -----

    pub fn set_image(&mut self, settings: ImageSettings) {
        self.image = settings;
        self.reapply_opacity();
    }

    pub fn reset_image(&mut self) {
        self.set_image(self.config.defaults.image);
    }

    fn reapply_opacity(&mut self) {
        if let Some(model) = self.scene.model.as_mut() {
            image::apply_opacity(model, &self.image, self.config.heuristics.depth_write_threshold);
        }
    }

    // ----- lighting -----

    pub fn set_lighting(&mut self, settings: LightingSettings) {
        let unlit_changed = settings.unlit != self.lighting.unlit;
        self.lighting = settings;
        lighting::apply_lights(&mut self.scene, &settings);
        if let Some(model) = self.scene.model.as_mut() {
            if unlit_changed || settings.unlit {
                lighting::apply_unlit(model, &self.snapshot, settings.unlit);
            }
            self.reapply_opacity();
        }
    }

    // ----- keyboard -----

    /// Run a shortcut. Ignored until a model is loaded.
    pub fn handle_shortcut(&mut self, shortcut: Shortcut) {
        if !self.is_loaded() {
            return;
        }
        match shortcut {
            Shortcut::FitView => self.fit_view(),
            Shortcut::TopView => self.top_view(),
            Shortcut::FrontView => self.front_view(),
            Shortcut::ToggleGrid => self.toggle_grid(),
            Shortcut::Mode(mode) => self.set_mode(mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use corelib::material::{Material, MaterialKind, MaterialSlot};
    use corelib::scene::rgb;

    use super::*;
    use crate::model::tests::sample_assets;

    fn loaded_viewer() -> Viewer {
        let mut viewer = Viewer::new(ViewerConfig::default());
        viewer.install_assets(sample_assets()).unwrap();
        viewer
    }

    fn live_slots(viewer: &Viewer) -> Vec<MaterialSlot> {
        viewer
            .scene
            .model
            .as_ref()
            .unwrap()
            .meshes()
            .iter()
            .map(|m| m.material.clone())
            .collect()
    }

    fn snapshot_slots(viewer: &Viewer) -> Vec<MaterialSlot> {
        viewer
            .scene
            .model
            .as_ref()
            .unwrap()
            .meshes()
            .iter()
            .map(|m| viewer.snapshot().get(m.id).unwrap().clone())
            .collect()
    }

    fn all_materials(viewer: &Viewer) -> Vec<Material> {
        live_slots(viewer)
            .iter()
            .flat_map(|s| s.iter().cloned().collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn operations_before_load_are_no_ops() {
        let mut viewer = Viewer::new(ViewerConfig::default());
        let eye = viewer.camera.eye;
        viewer.fit_view();
        viewer.top_view();
        viewer.set_mode(ViewMode::Wireframe);
        viewer.handle_shortcut(Shortcut::FrontView);
        viewer.set_image(ImageSettings {
            opacity: 10.0,
            ..ImageSettings::default()
        });
        assert_eq!(viewer.camera.eye, eye);
        assert_eq!(viewer.mode(), ViewMode::Textured);
        assert!(viewer.take_upload().is_none());
        assert_eq!(*viewer.status(), LoadStatus::Idle);
    }

    #[test]
    fn install_snapshots_every_mesh_and_frames_camera() {
        let mut viewer = loaded_viewer();
        assert_eq!(*viewer.status(), LoadStatus::Ready);
        assert_eq!(viewer.snapshot().len(), 2);
        assert_eq!(
            viewer.info(),
            ModelInfo {
                vertices: 9,
                faces: 3,
                textures: 1
            }
        );
        assert!(viewer.camera.distance_to_target() > 0.0);
        assert!(viewer.take_upload().is_some());
        assert!(viewer.take_upload().is_none());
    }

    #[test]
    fn textured_round_trip_restores_snapshot() {
        let mut viewer = loaded_viewer();
        viewer.set_mode(ViewMode::Wireframe);
        assert!(all_materials(&viewer).iter().all(|m| m.wireframe));
        viewer.set_mode(ViewMode::Solid);
        assert!(
            all_materials(&viewer)
                .iter()
                .all(|m| m.kind == MaterialKind::Standard)
        );
        viewer.set_mode(ViewMode::Textured);

        // The snapshot plus the current (full) opacity.
        let mut expected = snapshot_slots(&viewer);
        for m in expected.iter_mut().flat_map(|s| s.iter_mut()) {
            m.opacity = 1.0;
            m.transparent = false;
            m.depth_write = true;
        }
        assert_eq!(live_slots(&viewer), expected);
        assert_eq!(viewer.mode(), ViewMode::Textured);
    }

    #[test]
    fn opacity_rules_hold_in_every_mode() {
        let mut viewer = loaded_viewer();
        for mode in ViewMode::ALL {
            viewer.set_mode(mode);
            for (opacity, transparent, depth_write) in
                [(100.0, false, true), (40.0, true, false), (60.0, true, true)]
            {
                viewer.set_image(ImageSettings {
                    opacity,
                    ..ImageSettings::default()
                });
                for m in all_materials(&viewer) {
                    assert_eq!(m.transparent, transparent, "{mode:?} at {opacity}");
                    assert_eq!(m.depth_write, depth_write, "{mode:?} at {opacity}");
                    assert_relative_eq!(m.opacity, opacity / 100.0);
                }
            }
        }
    }

    #[test]
    fn mode_switch_keeps_current_opacity() {
        let mut viewer = loaded_viewer();
        viewer.set_image(ImageSettings {
            opacity: 40.0,
            ..ImageSettings::default()
        });
        viewer.set_mode(ViewMode::Solid);
        assert!(all_materials(&viewer).iter().all(|m| m.opacity == 0.4));
        viewer.set_mode(ViewMode::Textured);
        assert!(all_materials(&viewer).iter().all(|m| m.opacity == 0.4));
    }

    #[test]
    fn unlit_on_then_off_restores_material_state() {
        let mut viewer = loaded_viewer();
        let before = live_slots(&viewer);
        let unlit = LightingSettings {
            unlit: true,
            ..viewer.lighting()
        };
        viewer.set_lighting(unlit);
        viewer.set_lighting(unlit);
        for m in all_materials(&viewer) {
            assert_eq!(m.kind, MaterialKind::Unlit);
        }
        viewer.set_lighting(LightingSettings {
            unlit: false,
            ..unlit
        });
        let after = live_slots(&viewer);
        for (a, b) in before.iter().zip(&after) {
            for (x, y) in a.iter().zip(b.iter()) {
                assert_eq!(
                    (x.map, x.side, x.transparent, x.opacity),
                    (y.map, y.side, y.transparent, y.opacity)
                );
                assert_eq!(y.kind, MaterialKind::Phong);
            }
        }
    }

    #[test]
    fn unlit_leaves_mode_overrides_alone() {
        let mut viewer = loaded_viewer();
        viewer.set_mode(ViewMode::Wireframe);
        viewer.set_lighting(LightingSettings {
            unlit: true,
            ..viewer.lighting()
        });
        assert!(all_materials(&viewer).iter().all(|m| m.wireframe));

        // Back to textured while unlit: the unlit variant comes back.
        viewer.set_mode(ViewMode::Textured);
        assert!(
            all_materials(&viewer)
                .iter()
                .all(|m| m.kind == MaterialKind::Unlit)
        );
    }

    #[test]
    fn unlit_leaves_solid_materials_alone() {
        let mut viewer = loaded_viewer();
        viewer.set_mode(ViewMode::Solid);
        let solid = Material::standard(rgb(0x888888), 0.6, 0.1);
        viewer.set_lighting(LightingSettings {
            unlit: true,
            ..viewer.lighting()
        });
        assert!(all_materials(&viewer).iter().all(|m| *m == solid));
    }

    #[test]
    fn disabling_unlit_under_override_keeps_override() {
        for mode in [ViewMode::Wireframe, ViewMode::Solid] {
            let mut viewer = loaded_viewer();
            let on = LightingSettings {
                unlit: true,
                ..viewer.lighting()
            };
            viewer.set_lighting(on);
            viewer.set_mode(mode);
            let overridden = live_slots(&viewer);
            viewer.set_lighting(LightingSettings { unlit: false, ..on });
            assert_eq!(live_slots(&viewer), overridden, "{mode:?}");

            viewer.set_mode(ViewMode::Textured);
            let materials = all_materials(&viewer);
            assert!(materials.iter().all(|m| m.kind == MaterialKind::Phong), "{mode:?}");
            let expected: Vec<Material> = snapshot_slots(&viewer)
                .iter()
                .flat_map(|s| s.iter().cloned().collect::<Vec<_>>())
                .collect();
            for (live, orig) in materials.iter().zip(&expected) {
                assert_eq!((live.map, live.color, live.side), (orig.map, orig.color, orig.side));
            }
        }
    }

    #[test]
    fn grid_double_toggle_restores_state() {
        let mut viewer = loaded_viewer();
        assert_eq!(viewer.grid_label(), "GRID: ON");
        viewer.toggle_grid();
        assert_eq!(viewer.grid_label(), "GRID: OFF");
        assert!(!viewer.scene.grid.as_ref().unwrap().visible);
        viewer.handle_shortcut(Shortcut::ToggleGrid);
        assert_eq!(viewer.grid_label(), "GRID: ON");
        assert!(viewer.scene.grid.as_ref().unwrap().visible);
    }

    #[test]
    fn reset_transform_restores_default_rotation() {
        let mut viewer = loaded_viewer();
        viewer.set_rotation(Vec3::new(10.0, 20.0, 30.0));
        viewer.reset_transform();
        assert_eq!(viewer.rotation_deg(), Vec3::new(-91.0, 0.0, 53.0));
        let (x, y, z) = viewer
            .scene
            .model
            .as_ref()
            .unwrap()
            .pivot
            .rotation()
            .to_euler(corelib::EulerRot::XYZ);
        assert_relative_eq!(x, (-91f32).to_radians(), epsilon = 1e-4);
        assert_relative_eq!(y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(z, 53f32.to_radians(), epsilon = 1e-4);
    }

    #[test]
    fn top_and_front_views_aim_at_origin() {
        let mut viewer = loaded_viewer();
        viewer.set_rotation(Vec3::ZERO);

        viewer.handle_shortcut(Shortcut::TopView);
        assert_relative_eq!(viewer.camera.eye.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(viewer.camera.eye.y, 12.0, epsilon = 1e-3);
        assert_relative_eq!(viewer.camera.eye.z, 0.001, epsilon = 1e-4);
        assert_eq!(viewer.camera.target, Vec3::ZERO);

        viewer.front_view();
        assert_relative_eq!(viewer.camera.eye.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(viewer.camera.eye.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(viewer.camera.eye.z, 12.0, epsilon = 1e-3);
        assert_eq!(viewer.camera.target, Vec3::ZERO);
        assert_eq!(viewer.camera_label(), "CAM: 12.0");
    }

    #[test]
    fn lighting_sliders_reach_the_scene() {
        let mut viewer = loaded_viewer();
        viewer.set_lighting(LightingSettings {
            exposure: 100.0,
            ..viewer.lighting()
        });
        assert_relative_eq!(viewer.scene.exposure, 1.0, epsilon = 1e-5);
        assert_relative_eq!(
            viewer.scene.light(corelib::scene::AMBIENT_LIGHT).unwrap().intensity,
            1.3,
            epsilon = 1e-5
        );
    }

    #[test]
    fn failed_load_shows_single_message() {
        let mut viewer = Viewer::new(ViewerConfig::default());
        viewer.begin_load();
        viewer.on_load_finished(Err(anyhow::anyhow!("404 Not Found")));
        assert_eq!(
            *viewer.status(),
            LoadStatus::Failed(LOAD_FAILED_MESSAGE.to_string())
        );
        assert!(!viewer.is_loaded());
    }
}
