//! Viewer configuration: where the model lives and how the UI starts.

use asset::LoadOptions;
use corelib::Vec3;

use crate::{image::ImageSettings, lighting::LightingSettings};

pub const DEFAULT_BASE_URL: &str = "https://pub-f92ec188234b4317a2692473956f6954.r2.dev/tintal/";

/// Spherical placement of the camera right after load.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitialView {
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    pub distance_multiplier: f32,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            azimuth_deg: 40.0,
            elevation_deg: 28.0,
            distance_multiplier: 1.5,
        }
    }
}

/// Visual-tuning thresholds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Heuristics {
    /// Materials write depth only above this opacity.
    pub depth_write_threshold: f32,
    /// Progress reported (as a share of the estimate) once materials are in.
    pub placeholder_fraction: f64,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            depth_write_threshold: 0.5,
            placeholder_fraction: 0.02,
        }
    }
}

/// Slider values restored by the reset buttons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Defaults {
    /// Model rotation in degrees.
    pub rotation_deg: Vec3,
    pub image: ImageSettings,
    pub lighting: LightingSettings,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            rotation_deg: Vec3::new(-91.0, 0.0, 53.0),
            image: ImageSettings::default(),
            lighting: LightingSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub base_url: String,
    pub obj_file: String,
    pub mtl_file: String,
    /// Estimated total transfer size in bytes (progress-bar scaling only).
    pub estimated_total_bytes: u64,
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub initial_view: InitialView,
    pub defaults: Defaults,
    pub heuristics: Heuristics,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            obj_file: "Mesh.obj".into(),
            mtl_file: "Mesh.mtl".into(),
            estimated_total_bytes: 278 * 1024 * 1024,
            fov_deg: 50.0,
            initial_view: InitialView::default(),
            defaults: Defaults::default(),
            heuristics: Heuristics::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            mtl_file: self.mtl_file.clone(),
            obj_file: self.obj_file.clone(),
            estimated_total: self.estimated_total_bytes,
            placeholder_fraction: self.heuristics.placeholder_fraction,
        }
    }

    #[inline]
    pub fn fov_rad(&self) -> f32 {
        self.fov_deg.to_radians()
    }
}
