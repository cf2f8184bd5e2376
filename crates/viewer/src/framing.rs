//! Camera placements derived from the model's world-space bounds. Every
//! framing looks at the origin, where the pivot puts the model's center.

use std::f32::consts::FRAC_PI_4;

use corelib::{Vec3, bounds::Aabb};

use crate::config::InitialView;

/// Distance multiplier shared by the fit/top/front framings.
const FRAME_MARGIN: f32 = 1.2;
/// Tiny horizontal offset so a top-down view keeps a valid up vector.
const TOP_VIEW_NUDGE: f32 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    fn looking_at_origin(position: Vec3) -> Self {
        Self {
            position,
            target: Vec3::ZERO,
        }
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }
}

/// Clip planes and orbit limits scaled to the model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleLimits {
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl ScaleLimits {
    pub fn for_radius(radius: f32) -> Self {
        Self {
            near: radius * 0.001,
            far: radius * 50.0,
            min_distance: radius * 0.01,
            max_distance: radius * 10.0,
        }
    }
}

/// Distance at which a sphere of `radius` fills the vertical field of view.
fn fitting_distance(bounds: &Aabb, fov_rad: f32) -> f32 {
    bounds.radius() / (fov_rad * 0.5).sin()
}

pub fn initial_view(bounds: &Aabb, fov_rad: f32, view: &InitialView) -> CameraPose {
    let dist = fitting_distance(bounds, fov_rad) * view.distance_multiplier;
    let az = view.azimuth_deg.to_radians();
    let el = view.elevation_deg.to_radians();
    CameraPose::looking_at_origin(Vec3::new(
        dist * el.cos() * az.sin(),
        dist * el.sin(),
        dist * el.cos() * az.cos(),
    ))
}

pub fn fit_view(bounds: &Aabb, fov_rad: f32) -> CameraPose {
    let dist = fitting_distance(bounds, fov_rad) * FRAME_MARGIN;
    CameraPose::looking_at_origin(Vec3::new(
        dist * FRAC_PI_4.sin(),
        dist * 0.4,
        dist * FRAC_PI_4.cos(),
    ))
}

pub fn top_view(bounds: &Aabb) -> CameraPose {
    let size = bounds.size();
    let dist = size.x.max(size.z) * FRAME_MARGIN;
    CameraPose::looking_at_origin(Vec3::new(0.0, dist, TOP_VIEW_NUDGE))
}

pub fn front_view(bounds: &Aabb) -> CameraPose {
    let size = bounds.size();
    let dist = size.x.max(size.y) * FRAME_MARGIN;
    CameraPose::looking_at_origin(Vec3::new(0.0, 0.0, dist))
}
