//! Damped orbit controller: rotates, pans and zooms a [`Camera`] around a
//! target point.

use std::f32::consts::PI;

use crate::{Vec3, camera::Camera};

/// Keeps the polar angle away from the poles so `look_at` keeps a valid up.
const POLAR_EPS: f32 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, measured from +Z towards +X.
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            // atan2 keeps precision for offsets almost parallel to +Y.
            phi: Vec3::new(v.x, 0.0, v.z).length().atan2(v.y),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let s = self.phi.sin() * self.radius;
        Vec3::new(
            s * self.theta.sin(),
            self.phi.cos() * self.radius,
            s * self.theta.cos(),
        )
    }
}

#[derive(Clone, Debug)]
pub struct OrbitController {
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    delta: Spherical,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            min_distance: 1.0,
            max_distance: 10_000.0,
            enable_damping: true,
            damping_factor: 0.08,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.5,
            delta: Spherical::default(),
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_distance_limits(&mut self, min: f32, max: f32) {
        self.min_distance = min;
        self.max_distance = max.max(min);
    }

    /// Rotate by a drag of `dx`, `dy` pixels on a viewport `height` pixels tall.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, height: f32) {
        let h = height.max(1.0);
        self.delta.theta -= 2.0 * PI * dx / h * self.rotate_speed;
        self.delta.phi -= 2.0 * PI * dy / h * self.rotate_speed;
    }

    /// Pan by a drag of `dx`, `dy` pixels, scaled so the point under the
    /// cursor follows it at the target distance.
    pub fn pan_by_pixels(&mut self, dx: f32, dy: f32, height: f32, camera: &Camera) {
        let offset = camera.eye - self.target;
        let target_distance = offset.length() * (camera.fov_y_rad * 0.5).tan();
        let h = height.max(1.0);

        let forward = (self.target - camera.eye).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward);

        let k = 2.0 * target_distance / h * self.pan_speed;
        self.pan_offset += right * (-dx * k) + up * (dy * k);
    }

    /// Mouse wheel: positive `steps` zooms in.
    pub fn zoom_by_wheel(&mut self, steps: f32) {
        let factor = 0.95f32.powf(self.zoom_speed * steps.abs());
        if steps > 0.0 {
            self.scale *= factor;
        } else if steps < 0.0 {
            self.scale /= factor;
        }
    }

    /// Drop any pending rotate/pan/zoom motion.
    pub fn stop(&mut self) {
        self.delta = Spherical::default();
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }

    /// Apply pending input to the camera. Returns `true` if there is still
    /// damped motion left to apply on later frames.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let mut s = Spherical::from_offset(camera.eye - self.target);

        let k = if self.enable_damping { self.damping_factor } else { 1.0 };
        s.theta += self.delta.theta * k;
        s.phi += self.delta.phi * k;
        s.phi = s.phi.clamp(POLAR_EPS, PI - POLAR_EPS);
        s.radius = (s.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * k;
        camera.target = self.target;
        camera.eye = self.target + s.to_offset();

        self.scale = 1.0;
        if self.enable_damping {
            self.delta.theta *= 1.0 - self.damping_factor;
            self.delta.phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }

        self.delta.theta.abs() > 1e-6 || self.delta.phi.abs() > 1e-6 || self.pan_offset.length_squared() > 1e-12
    }
}
