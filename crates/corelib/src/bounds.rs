//! Axis-aligned bounding boxes.

use crate::{Mat4, Vec3};

/// Axis-aligned bounding box. The default value is empty (inverted) and
/// grows with [`Aabb::expand`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.expand(p);
        }
        aabb
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// `true` when the box has a zero extent on some axis (or is empty).
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || self.size().min_element() <= 0.0
    }

    #[inline]
    pub fn expand(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Half the diagonal length.
    pub fn radius(&self) -> f32 {
        self.size().length() * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box enclosing the eight transformed corners.
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        Aabb::from_points(self.corners().iter().map(|&c| m.transform_point3(c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_box_has_zero_size() {
        let b = Aabb::default();
        assert!(b.is_empty());
        assert_eq!(b.size(), Vec3::ZERO);
        assert_eq!(b.radius(), 0.0);
    }

    #[test]
    fn radius_is_half_diagonal() {
        let b = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.0, 2.0, 1.0));
        assert_relative_eq!(b.radius(), 1.5);
        assert!(!b.is_degenerate());
    }

    #[test]
    fn flat_box_is_degenerate() {
        let b = Aabb::from_points([Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)]);
        assert!(b.is_degenerate());
    }

    #[test]
    fn rotation_swaps_extents() {
        let b = Aabb::from_center_size(Vec3::ZERO, Vec3::new(10.0, 4.0, 6.0));
        let r = b.transformed(&Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let s = r.size();
        assert_relative_eq!(s.x, 6.0, epsilon = 1e-4);
        assert_relative_eq!(s.y, 4.0, epsilon = 1e-4);
        assert_relative_eq!(s.z, 10.0, epsilon = 1e-4);
    }
}
