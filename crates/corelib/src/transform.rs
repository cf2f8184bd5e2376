use crate::{EulerRot, Mat4, Quat, Vec3};

/// Translation / Euler XYZ rotation / scale, composed as T * R * S.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians (XYZ order).
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: Vec3, rotation_euler: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation_euler,
            scale,
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Set the rotation from angles in degrees.
    pub fn set_rotation_degrees(&mut self, degrees: Vec3) {
        self.rotation_euler = Vec3::new(
            degrees.x.to_radians(),
            degrees.y.to_radians(),
            degrees.z.to_radians(),
        );
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation_euler.x,
            self.rotation_euler.y,
            self.rotation_euler.z,
        )
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn degrees_are_stored_as_radians() {
        let mut t = Transform::identity();
        t.set_rotation_degrees(Vec3::new(-91.0, 0.0, 53.0));
        assert_relative_eq!(t.rotation_euler.x, (-91f32).to_radians());
        assert_relative_eq!(t.rotation_euler.z, 53f32.to_radians());
    }

    #[test]
    fn rotation_applies_x_then_y_then_z_intrinsic() {
        let mut t = Transform::identity();
        t.rotation_euler = Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, 0.0);
        let p = t.matrix().transform_point3(Vec3::Y);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-6);
    }
}
