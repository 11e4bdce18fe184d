//! Translation/rotation/scale transform for placing quads.

use glam::{Mat4, Quat, Vec3};

/// A TRS transform composed into a model matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Translation only.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Translation and uniform scale, the common case for 2D quads.
    pub fn from_translation_scale(translation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            scale,
            ..Self::IDENTITY
        }
    }

    /// Compose into a model matrix (scale, then rotation, then translation).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_identity_matrix() {
        assert_eq!(Transform::IDENTITY.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_translation_applies_last() {
        let t = Transform::from_translation_scale(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(2.0));
        let p = t.to_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        // Scaled by 2, then moved by 10.
        assert_eq!(p, Vec4::new(12.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_rotation_composes() {
        let t = Transform {
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            ..Transform::IDENTITY
        };
        let p = t.to_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }
}
