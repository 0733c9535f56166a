//! Math utilities and types
//!
//! Provides the small set of math types scene authoring needs. Rotations are
//! authored as XYZ Euler angles in degrees, which is how level scripts think
//! about them, and converted to quaternions only when a matrix is required.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation as XYZ Euler angles in degrees
    pub rotation: Vec3,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set the Euler rotation in degrees
    #[must_use]
    pub fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees;
        self
    }

    /// Set the scale
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation as a unit quaternion (X applied first, then Y, then Z)
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler_angles(
            utils::deg_to_rad(self.rotation.x),
            utils::deg_to_rad(self.rotation.y),
            utils::deg_to_rad(self.rotation.z),
        )
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation_quat().to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Wrap an angle in degrees into `[0, 360)`
    pub fn wrap_degrees(degrees: f32) -> f32 {
        degrees.rem_euclid(360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_matrix() {
        let transform = Transform::identity();
        assert_relative_eq!(transform.to_matrix(), Mat4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_translation_applies_last() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::new(2.0, 2.0, 2.0));
        let point = transform.to_matrix().transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(point.x, 3.0, epsilon = 1e-6);
        assert_relative_eq!(point.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(point.z, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_x_rotation_maps_y_to_z() {
        let transform = Transform::identity().with_rotation(Vec3::new(90.0, 0.0, 0.0));
        let rotated = transform.rotation_quat() * Vec3::y();
        assert_relative_eq!(rotated, Vec3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_relative_eq!(utils::wrap_degrees(370.0), 10.0, epsilon = 1e-4);
        assert_relative_eq!(utils::wrap_degrees(-90.0), 270.0, epsilon = 1e-4);
    }
}
