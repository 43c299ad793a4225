//! Transform types and the mesh-to-camera axis convention.

use glam::{EulerRot, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local transform of a scene node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Build a rotation from Euler angles in degrees, applied Z then X then Y.
    pub fn with_euler_degrees(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Quat::from_euler(
            EulerRot::YXZ,
            y.to_radians(),
            x.to_radians(),
            z.to_radians(),
        );
        self
    }

    /// The local +Z axis expressed in the parent's frame.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

/// Remap a mesh-space direction or point into camera space.
///
/// Mesh Y becomes camera Z (negated) and mesh Z becomes camera Y.
pub fn mesh_to_camera_axes(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/// Rotation whose +Z axis points along `forward`, keeping +Y as close to `up` as possible.
///
/// Returns `None` when `forward` has no usable length. When `forward` is parallel to
/// `up` the shortest arc from +Z is used instead.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let z = forward.try_normalize()?;
    let Some(x) = up.cross(z).try_normalize() else {
        return Some(Quat::from_rotation_arc(Vec3::Z, z));
    };
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn test_mesh_to_camera_axes() {
        assert_eq!(mesh_to_camera_axes(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 3.0, -2.0));
        assert_eq!(mesh_to_camera_axes(Vec3::Y), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_look_rotation_identity() {
        let q = look_rotation(Vec3::Z, Vec3::Y).unwrap();
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn test_look_rotation_points_forward() {
        for dir in [Vec3::X, Vec3::NEG_X, Vec3::NEG_Z, Vec3::new(1.0, 1.0, 0.0)] {
            let q = look_rotation(dir, Vec3::Y).unwrap();
            assert!(approx(q * Vec3::Z, dir.normalize()), "{dir:?}");
            // Up stays in the vertical plane containing forward
            assert!((q * Vec3::X).y.abs() < 1e-5);
        }
    }

    #[test]
    fn test_look_rotation_parallel_to_up() {
        let q = look_rotation(Vec3::Y, Vec3::Y).unwrap();
        assert!(approx(q * Vec3::Z, Vec3::Y));
        let q = look_rotation(Vec3::NEG_Y, Vec3::Y).unwrap();
        assert!(approx(q * Vec3::Z, Vec3::NEG_Y));
    }

    #[test]
    fn test_look_rotation_zero() {
        assert!(look_rotation(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_euler_degrees() {
        let t = Transform::IDENTITY.with_euler_degrees(0.0, 90.0, 0.0);
        assert!(approx(t.forward(), Vec3::X));
    }
}
