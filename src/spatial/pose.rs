use std::ops::Mul;

use na::{Isometry3, Translation3, UnitQuaternion, Vector3};

use crate::{
    types::Float,
    units::{self, UnitSystem},
};

/// Position and orientation of a frame relative to another.
#[derive(Clone, Debug, PartialEq, Copy)]
pub struct Pose {
    pub rotation: UnitQuaternion<Float>,
    pub translation: Vector3<Float>,
}

impl Pose {
    pub fn new(translation: Vector3<Float>, rotation: UnitQuaternion<Float>) -> Self {
        Pose {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Pose {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn translation(translation: Vector3<Float>) -> Self {
        Pose {
            rotation: UnitQuaternion::identity(),
            translation,
        }
    }

    pub fn rotation(rotation: UnitQuaternion<Float>) -> Self {
        Pose {
            rotation,
            translation: Vector3::zeros(),
        }
    }

    pub fn inverse(&self) -> Pose {
        let rotation = self.rotation.inverse();
        Pose {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// Map a point expressed in this frame to the parent frame
    pub fn transform_point(&self, point: &Vector3<Float>) -> Vector3<Float> {
        self.rotation * point + self.translation
    }

    /// Rotate a direction expressed in this frame to the parent frame
    pub fn transform_vector(&self, vector: &Vector3<Float>) -> Vector3<Float> {
        self.rotation * vector
    }

    pub fn to_isometry(&self) -> Isometry3<Float> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }

    pub fn convert_from_to(&self, from: UnitSystem, to: UnitSystem) -> Pose {
        Pose {
            rotation: self.rotation,
            translation: self.translation * units::LENGTH.convert(from, to),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::identity()
    }
}

impl Mul<&Pose> for &Pose {
    type Output = Pose;

    /// lhs maps B to A, rhs maps C to B, returns the pose mapping C to A.
    fn mul(self, rhs: &Pose) -> Pose {
        Pose {
            rotation: self.rotation * rhs.rotation,
            translation: self.translation + self.rotation * rhs.translation,
        }
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        &self * &rhs
    }
}

#[cfg(test)]
mod pose_tests {
    use na::vector;

    use super::*;
    use crate::{assert_vec_close, units::UnitSystem};

    #[test]
    fn compose_matches_isometry() {
        // Arrange
        let a = Pose::new(vector![1.0, 2.0, 3.0], UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3));
        let b = Pose::new(vector![-1.0, 0.5, 0.0], UnitQuaternion::from_euler_angles(-0.4, 0.0, 1.1));
        let p = vector![0.3, 0.2, -0.7];

        // Act
        let composed = &a * &b;

        // Assert
        let iso = a.to_isometry() * b.to_isometry();
        assert_vec_close!(
            composed.transform_point(&p),
            iso.transform_point(&p.into()).coords,
            1e-12
        );
    }

    #[test]
    fn inverse_round_trip() {
        // Arrange
        let pose = Pose::new(vector![1.0, -2.0, 0.5], UnitQuaternion::from_euler_angles(0.7, -0.3, 0.2));
        let p = vector![4.0, 5.0, 6.0];

        // Act
        let back = pose.inverse().transform_point(&pose.transform_point(&p));

        // Assert
        assert_vec_close!(back, p, 1e-12);
    }

    #[test]
    fn convert_scales_translation_only() {
        // Arrange
        let pose = Pose::new(vector![1.0, 0.0, 2.0], UnitQuaternion::from_euler_angles(0.5, 0.0, 0.0));

        // Act
        let converted = pose.convert_from_to(UnitSystem::SI, UnitSystem::MMKS);

        // Assert
        assert_vec_close!(converted.translation, vector![1000.0, 0.0, 2000.0], 1e-9);
        assert_eq!(converted.rotation, pose.rotation);
    }
}
