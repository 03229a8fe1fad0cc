use na::{UnitQuaternion, UnitVector3};

use crate::{
    spatial::{
        pose::Pose,
        spatial_vector::{SpatialVector, Twist},
    },
    types::Float,
};

/// Rotation of the joint frame by `q` about `axis`
pub fn local_step(axis: &UnitVector3<Float>, q: Float) -> Pose {
    Pose::rotation(UnitQuaternion::from_axis_angle(axis, q))
}

/// Unit rotation about the joint axis through the joint origin:
///     s = [r × z; z]
/// where `r` is the joint origin and `z` the axis, both in world coordinates.
pub fn spatial_axis(axis: &UnitVector3<Float>, pose: &Pose) -> Twist {
    let z = pose.rotation * axis.into_inner();
    SpatialVector::rotation_about(&pose.translation, &z)
}
