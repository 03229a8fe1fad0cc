use na::UnitVector3;

use crate::{
    spatial::{
        pose::Pose,
        spatial_vector::{SpatialVector, Twist},
    },
    types::Float,
};

/// Translation of the joint frame by `q` along `axis`
pub fn local_step(axis: &UnitVector3<Float>, q: Float) -> Pose {
    Pose::translation(axis.into_inner() * q)
}

/// Pure translation along the joint axis, in world coordinates
pub fn spatial_axis(axis: &UnitVector3<Float>, pose: &Pose) -> Twist {
    SpatialVector::linear(pose.rotation * axis.into_inner())
}
