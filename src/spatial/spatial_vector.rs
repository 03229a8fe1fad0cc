use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use na::{zero, Vector3};

use crate::{
    spatial::{pose::Pose, spatial_matrix::SpatialMatrix},
    types::Float,
    units::{self, UnitSystem},
};

/// A 6-dimensional spatial quantity stored as a linear and an angular part.
///
/// The same storage is used for motion and force quantities:
/// - a twist is `(v, ω)`, the velocity of the body point coinciding with the
///   world origin and the angular velocity;
/// - a wrench is `(F, τ)`, the force and its moment about the world origin.
///
/// The two kinds combine differently under the spatial cross product, so the
/// cross product comes in four explicitly named flavours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialVector {
    pub linear: Vector3<Float>,
    pub angular: Vector3<Float>,
}

/// Spatial velocity / acceleration / joint axis.
pub type Twist = SpatialVector;

/// Spatial force / momentum / impulse.
pub type Wrench = SpatialVector;

impl SpatialVector {
    pub fn new(linear: Vector3<Float>, angular: Vector3<Float>) -> Self {
        SpatialVector { linear, angular }
    }

    pub fn zero() -> Self {
        SpatialVector {
            linear: zero(),
            angular: zero(),
        }
    }

    pub fn linear(linear: Vector3<Float>) -> Self {
        SpatialVector {
            linear,
            angular: zero(),
        }
    }

    pub fn angular(angular: Vector3<Float>) -> Self {
        SpatialVector {
            linear: zero(),
            angular,
        }
    }

    /// Twist of a rotation with rate `omega` about an axis through `point`
    pub fn rotation_about(point: &Vector3<Float>, omega: &Vector3<Float>) -> Twist {
        SpatialVector {
            linear: point.cross(omega),
            angular: *omega,
        }
    }

    /// Wrench of a force applied at `point`
    pub fn force_at(point: &Vector3<Float>, force: &Vector3<Float>) -> Wrench {
        SpatialVector {
            linear: *force,
            angular: point.cross(force),
        }
    }

    /// Velocity of the world point `point` moving with this twist
    pub fn point_velocity(&self, point: &Vector3<Float>) -> Vector3<Float> {
        self.linear + self.angular.cross(point)
    }

    /// Moment of this wrench about `point`
    pub fn moment_about(&self, point: &Vector3<Float>) -> Vector3<Float> {
        self.angular - point.cross(&self.linear)
    }

    /// Inner product of a twist and a wrench (power), or of two axes.
    pub fn dot(&self, rhs: &SpatialVector) -> Float {
        self.linear.dot(&rhs.linear) + self.angular.dot(&rhs.angular)
    }

    pub fn norm(&self) -> Float {
        self.dot(self).sqrt()
    }

    /// Motion cross product of two twists:
    ///     (ω₁×v₂ + v₁×ω₂, ω₁×ω₂)
    ///
    /// Reference: Chapter 2.9 Spatial Cross Products in "Rigid Body Dynamics
    /// Algorithms" by Roy Featherstone
    pub fn twist_cross_twist(&self, rhs: &Twist) -> Twist {
        SpatialVector {
            linear: self.angular.cross(&rhs.linear) + self.linear.cross(&rhs.angular),
            angular: self.angular.cross(&rhs.angular),
        }
    }

    /// Force cross product of a twist with a wrench:
    ///     (ω×F, ω×τ + v×F)
    pub fn twist_cross_wrench(&self, rhs: &Wrench) -> Wrench {
        SpatialVector {
            linear: self.angular.cross(&rhs.linear),
            angular: self.angular.cross(&rhs.angular) + self.linear.cross(&rhs.linear),
        }
    }

    /// Wrench crossed with a twist, the negation of `twist_cross_wrench`.
    pub fn wrench_cross_twist(&self, rhs: &Twist) -> Wrench {
        SpatialVector {
            linear: self.linear.cross(&rhs.angular),
            angular: self.angular.cross(&rhs.angular) + self.linear.cross(&rhs.linear),
        }
    }

    /// Cross product of two wrenches treated as lines of action:
    ///     (F₁×F₂, F₁×τ₂ + τ₁×F₂)
    pub fn wrench_cross_wrench(&self, rhs: &Wrench) -> Wrench {
        SpatialVector {
            linear: self.linear.cross(&rhs.linear),
            angular: self.linear.cross(&rhs.angular) + self.angular.cross(&rhs.linear),
        }
    }

    /// Outer product `self * rhsᵗ` as a spatial matrix
    pub fn outer(&self, rhs: &SpatialVector) -> SpatialMatrix {
        SpatialMatrix {
            a11: self.linear * rhs.linear.transpose(),
            a12: self.linear * rhs.angular.transpose(),
            a21: self.angular * rhs.linear.transpose(),
            a22: self.angular * rhs.angular.transpose(),
        }
    }

    /// Re-express a twist given in a local frame in the frame that `pose`
    /// maps into.
    pub fn transform_twist(&self, pose: &Pose) -> Twist {
        let angular = pose.rotation * self.angular;
        let linear = pose.rotation * self.linear + pose.translation.cross(&angular);
        SpatialVector { linear, angular }
    }

    /// Re-express a wrench given in a local frame in the frame that `pose`
    /// maps into.
    pub fn transform_wrench(&self, pose: &Pose) -> Wrench {
        let linear = pose.rotation * self.linear;
        let angular = pose.rotation * self.angular + pose.translation.cross(&linear);
        SpatialVector { linear, angular }
    }

    pub fn convert_twist(&self, from: UnitSystem, to: UnitSystem) -> Twist {
        SpatialVector {
            linear: self.linear * units::SPEED.convert(from, to),
            angular: self.angular * units::ANGULAR_SPEED.convert(from, to),
        }
    }

    pub fn convert_acceleration(&self, from: UnitSystem, to: UnitSystem) -> Twist {
        SpatialVector {
            linear: self.linear * units::ACCELERATION.convert(from, to),
            angular: self.angular * units::ANGULAR_ACCELERATION.convert(from, to),
        }
    }

    pub fn convert_wrench(&self, from: UnitSystem, to: UnitSystem) -> Wrench {
        SpatialVector {
            linear: self.linear * units::FORCE.convert(from, to),
            angular: self.angular * units::TORQUE.convert(from, to),
        }
    }

    pub fn convert_momentum(&self, from: UnitSystem, to: UnitSystem) -> Wrench {
        SpatialVector {
            linear: self.linear * units::MOMENTUM.convert(from, to),
            angular: self.angular * units::ANGULAR_MOMENTUM.convert(from, to),
        }
    }
}

impl Default for SpatialVector {
    fn default() -> Self {
        SpatialVector::zero()
    }
}

impl Add for SpatialVector {
    type Output = SpatialVector;

    fn add(self, rhs: Self) -> Self::Output {
        SpatialVector {
            linear: self.linear + rhs.linear,
            angular: self.angular + rhs.angular,
        }
    }
}

impl Add for &SpatialVector {
    type Output = SpatialVector;

    fn add(self, rhs: Self) -> Self::Output {
        *self + *rhs
    }
}

impl AddAssign for SpatialVector {
    fn add_assign(&mut self, rhs: Self) {
        self.linear += rhs.linear;
        self.angular += rhs.angular;
    }
}

impl Sub for SpatialVector {
    type Output = SpatialVector;

    fn sub(self, rhs: Self) -> Self::Output {
        SpatialVector {
            linear: self.linear - rhs.linear,
            angular: self.angular - rhs.angular,
        }
    }
}

impl Sub for &SpatialVector {
    type Output = SpatialVector;

    fn sub(self, rhs: Self) -> Self::Output {
        *self - *rhs
    }
}

impl SubAssign for SpatialVector {
    fn sub_assign(&mut self, rhs: Self) {
        self.linear -= rhs.linear;
        self.angular -= rhs.angular;
    }
}

impl Neg for SpatialVector {
    type Output = SpatialVector;

    fn neg(self) -> Self::Output {
        SpatialVector {
            linear: -self.linear,
            angular: -self.angular,
        }
    }
}

impl Mul<Float> for SpatialVector {
    type Output = SpatialVector;

    fn mul(self, rhs: Float) -> Self::Output {
        SpatialVector {
            linear: self.linear * rhs,
            angular: self.angular * rhs,
        }
    }
}

impl Mul<Float> for &SpatialVector {
    type Output = SpatialVector;

    fn mul(self, rhs: Float) -> Self::Output {
        *self * rhs
    }
}

impl Div<Float> for SpatialVector {
    type Output = SpatialVector;

    fn div(self, rhs: Float) -> Self::Output {
        SpatialVector {
            linear: self.linear / rhs,
            angular: self.angular / rhs,
        }
    }
}
