use std::{
    fmt,
    ops::{Add, Mul},
    sync::Arc,
};

use na::{UnitVector3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    spatial::{pose::Pose, spatial_vector::Twist},
    types::Float,
    units::{self, UnitSystem},
};

pub mod prismatic;
pub mod revolute;

/// Driver callback `(time, q, qd) -> value`. The value is a force/torque or
/// an acceleration depending on the joint's `Prescribed` mode.
pub type DriverFn = Arc<dyn Fn(Float, Float, Float) -> Float + Send + Sync>;

/// The single degree of freedom of a joint, about or along an axis of the
/// joint frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointAxis {
    PrismaticX,
    PrismaticY,
    PrismaticZ,
    RevoluteX,
    RevoluteY,
    RevoluteZ,
}

impl JointAxis {
    /// Axis direction in the joint frame
    pub fn direction(&self) -> UnitVector3<Float> {
        match self {
            JointAxis::PrismaticX | JointAxis::RevoluteX => Vector3::x_axis(),
            JointAxis::PrismaticY | JointAxis::RevoluteY => Vector3::y_axis(),
            JointAxis::PrismaticZ | JointAxis::RevoluteZ => Vector3::z_axis(),
        }
    }

    pub fn is_revolute(&self) -> bool {
        matches!(
            self,
            JointAxis::RevoluteX | JointAxis::RevoluteY | JointAxis::RevoluteZ
        )
    }

    /// Pose of the joint frame after moving by `q`, relative to where it
    /// sits at `q = 0`.
    pub fn local_step(&self, q: Float) -> Pose {
        if self.is_revolute() {
            revolute::local_step(&self.direction(), q)
        } else {
            prismatic::local_step(&self.direction(), q)
        }
    }

    /// Spatial axis `s` in world coordinates, for a joint frame at world
    /// `pose`
    pub fn axis(&self, pose: &Pose) -> Twist {
        if self.is_revolute() {
            revolute::spatial_axis(&self.direction(), pose)
        } else {
            prismatic::spatial_axis(&self.direction(), pose)
        }
    }

    /// Conversion factors for (coordinate, rate) from `from` to `to`
    fn state_factors(&self, from: UnitSystem, to: UnitSystem) -> (Float, Float) {
        if self.is_revolute() {
            (1.0, units::ANGULAR_SPEED.convert(from, to))
        } else {
            (
                units::LENGTH.convert(from, to),
                units::SPEED.convert(from, to),
            )
        }
    }

    /// Conversion factor of a driver value from `from` to `to`
    fn drive_factor(&self, prescribed: Prescribed, from: UnitSystem, to: UnitSystem) -> Float {
        match (prescribed, self.is_revolute()) {
            (Prescribed::Load, true) => units::TORQUE.convert(from, to),
            (Prescribed::Load, false) => units::FORCE.convert(from, to),
            (Prescribed::Motion, true) => units::ANGULAR_ACCELERATION.convert(from, to),
            (Prescribed::Motion, false) => units::ACCELERATION.convert(from, to),
        }
    }
}

/// Whether the driver supplies the joint force (the solver finds the
/// acceleration) or the joint acceleration (the solver finds the force).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Prescribed {
    #[default]
    Load,
    Motion,
}

/// Driver output for one link at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JointDrive {
    /// Joint force or torque `Q`
    Load(Float),
    /// Joint acceleration `qpp`
    Motion(Float),
}

#[derive(Clone)]
pub struct JointProperties {
    pub axis: JointAxis,
    pub prescribed: Prescribed,
    driver: Option<DriverFn>,
}

impl JointProperties {
    /// An undriven joint, free to move under load
    pub fn new(axis: JointAxis) -> Self {
        JointProperties {
            axis,
            prescribed: Prescribed::Load,
            driver: None,
        }
    }

    pub fn with_driver<F>(mut self, prescribed: Prescribed, driver: F) -> Self
    where
        F: Fn(Float, Float, Float) -> Float + Send + Sync + 'static,
    {
        self.set_driver(prescribed, driver);
        self
    }

    pub fn set_driver<F>(&mut self, prescribed: Prescribed, driver: F)
    where
        F: Fn(Float, Float, Float) -> Float + Send + Sync + 'static,
    {
        self.prescribed = prescribed;
        self.driver = Some(Arc::new(driver));
    }

    pub fn clear_driver(&mut self) {
        self.driver = None;
    }

    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Evaluate the driver. A missing driver means zero load, or zero
    /// acceleration for a prescribed-motion joint.
    pub fn drive(&self, time: Float, state: &JointState) -> JointDrive {
        let value = self
            .driver
            .as_ref()
            .map_or(0.0, |driver| driver(time, state.q, state.qd));
        match self.prescribed {
            Prescribed::Load => JointDrive::Load(value),
            Prescribed::Motion => JointDrive::Motion(value),
        }
    }

    /// Same joint, with the driver wrapped to take and return values in `to`
    pub fn convert_from_to(&self, from: UnitSystem, to: UnitSystem) -> JointProperties {
        let driver = match &self.driver {
            Some(driver) if from != to => {
                let driver = driver.clone();
                let (q_back, qd_back) = self.axis.state_factors(to, from);
                let out = self.axis.drive_factor(self.prescribed, from, to);
                let wrapped: DriverFn =
                    Arc::new(move |t, q, qd| driver(t, q * q_back, qd * qd_back) * out);
                Some(wrapped)
            }
            other => other.clone(),
        };
        JointProperties {
            axis: self.axis,
            prescribed: self.prescribed,
            driver,
        }
    }
}

impl fmt::Debug for JointProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JointProperties")
            .field("axis", &self.axis)
            .field("prescribed", &self.prescribed)
            .field("driver", &self.driver.as_ref().map(|_| "Fn"))
            .finish()
    }
}

/// Coordinate and rate of one joint.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JointState {
    pub q: Float,
    pub qd: Float,
}

impl JointState {
    pub fn new(q: Float, qd: Float) -> Self {
        JointState { q, qd }
    }

    pub fn convert_from_to(&self, axis: JointAxis, from: UnitSystem, to: UnitSystem) -> JointState {
        let (fq, fqd) = axis.state_factors(from, to);
        JointState {
            q: self.q * fq,
            qd: self.qd * fqd,
        }
    }
}

impl Add for JointState {
    type Output = JointState;

    fn add(self, rhs: JointState) -> JointState {
        JointState {
            q: self.q + rhs.q,
            qd: self.qd + rhs.qd,
        }
    }
}

impl Mul<Float> for JointState {
    type Output = JointState;

    fn mul(self, rhs: Float) -> JointState {
        JointState {
            q: self.q * rhs,
            qd: self.qd * rhs,
        }
    }
}
