//! Independent 6-DOF bodies, integrated over position, orientation and
//! spatial momentum.
//!
//! The reference point of a body is the origin of its frame, not its center
//! of mass. Linear momentum `p` is stored with the angular momentum `h_r`
//! about the reference point, so that
//!     ṙ = v_r,  q̇ = ½ ω q,  ṗ = F,  ḣ_r = τ_r - ṙ × p
//! where `(v_r, ω) = M_r (p, h_r)` and `M_r` is the spatial mobility about
//! the reference point.
use std::{
    fmt,
    ops::{Add, Mul},
    sync::Arc,
};

use na::{Quaternion, UnitQuaternion, Vector3};
use tracing::{debug, info, trace};

use crate::{
    config::SolverConfig,
    error::{Error, Result},
    inertia::MassProperties,
    integrators::{check_time_step, runge_kutta_4},
    mechanism::{convert_force_fn, ForceFn},
    spatial::{
        pose::Pose,
        spatial_matrix::SpatialMatrix,
        spatial_vector::{SpatialVector, Twist, Wrench},
    },
    types::Float,
    units::{self, UnitSystem},
    util::quaternion_derivative,
};

/// Pose and momentum of one body. The orientation is kept as a raw
/// quaternion so that the state forms a vector space, and is renormalized
/// after every integration stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreeBodyState {
    pub position: Vector3<Float>,
    pub orientation: Quaternion<Float>,
    /// `(p, h_r)`, angular part about the reference point
    pub momentum: Wrench,
}

impl FreeBodyState {
    pub fn at_rest(pose: &Pose) -> Self {
        FreeBodyState {
            position: pose.translation,
            orientation: *pose.rotation.quaternion(),
            momentum: SpatialVector::zero(),
        }
    }

    /// State of a body at `pose` whose reference point moves with `velocity`
    /// while it spins at `omega`
    pub fn from_velocity(
        mass: &MassProperties,
        pose: &Pose,
        velocity: &Vector3<Float>,
        omega: &Vector3<Float>,
    ) -> Self {
        let cg = pose.transform_vector(&mass.cg);
        let inertia = mass.spi(&pose.rotation, &cg);
        FreeBodyState {
            position: pose.translation,
            orientation: *pose.rotation.quaternion(),
            momentum: &inertia * &SpatialVector::new(*velocity, *omega),
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, UnitQuaternion::new_normalize(self.orientation))
    }

    /// Spatial momentum about the world origin
    pub fn momentum_about_origin(&self) -> Wrench {
        let p = self.momentum.linear;
        SpatialVector::new(p, self.momentum.angular + self.position.cross(&p))
    }

    pub fn convert_from_to(&self, from: UnitSystem, to: UnitSystem) -> FreeBodyState {
        FreeBodyState {
            position: self.position * units::LENGTH.convert(from, to),
            orientation: self.orientation,
            momentum: self.momentum.convert_momentum(from, to),
        }
    }
}

impl Add for FreeBodyState {
    type Output = FreeBodyState;

    fn add(self, rhs: FreeBodyState) -> FreeBodyState {
        FreeBodyState {
            position: self.position + rhs.position,
            orientation: self.orientation + rhs.orientation,
            momentum: self.momentum + rhs.momentum,
        }
    }
}

impl Mul<Float> for FreeBodyState {
    type Output = FreeBodyState;

    fn mul(self, rhs: Float) -> FreeBodyState {
        FreeBodyState {
            position: self.position * rhs,
            orientation: self.orientation * rhs,
            momentum: self.momentum * rhs,
        }
    }
}

#[derive(Clone)]
pub struct FreeBody {
    pub name: String,
    /// Mass properties in the body frame, `cg` relative to the reference
    /// point
    pub mass: MassProperties,
    pub initial: FreeBodyState,
    /// Extra wrench on top of gravity, about the world origin
    pub applied_force: Option<ForceFn>,
}

impl FreeBody {
    pub fn new(name: &str, mass: MassProperties) -> Self {
        FreeBody {
            name: name.to_string(),
            mass,
            initial: FreeBodyState::at_rest(&Pose::identity()),
            applied_force: None,
        }
    }

    pub fn with_initial(mut self, initial: FreeBodyState) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_applied_force<F>(mut self, f: F) -> Self
    where
        F: Fn(Float, &Pose, &Twist) -> Wrench + Send + Sync + 'static,
    {
        self.applied_force = Some(Arc::new(f));
        self
    }

    /// Spatial mobility about the reference point for a body with the given
    /// orientation
    fn mobility(&self, rotation: &UnitQuaternion<Float>) -> Result<SpatialMatrix> {
        self.mass.spm(rotation, &(rotation * self.mass.cg))
    }

    /// Twist at the reference point `(v_r, ω)`
    fn reference_twist(&self, state: &FreeBodyState) -> Result<Twist> {
        let rotation = UnitQuaternion::new_normalize(state.orientation);
        Ok(&self.mobility(&rotation)? * &state.momentum)
    }

    /// Twist of the body at the world origin
    pub fn twist(&self, state: &FreeBodyState) -> Result<Twist> {
        let twist = self.reference_twist(state)?;
        Ok(SpatialVector::new(
            twist.linear + state.position.cross(&twist.angular),
            twist.angular,
        ))
    }

    pub fn kinetic_energy(&self, state: &FreeBodyState) -> Result<Float> {
        Ok(0.5 * self.reference_twist(state)?.dot(&state.momentum))
    }

    fn rate(&self, gravity: &Vector3<Float>, time: Float, state: &FreeBodyState) -> Result<FreeBodyState> {
        let reference = self.reference_twist(state)?;
        let pose = state.pose();
        let cg = pose.transform_point(&self.mass.cg);

        let mut force = SpatialVector::force_at(&cg, &(gravity * self.mass.mass));
        if let Some(f) = &self.applied_force {
            let twist = SpatialVector::new(
                reference.linear + state.position.cross(&reference.angular),
                reference.angular,
            );
            force += f(time, &pose, &twist);
        }

        let velocity = reference.linear;
        let p = state.momentum.linear;
        Ok(FreeBodyState {
            position: velocity,
            orientation: quaternion_derivative(&state.orientation, &reference.angular),
            momentum: SpatialVector::new(
                force.linear,
                force.moment_about(&state.position) - velocity.cross(&p),
            ),
        })
    }

    pub fn convert_from_to(&self, from: UnitSystem, to: UnitSystem) -> FreeBody {
        FreeBody {
            name: self.name.clone(),
            mass: self.mass.convert_to(to),
            initial: self.initial.convert_from_to(from, to),
            applied_force: self
                .applied_force
                .as_ref()
                .map(|f| convert_force_fn(f, from, to)),
        }
    }
}

impl fmt::Debug for FreeBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeBody")
            .field("name", &self.name)
            .field("mass", &self.mass)
            .field("initial", &self.initial)
            .field("applied_force", &self.applied_force.as_ref().map(|_| "Fn"))
            .finish()
    }
}

/// Owns a set of free bodies and advances each of them independently.
#[derive(Clone, Debug)]
pub struct FreeBodySolver {
    bodies: Vec<FreeBody>,
    config: SolverConfig,
    time: Float,
    states: Vec<FreeBodyState>,
}

impl FreeBodySolver {
    /// Bodies in another unit system than the configuration are converted.
    pub fn new(bodies: Vec<FreeBody>, config: SolverConfig) -> Result<Self> {
        let bodies: Vec<FreeBody> = bodies
            .into_iter()
            .map(|body| {
                if body.mass.units == config.units {
                    body
                } else {
                    body.convert_from_to(body.mass.units, config.units)
                }
            })
            .collect();
        for body in bodies.iter() {
            if body.mass.mass <= 0.0 {
                return Err(Error::NonPositiveMass(body.mass.mass));
            }
            body.mobility(&UnitQuaternion::identity())?;
        }

        let states = bodies.iter().map(|body| body.initial).collect();
        info!(bodies = bodies.len(), units = ?config.units, "free body solver ready");
        Ok(FreeBodySolver {
            bodies,
            config,
            time: 0.0,
            states,
        })
    }

    pub fn bodies(&self) -> &[FreeBody] {
        &self.bodies
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn time(&self) -> Float {
        self.time
    }

    pub fn states(&self) -> &[FreeBodyState] {
        &self.states
    }

    pub fn reset(&mut self) {
        debug!("resetting free body solver");
        self.time = 0.0;
        self.states = self.bodies.iter().map(|body| body.initial).collect();
    }

    /// Advance by `dt`. On error, states and time are left untouched.
    pub fn update(&mut self, dt: Float) -> Result<()> {
        check_time_step(dt)?;
        let gravity = self.config.gravity;
        let next = self
            .bodies
            .iter()
            .zip(self.states.iter())
            .map(|(body, state)| {
                runge_kutta_4(
                    state,
                    self.time,
                    dt,
                    |t, x: &FreeBodyState| body.rate(&gravity, t, x),
                    |_, x: &mut FreeBodyState| {
                        x.orientation = x.orientation.normalize();
                        Ok(())
                    },
                )
            })
            .collect::<Result<Vec<FreeBodyState>>>()?;
        self.states = next;
        self.time += dt;
        trace!(time = self.time, "free body step");
        Ok(())
    }

    pub fn poses(&self) -> Vec<Pose> {
        self.states.iter().map(|state| state.pose()).collect()
    }

    /// Twist of body `i` at the world origin
    pub fn twist(&self, i: usize) -> Result<Twist> {
        self.bodies[i].twist(&self.states[i])
    }

    pub fn kinetic_energy(&self, i: usize) -> Result<Float> {
        self.bodies[i].kinetic_energy(&self.states[i])
    }

    pub fn momentum_about_origin(&self, i: usize) -> Wrench {
        self.states[i].momentum_about_origin()
    }

    pub fn convert_to(&self, to: UnitSystem) -> FreeBodySolver {
        let from = self.config.units;
        FreeBodySolver {
            bodies: self.bodies.iter().map(|b| b.convert_from_to(from, to)).collect(),
            config: self.config.convert_to(to),
            time: self.time,
            states: self.states.iter().map(|s| s.convert_from_to(from, to)).collect(),
        }
    }
}
