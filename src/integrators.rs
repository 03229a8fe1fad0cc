use std::ops::{Add, Mul};

use crate::{
    error::{Error, Result},
    joint::JointState,
    types::Float,
};

/// Reject time steps that are not positive and finite
pub fn check_time_step(dt: Float) -> Result<()> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTimeStep(dt))
    }
}

/// Classical 4th-order Runge-Kutta step of `dx/dt = rate(t, x)`.
///
/// `constrain` is applied to every intermediate state before its rate is
/// evaluated, and to the final combination, e.g. to enforce contact or to
/// renormalize orientations.
pub fn runge_kutta_4<S, F, C>(state: &S, t: Float, dt: Float, mut rate: F, mut constrain: C) -> Result<S>
where
    S: Clone + Add<Output = S> + Mul<Float, Output = S>,
    F: FnMut(Float, &S) -> Result<S>,
    C: FnMut(Float, &mut S) -> Result<()>,
{
    let half = dt / 2.0;

    let k1 = rate(t, state)?;

    let mut x2 = state.clone() + k1.clone() * half;
    constrain(t + half, &mut x2)?;
    let k2 = rate(t + half, &x2)?;

    let mut x3 = state.clone() + k2.clone() * half;
    constrain(t + half, &mut x3)?;
    let k3 = rate(t + half, &x3)?;

    let mut x4 = state.clone() + k3.clone() * dt;
    constrain(t + dt, &mut x4)?;
    let k4 = rate(t + dt, &x4)?;

    let mut next = state.clone() + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);
    constrain(t + dt, &mut next)?;
    Ok(next)
}

/// Explicit Euler step, with the same constraint hook as `runge_kutta_4`
pub fn euler_step<S, F, C>(state: &S, t: Float, dt: Float, mut rate: F, mut constrain: C) -> Result<S>
where
    S: Clone + Add<Output = S> + Mul<Float, Output = S>,
    F: FnMut(Float, &S) -> Result<S>,
    C: FnMut(Float, &mut S) -> Result<()>,
{
    let mut next = state.clone() + rate(t, state)? * dt;
    constrain(t + dt, &mut next)?;
    Ok(next)
}

/// Joint states of a whole chain as one vector-space element. A rate is
/// stored in the same shape, with `(qd, qpp)` in place of `(q, qd)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainState(pub Vec<JointState>);

impl Add for ChainState {
    type Output = ChainState;

    fn add(self, rhs: ChainState) -> ChainState {
        ChainState(self.0.into_iter().zip(rhs.0).map(|(a, b)| a + b).collect())
    }
}

impl Mul<Float> for ChainState {
    type Output = ChainState;

    fn mul(self, rhs: Float) -> ChainState {
        ChainState(self.0.into_iter().map(|s| s * rhs).collect())
    }
}
