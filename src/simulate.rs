use na::Vector3;
use tracing::{debug, info, trace};

use crate::{
    config::SolverConfig,
    contact::{contact_status, handle_contact, ContactStatus},
    dynamics::{forward_kinematics, solve, PartialKinematics, ResolvedKinematics},
    error::{Error, Result},
    integrators::{check_time_step, runge_kutta_4, ChainState},
    joint::JointState,
    mechanism::{Chain, Topology},
    spatial::pose::Pose,
    types::Float,
    units::UnitSystem,
};

/// Owns a chain, its joint states and the current time, and advances them
/// with RK4.
#[derive(Clone, Debug)]
pub struct ChainSolver {
    chain: Chain,
    topology: Topology,
    config: SolverConfig,
    time: Float,
    state: Vec<JointState>,
}

impl ChainSolver {
    /// The chain is converted to the configured unit system if needed.
    pub fn new(chain: Chain, config: SolverConfig) -> Result<Self> {
        if chain.links.is_empty() {
            return Err(Error::EmptyChain);
        }
        chain.validate()?;
        let chain = if chain.units == config.units {
            chain
        } else {
            chain.convert_to(config.units)
        };

        let topology = Topology::new(&chain);
        let state = chain.initial_state();
        info!(
            links = chain.links.len(),
            units = ?config.units,
            contact = chain.contact.is_some() && config.contact,
            "chain solver ready"
        );
        Ok(ChainSolver {
            chain,
            topology,
            config,
            time: 0.0,
            state,
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn time(&self) -> Float {
        self.time
    }

    pub fn state(&self) -> &[JointState] {
        &self.state
    }

    /// Replace the joint states, one per link
    pub fn set_state(&mut self, state: Vec<JointState>) -> Result<()> {
        if state.len() != self.chain.links.len() {
            return Err(Error::StateLength {
                expected: self.chain.links.len(),
                found: state.len(),
            });
        }
        self.state = state;
        Ok(())
    }

    /// Back to time zero and the links' initial states
    pub fn reset(&mut self) {
        debug!("resetting chain solver");
        self.time = 0.0;
        self.state = self.chain.initial_state();
    }

    fn contact_enabled(&self) -> bool {
        self.config.contact && self.chain.contact.is_some()
    }

    /// Advance by `dt`. On error, state and time are left untouched.
    pub fn update(&mut self, dt: Float) -> Result<()> {
        check_time_step(dt)?;
        let chain = &self.chain;
        let topology = &self.topology;
        let gravity = self.config.gravity;
        let restitution = self.config.restitution;
        let contact = self.contact_enabled();

        let rate = |t: Float, x: &ChainState| -> Result<ChainState> {
            let resolved = solve(chain, topology, &gravity, t, &x.0)?;
            Ok(ChainState(
                resolved
                    .iter()
                    .map(|r| JointState::new(r.kinematics.state.qd, r.qpp))
                    .collect(),
            ))
        };
        let constrain = |t: Float, x: &mut ChainState| -> Result<()> {
            if contact {
                handle_contact(chain, topology, &gravity, restitution, t, &mut x.0)?;
            }
            Ok(())
        };

        let next = runge_kutta_4(&ChainState(self.state.clone()), self.time, dt, rate, constrain)?;
        self.state = next.0;
        self.time += dt;
        trace!(time = self.time, "chain step");
        Ok(())
    }

    /// Forward kinematics at the current state
    pub fn kinematics(&self) -> Vec<PartialKinematics> {
        forward_kinematics(&self.chain, &self.topology, &self.config.gravity, self.time, &self.state)
    }

    /// Full dynamics solution at the current state
    pub fn resolve(&self) -> Result<Vec<ResolvedKinematics>> {
        solve(&self.chain, &self.topology, &self.config.gravity, self.time, &self.state)
    }

    /// World pose of every link's joint frame
    pub fn link_poses(&self) -> Vec<Pose> {
        self.kinematics().into_iter().map(|k| k.pose).collect()
    }

    /// Joint force or torque of every joint at the current state. For a
    /// load-driven joint this is its driver value, for a motion-driven joint
    /// the force needed to follow the prescribed acceleration.
    pub fn joint_forces(&self) -> Result<Vec<Float>> {
        Ok(self.resolve()?.iter().map(|r| r.joint_force).collect())
    }

    /// Penetration and normal velocity of the declared contact, if any
    pub fn contact_status(&self) -> Option<ContactStatus> {
        let contact = self.chain.contact.as_ref()?;
        contact_status(contact, &self.kinematics())
    }

    /// Apply the contact impulse at the current state, if colliding
    pub fn handle_contact(&mut self) -> Result<bool> {
        if !self.contact_enabled() {
            return Ok(false);
        }
        handle_contact(
            &self.chain,
            &self.topology,
            &self.config.gravity,
            self.config.restitution,
            self.time,
            &mut self.state,
        )
    }

    pub fn convert_to(&self, to: UnitSystem) -> ChainSolver {
        let from = self.config.units;
        ChainSolver {
            chain: self.chain.convert_to(to),
            topology: self.topology.clone(),
            config: self.config.convert_to(to),
            time: self.time,
            state: self
                .chain
                .links
                .iter()
                .zip(self.state.iter())
                .map(|(link, state)| state.convert_from_to(link.joint.axis, from, to))
                .collect(),
        }
    }

    pub fn gravity(&self) -> &Vector3<Float> {
        &self.config.gravity
    }
}

/// Sampled trajectory, the initial state included.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    pub times: Vec<Float>,
    pub states: Vec<Vec<JointState>>,
}

/// Simulate from the solver's current time until `final_time` with a time
/// step of `dt`.
pub fn simulate(solver: &mut ChainSolver, final_time: Float, dt: Float) -> Result<Trajectory> {
    check_time_step(dt)?;
    let mut trajectory = Trajectory::default();
    trajectory.times.push(solver.time());
    trajectory.states.push(solver.state().to_vec());
    while solver.time() < final_time - dt / 2.0 {
        solver.update(dt)?;
        trajectory.times.push(solver.time());
        trajectory.states.push(solver.state().to_vec());
    }
    Ok(trajectory)
}
