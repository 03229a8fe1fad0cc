use chain_physics::{
    config::SolverConfig,
    energy::{kinetic_energy, potential_energy},
    helpers::build_double_pendulum,
    joint::JointState,
    simulate::{simulate, ChainSolver},
    units::UnitSystem,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Simulate a double pendulum in millimeters and print its energy, which
/// should stay constant
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut chain = build_double_pendulum(1.0, 1.0, UnitSystem::SI);
    chain.links[0].initial = JointState::new(1.0, 0.0);
    chain.links[1].initial = JointState::new(1.0, 0.0);

    let mut solver = ChainSolver::new(chain, SolverConfig::in_units(UnitSystem::MMKS))?;
    let trajectory = simulate(&mut solver, 10.0, 1e-3)?;

    for (i, (time, states)) in trajectory.times.iter().zip(trajectory.states.iter()).enumerate() {
        if i % 500 != 0 {
            continue;
        }
        solver.set_state(states.clone())?;
        let kinematics = solver.kinematics();
        info!(
            time,
            q1 = states[0].q,
            q2 = states[1].q,
            kinetic = kinetic_energy(&kinematics),
            potential = potential_energy(&kinematics),
            "double pendulum"
        );
    }
    Ok(())
}
