use chain_physics::{
    config::SolverConfig, energy::total_energy, helpers::build_pendulum, simulate::ChainSolver,
    types::Float, units::UnitSystem,
};
use nalgebra::vector;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Drop a horizontal rod onto a plane and print its swing. An optional TOML
/// solver configuration can be passed as the first argument.
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SolverConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => SolverConfig::default().with_restitution(0.5),
    };

    let m = 5.0; // Mass of rod
    let l: Float = 7.0; // Length of rod
    let mut chain = build_pendulum(m, l, UnitSystem::SI);
    chain.set_contact(0, vector![l, 0.0, 0.0], vector![0.0, 1.0, 0.0], -l / 2.0);

    let mut solver = ChainSolver::new(chain, config)?;

    let final_time = 5.0;
    let dt = 1e-3;
    let mut step = 0;
    while solver.time() < final_time {
        solver.update(dt)?;
        step += 1;
        if step % 100 == 0 {
            let state = solver.state()[0];
            info!(
                time = solver.time(),
                q = state.q,
                qd = state.qd,
                energy = total_energy(&solver.kinematics()),
                "pendulum"
            );
        }
    }
    Ok(())
}
