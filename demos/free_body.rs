use chain_physics::{
    config::SolverConfig,
    helpers::build_free_box,
    rigid_body::{FreeBodySolver, FreeBodyState},
    spatial::pose::Pose,
    units::UnitSystem,
};
use nalgebra::{vector, Vector3};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Spin a box about its intermediate axis in free space. The box flips
/// periodically while its momentum and energy stay fixed.
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut body = build_free_box(2.0, &vector![0.3, 0.2, 0.1], UnitSystem::SI);
    body.initial = FreeBodyState::from_velocity(
        &body.mass,
        &Pose::identity(),
        &Vector3::zeros(),
        &vector![0.01, 5.0, 0.01],
    );

    let config = SolverConfig::default().with_gravity(Vector3::zeros());
    let mut solver = FreeBodySolver::new(vec![body], config)?;

    let dt = 1e-3;
    for step in 1..=10_000 {
        solver.update(dt)?;
        if step % 250 == 0 {
            let twist = solver.twist(0)?;
            let momentum = solver.momentum_about_origin(0);
            info!(
                time = solver.time(),
                omega = ?twist.angular,
                angular_momentum = ?momentum.angular,
                energy = solver.kinetic_energy(0)?,
                "free body"
            );
        }
    }
    Ok(())
}
