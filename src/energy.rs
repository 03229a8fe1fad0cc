use crate::{dynamics::PartialKinematics, types::Float};

/// Sum of `1/2 vᵗ I v` over the links
pub fn kinetic_energy(kinematics: &[PartialKinematics]) -> Float {
    kinematics
        .iter()
        .map(|k| 0.5 * k.velocity.dot(&k.momentum))
        .sum()
}

/// Gravitational potential energy, zero with every center of mass at the
/// world origin
pub fn potential_energy(kinematics: &[PartialKinematics]) -> Float {
    kinematics.iter().map(|k| -k.weight.linear.dot(&k.cg)).sum()
}

pub fn total_energy(kinematics: &[PartialKinematics]) -> Float {
    kinetic_energy(kinematics) + potential_energy(kinematics)
}
