use na::Vector3;
use tracing::{debug, warn};

use crate::{
    dynamics::{articulated_inertia, forward_kinematics, ArticulatedQuantities, PartialKinematics},
    error::Result,
    joint::{JointDrive, JointState},
    mechanism::{Chain, ContactPlane, Topology},
    spatial::{spatial_matrix::SpatialMatrix, spatial_vector::SpatialVector},
    types::Float,
};

/// Effective inverse masses at or below this are treated as an immovable
/// contact.
const SINGULAR_INVERSE_MASS: Float = 1e-12;

/// Where the contact point is relative to the plane, and how fast it moves
/// along the normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactStatus {
    /// Contact point in world coordinates
    pub point: Vector3<Float>,
    /// Signed distance above the plane, negative when penetrating
    pub penetration: Float,
    /// Velocity along the normal, negative when approaching
    pub normal_velocity: Float,
}

impl ContactStatus {
    pub fn is_colliding(&self) -> bool {
        self.penetration <= 0.0 && self.normal_velocity < 0.0
    }
}

/// Contact status for the given kinematics. `None` when the contact link is
/// not part of the chain.
pub fn contact_status(contact: &ContactPlane, kinematics: &[PartialKinematics]) -> Option<ContactStatus> {
    let k = kinematics.get(contact.link)?;
    let point = k.pose.transform_point(&contact.point);
    let normal = contact.normal.into_inner();
    Some(ContactStatus {
        point,
        penetration: normal.dot(&point) - contact.offset,
        normal_velocity: normal.dot(&k.velocity.point_velocity(&point)),
    })
}

/// Operators of the contact path, ordered from the contact link to the root.
#[derive(Clone, Debug)]
pub struct ConstrainedInertia {
    /// Part of an impulse at the contact link that reaches each path link
    pub phi: Vec<SpatialMatrix>,
    /// Constrained inverse inertia of each path link's parent, zero at the
    /// root
    pub parent_y: Vec<SpatialMatrix>,
    /// Constrained inverse inertia at the contact link: twist change per unit
    /// impulse
    pub y: SpatialMatrix,
}

/// Reaction space and projection a joint presents to an impulse. A joint in
/// prescribed motion does not yield, so it passes the impulse on unchanged.
fn impulse_operators(
    k: &PartialKinematics,
    art: &ArticulatedQuantities,
) -> Option<(SpatialMatrix, SpatialMatrix)> {
    match k.drive {
        JointDrive::Load(_) => Some((art.reaction, art.projection)),
        JointDrive::Motion(_) => None,
    }
}

/// Two sweeps along `path` (contact link first):
///     Φ_k = 1,  Φ_parent = R_child Φ_child          contact link to root
///     Y_ground = 0,  Y_j = R_jᵗ Y_parent + P_j Φ_j   root to contact link
pub fn constrained_inverse_inertia(
    path: &[usize],
    kinematics: &[PartialKinematics],
    articulated: &[ArticulatedQuantities],
) -> ConstrainedInertia {
    let mut phi = Vec::with_capacity(path.len());
    let mut current = SpatialMatrix::identity();
    for (n, link) in path.iter().enumerate() {
        phi.push(current);
        if n + 1 < path.len() {
            if let Some((R, _)) = impulse_operators(&kinematics[*link], &articulated[*link]) {
                current = &R * &current;
            }
        }
    }

    let mut parent_y = vec![SpatialMatrix::zero(); path.len()];
    let mut y = SpatialMatrix::zero();
    for (n, link) in path.iter().enumerate().rev() {
        parent_y[n] = y;
        if let Some((R, P)) = impulse_operators(&kinematics[*link], &articulated[*link]) {
            y = &(&R.transpose() * &y) + &(&P * &phi[n]);
        }
    }

    ConstrainedInertia { phi, parent_y, y }
}

/// Apply a single impulse at the declared contact when the contact point is
/// on or below the plane and approaching it. Joint speeds on the path from the
/// contact link to the root are corrected so that the normal velocity becomes
/// `-restitution` times its value before the impulse.
///
/// Returns whether a correction was applied.
pub fn handle_contact(
    chain: &Chain,
    topology: &Topology,
    gravity: &Vector3<Float>,
    restitution: Float,
    time: Float,
    states: &mut [JointState],
) -> Result<bool> {
    let Some(contact) = &chain.contact else {
        return Ok(false);
    };
    let path = topology.path_to_root(contact.link);
    if path.is_empty() {
        warn!(link = contact.link, "contact link is not in the chain, contact skipped");
        return Ok(false);
    }

    let kinematics = forward_kinematics(chain, topology, gravity, time, states);
    let Some(status) = contact_status(contact, &kinematics) else {
        return Ok(false);
    };
    if !status.is_colliding() {
        return Ok(false);
    }

    let articulated = articulated_inertia(&kinematics, topology)?;
    let constrained = constrained_inverse_inertia(&path, &kinematics, &articulated);

    // Unit normal impulse applied at the contact point
    let unit = SpatialVector::force_at(&status.point, &contact.normal);
    let inverse_mass = constrained.y.quadratic(&unit);
    if inverse_mass <= SINGULAR_INVERSE_MASS {
        debug!(inverse_mass, "contact cannot move along its normal");
        return Ok(false);
    }
    let impulse = -(1.0 + restitution) * status.normal_velocity / inverse_mass;
    let w = unit * impulse;

    for (n, link) in path.iter().enumerate() {
        let k = &kinematics[*link];
        let art = &articulated[*link];
        if impulse_operators(k, art).is_none() {
            continue;
        }
        let transmitted = &constrained.phi[n] * &w - &art.inertia * &(&constrained.parent_y[n] * &w);
        states[*link].qd += k.axis.dot(&transmitted) / art.joint_inertia;
    }

    debug!(
        impulse,
        penetration = status.penetration,
        normal_velocity = status.normal_velocity,
        "contact impulse"
    );
    Ok(true)
}

#[cfg(test)]
mod contact_tests {
    use na::vector;

    use super::*;
    use crate::{
        assert_close,
        energy::kinetic_energy,
        helpers::{build_double_pendulum, build_pendulum},
        inertia::MassProperties,
        joint::{JointAxis, JointProperties, Prescribed},
        mechanism::Link,
        spatial::pose::Pose,
        units::UnitSystem,
        GRAVITY,
    };

    fn gravity() -> Vector3<Float> {
        vector![0.0, -GRAVITY, 0.0]
    }

    fn status(chain: &Chain, states: &[JointState]) -> ContactStatus {
        let topology = Topology::new(chain);
        let kinematics = forward_kinematics(chain, &topology, &gravity(), 0.0, states);
        contact_status(chain.contact.as_ref().unwrap(), &kinematics).unwrap()
    }

    #[test]
    fn inelastic_pendulum_strike() {
        // Arrange: rod tip below the plane y = -l/2 and moving down
        let l = 2.0;
        let mut chain = build_pendulum(1.0, l, UnitSystem::SI);
        chain.set_contact(0, vector![l, 0.0, 0.0], vector![0.0, 1.0, 0.0], -l / 2.0);
        let topology = Topology::new(&chain);
        let mut states = vec![JointState::new(-0.6, -2.0)];
        assert!(status(&chain, &states).is_colliding());

        // Act
        let handled = handle_contact(&chain, &topology, &gravity(), 0.0, 0.0, &mut states).unwrap();

        // Assert
        assert!(handled);
        assert_close!(status(&chain, &states).normal_velocity, 0.0, 1e-9);
        assert_close!(states[0].qd, 0.0, 1e-9);
        assert_eq!(states[0].q, -0.6);
    }

    #[test]
    fn elastic_strike_reverses_normal_velocity() {
        // Arrange
        let mut chain = build_double_pendulum(1.0, 1.0, UnitSystem::SI);
        chain.set_contact(1, vector![1.0, 0.0, 0.0], vector![0.0, 1.0, 0.0], -0.5);
        let topology = Topology::new(&chain);
        let mut states = vec![JointState::new(-0.2, -1.0), JointState::new(-0.5, -1.5)];
        let before = status(&chain, &states);
        assert!(before.is_colliding());
        let energy_before = kinetic_energy(&forward_kinematics(&chain, &topology, &gravity(), 0.0, &states));

        // Act
        let handled = handle_contact(&chain, &topology, &gravity(), 1.0, 0.0, &mut states).unwrap();

        // Assert
        assert!(handled);
        assert_close!(status(&chain, &states).normal_velocity, -before.normal_velocity, 1e-9);
        let energy_after = kinetic_energy(&forward_kinematics(&chain, &topology, &gravity(), 0.0, &states));
        assert_close!(energy_after, energy_before, 1e-9);
    }

    #[test]
    fn inelastic_double_pendulum_strike() {
        // Arrange
        let mut chain = build_double_pendulum(1.0, 1.0, UnitSystem::SI);
        chain.set_contact(1, vector![1.0, 0.0, 0.0], vector![0.0, 1.0, 0.0], -0.5);
        let topology = Topology::new(&chain);
        let mut states = vec![JointState::new(-0.2, -1.0), JointState::new(-0.5, -1.5)];
        let energy_before = kinetic_energy(&forward_kinematics(&chain, &topology, &gravity(), 0.0, &states));

        // Act
        let handled = handle_contact(&chain, &topology, &gravity(), 0.0, 0.0, &mut states).unwrap();

        // Assert
        assert!(handled);
        assert_close!(status(&chain, &states).normal_velocity, 0.0, 1e-9);
        let energy_after = kinetic_energy(&forward_kinematics(&chain, &topology, &gravity(), 0.0, &states));
        assert!(energy_after < energy_before);
    }

    #[test]
    fn only_path_joints_are_corrected() {
        // Arrange: a second branch hangs off the base, contact on the first
        let mut chain = build_double_pendulum(1.0, 1.0, UnitSystem::SI);
        let branch = Link::new(
            "branch",
            JointProperties::new(JointAxis::RevoluteZ),
            MassProperties::cuboid(1.0, &vector![1.0, 0.1, 0.1], UnitSystem::SI).with_cg(vector![0.5, 0.0, 0.0]),
        )
        .with_parent(0)
        .with_pose(Pose::translation(vector![0.5, 0.0, 0.0]));
        chain.add_link(branch).unwrap();
        chain.set_contact(1, vector![1.0, 0.0, 0.0], vector![0.0, 1.0, 0.0], -0.5);
        let topology = Topology::new(&chain);
        let mut states = vec![
            JointState::new(-0.2, -1.0),
            JointState::new(-0.5, -1.5),
            JointState::new(0.3, 0.7),
        ];

        // Act
        let handled = handle_contact(&chain, &topology, &gravity(), 0.0, 0.0, &mut states).unwrap();

        // Assert
        assert!(handled);
        assert_eq!(states[2], JointState::new(0.3, 0.7));
        assert_close!(status(&chain, &states).normal_velocity, 0.0, 1e-9);
    }

    #[test]
    fn prescribed_motion_joint_keeps_its_speed() {
        // Arrange
        let mut chain = build_double_pendulum(1.0, 1.0, UnitSystem::SI);
        chain.links[0].joint.set_driver(Prescribed::Motion, |_, _, _| 0.0);
        chain.set_contact(1, vector![1.0, 0.0, 0.0], vector![0.0, 1.0, 0.0], -0.5);
        let topology = Topology::new(&chain);
        let mut states = vec![JointState::new(-0.2, -1.0), JointState::new(-0.5, -1.5)];

        // Act
        let handled = handle_contact(&chain, &topology, &gravity(), 0.0, 0.0, &mut states).unwrap();

        // Assert
        assert!(handled);
        assert_eq!(states[0].qd, -1.0);
        assert_close!(status(&chain, &states).normal_velocity, 0.0, 1e-9);
    }

    #[test]
    fn separating_or_clear_contact_is_left_alone() {
        // Arrange
        let l = 2.0;
        let mut chain = build_pendulum(1.0, l, UnitSystem::SI);
        chain.set_contact(0, vector![l, 0.0, 0.0], vector![0.0, 1.0, 0.0], -l / 2.0);
        let topology = Topology::new(&chain);

        // Act & Assert: penetrating but moving away
        let mut separating = vec![JointState::new(-0.6, 1.0)];
        assert!(!handle_contact(&chain, &topology, &gravity(), 0.0, 0.0, &mut separating).unwrap());
        assert_eq!(separating[0], JointState::new(-0.6, 1.0));

        // Act & Assert: approaching but above the plane
        let mut above = vec![JointState::new(0.0, -1.0)];
        assert!(!handle_contact(&chain, &topology, &gravity(), 0.0, 0.0, &mut above).unwrap());
        assert_eq!(above[0], JointState::new(0.0, -1.0));
    }

    #[test]
    fn contact_on_missing_link_is_skipped() {
        // Arrange
        let mut chain = build_pendulum(1.0, 1.0, UnitSystem::SI);
        chain.set_contact(5, vector![1.0, 0.0, 0.0], vector![0.0, 1.0, 0.0], 10.0);
        let topology = Topology::new(&chain);
        let mut states = vec![JointState::new(0.0, -1.0)];

        // Act
        let handled = handle_contact(&chain, &topology, &gravity(), 0.0, 0.0, &mut states).unwrap();

        // Assert
        assert!(!handled);
        assert_eq!(states[0], JointState::new(0.0, -1.0));
    }
}
