//! Articulated-body dynamics of a chain, in world coordinates.
//!
//! One evaluation runs three sweeps over the links:
//! 1. forward kinematics, root to leaves, producing [`PartialKinematics`];
//! 2. the articulated-inertia sweep, leaves to root, producing
//!    [`ArticulatedQuantities`];
//! 3. the forward solve, root to leaves, producing [`ResolvedKinematics`],
//!    followed by a reverse sweep that sums the forces of each link's
//!    children.
//!
//! Twists are taken at the world origin and wrenches about it, so no frame
//! transforms are needed between parent and child. Gravity enters as an
//! external weight wrench, the ground does not accelerate.
//!
//! Reference: Chapter 7 Forward Dynamics - Articulated-Body Algorithm in
//! "Rigid Body Dynamics Algorithms" by Roy Featherstone
use itertools::izip;
use na::Vector3;

use crate::{
    error::{Error, Result},
    joint::{JointDrive, JointState},
    mechanism::{Chain, Topology},
    spatial::{
        pose::Pose,
        spatial_matrix::SpatialMatrix,
        spatial_vector::{SpatialVector, Twist, Wrench},
    },
    types::Float,
};

/// Joint inertias at or below this magnitude are treated as singular.
pub const SINGULAR_JOINT_INERTIA: Float = 1e-12;

/// Per-link quantities known after the first sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialKinematics {
    /// Joint frame in world coordinates
    pub pose: Pose,
    /// Center of mass in world coordinates
    pub cg: Vector3<Float>,
    pub state: JointState,
    pub drive: JointDrive,
    /// Joint axis `s`
    pub axis: Twist,
    /// Twist of the link
    pub velocity: Twist,
    /// Velocity-product acceleration `c = v × s·qd`
    pub bias_acceleration: Twist,
    /// Spatial inertia `I` about the world origin
    pub inertia: SpatialMatrix,
    /// Spatial mobility `I⁻¹`, `None` for a massless body or a singular
    /// inertia tensor such as a thin rod's
    pub mobility: Option<SpatialMatrix>,
    /// `I v`
    pub momentum: Wrench,
    /// Gravity acting at the center of mass
    pub weight: Wrench,
    /// Output of the link's applied-force callback
    pub applied: Wrench,
    /// `p = v ×* (I v) - (weight + applied)`
    pub bias_force: Wrench,
}

/// Per-link results of the articulated-inertia sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct ArticulatedQuantities {
    /// Articulated inertia `A`
    pub inertia: SpatialMatrix,
    /// Articulated bias force `pa`
    pub force: Wrench,
    /// Joint inertia `D = sᵗ A s`
    pub joint_inertia: Float,
    /// Projection `P = s sᵗ / D`
    pub projection: SpatialMatrix,
    /// Reaction space `R = 1 - A P`
    pub reaction: SpatialMatrix,
    /// Percussion axis `T = A s / D`
    pub percussion: Wrench,
}

/// Per-link quantities once the forward solve is complete.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedKinematics {
    pub kinematics: PartialKinematics,
    pub qpp: Float,
    /// Joint force or torque `Q`
    pub joint_force: Float,
    /// Spatial acceleration of the link
    pub acceleration: Twist,
    /// Wrench transmitted to the link through its joint
    pub force: Wrench,
    /// Sum of the wrenches transmitted to the link's children
    pub child_force: Wrench,
}

/// First sweep, root to leaves.
pub fn forward_kinematics(
    chain: &Chain,
    topology: &Topology,
    gravity: &Vector3<Float>,
    time: Float,
    states: &[JointState],
) -> Vec<PartialKinematics> {
    let mut kinematics: Vec<PartialKinematics> = Vec::with_capacity(chain.links.len());
    for (link, parent, state) in izip!(chain.links.iter(), topology.parents.iter(), states.iter()) {
        let (parent_pose, parent_velocity) = match parent {
            Some(p) => (kinematics[*p].pose, kinematics[*p].velocity),
            None => (Pose::identity(), SpatialVector::zero()),
        };

        let joint_frame = &parent_pose * &link.pose_on_parent;
        let axis = link.joint.axis.axis(&joint_frame);
        let pose = &joint_frame * &link.joint.axis.local_step(state.q);
        let cg = pose.transform_point(&link.local_cg());

        let joint_velocity = axis * state.qd;
        let velocity = parent_velocity + joint_velocity;
        let bias_acceleration = velocity.twist_cross_twist(&joint_velocity);

        let inertia = link.mass.spi(&pose.rotation, &cg);
        let mobility = link.mass.spm(&pose.rotation, &cg).ok();
        let momentum = &inertia * &velocity;
        let weight = SpatialVector::force_at(&cg, &(gravity * link.mass.mass));
        let applied = link
            .applied_force
            .as_ref()
            .map_or(SpatialVector::zero(), |f| f(time, &pose, &velocity));
        let bias_force = velocity.twist_cross_wrench(&momentum) - (weight + applied);

        kinematics.push(PartialKinematics {
            pose,
            cg,
            state: *state,
            drive: link.joint.drive(time, state),
            axis,
            velocity,
            bias_acceleration,
            inertia,
            mobility,
            momentum,
            weight,
            applied,
            bias_force,
        });
    }
    kinematics
}

/// Second sweep, leaves to root. Load-driven children fold into their parent
/// through their reaction space, motion-driven children with their full
/// articulated inertia.
pub fn articulated_inertia(
    kinematics: &[PartialKinematics],
    topology: &Topology,
) -> Result<Vec<ArticulatedQuantities>> {
    let n = kinematics.len();
    let mut inertias: Vec<SpatialMatrix> = kinematics.iter().map(|k| k.inertia).collect();
    let mut forces: Vec<Wrench> = kinematics.iter().map(|k| k.bias_force).collect();
    let mut articulated: Vec<Option<ArticulatedQuantities>> = vec![None; n];

    for i in (0..n).rev() {
        let k = &kinematics[i];
        let A = inertias[i];
        let pa = forces[i];
        let s = &k.axis;

        let U = &A * s;
        let D = s.dot(&U);
        if D.abs() <= SINGULAR_JOINT_INERTIA {
            return Err(Error::SingularJointInertia { link: i, inertia: D });
        }
        let P = &s.outer(s) * (1.0 / D);
        let R = &SpatialMatrix::identity() - &(&A * &P);
        let T = U / D;

        if let Some(p) = topology.parents[i] {
            match k.drive {
                JointDrive::Load(Q) => {
                    inertias[p] += &(&R * &A);
                    forces[p] += &R * &(&A * &k.bias_acceleration + pa) + T * Q;
                }
                JointDrive::Motion(qpp) => {
                    inertias[p] += &A;
                    forces[p] += &A * &(k.bias_acceleration + *s * qpp) + pa;
                }
            }
        }

        articulated[i] = Some(ArticulatedQuantities {
            inertia: A,
            force: pa,
            joint_inertia: D,
            projection: P,
            reaction: R,
            percussion: T,
        });
    }

    Ok(articulated.into_iter().flatten().collect())
}

/// Third sweep, root to leaves, then the reverse sweep accumulating the
/// children's transmitted forces.
pub fn forward_solve(
    kinematics: Vec<PartialKinematics>,
    articulated: &[ArticulatedQuantities],
    topology: &Topology,
) -> Vec<ResolvedKinematics> {
    let mut resolved: Vec<ResolvedKinematics> = Vec::with_capacity(kinematics.len());
    for (k, art, parent) in izip!(kinematics.into_iter(), articulated.iter(), topology.parents.iter()) {
        let a_p = match parent {
            Some(p) => resolved[*p].acceleration,
            None => SpatialVector::zero(),
        };
        let A = &art.inertia;
        let pa = art.force;
        let s = k.axis;
        let c = k.bias_acceleration;

        // Force needed to carry the parent's and the velocity-product
        // accelerations with the joint locked
        let locked = A * &(a_p + c) + pa;

        let (qpp, joint_force, acceleration, force) = match k.drive {
            JointDrive::Load(Q) => {
                let qpp = (Q - s.dot(&locked)) / art.joint_inertia;
                let a = a_p + s * qpp + c;
                (qpp, Q, a, A * &a + pa)
            }
            JointDrive::Motion(qpp) => {
                let a = a_p + s * qpp + c;
                let Q = s.dot(&(A * &a + pa));
                (qpp, Q, a, art.percussion * Q + &art.reaction * &locked)
            }
        };

        resolved.push(ResolvedKinematics {
            kinematics: k,
            qpp,
            joint_force,
            acceleration,
            force,
            child_force: SpatialVector::zero(),
        });
    }

    for i in (0..resolved.len()).rev() {
        let child_force = topology.children[i]
            .iter()
            .fold(SpatialVector::zero(), |acc, j| acc + resolved[*j].force);
        resolved[i].child_force = child_force;
    }

    resolved
}

/// All three sweeps at `(time, states)`.
pub fn solve(
    chain: &Chain,
    topology: &Topology,
    gravity: &Vector3<Float>,
    time: Float,
    states: &[JointState],
) -> Result<Vec<ResolvedKinematics>> {
    let kinematics = forward_kinematics(chain, topology, gravity, time, states);
    let articulated = articulated_inertia(&kinematics, topology)?;
    Ok(forward_solve(kinematics, &articulated, topology))
}

/// Newton-Euler residual of each link:
///     f - Σ f_children - (I a + p)
/// which vanishes for a consistent solution.
pub fn check_force_balance(resolved: &[ResolvedKinematics]) -> Vec<Wrench> {
    resolved
        .iter()
        .map(|r| {
            let k = &r.kinematics;
            r.force - r.child_force - (&k.inertia * &r.acceleration + k.bias_force)
        })
        .collect()
}

#[cfg(test)]
mod dynamics_tests {
    use na::{vector, Matrix3};

    use super::*;
    use crate::{
        assert_close, assert_vec_close,
        helpers::{build_cart_pole, build_double_pendulum, build_pendulum},
        inertia::MassProperties,
        joint::{JointAxis, JointProperties, Prescribed},
        mechanism::Link,
        units::UnitSystem,
        GRAVITY,
    };

    fn gravity() -> Vector3<Float> {
        vector![0.0, -GRAVITY, 0.0]
    }

    fn assert_balanced(resolved: &[ResolvedKinematics]) {
        for residual in check_force_balance(resolved) {
            assert_vec_close!(residual.linear, Vector3::<Float>::zeros(), 1e-3);
            assert_vec_close!(residual.angular, Vector3::<Float>::zeros(), 1e-3);
        }
    }

    #[test]
    fn kinematics_carry_mobility_when_invertible() {
        // Arrange: a thin rod base with a solid ball on its tip
        let mut chain = build_pendulum(1.0, 1.0, UnitSystem::SI);
        let ball = Link::new(
            "ball",
            JointProperties::new(JointAxis::RevoluteZ),
            MassProperties::sphere(2.0, 0.2, UnitSystem::SI),
        )
        .with_parent(0)
        .with_pose(Pose::translation(vector![1.0, 0.0, 0.0]));
        chain.add_link(ball).unwrap();
        let topology = Topology::new(&chain);
        let states = vec![JointState::new(0.4, 0.0), JointState::new(-1.0, 0.0)];

        // Act
        let kinematics = forward_kinematics(&chain, &topology, &gravity(), 0.0, &states);

        // Assert
        assert!(kinematics[0].mobility.is_none());
        let mobility = kinematics[1].mobility.unwrap();
        let product = &kinematics[1].inertia * &mobility;
        let identity = SpatialMatrix::identity();
        assert_vec_close!(product.a11, identity.a11, 1e-9);
        assert_vec_close!(product.a12, identity.a12, 1e-9);
        assert_vec_close!(product.a21, identity.a21, 1e-9);
        assert_vec_close!(product.a22, identity.a22, 1e-9);
    }

    #[test]
    fn horizontal_rod_pendulum() {
        // Arrange
        let m = 5.0;
        let l = 7.0;
        let chain = build_pendulum(m, l, UnitSystem::SI);
        let topology = Topology::new(&chain);

        // Act
        let resolved = solve(&chain, &topology, &gravity(), 0.0, &chain.initial_state()).unwrap();

        // Assert
        let i_pivot = m * l * l / 3.0;
        let expected = -(m * GRAVITY * l / 2.0) / i_pivot;
        assert_close!(resolved[0].qpp, expected, expected.abs() * 0.05);
        assert!(resolved[0].qpp < 0.0);
    }

    #[test]
    fn prescribed_motion_pendulum_needs_no_torque_at_free_fall_rate() {
        // Arrange
        let m = 2.0;
        let l = 1.5;
        let free_fall = -(m * GRAVITY * l / 2.0) / (m * l * l / 3.0);
        let mut chain = build_pendulum(m, l, UnitSystem::SI);
        chain.links[0].joint.set_driver(Prescribed::Motion, move |_, _, _| free_fall);
        let topology = Topology::new(&chain);

        // Act
        let resolved = solve(&chain, &topology, &gravity(), 0.0, &chain.initial_state()).unwrap();

        // Assert
        assert_close!(resolved[0].qpp, free_fall, 1e-12);
        assert_close!(resolved[0].joint_force, 0.0, 1e-9);
    }

    #[test]
    fn holding_torque_of_static_pendulum() {
        // Arrange
        let m = 2.0;
        let l = 1.5;
        let mut chain = build_pendulum(m, l, UnitSystem::SI);
        chain.links[0].joint.set_driver(Prescribed::Motion, |_, _, _| 0.0);
        let topology = Topology::new(&chain);

        // Act
        let resolved = solve(&chain, &topology, &gravity(), 0.0, &chain.initial_state()).unwrap();

        // Assert
        assert_close!(resolved[0].joint_force, m * GRAVITY * l / 2.0, 1e-9);
        assert_vec_close!(resolved[0].acceleration.angular, Vector3::<Float>::zeros(), 1e-12);
    }

    #[test]
    fn force_balance_of_moving_double_pendulum() {
        // Arrange
        let chain = build_double_pendulum(1.0, 1.0, UnitSystem::SI);
        let topology = Topology::new(&chain);
        let states = vec![JointState::new(0.3, 1.2), JointState::new(-0.7, -2.5)];

        // Act
        let resolved = solve(&chain, &topology, &gravity(), 0.0, &states).unwrap();

        // Assert
        assert_balanced(&resolved);
        for (r, state) in izip!(resolved.iter(), states.iter()) {
            assert_eq!(r.kinematics.state, *state);
        }
    }

    #[test]
    fn force_balance_with_prescribed_motion_joints() {
        // Arrange: the cart follows a prescribed acceleration, the pole swings
        let mut chain = build_cart_pole(3.0, 0.5, 1.2, UnitSystem::SI);
        chain.links[0]
            .joint
            .set_driver(Prescribed::Motion, |t, _, _| 2.0 * (3.0 * t).sin());
        let topology = Topology::new(&chain);
        let states = vec![JointState::new(0.4, -0.3), JointState::new(1.0, 2.0)];

        // Act
        let resolved = solve(&chain, &topology, &gravity(), 0.37, &states).unwrap();

        // Assert
        assert_close!(resolved[0].qpp, 2.0 * (3.0 * 0.37 as Float).sin(), 1e-12);
        assert_balanced(&resolved);
    }

    #[test]
    fn force_balance_with_mixed_tree() {
        // Arrange: a base with two branches, one prescribed in motion, and an
        // applied force on the load-driven branch
        let mut chain = build_double_pendulum(1.5, 0.8, UnitSystem::SI);
        let joint = JointProperties::new(JointAxis::RevoluteX)
            .with_driver(Prescribed::Motion, |t, q, qd| -q - 0.1 * qd + t);
        let branch = Link::new(
            "branch",
            joint,
            MassProperties::cuboid(0.7, &vector![0.1, 0.6, 0.1], UnitSystem::SI).with_cg(vector![0.0, 0.3, 0.0]),
        )
        .with_parent(0)
        .with_pose(Pose::translation(vector![0.4, 0.0, 0.1]));
        chain.add_link(branch).unwrap();
        chain.links[1] = chain.links[1]
            .clone()
            .with_applied_force(|_, pose, _| SpatialVector::force_at(&pose.translation, &vector![0.0, 0.0, 3.0]));
        let topology = Topology::new(&chain);
        let states = vec![
            JointState::new(0.2, 0.5),
            JointState::new(-0.4, 1.5),
            JointState::new(0.9, -0.8),
        ];

        // Act
        let resolved = solve(&chain, &topology, &gravity(), 1.1, &states).unwrap();

        // Assert
        assert_balanced(&resolved);
    }

    #[test]
    fn load_driver_matches_inverse_dynamics() {
        // Arrange: torque found by prescribing an acceleration, fed back as a
        // load, reproduces the acceleration
        let chain = build_double_pendulum(1.0, 1.0, UnitSystem::SI);
        let topology = Topology::new(&chain);
        let states = vec![JointState::new(0.5, 0.0), JointState::new(0.5, 1.0)];
        let target = [1.5, -0.5];

        let mut motion = chain.clone();
        for (link, qpp) in izip!(motion.links.iter_mut(), target.iter()) {
            let qpp = *qpp;
            link.joint.set_driver(Prescribed::Motion, move |_, _, _| qpp);
        }
        let torques: Vec<Float> = solve(&motion, &topology, &gravity(), 0.0, &states)
            .unwrap()
            .iter()
            .map(|r| r.joint_force)
            .collect();

        // Act
        let mut load = chain.clone();
        for (link, torque) in izip!(load.links.iter_mut(), torques.iter()) {
            let torque = *torque;
            link.joint.set_driver(Prescribed::Load, move |_, _, _| torque);
        }
        let resolved = solve(&load, &topology, &gravity(), 0.0, &states).unwrap();

        // Assert
        for (r, qpp) in izip!(resolved.iter(), target.iter()) {
            assert_close!(r.qpp, *qpp, 1e-9);
        }
    }

    #[test]
    fn zero_joint_inertia_is_an_error() {
        // Arrange: a massless point on a revolute joint through its location
        let mut chain = Chain::new(UnitSystem::SI);
        let massless = MassProperties::new(0.0, Matrix3::zeros(), Vector3::zeros(), UnitSystem::SI);
        chain
            .add_link(Link::new("massless", JointProperties::new(JointAxis::RevoluteZ), massless))
            .unwrap();
        let topology = Topology::new(&chain);

        // Act
        let result = solve(&chain, &topology, &gravity(), 0.0, &chain.initial_state());

        // Assert
        assert!(matches!(result, Err(Error::SingularJointInertia { link: 0, .. })));
    }
}
