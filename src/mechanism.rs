use std::{fmt, sync::Arc};

use na::{UnitVector3, Vector3};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    inertia::MassProperties,
    joint::{JointProperties, JointState},
    spatial::{
        pose::Pose,
        spatial_vector::{Twist, Wrench},
    },
    types::Float,
    units::{self, UnitSystem},
};

/// Applied-force callback `(time, pose, twist) -> wrench`, with the wrench
/// expressed about the world origin.
pub type ForceFn = Arc<dyn Fn(Float, &Pose, &Twist) -> Wrench + Send + Sync>;

/// Wrap an applied-force callback so that it takes and returns values in `to`
pub fn convert_force_fn(f: &ForceFn, from: UnitSystem, to: UnitSystem) -> ForceFn {
    if from == to {
        return f.clone();
    }
    let f = f.clone();
    Arc::new(move |t, pose, twist| {
        f(
            t,
            &pose.convert_from_to(to, from),
            &twist.convert_twist(to, from),
        )
        .convert_wrench(from, to)
    })
}

/// One node of the tree: a rigid body and the joint attaching it to its
/// parent.
#[derive(Clone)]
pub struct Link {
    pub name: String,
    /// `None` for a link attached to the ground
    pub parent: Option<usize>,
    /// Joint frame at `q = 0`, relative to the parent's joint frame
    pub pose_on_parent: Pose,
    /// Origin of the mass properties frame, in the joint frame
    pub mesh_origin: Vector3<Float>,
    pub mass: MassProperties,
    pub joint: JointProperties,
    pub initial: JointState,
    pub applied_force: Option<ForceFn>,
}

impl Link {
    pub fn new(name: &str, joint: JointProperties, mass: MassProperties) -> Self {
        Link {
            name: name.to_string(),
            parent: None,
            pose_on_parent: Pose::identity(),
            mesh_origin: Vector3::zeros(),
            mass,
            joint,
            initial: JointState::default(),
            applied_force: None,
        }
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_pose(mut self, pose_on_parent: Pose) -> Self {
        self.pose_on_parent = pose_on_parent;
        self
    }

    pub fn with_mesh_origin(mut self, mesh_origin: Vector3<Float>) -> Self {
        self.mesh_origin = mesh_origin;
        self
    }

    pub fn with_initial(mut self, initial: JointState) -> Self {
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

    /// Center of mass in the joint frame
    pub fn local_cg(&self) -> Vector3<Float> {
        self.mesh_origin + self.mass.cg
    }

    pub fn convert_from_to(&self, from: UnitSystem, to: UnitSystem) -> Link {
        let length = units::LENGTH.convert(from, to);
        Link {
            name: self.name.clone(),
            parent: self.parent,
            pose_on_parent: self.pose_on_parent.convert_from_to(from, to),
            mesh_origin: self.mesh_origin * length,
            mass: self.mass.convert_to(to),
            joint: self.joint.convert_from_to(from, to),
            initial: self.initial.convert_from_to(self.joint.axis, from, to),
            applied_force: self
                .applied_force
                .as_ref()
                .map(|f| convert_force_fn(f, from, to)),
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("pose_on_parent", &self.pose_on_parent)
            .field("mesh_origin", &self.mesh_origin)
            .field("mass", &self.mass)
            .field("joint", &self.joint)
            .field("initial", &self.initial)
            .field("applied_force", &self.applied_force.as_ref().map(|_| "Fn"))
            .finish()
    }
}

/// A point fixed on one link that must stay on the positive side of a world
/// plane `normal · x = offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactPlane {
    pub link: usize,
    /// Contact point in the link's joint frame
    pub point: Vector3<Float>,
    pub normal: UnitVector3<Float>,
    pub offset: Float,
}

impl ContactPlane {
    pub fn convert_from_to(&self, from: UnitSystem, to: UnitSystem) -> ContactPlane {
        let length = units::LENGTH.convert(from, to);
        ContactPlane {
            link: self.link,
            point: self.point * length,
            normal: self.normal,
            offset: self.offset * length,
        }
    }
}

/// Links stored root-first: every link's parent has a smaller index.
#[derive(Clone, Debug)]
pub struct Chain {
    pub links: Vec<Link>,
    pub contact: Option<ContactPlane>,
    pub units: UnitSystem,
}

impl Chain {
    pub fn new(units: UnitSystem) -> Self {
        Chain {
            links: vec![],
            contact: None,
            units,
        }
    }

    /// Append a link and return its index. The parent must already be in the
    /// chain.
    pub fn add_link(&mut self, link: Link) -> Result<usize> {
        if let Some(parent) = link.parent {
            if parent >= self.links.len() {
                return Err(Error::InvalidParent {
                    link: link.name,
                    parent,
                    count: self.links.len(),
                });
            }
        }
        if link.mass.mass < 0.0 {
            return Err(Error::NonPositiveMass(link.mass.mass));
        }
        if link.mass.units != self.units {
            return Err(Error::UnitMismatch {
                expected: self.units,
                found: link.mass.units,
            });
        }

        debug!(name = %link.name, parent = ?link.parent, "adding link");
        self.links.push(link);
        Ok(self.links.len() - 1)
    }

    /// Declare the contact. A zero normal removes any contact declaration.
    pub fn set_contact(&mut self, link: usize, point: Vector3<Float>, normal: Vector3<Float>, offset: Float) {
        self.contact = UnitVector3::try_new(normal, 0.0).map(|normal| ContactPlane {
            link,
            point,
            normal,
            offset,
        });
        if self.contact.is_none() {
            debug!("zero contact normal, contact disabled");
        }
    }

    pub fn clear_contact(&mut self) {
        self.contact = None;
    }

    /// Check that every link's parent precedes it. `add_link` keeps this
    /// true, but `links` is public and may have been edited directly.
    pub fn validate(&self) -> Result<()> {
        for (i, link) in self.links.iter().enumerate() {
            if let Some(parent) = link.parent {
                if parent >= i {
                    return Err(Error::InvalidParent {
                        link: link.name.clone(),
                        parent,
                        count: i,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn initial_state(&self) -> Vec<JointState> {
        self.links.iter().map(|link| link.initial).collect()
    }

    pub fn convert_to(&self, to: UnitSystem) -> Chain {
        info!(from = ?self.units, to = ?to, "converting chain");
        Chain {
            links: self
                .links
                .iter()
                .map(|link| link.convert_from_to(self.units, to))
                .collect(),
            contact: self
                .contact
                .as_ref()
                .map(|contact| contact.convert_from_to(self.units, to)),
            units: to,
        }
    }
}

/// Parent and children indices of every link, computed once per chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Topology {
    pub parents: Vec<Option<usize>>,
    pub children: Vec<Vec<usize>>,
}

impl Topology {
    pub fn new(chain: &Chain) -> Self {
        let parents: Vec<Option<usize>> = chain.links.iter().map(|link| link.parent).collect();
        let mut children = vec![vec![]; parents.len()];
        for (i, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                children[*p].push(i);
            }
        }
        Topology { parents, children }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Links from `link` up to its root, `link` first. Empty for an index
    /// outside the chain.
    pub fn path_to_root(&self, link: usize) -> Vec<usize> {
        let mut path = vec![];
        let mut current = (link < self.len()).then_some(link);
        while let Some(i) = current {
            path.push(i);
            current = self.parents[i];
        }
        path
    }
}

#[cfg(test)]
mod mechanism_tests {
    use na::vector;

    use super::*;
    use crate::{
        assert_close, assert_vec_close,
        joint::{JointAxis, JointDrive, Prescribed},
        spatial::spatial_vector::SpatialVector,
    };

    fn rod() -> MassProperties {
        MassProperties::cuboid(1.0, &vector![1.0, 0.1, 0.1], UnitSystem::SI)
    }

    fn tree() -> Chain {
        //     0
        //    / \
        //   1   2
        //   |
        //   3
        let mut chain = Chain::new(UnitSystem::SI);
        let joint = JointProperties::new(JointAxis::RevoluteZ);
        chain.add_link(Link::new("base", joint.clone(), rod())).unwrap();
        chain.add_link(Link::new("left", joint.clone(), rod()).with_parent(0)).unwrap();
        chain.add_link(Link::new("right", joint.clone(), rod()).with_parent(0)).unwrap();
        chain.add_link(Link::new("tip", joint, rod()).with_parent(1)).unwrap();
        chain
    }

    #[test]
    fn topology_of_tree() {
        // Act
        let topology = Topology::new(&tree());

        // Assert
        assert_eq!(topology.parents, vec![None, Some(0), Some(0), Some(1)]);
        assert_eq!(topology.children, vec![vec![1, 2], vec![3], vec![], vec![]]);
        assert_eq!(topology.path_to_root(3), vec![3, 1, 0]);
        assert_eq!(topology.path_to_root(2), vec![2, 0]);
        assert!(topology.path_to_root(7).is_empty());
    }

    #[test]
    fn add_link_rejects_bad_links() {
        let mut chain = tree();
        let joint = JointProperties::new(JointAxis::PrismaticX);

        let orphan = Link::new("orphan", joint.clone(), rod()).with_parent(4);
        assert!(matches!(chain.add_link(orphan), Err(Error::InvalidParent { parent: 4, count: 4, .. })));

        let negative = Link::new("negative", joint.clone(), MassProperties::sphere(-1.0, 0.1, UnitSystem::SI));
        assert!(matches!(chain.add_link(negative), Err(Error::NonPositiveMass(_))));

        let imperial = Link::new("imperial", joint, MassProperties::sphere(1.0, 0.1, UnitSystem::IPS));
        assert!(matches!(chain.add_link(imperial), Err(Error::UnitMismatch { .. })));

        assert_eq!(chain.links.len(), 4);
    }

    #[test]
    fn validate_catches_links_out_of_order() {
        // Arrange
        let mut chain = tree();
        assert!(chain.validate().is_ok());

        // Act
        chain.links.swap(1, 3);

        // Assert
        assert!(matches!(
            chain.validate(),
            Err(Error::InvalidParent { parent: 1, count: 1, .. })
        ));
    }

    #[test]
    fn zero_normal_disables_contact() {
        // Arrange
        let mut chain = tree();
        chain.set_contact(3, vector![1.0, 0.0, 0.0], vector![0.0, 2.0, 0.0], -1.0);
        assert_vec_close!(chain.contact.as_ref().unwrap().normal.into_inner(), vector![0.0, 1.0, 0.0], 1e-12);

        // Act
        chain.set_contact(3, vector![1.0, 0.0, 0.0], Vector3::zeros(), -1.0);

        // Assert
        assert!(chain.contact.is_none());
    }

    #[test]
    fn convert_chain_to_millimeters() {
        // Arrange
        let mut chain = Chain::new(UnitSystem::SI);
        let joint = JointProperties::new(JointAxis::PrismaticX).with_driver(Prescribed::Load, |_, q, _| -10.0 * q);
        let link = Link::new("cart", joint, MassProperties::sphere(2.0, 0.1, UnitSystem::SI))
            .with_pose(Pose::translation(vector![0.0, 1.0, 0.0]))
            .with_initial(JointState::new(0.2, 0.0))
            .with_applied_force(|_, pose, _| SpatialVector::force_at(&pose.translation, &vector![1.0, 0.0, 0.0]));
        chain.add_link(link).unwrap();
        chain.set_contact(0, vector![0.1, 0.0, 0.0], vector![0.0, 1.0, 0.0], 0.5);

        // Act
        let converted = chain.convert_to(UnitSystem::MMKS);

        // Assert
        let link = &converted.links[0];
        assert_eq!(converted.units, UnitSystem::MMKS);
        assert_vec_close!(link.pose_on_parent.translation, vector![0.0, 1000.0, 0.0], 1e-9);
        assert_close!(link.initial.q, 200.0, 1e-9);
        assert_close!(converted.contact.as_ref().unwrap().offset, 500.0, 1e-9);

        // -10 N/m * 0.2 m = -2 N = -2000 mN
        match link.joint.drive(0.0, &link.initial) {
            JointDrive::Load(force) => assert_close!(force, -2000.0, 1e-9),
            JointDrive::Motion(_) => panic!("expected load"),
        }

        // 1 N = 1000 mN at 1000 mm: moment 1e6 mN·mm = 1 N·m
        let pose = Pose::translation(vector![0.0, 0.0, 1000.0]);
        let f = link.applied_force.as_ref().unwrap();
        let wrench = f(0.0, &pose, &SpatialVector::zero());
        assert_vec_close!(wrench.linear, vector![1000.0, 0.0, 0.0], 1e-9);
        assert_vec_close!(wrench.angular, vector![0.0, 1.0e6, 0.0], 1e-6);
    }
}
