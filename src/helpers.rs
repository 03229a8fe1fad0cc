use na::{vector, Matrix3, Vector3};

use crate::{
    inertia::MassProperties,
    joint::{JointAxis, JointProperties},
    mechanism::{Chain, Link},
    rigid_body::FreeBody,
    spatial::pose::Pose,
    types::Float,
    units::UnitSystem,
};

/// Thin uniform rod of the given mass and length, lying along +x from its
/// joint
fn rod_along_x(mass: Float, length: Float, units: UnitSystem) -> MassProperties {
    let moment = mass * length * length / 12.0;
    MassProperties::new(
        mass,
        Matrix3::from_diagonal(&vector![0.0, moment, moment]),
        vector![length / 2.0, 0.0, 0.0],
        units,
    )
}

/// Thin uniform rod hanging along -y from its joint
fn rod_along_minus_y(mass: Float, length: Float, units: UnitSystem) -> MassProperties {
    let moment = mass * length * length / 12.0;
    MassProperties::new(
        mass,
        Matrix3::from_diagonal(&vector![moment, 0.0, moment]),
        vector![0.0, -length / 2.0, 0.0],
        units,
    )
}

/// Build a pendulum: a rod pinned at the world origin about z, horizontal
/// along +x at q = 0
pub fn build_pendulum(mass: Float, length: Float, units: UnitSystem) -> Chain {
    let mut chain = Chain::new(units);
    let rod = Link::new(
        "rod",
        JointProperties::new(JointAxis::RevoluteZ),
        rod_along_x(mass, length, units),
    );
    chain.links.push(rod);
    chain
}

/// Build a pendulum hanging straight down at q = 0
pub fn build_hanging_pendulum(mass: Float, length: Float, units: UnitSystem) -> Chain {
    let mut chain = Chain::new(units);
    chain.links.push(Link::new(
        "rod",
        JointProperties::new(JointAxis::RevoluteZ),
        rod_along_minus_y(mass, length, units),
    ));
    chain
}

/// Build a double pendulum: two identical rods, both along +x at q = 0, the
/// second pinned at the tip of the first
pub fn build_double_pendulum(mass: Float, length: Float, units: UnitSystem) -> Chain {
    let mut chain = build_pendulum(mass, length, units);
    chain.links[0].name = "rod1".to_string();
    chain.links.push(
        Link::new(
            "rod2",
            JointProperties::new(JointAxis::RevoluteZ),
            rod_along_x(mass, length, units),
        )
        .with_parent(0)
        .with_pose(Pose::translation(vector![length, 0.0, 0.0])),
    );
    chain
}

/// Build a box sliding along x
pub fn build_cart(mass: Float, size: &Vector3<Float>, units: UnitSystem) -> Chain {
    let mut chain = Chain::new(units);
    chain.links.push(Link::new(
        "cart",
        JointProperties::new(JointAxis::PrismaticX),
        MassProperties::cuboid(mass, size, units),
    ));
    chain
}

/// Build a cart sliding along x with a pole hanging from it, free to swing
/// about z
pub fn build_cart_pole(cart_mass: Float, pole_mass: Float, pole_length: Float, units: UnitSystem) -> Chain {
    let mut chain = build_cart(cart_mass, &vector![0.5, 0.25, 0.25], units);
    chain.links.push(
        Link::new(
            "pole",
            JointProperties::new(JointAxis::RevoluteZ),
            rod_along_minus_y(pole_mass, pole_length, units),
        )
        .with_parent(0),
    );
    chain
}

/// Build a free box at rest at the world origin
pub fn build_free_box(mass: Float, size: &Vector3<Float>, units: UnitSystem) -> FreeBody {
    FreeBody::new("box", MassProperties::cuboid(mass, size, units))
}
