//! Dimensional units and the conversion factors between unit systems.
//!
//! A [`Unit`] is an expression over five base dimensions. Its factor in a
//! unit system is the SI value of one unit of that system, so converting a
//! quantity from system `a` to system `b` multiplies it by
//! `factor(a) / factor(b)`. Derived units are composed from the base ones and
//! never carry per-system constants of their own.
use std::{
    fmt,
    ops::{Div, Mul},
    sync::LazyLock,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::Float,
};

const INCH: Float = 0.0254;
const FOOT: Float = 0.3048;
const POUND_FORCE: Float = 4.4482216152605;
const RANKINE: Float = 5.0 / 9.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    /// meter, kilogram, newton, second, kelvin
    #[default]
    SI,
    /// millimeter, kilogram, millinewton (kg·mm/s²), second, kelvin
    MMKS,
    /// inch, lbf·s²/in, pound-force, second, rankine
    IPS,
    /// foot, slug, pound-force, second, rankine
    FPS,
}

impl UnitSystem {
    pub const ALL: [UnitSystem; 4] = [
        UnitSystem::SI,
        UnitSystem::MMKS,
        UnitSystem::IPS,
        UnitSystem::FPS,
    ];
}

/// The base dimensions, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Length,
    Mass,
    Force,
    Time,
    Temperature,
}

impl Dimension {
    const ALL: [Dimension; 5] = [
        Dimension::Length,
        Dimension::Mass,
        Dimension::Force,
        Dimension::Time,
        Dimension::Temperature,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// SI value of one unit of this dimension in `system`
    pub fn factor(self, system: UnitSystem) -> Float {
        match (self, system) {
            (_, UnitSystem::SI) => 1.0,
            (Dimension::Time, _) => 1.0,

            (Dimension::Length, UnitSystem::MMKS) => 0.001,
            (Dimension::Length, UnitSystem::IPS) => INCH,
            (Dimension::Length, UnitSystem::FPS) => FOOT,

            (Dimension::Mass, UnitSystem::MMKS) => 1.0,
            (Dimension::Mass, UnitSystem::IPS) => POUND_FORCE / INCH,
            (Dimension::Mass, UnitSystem::FPS) => POUND_FORCE / FOOT,

            (Dimension::Force, UnitSystem::MMKS) => 0.001,
            (Dimension::Force, UnitSystem::IPS | UnitSystem::FPS) => POUND_FORCE,

            (Dimension::Temperature, UnitSystem::MMKS) => 1.0,
            (Dimension::Temperature, UnitSystem::IPS | UnitSystem::FPS) => RANKINE,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Dimension::Length => "L",
            Dimension::Mass => "M",
            Dimension::Force => "F",
            Dimension::Time => "T",
            Dimension::Temperature => "Θ",
        }
    }
}

/// Immutable unit expression.
#[derive(Clone, Debug)]
pub enum Unit {
    Base(Dimension),
    Product(Vec<Unit>),
    Power(Box<Unit>, i32),
    /// A unit times a constant, e.g. a degree as a scaled radian
    Scaled(Box<Unit>, Float),
}

/// Canonical form of a unit: one exponent per base dimension and a scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalized {
    pub exponents: [i32; 5],
    pub scale: Float,
}

impl Normalized {
    fn one() -> Self {
        Normalized {
            exponents: [0; 5],
            scale: 1.0,
        }
    }

    fn times(mut self, rhs: &Normalized) -> Self {
        for (e, r) in self.exponents.iter_mut().zip(rhs.exponents.iter()) {
            *e += r;
        }
        self.scale *= rhs.scale;
        self
    }

    fn pow(mut self, n: i32) -> Self {
        for e in self.exponents.iter_mut() {
            *e *= n;
        }
        self.scale = self.scale.powi(n);
        self
    }

    /// Number of base dimensions taking part in the unit
    pub fn complexity(&self) -> usize {
        self.exponents.iter().filter(|e| **e != 0).count()
    }
}

impl Unit {
    pub fn pow(&self, n: i32) -> Unit {
        Unit::Power(Box::new(self.clone()), n)
    }

    pub fn scaled(&self, scale: Float) -> Unit {
        Unit::Scaled(Box::new(self.clone()), scale)
    }

    pub fn normalize(&self) -> Normalized {
        match self {
            Unit::Base(dim) => {
                let mut n = Normalized::one();
                n.exponents[dim.index()] = 1;
                n
            }
            Unit::Product(units) => units
                .iter()
                .fold(Normalized::one(), |acc, u| acc.times(&u.normalize())),
            Unit::Power(unit, exp) => unit.normalize().pow(*exp),
            Unit::Scaled(unit, scale) => {
                let mut n = unit.normalize();
                n.scale *= scale;
                n
            }
        }
    }

    /// SI value of one of this unit expressed in `system`
    pub fn factor(&self, system: UnitSystem) -> Float {
        let n = self.normalize();
        Dimension::ALL
            .iter()
            .zip(n.exponents.iter())
            .fold(n.scale, |acc, (dim, exp)| acc * dim.factor(system).powi(*exp))
    }

    /// Multiplier taking a quantity of this unit from `from` to `to`
    pub fn convert(&self, from: UnitSystem, to: UnitSystem) -> Float {
        if from == to {
            return 1.0;
        }
        self.factor(from) / self.factor(to)
    }

    /// The single base dimension this unit consists of. Composite units have
    /// none and are rejected.
    pub fn try_base_dimension(&self) -> Result<Dimension> {
        let n = self.normalize();
        let mut found = None;
        for (dim, exp) in Dimension::ALL.iter().zip(n.exponents.iter()) {
            match (*exp, found) {
                (0, _) => {}
                (1, None) => found = Some(*dim),
                _ => return Err(Error::UnsupportedComposite(self.to_string())),
            }
        }
        match found {
            Some(dim) if n.scale == 1.0 => Ok(dim),
            _ => Err(Error::UnsupportedComposite(self.to_string())),
        }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.normalize() == other.normalize()
    }
}

impl Mul for &Unit {
    type Output = Unit;

    fn mul(self, rhs: &Unit) -> Unit {
        Unit::Product(vec![self.clone(), rhs.clone()])
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        Unit::Product(vec![self, rhs])
    }
}

impl Div for &Unit {
    type Output = Unit;

    fn div(self, rhs: &Unit) -> Unit {
        Unit::Product(vec![self.clone(), rhs.pow(-1)])
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Unit) -> Unit {
        &self / &rhs
    }
}

impl fmt::Display for Unit {
    /// Prints the canonical form: terms sorted by complexity (the magnitude
    /// of the exponent), then by dimension.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.normalize();
        let mut terms: Vec<(Dimension, i32)> = Dimension::ALL
            .iter()
            .zip(n.exponents.iter())
            .filter(|(_, e)| **e != 0)
            .map(|(d, e)| (*d, *e))
            .collect();
        terms.sort_by_key(|(d, e)| (e.abs(), *d));

        if n.scale != 1.0 {
            write!(f, "{}", n.scale)?;
            if !terms.is_empty() {
                write!(f, "*")?;
            }
        } else if terms.is_empty() {
            return write!(f, "1");
        }
        let body: Vec<String> = terms
            .iter()
            .map(|(d, e)| match e {
                1 => d.symbol().to_string(),
                _ => format!("{}^{}", d.symbol(), e),
            })
            .collect();
        write!(f, "{}", body.join("*"))
    }
}

pub const LENGTH: Unit = Unit::Base(Dimension::Length);
pub const MASS: Unit = Unit::Base(Dimension::Mass);
pub const FORCE: Unit = Unit::Base(Dimension::Force);
pub const TIME: Unit = Unit::Base(Dimension::Time);
pub const TEMPERATURE: Unit = Unit::Base(Dimension::Temperature);

pub static AREA: LazyLock<Unit> = LazyLock::new(|| LENGTH.pow(2));
pub static VOLUME: LazyLock<Unit> = LazyLock::new(|| LENGTH.pow(3));
pub static SPEED: LazyLock<Unit> = LazyLock::new(|| LENGTH / TIME);
pub static ANGULAR_SPEED: LazyLock<Unit> = LazyLock::new(|| TIME.pow(-1));
pub static ACCELERATION: LazyLock<Unit> = LazyLock::new(|| LENGTH / TIME.pow(2));
pub static ANGULAR_ACCELERATION: LazyLock<Unit> = LazyLock::new(|| TIME.pow(-2));
pub static TORQUE: LazyLock<Unit> = LazyLock::new(|| FORCE * LENGTH);
pub static ENERGY: LazyLock<Unit> = LazyLock::new(|| FORCE * LENGTH);
pub static POWER: LazyLock<Unit> = LazyLock::new(|| &*ENERGY / &TIME);
pub static PRESSURE: LazyLock<Unit> = LazyLock::new(|| &FORCE / &*AREA);
pub static MOMENTUM: LazyLock<Unit> = LazyLock::new(|| &MASS * &*SPEED);
pub static ANGULAR_MOMENTUM: LazyLock<Unit> = LazyLock::new(|| &*MOMENTUM * &LENGTH);
pub static MOMENT_OF_INERTIA: LazyLock<Unit> = LazyLock::new(|| &MASS * &*AREA);
pub static DENSITY: LazyLock<Unit> = LazyLock::new(|| &MASS / &*VOLUME);
pub static LINEAR_STIFFNESS: LazyLock<Unit> = LazyLock::new(|| FORCE / LENGTH);
pub static LINEAR_DAMPING: LazyLock<Unit> = LazyLock::new(|| &FORCE / &*SPEED);
pub static ANGULAR_DAMPING: LazyLock<Unit> = LazyLock::new(|| &*TORQUE / &*ANGULAR_SPEED);

/// Every derived unit defined above
pub fn derived_units() -> [&'static Unit; 17] {
    [
        &*AREA,
        &*VOLUME,
        &*SPEED,
        &*ANGULAR_SPEED,
        &*ACCELERATION,
        &*ANGULAR_ACCELERATION,
        &*TORQUE,
        &*ENERGY,
        &*POWER,
        &*PRESSURE,
        &*MOMENTUM,
        &*ANGULAR_MOMENTUM,
        &*MOMENT_OF_INERTIA,
        &*DENSITY,
        &*LINEAR_STIFFNESS,
        &*LINEAR_DAMPING,
        &*ANGULAR_DAMPING,
    ]
}
