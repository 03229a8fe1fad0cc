use thiserror::Error;

use crate::{types::Float, units::UnitSystem};

/// Result containing an error variant from this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Model and solver error variants.
#[derive(Error, Debug)]
pub enum Error {
    /// A solver was built from a chain without any links.
    #[error("chain has no links")]
    EmptyChain,

    /// A link was attached to a parent that does not precede it.
    #[error("link `{link}` refers to parent index {parent}, but only {count} links precede it")]
    InvalidParent {
        link: String,
        parent: usize,
        count: usize,
    },

    /// Two quantities expressed in different unit systems were combined.
    #[error("unit system mismatch: expected {expected:?}, found {found:?}")]
    UnitMismatch {
        expected: UnitSystem,
        found: UnitSystem,
    },

    #[error("mass must be positive, got {0}")]
    NonPositiveMass(Float),

    /// The effective inertia `sᵗ A s` seen by a joint vanished.
    #[error("joint of link {link} has singular effective inertia {inertia}")]
    SingularJointInertia { link: usize, inertia: Float },

    #[error("inertia tensor is singular")]
    SingularInertia,

    /// Time steps must be positive and finite.
    #[error("invalid time step {0}")]
    InvalidTimeStep(Float),

    #[error("expected {expected} joint states, got {found}")]
    StateLength { expected: usize, found: usize },

    /// Only single base dimensions to the first power have a base dimension.
    #[error("unit `{0}` is a composite without a single base dimension")]
    UnsupportedComposite(String),

    #[error(transparent)]
    Config(#[from] toml::de::Error),
}
