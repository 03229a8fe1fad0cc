use na::{vector, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    types::Float,
    units::{self, UnitSystem},
    GRAVITY,
};

/// Solver settings, loadable from TOML:
///
/// ```toml
/// units = "MMKS"
/// gravity = [0.0, -9806.65, 0.0]
/// restitution = 0.5
/// contact = true
/// ```
///
/// Missing keys take their default values. A missing `gravity` is standard
/// gravity along -y, expressed in the configured `units`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "SolverConfigFile")]
pub struct SolverConfig {
    /// Unit system the solver works in. `gravity` is expressed in it.
    pub units: UnitSystem,
    pub gravity: Vector3<Float>,
    /// Ratio of the normal velocity after a contact impulse to the one before
    pub restitution: Float,
    /// Whether the chain's contact declaration is enforced
    pub contact: bool,
}

/// On-disk form of [`SolverConfig`], before gravity is resolved against the
/// unit system.
#[derive(Deserialize)]
#[serde(default)]
struct SolverConfigFile {
    units: UnitSystem,
    gravity: Option<Vector3<Float>>,
    restitution: Float,
    contact: bool,
}

impl Default for SolverConfigFile {
    fn default() -> Self {
        let config = SolverConfig::default();
        SolverConfigFile {
            units: config.units,
            gravity: None,
            restitution: config.restitution,
            contact: config.contact,
        }
    }
}

impl From<SolverConfigFile> for SolverConfig {
    fn from(file: SolverConfigFile) -> Self {
        let defaults = SolverConfig::in_units(file.units);
        SolverConfig {
            units: file.units,
            gravity: file.gravity.unwrap_or(defaults.gravity),
            restitution: file.restitution,
            contact: file.contact,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            units: UnitSystem::SI,
            gravity: vector![0.0, -GRAVITY, 0.0],
            restitution: 0.0,
            contact: true,
        }
    }
}

impl SolverConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Default settings in `units`, with gravity converted from SI
    pub fn in_units(units: UnitSystem) -> Self {
        SolverConfig::default().convert_to(units)
    }

    pub fn with_gravity(mut self, gravity: Vector3<Float>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_restitution(mut self, restitution: Float) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_contact(mut self, contact: bool) -> Self {
        self.contact = contact;
        self
    }

    pub fn convert_to(&self, to: UnitSystem) -> SolverConfig {
        SolverConfig {
            units: to,
            gravity: self.gravity * units::ACCELERATION.convert(self.units, to),
            restitution: self.restitution,
            contact: self.contact,
        }
    }
}
