#![allow(non_snake_case)]

use types::Float;
pub extern crate nalgebra as na;

pub mod config;
pub mod contact;
pub mod dynamics;
pub mod energy;
pub mod error;
pub mod inertia;
pub mod integrators;
pub mod joint;
pub mod mechanism;
pub mod rigid_body;
pub mod simulate;
pub mod spatial;
pub mod types;
pub mod units;
pub mod util;

pub mod helpers;

/// Standard gravity, m/s²
pub const GRAVITY: Float = 9.80665;

pub const PI: Float = std::f64::consts::PI;
pub const TWO_PI: Float = 2.0 * PI;
