//! Planar (XY) analogue of the spatial types: 3-component vectors made of an
//! in-plane linear part and a scalar rotation about z, and 3x3 operators
//! stored as blocks.
use std::ops::{Add, Mul, Neg, Sub};

use na::{Matrix2, RowVector2, Vector2};

use crate::types::Float;

/// `ω ẑ × v`
fn perp(omega: Float, v: &Vector2<Float>) -> Vector2<Float> {
    Vector2::new(-omega * v.y, omega * v.x)
}

/// z-component of `a × b`
fn cross2(a: &Vector2<Float>, b: &Vector2<Float>) -> Float {
    a.x * b.y - a.y * b.x
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarVector {
    pub linear: Vector2<Float>,
    pub angular: Float,
}

impl PlanarVector {
    pub fn new(linear: Vector2<Float>, angular: Float) -> Self {
        PlanarVector { linear, angular }
    }

    pub fn zero() -> Self {
        PlanarVector {
            linear: Vector2::zeros(),
            angular: 0.0,
        }
    }

    pub fn force_at(point: &Vector2<Float>, force: &Vector2<Float>) -> Self {
        PlanarVector {
            linear: *force,
            angular: cross2(point, force),
        }
    }

    pub fn point_velocity(&self, point: &Vector2<Float>) -> Vector2<Float> {
        self.linear + perp(self.angular, point)
    }

    pub fn dot(&self, rhs: &PlanarVector) -> Float {
        self.linear.dot(&rhs.linear) + self.angular * rhs.angular
    }

    pub fn twist_cross_twist(&self, rhs: &PlanarVector) -> PlanarVector {
        PlanarVector {
            linear: perp(self.angular, &rhs.linear) - perp(rhs.angular, &self.linear),
            angular: 0.0,
        }
    }

    pub fn twist_cross_wrench(&self, rhs: &PlanarVector) -> PlanarVector {
        PlanarVector {
            linear: perp(self.angular, &rhs.linear),
            angular: cross2(&self.linear, &rhs.linear),
        }
    }

    pub fn wrench_cross_twist(&self, rhs: &PlanarVector) -> PlanarVector {
        -rhs.twist_cross_wrench(self)
    }

    /// The product of two planar wrenches leaves the plane: a force along z
    /// and an in-plane moment.
    pub fn wrench_cross_wrench(&self, rhs: &PlanarVector) -> TransverseWrench {
        TransverseWrench {
            force: cross2(&self.linear, &rhs.linear),
            moment: perp(self.angular, &rhs.linear) - perp(rhs.angular, &self.linear),
        }
    }
}

/// Wrench orthogonal to the plane: force along z, moment in the plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransverseWrench {
    pub force: Float,
    pub moment: Vector2<Float>,
}

impl Add for PlanarVector {
    type Output = PlanarVector;

    fn add(self, rhs: Self) -> Self::Output {
        PlanarVector {
            linear: self.linear + rhs.linear,
            angular: self.angular + rhs.angular,
        }
    }
}

impl Sub for PlanarVector {
    type Output = PlanarVector;

    fn sub(self, rhs: Self) -> Self::Output {
        PlanarVector {
            linear: self.linear - rhs.linear,
            angular: self.angular - rhs.angular,
        }
    }
}

impl Neg for PlanarVector {
    type Output = PlanarVector;

    fn neg(self) -> Self::Output {
        PlanarVector {
            linear: -self.linear,
            angular: -self.angular,
        }
    }
}

impl Mul<Float> for PlanarVector {
    type Output = PlanarVector;

    fn mul(self, rhs: Float) -> Self::Output {
        PlanarVector {
            linear: self.linear * rhs,
            angular: self.angular * rhs,
        }
    }
}

/// | a11  a12 |
/// | a21  a22 |
/// with a 2x2 upper-left block and a scalar lower-right block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarMatrix {
    pub a11: Matrix2<Float>,
    pub a12: Vector2<Float>,
    pub a21: RowVector2<Float>,
    pub a22: Float,
}

impl PlanarMatrix {
    pub fn identity() -> Self {
        PlanarMatrix {
            a11: Matrix2::identity(),
            a12: Vector2::zeros(),
            a21: RowVector2::zeros(),
            a22: 1.0,
        }
    }

    /// Planar spatial inertia of a body with mass `m`, moment `izz` about its
    /// center of mass, and center of mass at `cg`.
    pub fn inertia(m: Float, izz: Float, cg: &Vector2<Float>) -> Self {
        let c_perp = Vector2::new(-cg.y, cg.x);
        PlanarMatrix {
            a11: Matrix2::identity() * m,
            a12: c_perp * m,
            a21: c_perp.transpose() * m,
            a22: izz + m * cg.norm_squared(),
        }
    }

    pub fn transpose(&self) -> Self {
        PlanarMatrix {
            a11: self.a11.transpose(),
            a12: self.a21.transpose(),
            a21: self.a12.transpose(),
            a22: self.a22,
        }
    }

    /// Inverse through the Schur complement of the 2x2 block.
    pub fn inverse(&self) -> Option<PlanarMatrix> {
        let det = self.a11.determinant();
        if det == 0.0 {
            return None;
        }
        #[rustfmt::skip]
        let a_inv = Matrix2::new(
             self.a11[(1, 1)], -self.a11[(0, 1)],
            -self.a11[(1, 0)],  self.a11[(0, 0)],
        ) / det;
        let s = self.a22 - (self.a21 * a_inv * self.a12)[(0, 0)];
        if s == 0.0 {
            return None;
        }
        let a_inv_b = a_inv * self.a12;
        let c_a_inv = self.a21 * a_inv;
        Some(PlanarMatrix {
            a11: a_inv + a_inv_b * c_a_inv / s,
            a12: -a_inv_b / s,
            a21: -c_a_inv / s,
            a22: 1.0 / s,
        })
    }
}

impl Mul<&PlanarVector> for &PlanarMatrix {
    type Output = PlanarVector;

    fn mul(self, rhs: &PlanarVector) -> Self::Output {
        PlanarVector {
            linear: self.a11 * rhs.linear + self.a12 * rhs.angular,
            angular: (self.a21 * rhs.linear)[(0, 0)] + self.a22 * rhs.angular,
        }
    }
}

impl Mul<&PlanarMatrix> for &PlanarMatrix {
    type Output = PlanarMatrix;

    fn mul(self, rhs: &PlanarMatrix) -> Self::Output {
        PlanarMatrix {
            a11: self.a11 * rhs.a11 + self.a12 * rhs.a21,
            a12: self.a11 * rhs.a12 + self.a12 * rhs.a22,
            a21: self.a21 * rhs.a11 + rhs.a21 * self.a22,
            a22: (self.a21 * rhs.a12)[(0, 0)] + self.a22 * rhs.a22,
        }
    }
}
