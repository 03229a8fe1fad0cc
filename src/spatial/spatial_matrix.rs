use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use na::{zero, Matrix3};

use crate::{
    spatial::{spatial_vector::SpatialVector, symmetric::inverse3},
    types::Float,
};

/// A 6x6 operator on spatial vectors, stored as four 3x3 blocks:
/// | a11  a12 | | linear  |
/// | a21  a22 | | angular |
///
/// Inertia-like operators map twists to wrenches, mobility-like operators map
/// wrenches to twists; both are symmetric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialMatrix {
    pub a11: Matrix3<Float>,
    pub a12: Matrix3<Float>,
    pub a21: Matrix3<Float>,
    pub a22: Matrix3<Float>,
}

impl SpatialMatrix {
    pub fn new(
        a11: Matrix3<Float>,
        a12: Matrix3<Float>,
        a21: Matrix3<Float>,
        a22: Matrix3<Float>,
    ) -> Self {
        SpatialMatrix { a11, a12, a21, a22 }
    }

    pub fn zero() -> Self {
        SpatialMatrix {
            a11: zero(),
            a12: zero(),
            a21: zero(),
            a22: zero(),
        }
    }

    pub fn identity() -> Self {
        SpatialMatrix {
            a11: Matrix3::identity(),
            a12: zero(),
            a21: zero(),
            a22: Matrix3::identity(),
        }
    }

    /// Block diagonal matrix
    pub fn diagonal(a11: Matrix3<Float>, a22: Matrix3<Float>) -> Self {
        SpatialMatrix {
            a11,
            a12: zero(),
            a21: zero(),
            a22,
        }
    }

    pub fn transpose(&self) -> Self {
        SpatialMatrix {
            a11: self.a11.transpose(),
            a12: self.a21.transpose(),
            a21: self.a12.transpose(),
            a22: self.a22.transpose(),
        }
    }

    /// `vᵗ M v`
    pub fn quadratic(&self, v: &SpatialVector) -> Float {
        v.dot(&(self * v))
    }

    pub fn is_symmetric(&self, tol: Float) -> bool {
        let diff = self - &self.transpose();
        [diff.a11, diff.a12, diff.a21, diff.a22]
            .iter()
            .all(|block| block.amax() <= tol)
    }

    /// Inverse through the Schur complement of the upper-left block, falling
    /// back to the complement of the lower-right block when the upper-left
    /// block is singular. Returns `None` for a singular matrix.
    pub fn inverse(&self) -> Option<SpatialMatrix> {
        if let Some(a_inv) = inverse3(&self.a11) {
            // S = D - C A⁻¹ B
            let s = self.a22 - self.a21 * a_inv * self.a12;
            let s_inv = inverse3(&s)?;
            let a_inv_b = a_inv * self.a12;
            let c_a_inv = self.a21 * a_inv;
            return Some(SpatialMatrix {
                a11: a_inv + a_inv_b * s_inv * c_a_inv,
                a12: -a_inv_b * s_inv,
                a21: -s_inv * c_a_inv,
                a22: s_inv,
            });
        }

        let d_inv = inverse3(&self.a22)?;
        // S = A - B D⁻¹ C
        let s = self.a11 - self.a12 * d_inv * self.a21;
        let s_inv = inverse3(&s)?;
        let b_d_inv = self.a12 * d_inv;
        let d_inv_c = d_inv * self.a21;
        Some(SpatialMatrix {
            a11: s_inv,
            a12: -s_inv * b_d_inv,
            a21: -d_inv_c * s_inv,
            a22: d_inv + d_inv_c * s_inv * b_d_inv,
        })
    }
}

impl Default for SpatialMatrix {
    fn default() -> Self {
        SpatialMatrix::zero()
    }
}

impl Add for &SpatialMatrix {
    type Output = SpatialMatrix;

    fn add(self, rhs: Self) -> Self::Output {
        SpatialMatrix {
            a11: self.a11 + rhs.a11,
            a12: self.a12 + rhs.a12,
            a21: self.a21 + rhs.a21,
            a22: self.a22 + rhs.a22,
        }
    }
}

impl Add for SpatialMatrix {
    type Output = SpatialMatrix;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl AddAssign<&SpatialMatrix> for SpatialMatrix {
    fn add_assign(&mut self, rhs: &SpatialMatrix) {
        self.a11 += rhs.a11;
        self.a12 += rhs.a12;
        self.a21 += rhs.a21;
        self.a22 += rhs.a22;
    }
}

impl Sub for &SpatialMatrix {
    type Output = SpatialMatrix;

    fn sub(self, rhs: Self) -> Self::Output {
        SpatialMatrix {
            a11: self.a11 - rhs.a11,
            a12: self.a12 - rhs.a12,
            a21: self.a21 - rhs.a21,
            a22: self.a22 - rhs.a22,
        }
    }
}

impl Sub for SpatialMatrix {
    type Output = SpatialMatrix;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Neg for SpatialMatrix {
    type Output = SpatialMatrix;

    fn neg(self) -> Self::Output {
        SpatialMatrix {
            a11: -self.a11,
            a12: -self.a12,
            a21: -self.a21,
            a22: -self.a22,
        }
    }
}

impl Mul<Float> for &SpatialMatrix {
    type Output = SpatialMatrix;

    fn mul(self, rhs: Float) -> Self::Output {
        SpatialMatrix {
            a11: self.a11 * rhs,
            a12: self.a12 * rhs,
            a21: self.a21 * rhs,
            a22: self.a22 * rhs,
        }
    }
}

impl Mul<&SpatialVector> for &SpatialMatrix {
    type Output = SpatialVector;

    fn mul(self, rhs: &SpatialVector) -> Self::Output {
        SpatialVector {
            linear: self.a11 * rhs.linear + self.a12 * rhs.angular,
            angular: self.a21 * rhs.linear + self.a22 * rhs.angular,
        }
    }
}

impl Mul<SpatialVector> for &SpatialMatrix {
    type Output = SpatialVector;

    fn mul(self, rhs: SpatialVector) -> Self::Output {
        self * &rhs
    }
}

impl Mul<&SpatialMatrix> for &SpatialMatrix {
    type Output = SpatialMatrix;

    fn mul(self, rhs: &SpatialMatrix) -> Self::Output {
        SpatialMatrix {
            a11: self.a11 * rhs.a11 + self.a12 * rhs.a21,
            a12: self.a11 * rhs.a12 + self.a12 * rhs.a22,
            a21: self.a21 * rhs.a11 + self.a22 * rhs.a21,
            a22: self.a21 * rhs.a12 + self.a22 * rhs.a22,
        }
    }
}

impl Mul for SpatialMatrix {
    type Output = SpatialMatrix;

    fn mul(self, rhs: SpatialMatrix) -> Self::Output {
        &self * &rhs
    }
}
