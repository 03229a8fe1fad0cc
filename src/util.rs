use na::{Matrix3, Quaternion, Vector3};

use crate::types::Float;

/// Cross-product matrix of a vector, i.e. `skew_symmetric(a) * b == a.cross(b)`
#[rustfmt::skip]
pub fn skew_symmetric(v: &Vector3<Float>) -> Matrix3<Float> {
    Matrix3::new(
         0.0, -v.z,  v.y,
         v.z,  0.0, -v.x,
        -v.y,  v.x,  0.0,
    )
}

/// Compute the derivative of an orientation quaternion, given the angular
/// velocity expressed in the world frame:
///     qdot = 1/2 * ω \quaternion_product q
///
/// Ref: 1.5.2 & 1.5.4 in Quaternions and Dynamics, Basile Graf, 2007
pub fn quaternion_derivative(q: &Quaternion<Float>, omega: &Vector3<Float>) -> Quaternion<Float> {
    Quaternion::from_imag(*omega) * *q * 0.5
}

#[macro_export]
macro_rules! assert_close {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left = $left;
        let right = $right;
        let tol = $tolerance;
        let diff = (left - right).abs();
        if diff > tol {
            panic!(
                "assertion failed: {} ~= {} \
                (tolerance: {}, difference: {})",
                left, right, tol, diff
            );
        }
    }};
}

#[macro_export]
macro_rules! assert_vec_close {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left = $left;
        let right = $right;
        let tol = $tolerance;
        for (a, b) in left.iter().zip(right.iter()) {
            $crate::assert_close!(*a, *b, tol);
        }
    }};
}

#[cfg(test)]
pub mod test_utils {
    use na::{vector, Matrix3, UnitQuaternion, Vector3};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::types::Float;

    /// Deterministic generator for test fixtures
    pub fn seeded_rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    /// Build a Vector3 where each element is random between (-range, range)
    pub fn random_vector(rng: &mut StdRng, range: Float) -> Vector3<Float> {
        vector![
            rng.random_range(-range..range),
            rng.random_range(-range..range),
            rng.random_range(-range..range)
        ]
    }

    /// Build a UnitQuaternion from Euler angles, where each angle is random
    /// between (-range, range)
    pub fn random_quaternion(rng: &mut StdRng, range: Float) -> UnitQuaternion<Float> {
        UnitQuaternion::from_euler_angles(
            rng.random_range(-range..range),
            rng.random_range(-range..range),
            rng.random_range(-range..range),
        )
    }

    /// Build a random symmetric positive-definite matrix
    pub fn random_spd(rng: &mut StdRng, range: Float) -> Matrix3<Float> {
        let rot = random_quaternion(rng, 3.0).to_rotation_matrix();
        let diag = Matrix3::from_diagonal(&vector![
            rng.random_range(0.1..range),
            rng.random_range(0.1..range),
            rng.random_range(0.1..range)
        ]);
        rot.matrix() * diag * rot.matrix().transpose()
    }
}

#[cfg(test)]
mod util_tests {
    use super::*;
    use na::{vector, UnitQuaternion};

    #[test]
    fn skew_symmetric_is_cross_product() {
        // Arrange
        let a = vector![1.0, -2.0, 3.0];
        let b = vector![0.5, 4.0, -1.0];

        // Act
        let result = skew_symmetric(&a) * b;

        // Assert
        assert_vec_close!(result, a.cross(&b), 1e-12);
    }

    #[test]
    fn quaternion_derivative_matches_finite_difference() {
        // Arrange
        let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 0.7);
        let omega = vector![0.4, 1.1, -0.6];
        let dt = 1e-6;

        // Act
        let qdot = quaternion_derivative(q.quaternion(), &omega);

        // Assert
        let q_next = UnitQuaternion::from_scaled_axis(omega * dt) * q;
        let finite = (q_next.quaternion() - q.quaternion()) / dt;
        assert_vec_close!(qdot.coords, finite.coords, 1e-5);
    }

    #[test]
    fn close_assertions_are_expressions() {
        let value: Option<Float> = Some(1.0 + 1e-13);
        match value {
            Some(v) => assert_close!(v, 1.0, 1e-12),
            None => panic!("expected a value"),
        }
        match Some(Vector3::<Float>::zeros()) {
            Some(v) => assert_vec_close!(v, Vector3::<Float>::zeros(), 0.0),
            None => panic!("expected a vector"),
        }
    }
}
