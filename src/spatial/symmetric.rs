//! Closed-form helpers for 3x3 matrices: adjugate inverse, symmetric / skew
//! split, and the eigen decomposition of a symmetric matrix.
use na::{Matrix3, Vector3};

use crate::types::Float;

/// Inverse of a 3x3 matrix through its adjugate. Returns `None` when the
/// determinant vanishes.
pub fn inverse3(m: &Matrix3<Float>) -> Option<Matrix3<Float>> {
    let c0 = m.column(1).cross(&m.column(2));
    let c1 = m.column(2).cross(&m.column(0));
    let c2 = m.column(0).cross(&m.column(1));
    let det = m.column(0).dot(&c0);
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    // rows of the inverse are the cross products of the columns
    Some(Matrix3::from_rows(&[c0.transpose(), c1.transpose(), c2.transpose()]) / det)
}

pub fn symmetric_part(m: &Matrix3<Float>) -> Matrix3<Float> {
    (m + m.transpose()) * 0.5
}

pub fn skew_part(m: &Matrix3<Float>) -> Matrix3<Float> {
    (m - m.transpose()) * 0.5
}

/// The eigen decomposition of a symmetric 3x3 matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SymmetricEigen3 {
    /// Eigenvalues in ascending order.
    pub eigenvalues: Vector3<Float>,
    /// Unit eigenvectors stored as columns, matching `eigenvalues`.
    pub eigenvectors: Matrix3<Float>,
}

impl SymmetricEigen3 {
    pub fn new(mat: &Matrix3<Float>) -> Self {
        let eigenvalues = Self::eigenvalues(mat);

        if Self::off_diagonal_norm(mat) == 0.0 {
            // Columns of the identity, reordered the same way as the diagonal.
            let mut order = [0usize, 1, 2];
            order.sort_by(|a, b| mat[(*a, *a)].total_cmp(&mat[(*b, *b)]));
            let eigenvectors = Matrix3::from_columns(&[
                Vector3::ith(order[0], 1.0),
                Vector3::ith(order[1], 1.0),
                Vector3::ith(order[2], 1.0),
            ]);
            return Self {
                eigenvalues,
                eigenvectors,
            };
        }

        // Start from the root farthest from the middle one, which is always
        // simple, and search for the other extreme in its orthogonal complement.
        let (v0, v2) = if eigenvalues.z - eigenvalues.y >= eigenvalues.y - eigenvalues.x {
            let v2 = Self::eigenvector(mat, eigenvalues.z);
            (Self::eigenvector_in_complement(mat, &v2, eigenvalues.x), v2)
        } else {
            let v0 = Self::eigenvector(mat, eigenvalues.x);
            (v0, Self::eigenvector_in_complement(mat, &v0, eigenvalues.z))
        };
        let v1 = v2.cross(&v0).normalize();

        Self {
            eigenvalues,
            eigenvectors: Matrix3::from_columns(&[v0, v1, v2]),
        }
    }

    fn off_diagonal_norm(mat: &Matrix3<Float>) -> Float {
        mat[(0, 1)].powi(2) + mat[(0, 2)].powi(2) + mat[(1, 2)].powi(2)
    }

    /// Eigenvalues of a symmetric 3x3 matrix in ascending order.
    ///
    /// Uses the trigonometric solution of the depressed characteristic
    /// cubic. When two roots coincide the repeated value occupies both of its
    /// slots, so `x <= y <= z` always holds; for a diagonal matrix the diagonal
    /// is sorted directly and equal entries keep their axis order.
    ///
    /// Reference: <https://en.wikipedia.org/wiki/Eigenvalue_algorithm#3%C3%973_matrices>
    pub fn eigenvalues(mat: &Matrix3<Float>) -> Vector3<Float> {
        let p1 = Self::off_diagonal_norm(mat);
        if p1 == 0.0 {
            let mut diag = [mat[(0, 0)], mat[(1, 1)], mat[(2, 2)]];
            diag.sort_by(|a, b| a.total_cmp(b));
            return Vector3::new(diag[0], diag[1], diag[2]);
        }

        let q = mat.trace() / 3.0;
        let p2 = (mat[(0, 0)] - q).powi(2)
            + (mat[(1, 1)] - q).powi(2)
            + (mat[(2, 2)] - q).powi(2)
            + 2.0 * p1;
        let p = (p2 / 6.0).sqrt();
        let b = (mat - Matrix3::identity() * q) / p;
        let r = b.determinant() / 2.0;

        // r is in [-1, 1] for a symmetric matrix up to round-off
        let phi = if r <= -1.0 {
            std::f64::consts::FRAC_PI_3
        } else if r >= 1.0 {
            0.0
        } else {
            r.acos() / 3.0
        };

        let largest = q + 2.0 * p * phi.cos();
        let smallest = q + 2.0 * p * (phi + 2.0 * std::f64::consts::FRAC_PI_3).cos();
        let middle = 3.0 * q - largest - smallest;
        Vector3::new(smallest, middle, largest)
    }

    /// Unit eigenvector for a simple eigenvalue, by substituting it into
    /// `(mat - λI) v = 0` and taking the best conditioned cross product of the
    /// rows.
    pub fn eigenvector(mat: &Matrix3<Float>, eigenvalue: Float) -> Vector3<Float> {
        let m = mat - Matrix3::identity() * eigenvalue;
        let r0 = m.row(0).transpose();
        let r1 = m.row(1).transpose();
        let r2 = m.row(2).transpose();
        let candidates = [r0.cross(&r1), r0.cross(&r2), r1.cross(&r2)];

        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.norm_squared() > best.norm_squared() {
                best = *candidate;
            }
        }
        let norm = best.norm();
        if norm == 0.0 {
            // every row vanished: any direction is an eigenvector
            return Vector3::x();
        }
        best / norm
    }

    /// Unit eigenvector orthogonal to `known` for `eigenvalue`. Solves the 2x2
    /// system obtained by restricting `mat - λI` to the plane normal to
    /// `known`; if that restriction vanishes (repeated root) any vector of the
    /// plane is returned.
    pub fn eigenvector_in_complement(
        mat: &Matrix3<Float>,
        known: &Vector3<Float>,
        eigenvalue: Float,
    ) -> Vector3<Float> {
        let (u, w) = orthonormal_pair(known);
        let m = mat - Matrix3::identity() * eigenvalue;
        let mu = m * u;
        let mw = m * w;
        let m00 = u.dot(&mu);
        let m01 = u.dot(&mw);
        let m11 = w.dot(&mw);

        let (a, b) = if m00.abs().max(m01.abs()) >= m11.abs().max(m01.abs()) {
            (m00, m01)
        } else {
            (m01, m11)
        };
        let norm = (a * a + b * b).sqrt();
        if norm == 0.0 {
            return u;
        }
        (u * b - w * a) / norm
    }
}

/// Two unit vectors completing `n` to a right-handed orthonormal basis.
pub fn orthonormal_pair(n: &Vector3<Float>) -> (Vector3<Float>, Vector3<Float>) {
    let u = if n.x.abs() > n.y.abs() {
        Vector3::new(-n.z, 0.0, n.x) / (n.x * n.x + n.z * n.z).sqrt()
    } else {
        Vector3::new(0.0, n.z, -n.y) / (n.y * n.y + n.z * n.z).sqrt()
    };
    let w = n.cross(&u);
    (u, w)
}
