use std::ops::{Add, Sub};

use na::{Matrix3, UnitQuaternion, Vector2, Vector3};

use crate::{
    error::{Error, Result},
    spatial::{
        planar::PlanarMatrix,
        spatial_matrix::SpatialMatrix,
        symmetric::{inverse3, symmetric_part, SymmetricEigen3},
    },
    types::Float,
    units::{self, UnitSystem},
    util::skew_symmetric,
};

/// Mass distribution of a rigid body, expressed in the body frame.
///
/// !!! Warning
///     `mmoi` is the moment of inertia about the center of mass, not about the
///     body frame origin.
#[derive(Clone, Debug, PartialEq)]
pub struct MassProperties {
    pub mass: Float,
    pub mmoi: Matrix3<Float>,
    pub cg: Vector3<Float>,
    pub units: UnitSystem,
}

/// Inertia of a point mass `mass` at offset `d` about the reference point
fn parallel_axis(mass: Float, d: &Vector3<Float>) -> Matrix3<Float> {
    mass * (Matrix3::identity() * d.norm_squared() - d * d.transpose())
}

impl MassProperties {
    pub fn new(mass: Float, mmoi: Matrix3<Float>, cg: Vector3<Float>, units: UnitSystem) -> Self {
        MassProperties {
            mass,
            mmoi,
            cg,
            units,
        }
    }

    pub fn zero(units: UnitSystem) -> Self {
        MassProperties {
            mass: 0.0,
            mmoi: Matrix3::zeros(),
            cg: Vector3::zeros(),
            units,
        }
    }

    /// Solid sphere centered at the origin
    pub fn sphere(mass: Float, radius: Float, units: UnitSystem) -> Self {
        let moment = 2.0 / 5.0 * mass * radius * radius;
        MassProperties::new(mass, Matrix3::identity() * moment, Vector3::zeros(), units)
    }

    /// Solid cylinder centered at the origin, with its axis along z
    pub fn cylinder(mass: Float, radius: Float, length: Float, units: UnitSystem) -> Self {
        let r2 = radius * radius;
        let ixx = mass * (3.0 * r2 + length * length) / 12.0;
        let izz = mass * r2 / 2.0;
        MassProperties::new(
            mass,
            Matrix3::from_diagonal(&Vector3::new(ixx, ixx, izz)),
            Vector3::zeros(),
            units,
        )
    }

    /// Solid box centered at the origin, with edge lengths along x, y, z
    pub fn cuboid(mass: Float, size: &Vector3<Float>, units: UnitSystem) -> Self {
        let s = size.component_mul(size);
        MassProperties::new(
            mass,
            Matrix3::from_diagonal(&Vector3::new(s.y + s.z, s.x + s.z, s.x + s.y)) * (mass / 12.0),
            Vector3::zeros(),
            units,
        )
    }

    /// Body of known mass, given the centroid and the inertia per unit mass
    /// about that centroid, as reported by a geometry provider.
    pub fn from_mass(
        mass: Float,
        centroid: Vector3<Float>,
        specific_inertia: &Matrix3<Float>,
        units: UnitSystem,
    ) -> Self {
        MassProperties::new(mass, symmetric_part(specific_inertia) * mass, centroid, units)
    }

    /// Body of uniform density filling `volume`
    pub fn from_density(
        density: Float,
        volume: Float,
        centroid: Vector3<Float>,
        specific_inertia: &Matrix3<Float>,
        units: UnitSystem,
    ) -> Self {
        MassProperties::from_mass(density * volume, centroid, specific_inertia, units)
    }

    /// Same body with its center of mass moved to `cg`
    pub fn with_cg(mut self, cg: Vector3<Float>) -> Self {
        self.cg = cg;
        self
    }

    /// Inertia tensor about the center of mass, rotated into the world frame
    pub fn world_mmoi(&self, rotation: &UnitQuaternion<Float>) -> Matrix3<Float> {
        let r = rotation.to_rotation_matrix();
        r.matrix() * self.mmoi * r.matrix().transpose()
    }

    /// Spatial inertia about the world origin, for a body whose frame has the
    /// given world `rotation` and whose center of mass sits at world point
    /// `cg`:
    /// | m·1        -m·[c]×            |
    /// | m·[c]×     Ic - m·[c]×[c]×    |
    pub fn spi(&self, rotation: &UnitQuaternion<Float>, cg: &Vector3<Float>) -> SpatialMatrix {
        let m = self.mass;
        let cx = skew_symmetric(cg);
        SpatialMatrix::new(
            Matrix3::identity() * m,
            -cx * m,
            cx * m,
            self.world_mmoi(rotation) - cx * cx * m,
        )
    }

    /// Spatial mobility, the inverse of `spi`, built block-wise:
    /// | 1/m - [c]× Ic⁻¹ [c]×     [c]× Ic⁻¹ |
    /// | -Ic⁻¹ [c]×               Ic⁻¹      |
    pub fn spm(&self, rotation: &UnitQuaternion<Float>, cg: &Vector3<Float>) -> Result<SpatialMatrix> {
        if self.mass <= 0.0 {
            return Err(Error::NonPositiveMass(self.mass));
        }
        let ic_inv = inverse3(&self.world_mmoi(rotation)).ok_or(Error::SingularInertia)?;
        let cx = skew_symmetric(cg);
        Ok(SpatialMatrix::new(
            Matrix3::identity() / self.mass - cx * ic_inv * cx,
            cx * ic_inv,
            -ic_inv * cx,
            ic_inv,
        ))
    }

    /// Spatial inertia of the motion restricted to the XY plane
    pub fn planar_spi(&self, cg: &Vector2<Float>) -> PlanarMatrix {
        PlanarMatrix::inertia(self.mass, self.mmoi[(2, 2)], cg)
    }

    /// Principal moments, ascending, and the principal axes as columns
    pub fn principal(&self) -> SymmetricEigen3 {
        SymmetricEigen3::new(&self.mmoi)
    }

    pub fn convert_to(&self, to: UnitSystem) -> MassProperties {
        let from = self.units;
        MassProperties {
            mass: self.mass * units::MASS.convert(from, to),
            mmoi: self.mmoi * units::MOMENT_OF_INERTIA.convert(from, to),
            cg: self.cg * units::LENGTH.convert(from, to),
            units: to,
        }
    }
}

impl Add for &MassProperties {
    type Output = MassProperties;

    /// Combined body, with the inertia taken about the combined center of mass
    fn add(self, rhs: &MassProperties) -> MassProperties {
        if self.units != rhs.units {
            panic!(
                "lhs unit system {:?} != rhs unit system {:?}!",
                self.units, rhs.units
            );
        }

        let mass = self.mass + rhs.mass;
        if mass == 0.0 {
            return MassProperties::zero(self.units);
        }
        let cg = (self.cg * self.mass + rhs.cg * rhs.mass) / mass;
        let mmoi = self.mmoi
            + parallel_axis(self.mass, &(self.cg - cg))
            + rhs.mmoi
            + parallel_axis(rhs.mass, &(rhs.cg - cg));
        MassProperties {
            mass,
            mmoi,
            cg,
            units: self.units,
        }
    }
}

impl Add for MassProperties {
    type Output = MassProperties;

    fn add(self, rhs: MassProperties) -> MassProperties {
        &self + &rhs
    }
}

impl Sub for &MassProperties {
    type Output = Result<MassProperties>;

    /// Body left over after removing `rhs` from `self`. The remaining mass
    /// must stay positive.
    fn sub(self, rhs: &MassProperties) -> Result<MassProperties> {
        if self.units != rhs.units {
            return Err(Error::UnitMismatch {
                expected: self.units,
                found: rhs.units,
            });
        }

        let mass = self.mass - rhs.mass;
        if mass <= 0.0 {
            return Err(Error::NonPositiveMass(mass));
        }
        let cg = (self.cg * self.mass - rhs.cg * rhs.mass) / mass;
        let mmoi = self.mmoi + parallel_axis(self.mass, &(self.cg - cg))
            - rhs.mmoi
            - parallel_axis(rhs.mass, &(rhs.cg - cg));
        Ok(MassProperties {
            mass,
            mmoi,
            cg,
            units: self.units,
        })
    }
}

#[cfg(test)]
mod inertia_tests {
    use na::vector;

    use super::*;
    use crate::{
        assert_close, assert_vec_close,
        spatial::spatial_vector::SpatialVector,
        util::test_utils::{random_quaternion, random_spd, random_vector, seeded_rng},
    };

    #[test]
    fn two_half_boxes_make_the_whole_box() {
        // Arrange
        let size = vector![2.0, 1.0, 0.5];
        let whole = MassProperties::cuboid(6.0, &size, UnitSystem::SI);
        let half_size = vector![1.0, 1.0, 0.5];
        let left = MassProperties::cuboid(3.0, &half_size, UnitSystem::SI).with_cg(vector![-0.5, 0.0, 0.0]);
        let right = MassProperties::cuboid(3.0, &half_size, UnitSystem::SI).with_cg(vector![0.5, 0.0, 0.0]);

        // Act
        let sum = &left + &right;

        // Assert
        assert_close!(sum.mass, whole.mass, 1e-4);
        assert_vec_close!(sum.cg, whole.cg, 1e-4);
        assert_vec_close!(sum.mmoi, whole.mmoi, 1e-4);
    }

    #[test]
    fn subtraction_undoes_addition() {
        // Arrange
        let mut rng = seeded_rng(21);
        let a = MassProperties::new(2.0, random_spd(&mut rng, 1.0), random_vector(&mut rng, 1.0), UnitSystem::SI);
        let b = MassProperties::new(0.5, random_spd(&mut rng, 1.0), random_vector(&mut rng, 1.0), UnitSystem::SI);

        // Act
        let back = (&(&a + &b) - &b).unwrap();

        // Assert
        assert_close!(back.mass, a.mass, 1e-10);
        assert_vec_close!(back.cg, a.cg, 1e-10);
        assert_vec_close!(back.mmoi, a.mmoi, 1e-10);
    }

    #[test]
    fn subtraction_to_non_positive_mass_is_an_error() {
        let a = MassProperties::sphere(1.0, 0.1, UnitSystem::SI);
        let b = MassProperties::sphere(1.0, 0.1, UnitSystem::SI);
        assert!(matches!(&a - &b, Err(Error::NonPositiveMass(_))));

        let c = MassProperties::sphere(0.5, 0.1, UnitSystem::MMKS);
        assert!(matches!(&a - &c, Err(Error::UnitMismatch { .. })));
    }

    #[test]
    #[should_panic]
    fn adding_different_unit_systems_panics() {
        let a = MassProperties::sphere(1.0, 0.1, UnitSystem::SI);
        let b = MassProperties::sphere(1.0, 0.1, UnitSystem::IPS);
        let _ = &a + &b;
    }

    #[test]
    fn spm_is_inverse_of_spi() {
        let mut rng = seeded_rng(22);
        for _ in 0..10 {
            // Arrange
            let body = MassProperties::new(1.5, random_spd(&mut rng, 2.0), Vector3::zeros(), UnitSystem::SI);
            let rotation = random_quaternion(&mut rng, 3.0);
            let cg = random_vector(&mut rng, 2.0);

            // Act
            let spi = body.spi(&rotation, &cg);
            let spm = body.spm(&rotation, &cg).unwrap();

            // Assert
            let product = &spi * &spm;
            let identity = SpatialMatrix::identity();
            assert_vec_close!(product.a11, identity.a11, 1e-9);
            assert_vec_close!(product.a12, identity.a12, 1e-9);
            assert_vec_close!(product.a21, identity.a21, 1e-9);
            assert_vec_close!(product.a22, identity.a22, 1e-9);
            assert!(spi.is_symmetric(1e-9));
            assert!(spm.is_symmetric(1e-9));
        }
    }

    #[test]
    fn spm_of_singular_inertia_is_an_error() {
        let rod = MassProperties::new(1.0, Matrix3::from_diagonal(&vector![1.0, 1.0, 0.0]), Vector3::zeros(), UnitSystem::SI);
        assert!(matches!(
            rod.spm(&UnitQuaternion::identity(), &Vector3::zeros()),
            Err(Error::SingularInertia)
        ));
    }

    #[test]
    fn spi_momentum_of_translation() {
        // Arrange
        let body = MassProperties::sphere(2.0, 0.3, UnitSystem::SI);
        let cg = vector![1.0, 2.0, 3.0];
        let v = vector![0.5, -1.0, 0.0];

        // Act
        let momentum = &body.spi(&UnitQuaternion::identity(), &cg) * &SpatialVector::linear(v);

        // Assert
        assert_vec_close!(momentum.linear, v * 2.0, 1e-12);
        assert_vec_close!(momentum.angular, cg.cross(&(v * 2.0)), 1e-12);
    }

    #[test]
    fn planar_spi_matches_spatial_in_plane() {
        // Arrange
        let body = MassProperties::cylinder(3.0, 0.2, 1.0, UnitSystem::SI);
        let cg = vector![0.4, -0.7];

        // Act
        let planar = body.planar_spi(&cg);
        let spatial = body.spi(&UnitQuaternion::identity(), &vector![cg.x, cg.y, 0.0]);

        // Assert
        assert_close!(planar.a22, spatial.a22[(2, 2)], 1e-12);
        assert_close!(planar.a12.x, spatial.a12[(0, 2)], 1e-12);
        assert_close!(planar.a12.y, spatial.a12[(1, 2)], 1e-12);
    }

    #[test]
    fn convert_and_back() {
        // Arrange
        let body = MassProperties::cylinder(3.0, 0.2, 1.0, UnitSystem::SI).with_cg(vector![0.1, 0.2, 0.3]);

        // Act
        let ips = body.convert_to(UnitSystem::IPS);
        let back = ips.convert_to(UnitSystem::SI);

        // Assert
        assert_eq!(ips.units, UnitSystem::IPS);
        assert_close!(ips.cg.x, 0.1 / 0.0254, 1e-9);
        assert_close!(back.mass, body.mass, 1e-9);
        assert_vec_close!(back.mmoi, body.mmoi, 1e-9);
    }

    #[test]
    fn from_density_and_principal_axes() {
        // Arrange
        let specific = Matrix3::from_diagonal(&vector![3.0, 1.0, 2.0]);

        // Act
        let body = MassProperties::from_density(2.0, 1.5, vector![0.0, 1.0, 0.0], &specific, UnitSystem::SI);
        let principal = body.principal();

        // Assert
        assert_close!(body.mass, 3.0, 1e-12);
        assert_vec_close!(principal.eigenvalues, vector![3.0, 6.0, 9.0], 1e-9);
    }
}
