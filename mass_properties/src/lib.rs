use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum MassPropertiesErrors {
    #[error("Ixx cant be less than or equal to zero")]
    IxxLessThanOrEqualToZero,
    #[error("Iyy cant be less than or equal to zero")]
    IyyLessThanOrEqualToZero,
    #[error("Izz cant be less than or equal to zero")]
    IzzLessThanOrEqualToZero,
    #[error("inertia matrix must be symmetric")]
    InertiaNotSymmetric,
    #[error("mass cannot be less than or equal to zero")]
    MassLessThanOrEqualToZero,
}

/// Center of mass expressed in the body frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CenterOfMass {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CenterOfMass {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f64>> for CenterOfMass {
    fn from(v: Vector3<f64>) -> CenterOfMass {
        CenterOfMass::new(v[0], v[1], v[2])
    }
}

/// Inertia tensor about the center of mass, body axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inertia {
    pub ixx: f64,
    pub ixy: f64,
    pub ixz: f64,
    pub iyy: f64,
    pub iyz: f64,
    pub izz: f64,
}

impl Inertia {
    pub fn new(
        ixx: f64,
        iyy: f64,
        izz: f64,
        ixy: f64,
        ixz: f64,
        iyz: f64,
    ) -> Result<Self, MassPropertiesErrors> {
        if ixx <= f64::EPSILON {
            return Err(MassPropertiesErrors::IxxLessThanOrEqualToZero);
        }
        if iyy <= f64::EPSILON {
            return Err(MassPropertiesErrors::IyyLessThanOrEqualToZero);
        }
        if izz <= f64::EPSILON {
            return Err(MassPropertiesErrors::IzzLessThanOrEqualToZero);
        }
        Ok(Self {
            ixx,
            iyy,
            izz,
            ixy,
            ixz,
            iyz,
        })
    }

    /// Principal-axes inertia of a solid box with full side lengths `lx`, `ly`, `lz`
    pub fn cuboid(mass: f64, lx: f64, ly: f64, lz: f64) -> Result<Self, MassPropertiesErrors> {
        let k = mass / 12.0;
        Inertia::new(
            k * (ly * ly + lz * lz),
            k * (lx * lx + lz * lz),
            k * (lx * lx + ly * ly),
            0.0,
            0.0,
            0.0,
        )
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ixx, self.ixy, self.ixz, //
            self.ixy, self.iyy, self.iyz, //
            self.ixz, self.iyz, self.izz,
        )
    }
}

impl TryFrom<Matrix3<f64>> for Inertia {
    type Error = MassPropertiesErrors;
    fn try_from(m: Matrix3<f64>) -> Result<Inertia, MassPropertiesErrors> {
        if (m - m.transpose()).abs().max() > 1e-12 {
            return Err(MassPropertiesErrors::InertiaNotSymmetric);
        }
        Inertia::new(
            m[(0, 0)],
            m[(1, 1)],
            m[(2, 2)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 2)],
        )
    }
}

/// Represents the mass properties of an object
/// Mass, Center of Mass, Inertia
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    pub center_of_mass: CenterOfMass,
    pub mass: f64,
    pub inertia: Inertia,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            center_of_mass: CenterOfMass::default(),
            mass: 1.0,
            inertia: Inertia {
                ixx: 1.0,
                ixy: 0.0,
                ixz: 0.0,
                iyy: 1.0,
                iyz: 0.0,
                izz: 1.0,
            },
        }
    }
}

impl MassProperties {
    pub fn new(
        mass: f64,
        center_of_mass: CenterOfMass,
        inertia: Inertia,
    ) -> Result<Self, MassPropertiesErrors> {
        if mass <= f64::EPSILON {
            return Err(MassPropertiesErrors::MassLessThanOrEqualToZero);
        }
        Ok(MassProperties {
            mass,
            center_of_mass,
            inertia,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mass_must_be_positive() {
        let err = MassProperties::new(0.0, CenterOfMass::default(), Inertia::cuboid(1.0, 1.0, 1.0, 1.0).unwrap());
        assert_eq!(err.unwrap_err(), MassPropertiesErrors::MassLessThanOrEqualToZero);
    }

    #[test]
    fn test_cuboid_inertia() {
        let inertia = Inertia::cuboid(12.0, 1.0, 2.0, 3.0).unwrap();
        assert_abs_diff_eq!(inertia.ixx, 13.0, epsilon = 1e-12);
        assert_abs_diff_eq!(inertia.iyy, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(inertia.izz, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inertia_from_matrix() {
        let m = Matrix3::new(2.0, 0.1, 0.2, 0.1, 3.0, 0.3, 0.2, 0.3, 4.0);
        let inertia = Inertia::try_from(m).unwrap();
        assert_abs_diff_eq!(inertia.matrix(), m, epsilon = 1e-12);

        let skewed = Matrix3::new(2.0, 0.1, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0);
        assert_eq!(
            Inertia::try_from(skewed).unwrap_err(),
            MassPropertiesErrors::InertiaNotSymmetric
        );
    }
}
