use super::{set_column, JointErrors, JointModel};
use nalgebra::{DMatrix, Isometry3, RealField, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use spatial_algebra::{lift_vector, MotionVector};

/// One translational degree of freedom along a fixed axis of the joint inner frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prismatic {
    axis: Vector3<f64>,
}

impl Prismatic {
    pub fn new(axis: Vector3<f64>) -> Result<Self, JointErrors> {
        let norm = axis.norm();
        if norm < f64::EPSILON {
            return Err(JointErrors::ZeroAxis);
        }
        Ok(Self { axis: axis / norm })
    }

    pub fn axis(&self) -> &Vector3<f64> {
        &self.axis
    }
}

impl JointModel for Prismatic {
    fn nparams(&self) -> usize {
        1
    }

    fn ndof(&self) -> usize {
        1
    }

    fn transform<T: RealField + Copy>(&self, q: &[T]) -> Isometry3<T> {
        let translation = lift_vector::<T>(&self.axis) * q[0];
        Isometry3::from_parts(Translation3::from(translation), UnitQuaternion::identity())
    }

    fn motion_subspace<T: RealField + Copy>(&self) -> Vec<MotionVector<T>> {
        vec![MotionVector::new(Vector3::zeros(), lift_vector(&self.axis))]
    }

    fn fill_columns(
        &self,
        world_from_jif: &Isometry3<f64>,
        _q: &[f64],
        _point: &Vector3<f64>,
        jac: &mut DMatrix<f64>,
        col: usize,
    ) {
        let v = world_from_jif.rotation * self.axis;
        set_column(jac, col, &Vector3::zeros(), &v);
    }
}
