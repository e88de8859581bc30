use super::{set_column, JointErrors, JointModel};
use nalgebra::{DMatrix, Isometry3, RealField, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use spatial_algebra::{lift_vector, MotionVector};

/// One rotational degree of freedom about a fixed axis of the joint inner frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Revolute {
    axis: Vector3<f64>,
}

impl Revolute {
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

impl JointModel for Revolute {
    fn nparams(&self) -> usize {
        1
    }

    fn ndof(&self) -> usize {
        1
    }

    fn transform<T: RealField + Copy>(&self, q: &[T]) -> Isometry3<T> {
        let axis = Unit::new_unchecked(lift_vector::<T>(&self.axis));
        Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&axis, q[0]),
        )
    }

    fn motion_subspace<T: RealField + Copy>(&self) -> Vec<MotionVector<T>> {
        // the axis is invariant under the joint rotation, so it reads the same in the outer frame
        vec![MotionVector::new(lift_vector(&self.axis), Vector3::zeros())]
    }

    fn fill_columns(
        &self,
        world_from_jif: &Isometry3<f64>,
        _q: &[f64],
        point: &Vector3<f64>,
        jac: &mut DMatrix<f64>,
        col: usize,
    ) {
        let w = world_from_jif.rotation * self.axis;
        let v = w.cross(&(point - world_from_jif.translation.vector));
        set_column(jac, col, &w, &v);
    }
}
