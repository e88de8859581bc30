use super::{quaternion_rate_axes, rotation_from_params, set_column, JointModel};
use nalgebra::{DMatrix, Isometry3, RealField, Translation3, Vector3};
use serde::{Deserialize, Serialize};
use spatial_algebra::MotionVector;

/// Six degree of freedom joint.
/// Coordinates are the attitude quaternion `w, x, y, z` followed by the position of the
/// outer frame origin in the inner frame, so a floating root is parameterized by seven values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Floating;

impl JointModel for Floating {
    fn nparams(&self) -> usize {
        7
    }

    fn ndof(&self) -> usize {
        6
    }

    fn transform<T: RealField + Copy>(&self, q: &[T]) -> Isometry3<T> {
        Isometry3::from_parts(
            Translation3::new(q[4], q[5], q[6]),
            rotation_from_params(&q[0..4]),
        )
    }

    fn motion_subspace<T: RealField + Copy>(&self) -> Vec<MotionVector<T>> {
        // body frame twist, angular first
        (0..6)
            .map(|k| {
                let mut m = nalgebra::Vector6::zeros();
                m[k] = T::one();
                MotionVector(m.into())
            })
            .collect()
    }

    fn fill_columns(
        &self,
        world_from_jif: &Isometry3<f64>,
        q: &[f64],
        point: &Vector3<f64>,
        jac: &mut DMatrix<f64>,
        col: usize,
    ) {
        // the attitude rotates about the outer frame origin, not the inner one
        let pivot = world_from_jif * nalgebra::Point3::new(q[4], q[5], q[6]);
        let lever = point - pivot.coords;
        for (k, axis) in quaternion_rate_axes(&q[0..4]).iter().enumerate() {
            let w = world_from_jif.rotation * axis;
            set_column(jac, col + k, &w, &w.cross(&lever));
        }
        for k in 0..3 {
            let v = world_from_jif.rotation * Vector3::ith(k, 1.0);
            set_column(jac, col + 4 + k, &Vector3::zeros(), &v);
        }
    }
}
