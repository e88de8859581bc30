use super::{quaternion_rate_axes, rotation_from_params, set_column, JointModel};
use nalgebra::{DMatrix, Isometry3, RealField, Translation3, Vector3};
use serde::{Deserialize, Serialize};
use spatial_algebra::MotionVector;

/// Three rotational degrees of freedom parameterized by a `w, x, y, z` quaternion
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Spherical;

impl JointModel for Spherical {
    fn nparams(&self) -> usize {
        4
    }

    fn ndof(&self) -> usize {
        3
    }

    fn transform<T: RealField + Copy>(&self, q: &[T]) -> Isometry3<T> {
        Isometry3::from_parts(Translation3::identity(), rotation_from_params(q))
    }

    fn motion_subspace<T: RealField + Copy>(&self) -> Vec<MotionVector<T>> {
        // body frame angular rates
        (0..3)
            .map(|k| {
                let mut w = Vector3::zeros();
                w[k] = T::one();
                MotionVector::new(w, Vector3::zeros())
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
        let lever = point - world_from_jif.translation.vector;
        for (k, axis) in quaternion_rate_axes(q).iter().enumerate() {
            let w = world_from_jif.rotation * axis;
            set_column(jac, col + k, &w, &w.cross(&lever));
        }
    }
}
