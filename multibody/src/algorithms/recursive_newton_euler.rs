use super::forward_kinematics::ForwardKinematics;
use crate::{joint::JointModel, system::MultiBody, MultibodyErrors};
use nalgebra::{RealField, Vector3};
use spatial_algebra::{
    lift_vector, ForceVector, MotionVector, SpatialInertia, SpatialTransform,
};

/// Static recursive Newton-Euler: joint efforts holding the mechanism still against gravity
/// and external wrenches. Joint rates and accelerations are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseDynamics<T: RealField + Copy> {
    body_forces: Vec<ForceVector<T>>,
    torques: Vec<Vec<T>>,
}

impl<T: RealField + Copy> InverseDynamics<T> {
    pub fn new(mb: &MultiBody) -> Self {
        Self {
            body_forces: vec![ForceVector::zeros(); mb.nr_bodies()],
            torques: mb
                .joints()
                .iter()
                .map(|j| vec![T::zero(); j.model.ndof()])
                .collect(),
        }
    }

    /// `external` holds one wrench per body, expressed in that body's frame
    pub fn run(
        &mut self,
        mb: &MultiBody,
        fk: &ForwardKinematics<T>,
        gravity: &Vector3<f64>,
        external: &[ForceVector<T>],
    ) -> Result<(), MultibodyErrors> {
        if external.len() != mb.nr_bodies() {
            return Err(MultibodyErrors::ForcesSizeMismatch {
                expected: mb.nr_bodies(),
                got: external.len(),
            });
        }
        let gravity = lift_vector::<T>(gravity);

        // first pass: a uniform upward acceleration stands in for gravity
        for (i, body) in mb.bodies().iter().enumerate() {
            let up = fk.world_from_body(i).rotation.inverse_transform_vector(&-gravity);
            let a = MotionVector::new(Vector3::zeros(), up);
            self.body_forces[i] = SpatialInertia(body.mass_properties) * a - external[i];
        }

        // second pass: leaves to root, children always come after their parent
        for i in (0..mb.nr_bodies()).rev() {
            let f = self.body_forces[i];
            for (k, s) in mb.joint(i).model.motion_subspace::<T>().iter().enumerate() {
                self.torques[i][k] = s.vector().dot(&f.vector());
            }
            if let Some(parent) = mb.parent(i) {
                let parent_from_body = SpatialTransform(*fk.parent_from_body(i));
                self.body_forces[parent] += parent_from_body * f;
            }
        }
        Ok(())
    }

    /// Wrench transmitted through each body's inner joint, in the body frame
    pub fn body_forces(&self) -> &[ForceVector<T>] {
        &self.body_forces
    }

    pub fn torques(&self) -> &[Vec<T>] {
        &self.torques
    }

    /// Efforts of joint `joint`, one per degree of freedom
    pub fn joint_torque(&self, joint: usize) -> &[T] {
        &self.torques[joint]
    }
}
