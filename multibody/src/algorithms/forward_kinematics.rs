use crate::{joint::JointModel, system::MultiBody, MultibodyErrors};
use nalgebra::{Isometry3, RealField};
use spatial_algebra::lift_isometry;

/// Body poses for one set of joint coordinates.
/// Generic over the scalar so the same propagation runs on plain and dual numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardKinematics<T: RealField + Copy> {
    q: Vec<Vec<T>>,
    world_from_jif: Vec<Isometry3<T>>,
    parent_from_body: Vec<Isometry3<T>>,
    world_from_body: Vec<Isometry3<T>>,
}

impl<T: RealField + Copy> ForwardKinematics<T> {
    /// Zero-initialized storage for `mb`. Poses are identity until the first `run`.
    pub fn new(mb: &MultiBody) -> Self {
        let n = mb.nr_bodies();
        Self {
            q: mb
                .joints()
                .iter()
                .map(|j| vec![T::zero(); j.model.nparams()])
                .collect(),
            world_from_jif: vec![Isometry3::identity(); n],
            parent_from_body: vec![Isometry3::identity(); n],
            world_from_body: vec![Isometry3::identity(); n],
        }
    }

    /// Propagates poses root to leaves from per-joint coordinates
    pub fn run(&mut self, mb: &MultiBody, q: &[Vec<T>]) -> Result<(), MultibodyErrors> {
        if q.len() != mb.nr_joints() {
            return Err(MultibodyErrors::ParamsSizeMismatch {
                expected: mb.nr_joints(),
                got: q.len(),
            });
        }
        for (i, joint) in mb.joints().iter().enumerate() {
            let nparams = joint.model.nparams();
            if q[i].len() != nparams {
                return Err(MultibodyErrors::ParamsSizeMismatch {
                    expected: nparams,
                    got: q[i].len(),
                });
            }
            self.q[i].clone_from(&q[i]);

            let ib_from_jif = lift_isometry::<T>(mb.ib_from_jif(i));
            let jif_from_jof = joint.model.transform(&q[i]);
            self.parent_from_body[i] = ib_from_jif * jif_from_jof;
            self.world_from_jif[i] = match mb.parent(i) {
                Some(parent) => self.world_from_body[parent] * ib_from_jif,
                None => ib_from_jif,
            };
            self.world_from_body[i] = self.world_from_jif[i] * jif_from_jof;
        }
        Ok(())
    }

    /// Same as `run` from a flat joint parameter slice
    pub fn run_flat(&mut self, mb: &MultiBody, params: &[T]) -> Result<(), MultibodyErrors> {
        if params.len() != mb.nr_params() {
            return Err(MultibodyErrors::ParamsSizeMismatch {
                expected: mb.nr_params(),
                got: params.len(),
            });
        }
        let q = mb.split_params(params);
        self.run(mb, &q)
    }

    pub fn q(&self) -> &[Vec<T>] {
        &self.q
    }

    pub fn joint_params(&self, joint: usize) -> &[T] {
        &self.q[joint]
    }

    pub fn world_from_body(&self, body: usize) -> &Isometry3<T> {
        &self.world_from_body[body]
    }

    pub fn world_from_bodies(&self) -> &[Isometry3<T>] {
        &self.world_from_body
    }

    pub fn parent_from_body(&self, body: usize) -> &Isometry3<T> {
        &self.parent_from_body[body]
    }

    /// Joint inner frame pose in the world, i.e. before the joint motion is applied
    pub fn world_from_joint(&self, joint: usize) -> &Isometry3<T> {
        &self.world_from_jif[joint]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        body::{Body, BodyId},
        joint::{prismatic::Prismatic, revolute::Revolute, Joint},
        system::MultiBodyBuilder,
    };
    use approx::assert_abs_diff_eq;
    use mass_properties::MassProperties;
    use nalgebra::{Point3, Vector3};
    use std::f64::consts::FRAC_PI_2;

    const TOL: f64 = 1e-12;

    fn arm() -> MultiBody {
        let mut shoulder = Joint::new("shoulder", Revolute::new(Vector3::z()).unwrap())
            .unwrap()
            .with_world_transform(Isometry3::translation(0.0, 0.0, 1.0));
        shoulder.connect_outer_body(BodyId(0)).unwrap();

        let mut slider = Joint::new("slider", Prismatic::new(Vector3::x()).unwrap()).unwrap();
        slider
            .connect_inner_body(BodyId(0), Isometry3::translation(1.0, 0.0, 0.0))
            .unwrap();
        slider.connect_outer_body(BodyId(1)).unwrap();

        MultiBodyBuilder::new()
            .with_body(Body::new(BodyId(0), "link", MassProperties::default()).unwrap())
            .unwrap()
            .with_body(Body::new(BodyId(1), "tip", MassProperties::default()).unwrap())
            .unwrap()
            .with_joint(shoulder)
            .with_joint(slider)
            .build()
            .unwrap()
    }

    #[test]
    fn test_chain_poses() {
        let mb = arm();
        let mut fk = ForwardKinematics::new(&mb);
        fk.run_flat(&mb, &[FRAC_PI_2, 0.5]).unwrap();

        // link rotated a quarter turn, slider pushes the tip along the rotated x axis
        let tip = fk.world_from_body(1) * Point3::origin();
        assert_abs_diff_eq!(tip.coords, Vector3::new(0.0, 1.5, 1.0), epsilon = TOL);
        let joint = fk.world_from_joint(1).translation.vector;
        assert_abs_diff_eq!(joint, Vector3::new(0.0, 1.0, 1.0), epsilon = TOL);
        let local = fk.parent_from_body(1).translation.vector;
        assert_abs_diff_eq!(local, Vector3::new(1.5, 0.0, 0.0), epsilon = TOL);
        assert_eq!(fk.joint_params(1), &[0.5]);
    }

    #[test]
    fn test_size_mismatch() {
        let mb = arm();
        let mut fk = ForwardKinematics::<f64>::new(&mb);
        assert_eq!(
            fk.run_flat(&mb, &[0.0]).unwrap_err(),
            MultibodyErrors::ParamsSizeMismatch { expected: 2, got: 1 }
        );
    }
}
