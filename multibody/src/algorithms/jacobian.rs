use super::forward_kinematics::ForwardKinematics;
use crate::{body::BodyId, joint::JointModel, system::MultiBody, MultibodyErrors};
use nalgebra::{DMatrix, Vector3};

/// Velocity Jacobian of a point fixed on one body.
/// Columns cover the joint parameters on the path from the root to the body, in path order.
#[derive(Debug, Clone, PartialEq)]
pub struct Jacobian {
    body_index: usize,
    joints_path: Vec<usize>,
    local_offsets: Vec<usize>,
    dof: usize,
    point: Vector3<f64>,
    jac: DMatrix<f64>,
}

impl Jacobian {
    pub fn new(mb: &MultiBody, body: BodyId) -> Result<Self, MultibodyErrors> {
        let body_index = mb.body_index(body)?;
        let joints_path = mb.joint_path(body_index);
        let mut local_offsets = Vec::with_capacity(joints_path.len());
        let mut dof = 0;
        for &joint in &joints_path {
            local_offsets.push(dof);
            dof += mb.joint(joint).model.nparams();
        }
        Ok(Self {
            body_index,
            joints_path,
            local_offsets,
            dof,
            point: Vector3::zeros(),
            jac: DMatrix::zeros(6, dof),
        })
    }

    /// Number of columns, one per joint parameter along the path
    pub fn dof(&self) -> usize {
        self.dof
    }

    pub fn body_index(&self) -> usize {
        self.body_index
    }

    /// Joint indices from the root down to the body
    pub fn joints_path(&self) -> &[usize] {
        &self.joints_path
    }

    /// First local column of each joint in `joints_path`
    pub fn local_offsets(&self) -> &[usize] {
        &self.local_offsets
    }

    /// Sets the evaluation point, expressed in the body frame
    pub fn set_point(&mut self, point: Vector3<f64>) {
        self.point = point;
    }

    pub fn point(&self) -> &Vector3<f64> {
        &self.point
    }

    /// 6 x dof world frame block, angular rows first
    pub fn jacobian(&mut self, mb: &MultiBody, fk: &ForwardKinematics<f64>) -> &DMatrix<f64> {
        let point = fk.world_from_body(self.body_index) * nalgebra::Point3::from(self.point);
        self.jac.fill(0.0);
        for (&joint, &col) in self.joints_path.iter().zip(&self.local_offsets) {
            mb.joint(joint).model.fill_columns(
                fk.world_from_joint(joint),
                fk.joint_params(joint),
                &point.coords,
                &mut self.jac,
                col,
            );
        }
        &self.jac
    }
}
