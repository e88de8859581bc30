pub mod floating;
pub mod prismatic;
pub mod revolute;
pub mod spherical;

use crate::body::BodyId;
use floating::Floating;
use nalgebra::{DMatrix, Isometry3, Quaternion, RealField, UnitQuaternion, Vector3};
use prismatic::Prismatic;
use revolute::Revolute;
use serde::{Deserialize, Serialize};
use spatial_algebra::MotionVector;
use spherical::Spherical;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum JointErrors {
    #[error("name cannot be empty for joint")]
    EmptyName,
    #[error("inner body already exists for joint '{0}'")]
    InnerBodyExists(String),
    #[error("outer body already exists for joint '{0}'")]
    OuterBodyExists(String),
    #[error("joint axis cannot have zero length")]
    ZeroAxis,
}

pub trait JointModel {
    /// Number of parameter-vector slots used by the joint coordinates
    fn nparams(&self) -> usize;
    /// Number of degrees of freedom, i.e. the dimension of the joint motion subspace
    fn ndof(&self) -> usize;
    /// Joint-outer-frame pose in the joint-inner-frame (jif_from_jof)
    fn transform<T: RealField + Copy>(&self, q: &[T]) -> Isometry3<T>;
    /// Motion subspace expressed in the outer body frame, one column per dof
    fn motion_subspace<T: RealField + Copy>(&self) -> Vec<MotionVector<T>>;
    /// Writes world frame velocity columns of `point` into `jac`, one column per parameter
    /// starting at `col`. Rows 0..3 are angular, rows 3..6 linear.
    fn fill_columns(
        &self,
        world_from_jif: &Isometry3<f64>,
        q: &[f64],
        point: &Vector3<f64>,
        jac: &mut DMatrix<f64>,
        col: usize,
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JointModels {
    Fixed,
    Floating(Floating),
    Prismatic(Prismatic),
    Revolute(Revolute),
    Spherical(Spherical),
}

impl JointModels {
    pub fn is_floating(&self) -> bool {
        matches!(self, JointModels::Floating(_))
    }
}

impl From<Floating> for JointModels {
    fn from(value: Floating) -> Self {
        JointModels::Floating(value)
    }
}
impl From<Prismatic> for JointModels {
    fn from(value: Prismatic) -> Self {
        JointModels::Prismatic(value)
    }
}
impl From<Revolute> for JointModels {
    fn from(value: Revolute) -> Self {
        JointModels::Revolute(value)
    }
}
impl From<Spherical> for JointModels {
    fn from(value: Spherical) -> Self {
        JointModels::Spherical(value)
    }
}

impl JointModel for JointModels {
    fn nparams(&self) -> usize {
        match self {
            JointModels::Fixed => 0,
            JointModels::Floating(model) => model.nparams(),
            JointModels::Prismatic(model) => model.nparams(),
            JointModels::Revolute(model) => model.nparams(),
            JointModels::Spherical(model) => model.nparams(),
        }
    }

    fn ndof(&self) -> usize {
        match self {
            JointModels::Fixed => 0,
            JointModels::Floating(model) => model.ndof(),
            JointModels::Prismatic(model) => model.ndof(),
            JointModels::Revolute(model) => model.ndof(),
            JointModels::Spherical(model) => model.ndof(),
        }
    }

    fn transform<T: RealField + Copy>(&self, q: &[T]) -> Isometry3<T> {
        match self {
            JointModels::Fixed => Isometry3::identity(),
            JointModels::Floating(model) => model.transform(q),
            JointModels::Prismatic(model) => model.transform(q),
            JointModels::Revolute(model) => model.transform(q),
            JointModels::Spherical(model) => model.transform(q),
        }
    }

    fn motion_subspace<T: RealField + Copy>(&self) -> Vec<MotionVector<T>> {
        match self {
            JointModels::Fixed => Vec::new(),
            JointModels::Floating(model) => model.motion_subspace(),
            JointModels::Prismatic(model) => model.motion_subspace(),
            JointModels::Revolute(model) => model.motion_subspace(),
            JointModels::Spherical(model) => model.motion_subspace(),
        }
    }

    fn fill_columns(
        &self,
        world_from_jif: &Isometry3<f64>,
        q: &[f64],
        point: &Vector3<f64>,
        jac: &mut DMatrix<f64>,
        col: usize,
    ) {
        match self {
            JointModels::Fixed => {}
            JointModels::Floating(model) => model.fill_columns(world_from_jif, q, point, jac, col),
            JointModels::Prismatic(model) => model.fill_columns(world_from_jif, q, point, jac, col),
            JointModels::Revolute(model) => model.fill_columns(world_from_jif, q, point, jac, col),
            JointModels::Spherical(model) => model.fill_columns(world_from_jif, q, point, jac, col),
        }
    }
}

/// Where a joint attaches.
/// The inner frame is placed relative to the inner body frame (or the world when there is no
/// inner body). The outer body frame coincides with the joint outer frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointConnection {
    pub inner_body: Option<BodyId>,
    pub ib_from_jif: Isometry3<f64>,
    pub outer_body: Option<BodyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub name: String,
    pub model: JointModels,
    pub connections: JointConnection,
}

impl Joint {
    pub fn new(name: &str, model: impl Into<JointModels>) -> Result<Self, JointErrors> {
        if name.is_empty() {
            return Err(JointErrors::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            model: model.into(),
            connections: JointConnection::default(),
        })
    }

    pub fn fixed(name: &str) -> Result<Self, JointErrors> {
        Joint::new(name, JointModels::Fixed)
    }

    /// Connects the joint inner frame to a body. Without an inner body the joint hangs off the world.
    pub fn connect_inner_body(
        &mut self,
        body: BodyId,
        ib_from_jif: Isometry3<f64>,
    ) -> Result<(), JointErrors> {
        if self.connections.inner_body.is_some() {
            return Err(JointErrors::InnerBodyExists(self.name.clone()));
        }
        self.connections.inner_body = Some(body);
        self.connections.ib_from_jif = ib_from_jif;
        Ok(())
    }

    /// Places the joint inner frame in the world, for joints without an inner body
    pub fn with_world_transform(mut self, world_from_jif: Isometry3<f64>) -> Self {
        self.connections.ib_from_jif = world_from_jif;
        self
    }

    pub fn connect_outer_body(&mut self, body: BodyId) -> Result<(), JointErrors> {
        if self.connections.outer_body.is_some() {
            return Err(JointErrors::OuterBodyExists(self.name.clone()));
        }
        self.connections.outer_body = Some(body);
        Ok(())
    }
}

/// Unit quaternion from `w, x, y, z` joint coordinates. A zero quaternion maps to identity.
pub(crate) fn rotation_from_params<T: RealField + Copy>(q: &[T]) -> UnitQuaternion<T> {
    let quaternion = Quaternion::new(q[0], q[1], q[2], q[3]);
    if quaternion.norm_squared() > T::zero() {
        UnitQuaternion::from_quaternion(quaternion)
    } else {
        UnitQuaternion::identity()
    }
}

/// Angular velocity (in the jif) produced by a unit rate of each of the four quaternion
/// coordinates. The rotation is built from the normalized quaternion, hence the 1/|q|^2.
pub(crate) fn quaternion_rate_axes(q: &[f64]) -> [Vector3<f64>; 4] {
    let quaternion = Quaternion::new(q[0], q[1], q[2], q[3]);
    let norm_squared = quaternion.norm_squared();
    if norm_squared <= f64::EPSILON {
        return [Vector3::zeros(); 4];
    }
    let conjugate = quaternion.conjugate();
    let unit = [
        Quaternion::new(1.0, 0.0, 0.0, 0.0),
        Quaternion::new(0.0, 1.0, 0.0, 0.0),
        Quaternion::new(0.0, 0.0, 1.0, 0.0),
        Quaternion::new(0.0, 0.0, 0.0, 1.0),
    ];
    unit.map(|e| (e * conjugate).imag() * (2.0 / norm_squared))
}

/// Writes an (angular, linear) column pair
pub(crate) fn set_column(
    jac: &mut DMatrix<f64>,
    col: usize,
    angular: &Vector3<f64>,
    linear: &Vector3<f64>,
) {
    jac.fixed_view_mut::<3, 1>(0, col).copy_from(angular);
    jac.fixed_view_mut::<3, 1>(3, col).copy_from(linear);
}
