pub mod algorithms;
pub mod body;
pub mod joint;
pub mod system;

use body::{BodyErrors, BodyId};
use joint::JointErrors;
use mass_properties::MassPropertiesErrors;
use thiserror::Error;

pub use algorithms::{
    forward_kinematics::ForwardKinematics, jacobian::Jacobian,
    recursive_newton_euler::InverseDynamics,
};
pub use body::Body;
pub use joint::{Joint, JointModel, JointModels};
pub use system::{MultiBody, MultiBodyBuilder};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MultibodyErrors {
    #[error("{0}")]
    Body(#[from] BodyErrors),
    #[error("body '{0}' does not have an inner joint")]
    BodyMissingInnerJoint(String),
    #[error("could not find body {0} in the system")]
    BodyNotFound(BodyId),
    #[error("body '{0}' cannot be reached from a root joint")]
    Disconnected(String),
    #[error("body id {0} is already taken")]
    DuplicateBody(BodyId),
    #[error("body '{0}' already has an inner joint")]
    InnerJointExists(String),
    #[error("expected {expected} body forces, got {got}")]
    ForcesSizeMismatch { expected: usize, got: usize },
    #[error("{0}")]
    JointErrors(#[from] JointErrors),
    #[error("joint '{0}' must have an outer body")]
    JointMissingOuterBody(String),
    #[error("{0}")]
    MassProperties(#[from] MassPropertiesErrors),
    #[error("inner body {0} of a joint is not in the system")]
    ParentNotFound(BodyId),
    #[error("expected {expected} joint parameters, got {got}")]
    ParamsSizeMismatch { expected: usize, got: usize },
}
