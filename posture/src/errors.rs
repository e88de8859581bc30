use multibody::{body::BodyId, MultibodyErrors};
use proximity::ProximityErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PostureErrors {
    #[error("could not read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("kinematic cache is already borrowed")]
    CacheInUse,
    #[error("quaternion of the floating base has zero norm")]
    DegenerateQuaternion,
    #[error("{0}")]
    Multibody(#[from] MultibodyErrors),
    #[error("{0}")]
    Proximity(#[from] ProximityErrors),
    #[error("invalid settings: {0}")]
    RonDeserialize(#[from] ron::error::SpannedError),
    #[error("could not serialize settings: {0}")]
    RonSerialize(#[from] ron::Error),
    #[error("expected a vector of size {expected}, got {got}")]
    SizeMismatch { expected: usize, got: usize },
    #[error("body {0} is not part of the mechanism")]
    UnknownBody(BodyId),
}
