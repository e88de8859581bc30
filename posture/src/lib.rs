//! Collision avoidance constraints for posture generation.
//!
//! A [`KinematicCache`] holds the optimization parameter vector and everything derived from it.
//! Collision constraints share one cache and evaluate signed distances between convex hulls
//! together with their sparse Jacobian.

pub mod cache;
pub mod collision;
pub mod config;
pub mod errors;
pub mod function;
pub mod sparse;

#[cfg(feature = "autodiff")]
pub use cache::Tangent;
pub use cache::{
    CacheRef, Construct, EllipseDescriptor, ForceDescriptor, KinematicCache, Plain,
};
pub use collision::{
    env::EnvCollisionConstraint, self_collision::SelfCollisionConstraint, EnvCollision,
    SelfCollision,
};
pub use config::CollisionSettings;
pub use errors::PostureErrors;
pub use function::DifferentiableSparseFunction;
