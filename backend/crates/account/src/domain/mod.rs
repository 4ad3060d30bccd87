//! Domain Layer
//!
//! Entities, value objects, repository traits and the access policy.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{identity::Identity, user::User};
pub use policy::AccessPolicy;
pub use repository::{ImageStore, RefreshTokenStore, UserRepository};
