//! Account Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, access policy
//! - `application/` - Use cases, token codec, credential verifier
//! - `infra/` - PostgreSQL, in-memory and filesystem implementations
//! - `presentation/` - HTTP handlers, DTOs, router, bearer middleware
//!
//! ## Features
//! - Login with email + password, returning an access/refresh token pair
//! - Refresh token exchange for a new access token
//! - User CRUD with profile image upload
//! - Role-based access (User, Admin)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B policy for new passwords)
//! - HS256-signed, time-bounded access tokens
//! - A caller may act on their own record; admins on any record
//! - Role changes honored only for callers whose stored role is admin

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AccountConfig;
pub use domain::entity::identity::Identity;
pub use error::{AccountError, AccountResult};
pub use infra::{InMemoryAccountRepository, LocalImageStore, PgAccountRepository};
pub use presentation::{AccountAppState, account_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
