//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod credentials;
pub mod refresh;
pub mod sign_in;
pub mod token;
pub mod users;

// Re-exports
pub use config::AccountConfig;
pub use credentials::CredentialVerifier;
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use token::{Claims, TokenCodec};
pub use users::{NewUser, UserPatch, UserReplacement, UserUseCase};
