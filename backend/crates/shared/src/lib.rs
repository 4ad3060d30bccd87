//! Shared Kernel
//!
//! Vocabulary shared by every crate of the account service:
//! - Error classification and the unified [`error::app_error::AppError`]
//! - Typed ID wrappers
//!
//! Only things whose meaning is identical across domains belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
