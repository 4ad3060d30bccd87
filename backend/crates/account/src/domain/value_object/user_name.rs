//! User Name Value Object
//!
//! Display name shown for an account. Unlike the email it is not unique and
//! is never used to log in.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const USER_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    /// Trim and validate: non-empty, at most [`USER_NAME_MAX_LENGTH`] characters,
    /// no control characters
    pub fn new(input: impl AsRef<str>) -> AppResult<Self> {
        let trimmed = input.as_ref().trim();

        if trimmed.is_empty() {
            return Err(AppError::bad_request("User name cannot be empty"));
        }

        let length = trimmed.chars().count();
        if length > USER_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "User name must be at most {USER_NAME_MAX_LENGTH} characters (got {length})"
            )));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(AppError::bad_request("User name contains control characters"));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// From storage, assumed valid
    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_name_trims() {
        assert_eq!(UserName::new("  Ivan Caez ").unwrap().as_str(), "Ivan Caez");
    }

    #[test]
    fn test_user_name_invalid() {
        assert!(UserName::new("").is_err());
        assert!(UserName::new("   ").is_err());
        assert!(UserName::new("a".repeat(USER_NAME_MAX_LENGTH + 1)).is_err());
        assert!(UserName::new("bad\u{0000}name").is_err());
    }

    #[test]
    fn test_user_name_max_length_ok() {
        assert!(UserName::new("ñ".repeat(USER_NAME_MAX_LENGTH)).is_ok());
    }
}
