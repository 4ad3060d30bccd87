//! User Password Value Object
//!
//! Domain wrapper over `platform::password`. New passwords pass through the
//! policy in [`RawPassword::new`]; passwords typed at login use
//! [`RawPassword::presented`] and are only normalized.

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{
    ClearTextPassword, HashParams, HashedPassword, PasswordHashError, PasswordPolicyError,
};
use std::fmt;

pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Password that is about to be stored
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let clear_text = ClearTextPassword::new(raw.into()).map_err(policy_error)?;
        Ok(Self(clear_text))
    }

    /// Password presented for verification
    pub fn presented(raw: impl Into<String>) -> Self {
        Self(ClearTextPassword::presented(raw.into()))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

fn policy_error(err: PasswordPolicyError) -> AppError {
    let action = match err {
        PasswordPolicyError::TooShort { .. } => "Choose a longer password",
        PasswordPolicyError::TooLong { .. } => "Choose a shorter password",
        PasswordPolicyError::EmptyOrWhitespace => "Enter a password",
        PasswordPolicyError::InvalidCharacter => "Remove control characters",
        PasswordPolicyError::CommonPattern => "Choose a less predictable password",
    };
    AppError::bad_request(err.to_string()).with_action(action)
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Argon2id hash as stored on the user record
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(
        raw: &RawPassword,
        params: &HashParams,
        pepper: Option<&[u8]>,
    ) -> AppResult<Self> {
        let hashed = raw.inner().hash(params, pepper).map_err(|e| match e {
            PasswordHashError::InvalidParams(msg) => {
                AppError::internal(format!("Invalid password hash parameters: {msg}"))
            }
            other => AppError::internal(other.to_string()),
        })?;

        Ok(Self(hashed))
    }

    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string)
            .map_err(|_| AppError::internal("Invalid password hash in storage"))?;
        Ok(Self(hashed))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }

    pub fn needs_rehash(&self, params: &HashParams) -> bool {
        self.0.needs_rehash(params)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
