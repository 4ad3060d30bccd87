//! Application Configuration
//!
//! Configuration for the account application layer.

use std::path::PathBuf;

use chrono::Duration;
use platform::password::HashParams;

use crate::domain::value_object::image_path::DEFAULT_IMAGE_PATH;
use crate::error::{AccountError, AccountResult};

/// Minimum HMAC key size for HS256
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Upper bound for either token lifetime
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

#[derive(Clone)]
pub struct AccountConfig {
    /// HMAC-SHA256 signing key for access and refresh tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (7 days)
    pub refresh_token_ttl: Duration,
    pub hash_params: HashParams,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Directory where uploaded images are written
    pub upload_dir: PathBuf,
    pub default_image: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
            hash_params: HashParams::default(),
            password_pepper: None,
            upload_dir: PathBuf::from("uploads"),
            default_image: DEFAULT_IMAGE_PATH.to_string(),
        }
    }
}

impl AccountConfig {
    /// Random signing key, production hashing cost
    pub fn with_random_secret() -> Self {
        Self {
            jwt_secret: platform::crypto::random_bytes(MIN_JWT_SECRET_LENGTH),
            ..Default::default()
        }
    }

    /// Random signing key and cheap hashing. Never use in production.
    pub fn development() -> Self {
        Self {
            hash_params: HashParams::insecure_fast(),
            ..Self::with_random_secret()
        }
    }

    pub fn validate(&self) -> AccountResult<()> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AccountError::Internal(format!(
                "JWT secret must be at least {MIN_JWT_SECRET_LENGTH} bytes (got {})",
                self.jwt_secret.len()
            )));
        }
        validate_ttl("Access token", self.access_token_ttl)?;
        validate_ttl("Refresh token", self.refresh_token_ttl)?;
        Ok(())
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

fn validate_ttl(name: &str, ttl: Duration) -> AccountResult<()> {
    if ttl <= Duration::zero() {
        return Err(AccountError::Internal(format!("{name} TTL must be positive")));
    }
    if ttl > Duration::days(MAX_TOKEN_TTL_DAYS) {
        return Err(AccountError::Internal(format!(
            "{name} TTL must not exceed {MAX_TOKEN_TTL_DAYS} days"
        )));
    }
    Ok(())
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("hash_params", &self.hash_params)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("upload_dir", &self.upload_dir)
            .field("default_image", &self.default_image)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_needs_secret() {
        assert!(AccountConfig::default().validate().is_err());
    }

    #[test]
    fn test_development_is_valid() {
        let config = AccountConfig::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.hash_params, HashParams::insecure_fast());
        assert_eq!(config.default_image, DEFAULT_IMAGE_PATH);
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let config = AccountConfig {
            access_token_ttl: Duration::zero(),
            ..AccountConfig::development()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_ttl() {
        let config = AccountConfig {
            refresh_token_ttl: Duration::seconds(i64::MAX / 1000),
            ..AccountConfig::development()
        };
        assert!(config.validate().is_err());

        let config = AccountConfig {
            access_token_ttl: Duration::days(MAX_TOKEN_TTL_DAYS),
            refresh_token_ttl: Duration::days(MAX_TOKEN_TTL_DAYS),
            ..AccountConfig::development()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AccountConfig {
            jwt_secret: b"super-secret-signing-key-material!!".to_vec(),
            password_pepper: Some(b"pepper".to_vec()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
