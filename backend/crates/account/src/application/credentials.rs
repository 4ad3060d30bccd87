//! Credential Verifier
//!
//! Checks an identifier/password pair against the stored Argon2id hash.

use std::sync::{Arc, OnceLock};

use crate::application::config::AccountConfig;
use crate::domain::entity::identity::Identity;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AccountError, AccountResult};

pub struct CredentialVerifier<R>
where
    R: UserRepository,
{
    user_repo: Arc<R>,
    config: Arc<AccountConfig>,
    /// Verified against when the identifier is unknown, so both failure
    /// paths cost one Argon2 verification
    dummy_hash: OnceLock<Option<UserPassword>>,
}

impl<R> CredentialVerifier<R>
where
    R: UserRepository + Send + Sync,
{
    /// Computes the dummy hash up front so the first unknown-identifier
    /// login costs the same as every other one
    pub fn new(user_repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        let verifier = Self {
            user_repo,
            config,
            dummy_hash: OnceLock::new(),
        };
        if verifier.dummy_hash().is_none() {
            tracing::warn!("Could not prepare dummy password hash");
        }
        verifier
    }

    pub async fn verify(&self, identifier: &str, password: &str) -> AccountResult<Identity> {
        let presented = RawPassword::presented(password);
        let pepper = self.config.pepper();

        let user = match Email::new(identifier) {
            Ok(email) => self.user_repo.find_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            if let Some(dummy) = self.dummy_hash() {
                let _ = dummy.verify(&presented, pepper);
            }
            tracing::warn!("Invalid credentials");
            return Err(AccountError::InvalidCredentials);
        };

        if !user.password_hash.verify(&presented, pepper) {
            tracing::warn!("Invalid credentials");
            return Err(AccountError::InvalidCredentials);
        }

        if user.password_hash.needs_rehash(&self.config.hash_params) {
            tracing::debug!(user_id = %user.user_id, "Password hash uses outdated parameters");
        }

        Ok(user.identity())
    }

    fn dummy_hash(&self) -> Option<&UserPassword> {
        self.dummy_hash
            .get_or_init(|| {
                let filler = platform::crypto::to_base64url(&platform::crypto::random_bytes(16));
                UserPassword::from_raw(
                    &RawPassword::presented(filler),
                    &self.config.hash_params,
                    self.config.pepper(),
                )
                .ok()
            })
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::User;
    use crate::domain::value_object::{
        image_path::ImagePath, user_name::UserName, user_role::UserRole,
    };
    use crate::infra::memory::InMemoryAccountRepository;

    async fn verifier_with_admin() -> CredentialVerifier<InMemoryAccountRepository> {
        let config = Arc::new(AccountConfig::development());
        let repo = Arc::new(InMemoryAccountRepository::new());
        let hash = UserPassword::from_raw(
            &RawPassword::presented("admin"),
            &config.hash_params,
            config.pepper(),
        )
        .unwrap();
        let admin = User::new(
            UserName::new("Admin").unwrap(),
            Email::new("admin@test.com").unwrap(),
            hash,
            UserRole::Admin,
            ImagePath::default(),
        );
        repo.create(&admin).await.unwrap();
        CredentialVerifier::new(repo, config)
    }

    #[tokio::test]
    async fn test_verify_success() {
        let verifier = verifier_with_admin().await;
        let identity = verifier.verify("Admin@Test.com", "admin").await.unwrap();
        assert_eq!(identity.subject.as_str(), "admin@test.com");
        assert_eq!(identity.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_failures_are_indistinguishable() {
        let verifier = verifier_with_admin().await;

        let wrong_password = verifier.verify("admin@test.com", "nope").await.unwrap_err();
        let unknown_user = verifier.verify("ghost@test.com", "admin").await.unwrap_err();
        let malformed = verifier.verify("not an email", "admin").await.unwrap_err();

        for err in [wrong_password, unknown_user, malformed] {
            assert!(matches!(err, AccountError::InvalidCredentials));
        }
    }
}
