//! Sign In Use Case
//!
//! Verifies credentials and issues an access/refresh token pair.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AccountConfig;
use crate::application::credentials::CredentialVerifier;
use crate::application::token::TokenCodec;
use crate::domain::repository::{RefreshTokenStore, UserRepository};
use crate::error::AccountResult;

pub struct SignInInput {
    /// Email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignInOutput {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SignInUseCase<R>
where
    R: UserRepository + RefreshTokenStore,
{
    repo: Arc<R>,
    verifier: CredentialVerifier<R>,
    codec: TokenCodec,
}

impl<R> SignInUseCase<R>
where
    R: UserRepository + RefreshTokenStore + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self {
            verifier: CredentialVerifier::new(repo.clone(), config.clone()),
            codec: TokenCodec::from_config(&config),
            repo,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AccountResult<SignInOutput> {
        let identity = self
            .verifier
            .verify(&input.identifier, &input.password)
            .await?;

        let now = Utc::now();
        let access_token = self.codec.issue_access_at(&identity, now)?;
        let refresh_token = self.codec.issue_refresh_at(&identity, now)?;
        let expires_at = self.codec.refresh_expires_at(now)?;

        self.repo.put(&refresh_token, &identity, expires_at).await?;

        match self.repo.delete_expired(now).await {
            Ok(0) => {}
            Ok(pruned) => tracing::debug!(pruned, "Pruned expired refresh tokens"),
            Err(e) => tracing::warn!(error = %e, "Failed to prune expired refresh tokens"),
        }

        tracing::info!(
            subject = %identity.subject,
            role = %identity.role,
            "User signed in"
        );

        Ok(SignInOutput {
            access_token,
            refresh_token,
        })
    }
}
