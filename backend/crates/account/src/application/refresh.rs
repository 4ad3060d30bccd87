//! Refresh Use Case
//!
//! Exchanges a stored refresh token for a new access token. The refresh token
//! itself is not rotated.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AccountConfig;
use crate::application::token::TokenCodec;
use crate::domain::repository::{RefreshTokenStore, UserRepository};
use crate::error::{AccountError, AccountResult};

#[derive(Debug, Clone)]
pub struct RefreshOutput {
    pub access_token: String,
}

pub struct RefreshUseCase<R>
where
    R: UserRepository + RefreshTokenStore,
{
    repo: Arc<R>,
    codec: TokenCodec,
}

impl<R> RefreshUseCase<R>
where
    R: UserRepository + RefreshTokenStore + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self {
            codec: TokenCodec::from_config(&config),
            repo,
        }
    }

    pub async fn execute(&self, refresh_token: &str) -> AccountResult<RefreshOutput> {
        self.execute_at(refresh_token, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> AccountResult<RefreshOutput> {
        let claims = self.codec.parse_lenient(refresh_token)?;
        let subject = claims.identity()?.subject;

        // Role may have changed since the refresh token was issued
        let user = self
            .repo
            .find_by_email(&subject)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        let bound = self
            .repo
            .get(refresh_token)
            .await?
            .ok_or(AccountError::UnknownRefreshToken)?;

        if self.codec.is_expired_at(refresh_token, now) {
            return Err(AccountError::ExpiredToken);
        }
        if bound.subject != subject {
            tracing::warn!(
                subject = %subject,
                bound = %bound.subject,
                "Refresh token bound to a different subject"
            );
            return Err(AccountError::InvalidToken);
        }
        // The email may have moved to a newer account since the token was issued
        if bound.user_id != user.user_id || claims.user_id()? != user.user_id {
            tracing::warn!(
                subject = %subject,
                user_id = %user.user_id,
                bound_user_id = %bound.user_id,
                "Refresh token issued to a different account"
            );
            return Err(AccountError::InvalidToken);
        }

        let identity = user.identity();
        let access_token = self.codec.issue_access_at(&identity, now)?;

        tracing::info!(
            subject = %identity.subject,
            role = %identity.role,
            "Access token refreshed"
        );

        Ok(RefreshOutput { access_token })
    }
}
