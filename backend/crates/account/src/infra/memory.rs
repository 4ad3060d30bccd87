//! In-Memory Repository
//!
//! Process-local storage for development and tests. Contents are lost on
//! restart.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::{identity::Identity, user::User};
use crate::domain::repository::{RefreshTokenStore, UserRepository};
use crate::domain::value_object::{email::Email, image_path::ImagePath, user_id::UserId};
use crate::error::{AccountError, AccountResult};

struct RefreshBinding {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    users: RwLock<HashMap<UserId, User>>,
    refresh_tokens: RwLock<HashMap<String, RefreshBinding>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryAccountRepository {
    async fn create(&self, user: &User) -> AccountResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AccountError::EmailTaken);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AccountResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == *email).cloned())
    }

    async fn list(&self) -> AccountResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn exists_by_email(&self, email: &Email) -> AccountResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == *email))
    }

    async fn exists_by_image(&self, image: &ImagePath) -> AccountResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.image == *image))
    }

    async fn update(&self, user: &User) -> AccountResult<()> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email == user.email && u.user_id != user.user_id)
        {
            return Err(AccountError::EmailTaken);
        }
        match users.get_mut(&user.user_id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(AccountError::UserNotFound),
        }
    }

    async fn delete(&self, user_id: &UserId) -> AccountResult<bool> {
        Ok(self.users.write().await.remove(user_id).is_some())
    }
}

impl RefreshTokenStore for InMemoryAccountRepository {
    async fn put(
        &self,
        token: &str,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> AccountResult<()> {
        self.refresh_tokens.write().await.insert(
            token.to_string(),
            RefreshBinding {
                identity: identity.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> AccountResult<Option<Identity>> {
        let tokens = self.refresh_tokens.read().await;
        Ok(tokens.get(token).map(|binding| binding.identity.clone()))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AccountResult<u64> {
        let mut tokens = self.refresh_tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, binding| binding.expires_at > now);
        Ok((before - tokens.len()) as u64)
    }
}
