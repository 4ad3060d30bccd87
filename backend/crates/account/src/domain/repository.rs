//! Repository Traits
//!
//! Interfaces for persistence and file storage. Implementations live in the
//! infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::{identity::Identity, user::User};
use crate::domain::value_object::{email::Email, image_path::ImagePath, user_id::UserId};
use crate::error::AccountResult;

/// Durable user store
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn create(&self, user: &User) -> AccountResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AccountResult<Option<User>>;

    /// Emails are stored lowercased, so this is case-insensitive
    async fn find_by_email(&self, email: &Email) -> AccountResult<Option<User>>;

    /// All users, oldest first
    async fn list(&self) -> AccountResult<Vec<User>>;

    async fn exists_by_email(&self, email: &Email) -> AccountResult<bool>;

    /// Whether any user still points at `image`
    async fn exists_by_image(&self, image: &ImagePath) -> AccountResult<bool>;

    async fn update(&self, user: &User) -> AccountResult<()>;

    /// Returns false when no such user existed
    async fn delete(&self, user_id: &UserId) -> AccountResult<bool>;
}

/// Refresh token bindings
///
/// Tokens are never removed on use; a user may hold several at once. Bindings
/// past their expiry are dropped by `delete_expired`.
#[trait_variant::make(RefreshTokenStore: Send)]
pub trait LocalRefreshTokenStore {
    async fn put(
        &self,
        token: &str,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> AccountResult<()>;

    async fn get(&self, token: &str) -> AccountResult<Option<Identity>>;

    /// Returns the number of bindings removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> AccountResult<u64>;
}

/// Profile image storage
#[trait_variant::make(ImageStore: Send)]
pub trait LocalImageStorage {
    /// Store the bytes under a unique name derived from `original_name`
    async fn save(&self, original_name: &str, bytes: &[u8]) -> AccountResult<ImagePath>;

    /// Missing files are not an error
    async fn delete(&self, path: &ImagePath) -> AccountResult<()>;
}
