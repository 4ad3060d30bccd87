//! User Use Cases
//!
//! CRUD over user records. Every operation takes the caller explicitly and
//! goes through [`AccessPolicy`] before touching the store.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AccountConfig;
use crate::domain::entity::{
    identity::Identity,
    user::{User, UserChanges},
};
use crate::domain::policy::AccessPolicy;
use crate::domain::repository::{ImageStore, UserRepository};
use crate::domain::value_object::{
    email::Email,
    image_path::ImagePath,
    user_id::UserId,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AccountError, AccountResult};

pub struct NewUser {
    pub user_name: UserName,
    pub email: Email,
    pub password: RawPassword,
    /// Honored only when an admin creates the account
    pub user_role: Option<UserRole>,
}

/// Full update. The image is managed through uploads and is left as is.
pub struct UserReplacement {
    pub user_name: UserName,
    pub email: Email,
    pub password: RawPassword,
    pub user_role: Option<UserRole>,
}

#[derive(Default)]
pub struct UserPatch {
    pub user_name: Option<UserName>,
    pub email: Option<Email>,
    pub image: Option<ImagePath>,
    pub password: Option<RawPassword>,
    pub user_role: Option<UserRole>,
}

pub struct UserUseCase<R, F>
where
    R: UserRepository,
    F: ImageStore,
{
    user_repo: Arc<R>,
    images: Arc<F>,
    policy: AccessPolicy<R>,
    config: Arc<AccountConfig>,
}

impl<R, F> UserUseCase<R, F>
where
    R: UserRepository + Send + Sync,
    F: ImageStore + Send + Sync,
{
    pub fn new(user_repo: Arc<R>, images: Arc<F>, config: Arc<AccountConfig>) -> Self {
        Self {
            policy: AccessPolicy::new(user_repo.clone()),
            user_repo,
            images,
            config,
        }
    }

    /// Sign-up when `caller` is `None`
    pub async fn create(&self, caller: Option<&Identity>, input: NewUser) -> AccountResult<User> {
        if self.user_repo.exists_by_email(&input.email).await? {
            return Err(AccountError::EmailTaken);
        }

        let user_role = self
            .policy
            .resolve_role(caller, input.user_role, UserRole::User)
            .await?;
        let password_hash = self.hash(&input.password)?;

        let user = User::new(
            input.user_name,
            input.email,
            password_hash,
            user_role,
            self.default_image(),
        );
        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            role = %user.user_role,
            created_by = caller.map(|c| c.subject.as_str()).unwrap_or("self"),
            "User created"
        );

        Ok(user)
    }

    /// Bootstrap an admin account at startup, bypassing the access policy and
    /// the new-password policy. Returns false when the email is already taken.
    pub async fn ensure_admin(
        &self,
        user_name: UserName,
        email: Email,
        password: RawPassword,
    ) -> AccountResult<bool> {
        if self.user_repo.exists_by_email(&email).await? {
            return Ok(false);
        }

        let user = User::new(
            user_name,
            email,
            self.hash(&password)?,
            UserRole::Admin,
            self.default_image(),
        );
        self.user_repo.create(&user).await?;

        tracing::info!(user_id = %user.user_id, email = %user.email, "Seeded admin account");
        Ok(true)
    }

    /// Any authenticated caller may list users
    pub async fn list(&self, caller: &Identity) -> AccountResult<Vec<User>> {
        tracing::debug!(caller = %caller.subject, "Listing users");
        self.user_repo.list().await
    }

    pub async fn get_by_id(&self, caller: &Identity, user_id: &UserId) -> AccountResult<User> {
        self.policy.ensure_can_access(caller, user_id)?;
        self.load(user_id).await
    }

    pub async fn get_by_email(&self, caller: &Identity, email: &Email) -> AccountResult<User> {
        self.policy.ensure_can_access_email(caller, email).await?;
        self.user_repo
            .find_by_email(email)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    pub async fn replace(
        &self,
        caller: &Identity,
        user_id: &UserId,
        input: UserReplacement,
    ) -> AccountResult<User> {
        self.policy.ensure_can_access(caller, user_id)?;
        let mut user = self.load(user_id).await?;

        self.ensure_email_available(&user, &input.email).await?;
        let user_role = self
            .policy
            .resolve_role(Some(caller), input.user_role, user.user_role)
            .await?;

        let changes = UserChanges {
            user_name: Some(input.user_name),
            email: Some(input.email),
            image: None,
            password_hash: Some(self.hash(&input.password)?),
            user_role: Some(user_role),
        };

        self.save_changes(&mut user, changes).await?;
        Ok(user)
    }

    /// Absent fields are left unchanged. Nothing is written when no field
    /// actually differs. The image may only be kept or reset to the default;
    /// new images come in through [`Self::upload_image`].
    pub async fn patch(
        &self,
        caller: &Identity,
        user_id: &UserId,
        patch: UserPatch,
    ) -> AccountResult<User> {
        self.policy.ensure_can_access(caller, user_id)?;
        let mut user = self.load(user_id).await?;

        if let Some(email) = &patch.email {
            self.ensure_email_available(&user, email).await?;
        }

        let user_role = match patch.user_role {
            Some(_) => Some(
                self.policy
                    .resolve_role(Some(caller), patch.user_role, user.user_role)
                    .await?,
            ),
            None => None,
        };
        let password_hash = match &patch.password {
            Some(raw) => Some(self.hash(raw)?),
            None => None,
        };
        let image = match patch.image {
            Some(image) if self.is_default_image(&image) => Some(self.default_image()),
            Some(image) if image == user.image => Some(image),
            Some(image) => {
                tracing::warn!(
                    user_id = %user.user_id,
                    image = %image,
                    "Rejected image reference set through patch"
                );
                return Err(AccountError::Validation(
                    "Image can only be replaced by upload or reset to the default".to_string(),
                ));
            }
            None => None,
        };

        let previous_image = user.image.clone();
        let changes = UserChanges {
            user_name: patch.user_name,
            email: patch.email,
            image,
            password_hash,
            user_role,
        };

        self.save_changes(&mut user, changes).await?;
        if user.image != previous_image {
            self.release_image(&previous_image).await;
        }
        Ok(user)
    }

    /// Store a new profile image and drop the previous one unless it is the
    /// shared default
    pub async fn upload_image(
        &self,
        caller: &Identity,
        user_id: &UserId,
        original_name: &str,
        bytes: &[u8],
    ) -> AccountResult<User> {
        self.policy.ensure_can_access(caller, user_id)?;
        let mut user = self.load(user_id).await?;

        if bytes.is_empty() {
            return Err(AccountError::Validation("Image file is empty".to_string()));
        }

        let new_image = self.images.save(original_name, bytes).await?;
        let previous = std::mem::replace(&mut user.image, new_image.clone());
        user.updated_at = Utc::now();
        if let Err(e) = self.user_repo.update(&user).await {
            if let Err(cleanup) = self.images.delete(&new_image).await {
                tracing::warn!(
                    image = %new_image,
                    error = %cleanup,
                    "Failed to remove orphaned image"
                );
            }
            return Err(e);
        }

        self.release_image(&previous).await;

        tracing::info!(user_id = %user.user_id, image = %user.image, "Profile image replaced");
        Ok(user)
    }

    pub async fn delete(&self, caller: &Identity, user_id: &UserId) -> AccountResult<()> {
        self.policy.ensure_can_access(caller, user_id)?;
        let user = self.load(user_id).await?;

        if !self.user_repo.delete(user_id).await? {
            return Err(AccountError::UserNotFound);
        }

        self.release_image(&user.image).await;

        tracing::info!(user_id = %user_id, deleted_by = %caller.subject, "User deleted");
        Ok(())
    }

    async fn load(&self, user_id: &UserId) -> AccountResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    async fn ensure_email_available(&self, user: &User, email: &Email) -> AccountResult<()> {
        if user.email != *email && self.user_repo.exists_by_email(email).await? {
            return Err(AccountError::EmailTaken);
        }
        Ok(())
    }

    async fn save_changes(&self, user: &mut User, changes: UserChanges) -> AccountResult<()> {
        if user.apply(changes, Utc::now()) {
            self.user_repo.update(user).await?;
            tracing::info!(user_id = %user.user_id, "User updated");
        } else {
            tracing::debug!(user_id = %user.user_id, "Update left user unchanged");
        }
        Ok(())
    }

    fn hash(&self, raw: &RawPassword) -> AccountResult<UserPassword> {
        Ok(UserPassword::from_raw(
            raw,
            &self.config.hash_params,
            self.config.pepper(),
        )?)
    }

    /// Remove an image file nobody points at any more. Failures are logged;
    /// the record change that released it has already been committed.
    async fn release_image(&self, image: &ImagePath) {
        if self.is_default_image(image) {
            return;
        }

        match self.user_repo.exists_by_image(image).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::debug!(image = %image, "Image still referenced, keeping file");
                return;
            }
            Err(e) => {
                tracing::warn!(image = %image, error = %e, "Could not check image references");
                return;
            }
        }

        if let Err(e) = self.images.delete(image).await {
            tracing::warn!(image = %image, error = %e, "Failed to remove profile image");
        }
    }

    fn default_image(&self) -> ImagePath {
        ImagePath::new(self.config.default_image.clone())
    }

    fn is_default_image(&self, image: &ImagePath) -> bool {
        image.is_default() || image.same_file(&self.default_image())
    }
}
