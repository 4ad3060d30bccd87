//! User Entity
//!
//! The durable user record. Holds the credential hash, which never leaves the
//! crate through a response DTO.

use chrono::{DateTime, Utc};

use crate::domain::entity::identity::Identity;
use crate::domain::value_object::{
    email::Email, image_path::ImagePath, user_id::UserId, user_name::UserName,
    user_password::UserPassword, user_role::UserRole,
};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub user_name: UserName,
    /// Login identifier, unique across users
    pub email: Email,
    pub image: ImagePath,
    pub password_hash: UserPassword,
    pub user_role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field-level changes to a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub user_name: Option<UserName>,
    pub email: Option<Email>,
    pub image: Option<ImagePath>,
    pub password_hash: Option<UserPassword>,
    pub user_role: Option<UserRole>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none()
            && self.email.is_none()
            && self.image.is_none()
            && self.password_hash.is_none()
            && self.user_role.is_none()
    }
}

impl User {
    pub fn new(
        user_name: UserName,
        email: Email,
        password_hash: UserPassword,
        user_role: UserRole,
        image: ImagePath,
    ) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            user_name,
            email,
            image,
            password_hash,
            user_role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id, self.email.clone(), self.user_role)
    }

    /// Apply changes, bumping `updated_at` only if some field actually differs.
    /// Returns whether the record changed.
    pub fn apply(&mut self, changes: UserChanges, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if let Some(user_name) = changes.user_name {
            changed |= replace_if_different(&mut self.user_name, user_name);
        }
        if let Some(email) = changes.email {
            changed |= replace_if_different(&mut self.email, email);
        }
        if let Some(image) = changes.image {
            changed |= replace_if_different(&mut self.image, image);
        }
        if let Some(password_hash) = changes.password_hash {
            changed |= replace_if_different(&mut self.password_hash, password_hash);
        }
        if let Some(user_role) = changes.user_role {
            changed |= replace_if_different(&mut self.user_role, user_role);
        }

        if changed {
            self.updated_at = now;
        }
        changed
    }
}

fn replace_if_different<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
