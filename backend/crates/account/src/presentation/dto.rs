//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{NewUser, UserPatch, UserReplacement};
use crate::domain::entity::user::User;
use crate::domain::value_object::{
    email::Email, image_path::ImagePath, user_name::UserName, user_password::RawPassword,
    user_role::UserRole,
};
use crate::error::AccountError;

// ============================================================================
// Authentication
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[serde(alias = "identifier")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    /// New access token
    pub token: String,
}

// ============================================================================
// Users
// ============================================================================

/// Body of `POST /v1/users` and `PUT /v1/users/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Body of `PATCH /v1/users/{id}`. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatchRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

/// Never carries the password hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub image: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            username: user.user_name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            image: user.image.as_str().to_string(),
            role: user.user_role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

impl TryFrom<UserRequest> for NewUser {
    type Error = AccountError;

    fn try_from(req: UserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            user_name: UserName::new(&req.username)?,
            email: Email::new(&req.email)?,
            password: RawPassword::new(req.password)?,
            user_role: req.role,
        })
    }
}

impl TryFrom<UserRequest> for UserReplacement {
    type Error = AccountError;

    fn try_from(req: UserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            user_name: UserName::new(&req.username)?,
            email: Email::new(&req.email)?,
            password: RawPassword::new(req.password)?,
            user_role: req.role,
        })
    }
}

impl TryFrom<UserPatchRequest> for UserPatch {
    type Error = AccountError;

    fn try_from(req: UserPatchRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            user_name: req.username.map(UserName::new).transpose()?,
            email: req.email.map(Email::new).transpose()?,
            image: req.image.map(ImagePath::new),
            password: req.password.map(RawPassword::new).transpose()?,
            user_role: req.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_request_absent_fields() {
        let req: UserPatchRequest = serde_json::from_str(r#"{"username":"New Name"}"#).unwrap();
        let patch = UserPatch::try_from(req).unwrap();

        assert_eq!(patch.user_name.unwrap().as_str(), "New Name");
        assert!(patch.email.is_none());
        assert!(patch.image.is_none());
        assert!(patch.password.is_none());
        assert!(patch.user_role.is_none());
    }

    #[test]
    fn test_invalid_fields_are_validation_errors() {
        let req = UserRequest {
            username: "Ivan".into(),
            email: "newEmail".into(),
            password: "ValidPass123!".into(),
            role: None,
        };
        assert!(matches!(
            NewUser::try_from(req),
            Err(AccountError::Validation(_))
        ));
    }

    #[test]
    fn test_sign_in_request_accepts_identifier_alias() {
        let req: SignInRequest =
            serde_json::from_str(r#"{"identifier":"admin@test.com","password":"admin"}"#).unwrap();
        assert_eq!(req.email, "admin@test.com");
    }

    #[test]
    fn test_user_request_role_code() {
        let req: UserRequest = serde_json::from_str(
            r#"{"username":"Test User","email":"test@test.com","password":"ValidPass123!","role":"ADMIN"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Some(UserRole::Admin));
    }
}
