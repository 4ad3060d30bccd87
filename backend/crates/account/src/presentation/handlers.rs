//! HTTP Handlers

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;

use crate::application::{
    AccountConfig, NewUser, RefreshUseCase, SignInInput, SignInUseCase, TokenCodec, UserPatch,
    UserReplacement, UserUseCase,
};
use crate::domain::repository::{ImageStore, RefreshTokenStore, UserRepository};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AccountError, AccountResult};
use crate::presentation::dto::{
    RefreshRequest, RefreshResponse, SignInRequest, SignInResponse, UserPatchRequest, UserRequest,
    UserResponse,
};
use crate::presentation::middleware::{CurrentCaller, OptionalCaller};

/// Multipart field carrying the uploaded image
const IMAGE_FIELD: &str = "image";

/// Shared state for account handlers. Use cases are built once so the
/// credential verifier's dummy hash is reused.
pub struct AccountAppState<R, F>
where
    R: UserRepository + RefreshTokenStore,
    F: ImageStore,
{
    pub sign_in: Arc<SignInUseCase<R>>,
    pub refresh: Arc<RefreshUseCase<R>>,
    pub users: Arc<UserUseCase<R, F>>,
    pub codec: Arc<TokenCodec>,
}

impl<R, F> Clone for AccountAppState<R, F>
where
    R: UserRepository + RefreshTokenStore,
    F: ImageStore,
{
    fn clone(&self) -> Self {
        Self {
            sign_in: self.sign_in.clone(),
            refresh: self.refresh.clone(),
            users: self.users.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<R, F> AccountAppState<R, F>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, images: Arc<F>, config: Arc<AccountConfig>) -> Self {
        Self {
            sign_in: Arc::new(SignInUseCase::new(repo.clone(), config.clone())),
            refresh: Arc::new(RefreshUseCase::new(repo.clone(), config.clone())),
            codec: Arc::new(TokenCodec::from_config(&config)),
            users: Arc::new(UserUseCase::new(repo, images, config)),
        }
    }
}

fn parse_user_id(raw: &str) -> AccountResult<UserId> {
    UserId::from_str(raw).map_err(|_| AccountError::Validation(format!("Invalid user id: {raw}")))
}

// ============================================================================
// Authentication
// ============================================================================

/// POST /v1/auth
pub async fn sign_in<R, F>(
    State(state): State<AccountAppState<R, F>>,
    Json(req): Json<SignInRequest>,
) -> AccountResult<Json<SignInResponse>>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let output = state
        .sign_in
        .execute(SignInInput {
            identifier: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(SignInResponse {
        access_token: output.access_token,
        refresh_token: output.refresh_token,
    }))
}

/// POST /v1/auth/refresh
pub async fn refresh<R, F>(
    State(state): State<AccountAppState<R, F>>,
    Json(req): Json<RefreshRequest>,
) -> AccountResult<Json<RefreshResponse>>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let output = state.refresh.execute(&req.token).await?;

    Ok(Json(RefreshResponse {
        token: output.access_token,
    }))
}

// ============================================================================
// Users
// ============================================================================

/// POST /v1/users
///
/// Open to anonymous callers. A requested role only sticks for admins.
pub async fn create_user<R, F>(
    State(state): State<AccountAppState<R, F>>,
    OptionalCaller(caller): OptionalCaller,
    Json(req): Json<UserRequest>,
) -> AccountResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let input = NewUser::try_from(req)?;
    let user = state.users.create(caller.as_ref(), input).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /v1/users
pub async fn list_users<R, F>(
    State(state): State<AccountAppState<R, F>>,
    CurrentCaller(caller): CurrentCaller,
) -> AccountResult<Json<Vec<UserResponse>>>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let users = state.users.list(&caller).await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// GET /v1/users/{id}
pub async fn get_user<R, F>(
    State(state): State<AccountAppState<R, F>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> AccountResult<Json<UserResponse>>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let user_id = parse_user_id(&id)?;
    let user = state.users.get_by_id(&caller, &user_id).await?;
    Ok(Json(user.into()))
}

/// GET /v1/users/email/{email}
pub async fn get_user_by_email<R, F>(
    State(state): State<AccountAppState<R, F>>,
    CurrentCaller(caller): CurrentCaller,
    Path(email): Path<String>,
) -> AccountResult<Json<UserResponse>>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let email = Email::new(&email)?;
    let user = state.users.get_by_email(&caller, &email).await?;
    Ok(Json(user.into()))
}

/// PUT /v1/users/{id}
pub async fn replace_user<R, F>(
    State(state): State<AccountAppState<R, F>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    Json(req): Json<UserRequest>,
) -> AccountResult<Json<UserResponse>>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let user_id = parse_user_id(&id)?;
    let input = UserReplacement::try_from(req)?;
    let user = state.users.replace(&caller, &user_id, input).await?;
    Ok(Json(user.into()))
}

/// PATCH /v1/users/{id}
pub async fn patch_user<R, F>(
    State(state): State<AccountAppState<R, F>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    Json(req): Json<UserPatchRequest>,
) -> AccountResult<Json<UserResponse>>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let user_id = parse_user_id(&id)?;
    let patch = UserPatch::try_from(req)?;
    let user = state.users.patch(&caller, &user_id, patch).await?;
    Ok(Json(user.into()))
}

/// PATCH /v1/users/{id}/upload
pub async fn upload_image<R, F>(
    State(state): State<AccountAppState<R, F>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AccountResult<Json<UserResponse>>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let user_id = parse_user_id(&id)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AccountError::Validation(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AccountError::Validation(e.body_text()))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        AccountError::Validation(format!("Missing multipart field '{IMAGE_FIELD}'"))
    })?;

    let user = state
        .users
        .upload_image(&caller, &user_id, &file_name, &bytes)
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /v1/users/{id}
pub async fn delete_user<R, F>(
    State(state): State<AccountAppState<R, F>>,
    CurrentCaller(caller): CurrentCaller,
    Path(id): Path<String>,
) -> AccountResult<StatusCode>
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let user_id = parse_user_id(&id)?;
    state.users.delete(&caller, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        let id = UserId::new();
        assert_eq!(parse_user_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_user_id("42"),
            Err(AccountError::Validation(_))
        ));
    }
}
