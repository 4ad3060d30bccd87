//! Account Router

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
};

use crate::domain::repository::{ImageStore, RefreshTokenStore, UserRepository};
use crate::presentation::handlers::{self, AccountAppState};
use crate::presentation::middleware::authenticate;

/// Upper bound for a profile image upload
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Authentication and user routes under `/v1`
pub fn account_router<R, F>(state: AccountAppState<R, F>) -> Router
where
    R: UserRepository + RefreshTokenStore + Send + Sync + 'static,
    F: ImageStore + Send + Sync + 'static,
{
    let auth = Router::new()
        .route("/v1/auth", post(handlers::sign_in::<R, F>))
        .route("/v1/auth/refresh", post(handlers::refresh::<R, F>));

    let users = Router::new()
        .route(
            "/v1/users",
            post(handlers::create_user::<R, F>).get(handlers::list_users::<R, F>),
        )
        .route(
            "/v1/users/{id}",
            get(handlers::get_user::<R, F>)
                .put(handlers::replace_user::<R, F>)
                .patch(handlers::patch_user::<R, F>)
                .delete(handlers::delete_user::<R, F>),
        )
        .route(
            "/v1/users/email/{email}",
            get(handlers::get_user_by_email::<R, F>),
        )
        .route(
            "/v1/users/{id}/upload",
            patch(handlers::upload_image::<R, F>).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.codec.clone(),
            authenticate,
        ));

    auth.merge(users).with_state(state)
}
