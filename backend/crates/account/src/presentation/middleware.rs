//! Bearer Authentication
//!
//! [`authenticate`] verifies an `Authorization: Bearer <token>` header when
//! one is present and stores the resulting [`Identity`] in the request
//! extensions. Handlers pick it up through [`CurrentCaller`] (required) or
//! [`OptionalCaller`] (anonymous allowed).

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::{header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;

use crate::application::token::TokenCodec;
use crate::domain::entity::identity::Identity;
use crate::error::{AccountError, AccountResult};

const BEARER_PREFIX: &str = "Bearer ";

/// Requests without an `Authorization` header pass through anonymously; a
/// header that does not verify is rejected.
pub async fn authenticate(
    State(codec): State<Arc<TokenCodec>>,
    mut req: Request,
    next: Next,
) -> AccountResult<Response> {
    let identity = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => {
            let token = value
                .to_str()
                .ok()
                .and_then(|s| s.strip_prefix(BEARER_PREFIX))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or(AccountError::InvalidToken)?;
            Some(codec.parse(token)?.identity()?)
        }
        None => None,
    };

    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// Authenticated caller. Rejects with 401 when no valid bearer token was sent.
#[derive(Debug, Clone)]
pub struct CurrentCaller(pub Identity);

impl<S> FromRequestParts<S> for CurrentCaller
where
    S: Send + Sync,
{
    type Rejection = AccountError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentCaller)
            .ok_or(AccountError::MissingToken)
    }
}

#[derive(Debug, Clone)]
pub struct OptionalCaller(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalCaller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalCaller(parts.extensions.get::<Identity>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{email::Email, user_id::UserId, user_role::UserRole};
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    #[tokio::test]
    async fn test_current_caller_requires_identity() {
        let req = HttpRequest::builder().uri("/v1/users").body(Body::empty()).unwrap();
        let (mut parts, _) = req.into_parts();

        let err = CurrentCaller::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AccountError::MissingToken));

        let OptionalCaller(caller) = OptionalCaller::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(caller.is_none());
    }

    #[tokio::test]
    async fn test_current_caller_reads_extension() {
        let identity = Identity::new(
            UserId::new(),
            Email::new("admin@test.com").unwrap(),
            UserRole::Admin,
        );
        let mut req = HttpRequest::builder().uri("/v1/users").body(Body::empty()).unwrap();
        req.extensions_mut().insert(identity.clone());
        let (mut parts, _) = req.into_parts();

        let CurrentCaller(caller) = CurrentCaller::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(caller, identity);
    }
}
