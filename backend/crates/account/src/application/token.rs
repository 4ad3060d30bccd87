//! Token Codec
//!
//! HS256 JWTs for access and refresh tokens. Both kinds carry the same claims
//! and differ only in lifetime.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AccountConfig;
use crate::domain::entity::identity::Identity;
use crate::domain::value_object::{email::Email, user_id::UserId, user_role::UserRole};
use crate::error::{AccountError, AccountResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (email)
    pub sub: String,
    /// User id the token was issued to
    pub uid: String,
    pub role: UserRole,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Unique token id, so two tokens issued in the same second differ
    pub jti: String,
}

impl Claims {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn user_id(&self) -> AccountResult<UserId> {
        UserId::from_str(&self.uid).map_err(|_| AccountError::InvalidToken)
    }

    pub fn identity(&self) -> AccountResult<Identity> {
        let subject = Email::new(&self.sub).map_err(|_| AccountError::InvalidToken)?;
        Ok(Identity::new(self.user_id()?, subject, self.role))
    }
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Signature and expiry
    validation: Validation,
    /// Signature only
    lenient_validation: Validation,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], access_token_ttl: Duration, refresh_token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let mut lenient_validation = validation.clone();
        lenient_validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lenient_validation,
            access_token_ttl,
            refresh_token_ttl,
        }
    }

    pub fn from_config(config: &AccountConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    pub fn issue(&self, identity: &Identity, ttl: Duration) -> AccountResult<String> {
        self.issue_at(identity, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        identity: &Identity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AccountResult<String> {
        let claims = Claims {
            sub: identity.subject.as_str().to_string(),
            uid: identity.user_id.to_string(),
            role: identity.role,
            iat: now.timestamp(),
            exp: expiry(now, ttl)?.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AccountError::Internal(format!("Token encoding failed: {e}")))
    }

    pub fn issue_access(&self, identity: &Identity) -> AccountResult<String> {
        self.issue_access_at(identity, Utc::now())
    }

    pub fn issue_access_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AccountResult<String> {
        self.issue_at(identity, self.access_token_ttl, now)
    }

    pub fn issue_refresh(&self, identity: &Identity) -> AccountResult<String> {
        self.issue_refresh_at(identity, Utc::now())
    }

    pub fn issue_refresh_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> AccountResult<String> {
        self.issue_at(identity, self.refresh_token_ttl, now)
    }

    /// Expiry of a refresh token issued at `now`
    pub fn refresh_expires_at(&self, now: DateTime<Utc>) -> AccountResult<DateTime<Utc>> {
        expiry(now, self.refresh_token_ttl)
    }

    /// Verify signature and expiry
    pub fn parse(&self, token: &str) -> AccountResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AccountError::ExpiredToken,
                _ => AccountError::InvalidToken,
            })?;

        // exp equal to the current second counts as expired
        if claims.is_expired_at(Utc::now()) {
            return Err(AccountError::ExpiredToken);
        }
        Ok(claims)
    }

    pub fn parse_at(&self, token: &str, now: DateTime<Utc>) -> AccountResult<Claims> {
        let claims = self.parse_lenient(token)?;
        if claims.is_expired_at(now) {
            return Err(AccountError::ExpiredToken);
        }
        Ok(claims)
    }

    /// Verify the signature only. Expired tokens still yield their claims.
    pub fn parse_lenient(&self, token: &str) -> AccountResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.lenient_validation)
            .map(|data| data.claims)
            .map_err(|_| AccountError::InvalidToken)
    }

    /// Subject of a correctly signed token, expired or not
    pub fn extract_subject(&self, token: &str) -> Option<Email> {
        let claims = self.parse_lenient(token).ok()?;
        Email::new(&claims.sub).ok()
    }

    /// False for tokens that do not verify at all
    pub fn is_expired(&self, token: &str) -> bool {
        self.is_expired_at(token, Utc::now())
    }

    pub fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.parse_lenient(token)
            .is_ok_and(|claims| claims.is_expired_at(now))
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> AccountResult<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AccountError::Internal(format!("Token lifetime {ttl} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::minutes(15), Duration::days(7))
    }

    fn identity(role: UserRole) -> Identity {
        Identity::new(UserId::new(), Email::new("admin@test.com").unwrap(), role)
    }

    #[test]
    fn test_issue_then_parse() {
        let codec = codec();
        let identity = identity(UserRole::Admin);
        let token = codec.issue_access(&identity).unwrap();

        assert_eq!(token.split('.').count(), 3);

        let claims = codec.parse(&token).unwrap();
        assert_eq!(claims.sub, "admin@test.com");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_eq!(claims.identity().unwrap(), identity);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();
        let issued = Utc::now();
        let ttl = Duration::seconds(30);
        let token = codec.issue_at(&identity(UserRole::User), ttl, issued).unwrap();

        assert!(codec.parse_at(&token, issued).is_ok());
        assert!(codec.parse_at(&token, issued + Duration::seconds(29)).is_ok());
        assert!(matches!(
            codec.parse_at(&token, issued + ttl),
            Err(AccountError::ExpiredToken)
        ));
        assert!(codec.is_expired_at(&token, issued + Duration::seconds(31)));
        assert!(!codec.is_expired_at(&token, issued));
    }

    #[test]
    fn test_expired_token_keeps_subject() {
        let codec = codec();
        let past = Utc::now() - Duration::days(30);
        let token = codec
            .issue_at(&identity(UserRole::User), Duration::minutes(1), past)
            .unwrap();

        assert!(matches!(codec.parse(&token), Err(AccountError::ExpiredToken)));
        assert!(codec.is_expired(&token));
        assert_eq!(codec.extract_subject(&token).unwrap().as_str(), "admin@test.com");
        assert_eq!(codec.parse_lenient(&token).unwrap().sub, "admin@test.com");
    }

    #[test]
    fn test_tokens_are_unique() {
        let codec = codec();
        let now = Utc::now();
        let a = codec.issue_at(&identity(UserRole::User), Duration::minutes(1), now).unwrap();
        let b = codec.issue_at(&identity(UserRole::User), Duration::minutes(1), now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let token = codec().issue_access(&identity(UserRole::User)).unwrap();
        let other = TokenCodec::new(
            b"ffffffffffffffffffffffffffffffff",
            Duration::minutes(15),
            Duration::days(7),
        );

        assert!(matches!(other.parse(&token), Err(AccountError::InvalidToken)));
        assert!(other.extract_subject(&token).is_none());
        assert!(!other.is_expired(&token));
    }

    #[test]
    fn test_other_algorithm_is_invalid() {
        let codec = codec();
        let claims = codec
            .parse(&codec.issue_access(&identity(UserRole::User)).unwrap())
            .unwrap();
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(codec.parse(&hs512), Err(AccountError::InvalidToken)));
        assert!(codec.extract_subject(&hs512).is_none());
    }

    #[test]
    fn test_tampered_claims_are_invalid() {
        let codec = codec();
        let token = codec.issue_access(&identity(UserRole::User)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = Claims {
            sub: "admin@test.com".to_string(),
            uid: UserId::new().to_string(),
            role: UserRole::Admin,
            iat: 0,
            exp: i64::MAX,
            jti: "x".to_string(),
        };
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            platform::crypto::to_base64url(&serde_json::to_vec(&forged_claims).unwrap()),
            parts[2]
        );

        assert!(matches!(codec.parse(&forged), Err(AccountError::InvalidToken)));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = codec();
        for token in ["", "abc", "a.b", "a.b.c.d", "...", "not.a.token"] {
            assert!(
                matches!(codec.parse(token), Err(AccountError::InvalidToken)),
                "{token:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let codec = codec();
        let result = codec.issue(&identity(UserRole::User), Duration::seconds(i64::MAX / 1000));
        assert!(matches!(result, Err(AccountError::Internal(_))));

        let long_refresh = TokenCodec::new(
            SECRET,
            Duration::minutes(15),
            Duration::seconds(i64::MAX / 1000),
        );
        assert!(long_refresh.refresh_expires_at(Utc::now()).is_err());
    }
}
