//! Platform Crate - Technical Infrastructure
//!
//! Technical building blocks with no account-domain knowledge:
//! - Cryptographic primitives (random bytes, SHA-256, HMAC-SHA256, Base64url)
//! - Password hashing (Argon2id, NIST SP 800-63B policy)

pub mod crypto;
pub mod password;
