//! Identity
//!
//! Who a request acts as. Resolved from the user store at login, embedded in
//! tokens, and bound to refresh tokens. The user id pins the identity to one
//! record even if its email is later reused by another account.

use crate::domain::value_object::{email::Email, user_id::UserId, user_role::UserRole};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub subject: Email,
    pub role: UserRole,
}

impl Identity {
    pub fn new(user_id: UserId, subject: Email, role: UserRole) -> Self {
        Self {
            user_id,
            subject,
            role,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
