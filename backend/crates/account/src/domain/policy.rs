//! Access Policy
//!
//! Ownership and role checks for user records. A caller may act on a record
//! when it is their own or when they are an admin. Role changes go through
//! [`AccessPolicy::resolve_role`], which reads the caller's role from the
//! store rather than trusting the token.

use std::sync::Arc;

use crate::domain::entity::identity::Identity;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId, user_role::UserRole};
use crate::error::{AccountError, AccountResult};

pub struct AccessPolicy<R>
where
    R: UserRepository,
{
    user_repo: Arc<R>,
}

impl<R> Clone for AccessPolicy<R>
where
    R: UserRepository,
{
    fn clone(&self) -> Self {
        Self {
            user_repo: self.user_repo.clone(),
        }
    }
}

impl<R> AccessPolicy<R>
where
    R: UserRepository + Send + Sync,
{
    pub fn new(user_repo: Arc<R>) -> Self {
        Self { user_repo }
    }

    /// Own record or admin. Ownership is decided by user id, so a token keeps
    /// pointing at its record even after the email moves to another account.
    pub fn can_access(&self, caller: &Identity, target_id: &UserId) -> bool {
        caller.is_admin() || caller.user_id == *target_id
    }

    pub async fn can_access_email(&self, caller: &Identity, email: &Email) -> AccountResult<bool> {
        if caller.is_admin() {
            return Ok(true);
        }
        if caller.subject != *email {
            return Ok(false);
        }

        let owner = self.user_repo.find_by_email(email).await?;
        Ok(owner.is_some_and(|user| user.user_id == caller.user_id))
    }

    pub fn ensure_can_access(&self, caller: &Identity, target_id: &UserId) -> AccountResult<()> {
        if self.can_access(caller, target_id) {
            return Ok(());
        }
        tracing::warn!(
            caller = %caller.subject,
            target = %target_id,
            "Access to user record denied"
        );
        Err(AccountError::AuthorizationDenied)
    }

    pub async fn ensure_can_access_email(
        &self,
        caller: &Identity,
        email: &Email,
    ) -> AccountResult<()> {
        if self.can_access_email(caller, email).await? {
            return Ok(());
        }
        tracing::warn!(caller = %caller.subject, target = %email, "Access to user record denied");
        Err(AccountError::AuthorizationDenied)
    }

    /// Elevation guard. `requested` wins only if the caller's stored role is
    /// admin; anything else keeps `existing`.
    pub async fn resolve_role(
        &self,
        caller: Option<&Identity>,
        requested: Option<UserRole>,
        existing: UserRole,
    ) -> AccountResult<UserRole> {
        let (Some(caller), Some(requested)) = (caller, requested) else {
            return Ok(existing);
        };

        if requested == existing {
            return Ok(existing);
        }

        let caller_is_admin = self
            .user_repo
            .find_by_id(&caller.user_id)
            .await?
            .is_some_and(|user| user.user_role.is_admin());

        if caller_is_admin {
            Ok(requested)
        } else {
            tracing::warn!(
                caller = %caller.subject,
                requested = %requested,
                "Ignoring role change requested by non-admin"
            );
            Ok(existing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        image_path::ImagePath,
        user_name::UserName,
        user_password::{RawPassword, UserPassword},
    };
    use crate::infra::memory::InMemoryAccountRepository;
    use platform::password::HashParams;

    async fn seed(repo: &InMemoryAccountRepository, email: &str, role: UserRole) -> User {
        let hash = UserPassword::from_raw(
            &RawPassword::presented("pw"),
            &HashParams::insecure_fast(),
            None,
        )
        .unwrap();
        let user = User::new(
            UserName::new("someone").unwrap(),
            Email::new(email).unwrap(),
            hash,
            role,
            ImagePath::default(),
        );
        repo.create(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_can_access_truth_table() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let alice = seed(&repo, "alice@example.com", UserRole::User).await;
        let bob = seed(&repo, "bob@example.com", UserRole::User).await;
        let admin = seed(&repo, "admin@example.com", UserRole::Admin).await;
        let policy = AccessPolicy::new(repo);

        // own record, non-admin
        assert!(policy.can_access(&alice.identity(), &alice.user_id));
        // other record, non-admin
        assert!(!policy.can_access(&alice.identity(), &bob.user_id));
        // other record, admin
        assert!(policy.can_access(&admin.identity(), &bob.user_id));
        // own record, admin
        assert!(policy.can_access(&admin.identity(), &admin.user_id));

        assert!(matches!(
            policy.ensure_can_access(&alice.identity(), &bob.user_id),
            Err(AccountError::AuthorizationDenied)
        ));
    }

    #[tokio::test]
    async fn test_can_access_email() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let alice = seed(&repo, "alice@example.com", UserRole::User).await;
        let admin = seed(&repo, "admin@example.com", UserRole::Admin).await;
        let policy = AccessPolicy::new(repo);

        assert!(policy.can_access_email(&alice.identity(), &alice.email).await.unwrap());
        assert!(!policy.can_access_email(&alice.identity(), &admin.email).await.unwrap());
        assert!(policy.can_access_email(&admin.identity(), &alice.email).await.unwrap());
        assert!(
            policy
                .ensure_can_access_email(&alice.identity(), &admin.email)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_reused_email_does_not_transfer_access() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let mut alice = seed(&repo, "alice@example.com", UserRole::User).await;
        let stale = alice.identity();

        alice.email = Email::new("alice.new@example.com").unwrap();
        repo.update(&alice).await.unwrap();
        let newcomer = seed(&repo, "alice@example.com", UserRole::User).await;
        let policy = AccessPolicy::new(repo);

        assert!(!policy.can_access(&stale, &newcomer.user_id));
        assert!(!policy.can_access_email(&stale, &newcomer.email).await.unwrap());
        assert!(policy.can_access(&stale, &alice.user_id));
    }

    #[tokio::test]
    async fn test_resolve_role_elevation_guard() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let alice = seed(&repo, "alice@example.com", UserRole::User).await;
        let admin = seed(&repo, "admin@example.com", UserRole::Admin).await;
        let policy = AccessPolicy::new(repo);

        // non-admin self-elevation is ignored
        let role = policy
            .resolve_role(Some(&alice.identity()), Some(UserRole::Admin), UserRole::User)
            .await
            .unwrap();
        assert_eq!(role, UserRole::User);

        // admin may promote
        let role = policy
            .resolve_role(Some(&admin.identity()), Some(UserRole::Admin), UserRole::User)
            .await
            .unwrap();
        assert_eq!(role, UserRole::Admin);

        // absent request keeps existing
        let role = policy
            .resolve_role(Some(&admin.identity()), None, UserRole::User)
            .await
            .unwrap();
        assert_eq!(role, UserRole::User);

        // anonymous caller keeps existing
        let role = policy
            .resolve_role(None, Some(UserRole::Admin), UserRole::User)
            .await
            .unwrap();
        assert_eq!(role, UserRole::User);
    }

    #[tokio::test]
    async fn test_resolve_role_uses_stored_role_not_token_role() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let alice = seed(&repo, "alice@example.com", UserRole::User).await;
        let policy = AccessPolicy::new(repo);

        // a forged or stale identity claiming admin is not enough
        let claimed = Identity::new(alice.user_id, alice.email.clone(), UserRole::Admin);
        let role = policy
            .resolve_role(Some(&claimed), Some(UserRole::Admin), UserRole::User)
            .await
            .unwrap();
        assert_eq!(role, UserRole::User);
    }
}
