//! Registration, login and password changes. Issues and verifies bearer tokens.
//!
//! bcrypt is CPU-bound, so hashing and verification run on the blocking pool.

use super::{normalize_email, present, require_admin};
use crate::domain::{DomainError, Principal, Role, User, parse_enum};
use crate::ports::{PasswordPort, TokenPort, UserRepo};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// A fresh token plus the user it was issued for.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserRepo>,
    passwords: Arc<dyn PasswordPort>,
    tokens: Arc<dyn TokenPort>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        passwords: Arc<dyn PasswordPort>,
        tokens: Arc<dyn TokenPort>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    /// Verify a bearer token.
    pub fn authenticate(&self, token: &str) -> Result<Principal, DomainError> {
        self.tokens.verify(token)
    }

    /// Create a user. The very first account becomes admin; afterwards the
    /// admin role is only granted when an admin is the one registering.
    pub async fn register(
        &self,
        input: RegisterInput,
        caller: Option<&Principal>,
    ) -> Result<User, DomainError> {
        let (Some(name), Some(email), Some(password)) = (
            present(&input.name),
            present(&input.email),
            input.password.clone().filter(|p| !p.is_empty()),
        ) else {
            return Err(DomainError::validation("All fields are required."));
        };
        let email = normalize_email(&email);

        let requested = match present(&input.role) {
            Some(r) => parse_enum::<Role>(&r.to_lowercase())
                .ok_or_else(|| DomainError::validation("Invalid role"))?,
            None => Role::User,
        };

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(DomainError::conflict("This email is already registered."));
        }

        let role = if self.users.count_users().await? == 0 {
            Role::Admin
        } else if requested == Role::Admin && caller.is_some_and(Principal::is_admin) {
            Role::Admin
        } else {
            Role::User
        };

        let password_hash = self.hash(password).await?;
        let now = Utc::now();
        let user = User {
            id: super::new_id(),
            name,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        };
        self.users.insert_user(&user).await?;
        info!(user_id = %user.id, role = role.as_str(), "user registered");
        Ok(user)
    }

    pub async fn check_email(&self, email: Option<String>) -> Result<bool, DomainError> {
        let email = present(&email).ok_or_else(|| DomainError::validation("Email is required"))?;
        Ok(self
            .users
            .find_user_by_email(&normalize_email(&email))
            .await?
            .is_some())
    }

    pub async fn list_users(&self, caller: &Principal) -> Result<Vec<User>, DomainError> {
        require_admin(caller)?;
        self.users.list_users().await
    }

    pub async fn login(
        &self,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<LoginOutcome, DomainError> {
        let (Some(email), Some(password)) = (present(&email), password.filter(|p| !p.is_empty()))
        else {
            return Err(DomainError::validation("Email and password are required"));
        };
        let invalid = || DomainError::Unauthorized("Invalid credentials".into());

        let user = self
            .users
            .find_user_by_email(&normalize_email(&email))
            .await?
            .ok_or_else(invalid)?;
        if !self.verify(password, user.password_hash.clone()).await? {
            return Err(invalid());
        }
        let token = self.tokens.issue(&user)?;
        info!(user_id = %user.id, "login succeeded");
        Ok(LoginOutcome { token, user })
    }

    pub async fn change_password(
        &self,
        caller: &Principal,
        current: Option<String>,
        new: Option<String>,
    ) -> Result<LoginOutcome, DomainError> {
        let (Some(current), Some(new)) = (
            current.filter(|p| !p.is_empty()),
            new.filter(|p| !p.is_empty()),
        ) else {
            return Err(DomainError::validation(
                "Both current password and new password are required.",
            ));
        };

        let mut user = self
            .users
            .find_user(&caller.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))?;
        if !self.verify(current.clone(), user.password_hash.clone()).await? {
            return Err(DomainError::validation("Current password is incorrect"));
        }
        if current == new {
            return Err(DomainError::validation(
                "New password cannot be the same as the current password.",
            ));
        }

        user.password_hash = self.hash(new).await?;
        self.users
            .update_password(&user.id, &user.password_hash)
            .await?;
        let token = self.tokens.issue(&user)?;
        info!(user_id = %user.id, "password changed");
        Ok(LoginOutcome { token, user })
    }

    async fn hash(&self, plain: String) -> Result<String, DomainError> {
        let passwords = Arc::clone(&self.passwords);
        tokio::task::spawn_blocking(move || passwords.hash(&plain))
            .await
            .map_err(|e| DomainError::Auth(format!("hash task failed: {e}")))?
    }

    async fn verify(&self, plain: String, hash: String) -> Result<bool, DomainError> {
        let passwords = Arc::clone(&self.passwords);
        tokio::task::spawn_blocking(move || passwords.verify(&plain, &hash))
            .await
            .map_err(|e| DomainError::Auth(format!("verify task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::security::{BcryptHasher, JwtTokens};
    use crate::usecases::test_support::{Fixture, fixture};
    use secrecy::SecretString;
    use std::time::Duration;

    fn service(fx: &Fixture) -> AuthService {
        AuthService::new(
            fx.repo.clone(),
            Arc::new(BcryptHasher::new(4)),
            Arc::new(JwtTokens::new(
                SecretString::from("test-secret"),
                Duration::from_secs(3600),
            )),
        )
    }

    fn input(name: &str, email: &str, password: &str, role: Option<&str>) -> RegisterInput {
        RegisterInput {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
            role: role.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_first_user_is_admin_then_role_needs_admin_caller() {
        let fx = fixture().await;
        let auth = service(&fx);

        let first = auth
            .register(input("Root", "root@example.com", "pw", None), None)
            .await
            .unwrap();
        assert_eq!(first.role, Role::Admin);

        let sneaky = auth
            .register(input("Eve", "eve@example.com", "pw", Some("admin")), None)
            .await
            .unwrap();
        assert_eq!(sneaky.role, Role::User);

        let root = Principal::from(&first);
        let granted = auth
            .register(input("Bob", "bob@example.com", "pw", Some("admin")), Some(&root))
            .await
            .unwrap();
        assert_eq!(granted.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_register_validation_and_duplicates() {
        let fx = fixture().await;
        let auth = service(&fx);
        let err = auth
            .register(input("", "a@example.com", "pw", None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        auth.register(input("Ann", "Ann@Example.com ", "pw", None), None)
            .await
            .unwrap();
        let err = auth
            .register(input("Ann", "ann@example.com", "pw", None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(auth.check_email(Some("ANN@example.com".into())).await.unwrap());
        assert!(!auth.check_email(Some("zed@example.com".into())).await.unwrap());
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let fx = fixture().await;
        let auth = service(&fx);
        auth.register(input("Ann", "ann@example.com", "pw", None), None)
            .await
            .unwrap();

        let outcome = auth
            .login(Some("ann@example.com".into()), Some("pw".into()))
            .await
            .unwrap();
        let principal = auth.authenticate(&outcome.token).unwrap();
        assert_eq!(principal.email, "ann@example.com");

        let err = auth
            .login(Some("ann@example.com".into()), Some("nope".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(ref m) if m == "Invalid credentials"));
        let err = auth
            .login(Some("ghost@example.com".into()), Some("pw".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_change_password_rules() {
        let fx = fixture().await;
        let auth = service(&fx);
        let user = auth
            .register(input("Ann", "ann@example.com", "old", None), None)
            .await
            .unwrap();
        let me = Principal::from(&user);

        let err = auth
            .change_password(&me, Some("wrong".into()), Some("new".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = auth
            .change_password(&me, Some("old".into()), Some("old".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        auth.change_password(&me, Some("old".into()), Some("new".into()))
            .await
            .unwrap();
        assert!(auth
            .login(Some("ann@example.com".into()), Some("new".into()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_list_users_requires_admin() {
        let fx = fixture().await;
        let auth = service(&fx);
        let root = auth
            .register(input("Root", "root@example.com", "pw", None), None)
            .await
            .unwrap();
        let ann = auth
            .register(input("Ann", "ann@example.com", "pw", None), None)
            .await
            .unwrap();

        assert_eq!(auth.list_users(&Principal::from(&root)).await.unwrap().len(), 2);
        let err = auth.list_users(&Principal::from(&ann)).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
