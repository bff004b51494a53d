//! HS256 bearer tokens. Implements `TokenPort`.
//!
//! The signing secret stays in a `SecretString` and is only exposed to build keys.

use crate::domain::{DomainError, Principal, Role, User};
use crate::ports::TokenPort;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    name: String,
    role: Role,
    iat: u64,
    exp: u64,
}

pub struct JwtTokens {
    secret: SecretString,
    ttl: Duration,
}

impl JwtTokens {
    pub fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    fn now() -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

impl TokenPort for JwtTokens {
    fn issue(&self, user: &User) -> Result<String, DomainError> {
        let now = Self::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl.as_secs(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| DomainError::Auth(format!("token signing failed: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Principal, DomainError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let data = jsonwebtoken::decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                DomainError::Forbidden("Invalid token".into())
            })?;
        let claims = data.claims;
        Ok(Principal {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: "u1".into(),
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password_hash: String::new(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    fn tokens(secret: &str) -> JwtTokens {
        JwtTokens::new(SecretString::from(secret), Duration::from_secs(120 * 60))
    }

    #[test]
    fn test_issue_then_verify_roundtrips_principal() {
        let jwt = tokens("top-secret");
        let token = jwt.issue(&user(Role::Admin)).unwrap();
        let principal = jwt.verify(&token).unwrap();
        assert_eq!(principal.user_id, "u1");
        assert_eq!(principal.email, "ann@example.com");
        assert!(principal.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_forbidden() {
        let token = tokens("one").issue(&user(Role::User)).unwrap();
        let err = tokens("two").verify(&token).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(ref m) if m == "Invalid token"));
    }

    #[test]
    fn test_expired_token_is_forbidden() {
        let now = JwtTokens::now();
        let claims = Claims {
            sub: "u1".into(),
            email: "ann@example.com".into(),
            name: "Ann".into(),
            role: Role::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"top-secret"),
        )
        .unwrap();
        assert!(matches!(
            tokens("top-secret").verify(&token),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn test_garbage_is_forbidden() {
        assert!(matches!(
            tokens("k").verify("not.a.jwt"),
            Err(DomainError::Forbidden(_))
        ));
    }
}
