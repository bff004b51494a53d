//! Bearer-token extractors.

use super::AppState;
use super::error::ApiError;
use crate::domain::{DomainError, Principal};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Authenticated caller. Missing header is 401; a bad or expired token is 403.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

/// Caller when a valid token is presented, `None` otherwise.
#[derive(Debug, Clone)]
pub struct MaybeCaller(pub Option<Principal>);

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)
            .ok_or_else(|| DomainError::Unauthorized("No token provided".into()))?;
        Ok(Caller(state.auth.authenticate(token)?))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeCaller(
            bearer(parts).and_then(|token| state.auth.authenticate(token).ok()),
        ))
    }
}
