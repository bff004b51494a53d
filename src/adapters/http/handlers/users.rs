//! Registration, login and password changes.

use crate::adapters::http::AppState;
use crate::adapters::http::auth::{Caller, MaybeCaller};
use crate::adapters::http::error::ApiResult;
use crate::domain::Principal;
use crate::usecases::{LoginOutcome, RegisterInput};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeBody {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    Json(body): Json<RegisterInput>,
) -> ApiResult<impl IntoResponse> {
    let user = state.auth.register(body, caller.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully.",
            "user": user,
        })),
    ))
}

pub async fn list_users(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<impl IntoResponse> {
    let users = state.auth.list_users(&caller).await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

pub async fn check_email(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> ApiResult<impl IntoResponse> {
    let exists = state.auth.check_email(body.email).await?;
    Ok(Json(json!({ "exists": exists })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<impl IntoResponse> {
    let LoginOutcome { token, user } = state.auth.login(body.email, body.password).await?;
    Ok(Json(json!({
        "message": "Login successful",
        "email": user.email,
        "name": user.name,
        "role": user.role,
        "authToken": token,
    })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(body): Json<PasswordChangeBody>,
) -> ApiResult<impl IntoResponse> {
    let LoginOutcome { token, user } = state
        .auth
        .change_password(&caller, body.current_password, body.new_password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully",
        "token": token,
        "user": Principal::from(&user),
    })))
}
