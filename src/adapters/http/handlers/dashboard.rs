//! Chart data and health.

use crate::adapters::http::AppState;
use crate::adapters::http::auth::Caller;
use crate::adapters::http::error::ApiResult;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

pub async fn task_pie(State(state): State<AppState>, _caller: Caller) -> ApiResult<impl IntoResponse> {
    let tasks = state.dashboard.status_breakdown().await?;
    Ok(Json(json!({ "tasks": tasks })))
}

pub async fn task_bar(State(state): State<AppState>, _caller: Caller) -> ApiResult<impl IntoResponse> {
    let tasks = state.dashboard.tasks_per_project().await?;
    Ok(Json(json!({ "tasks": tasks })))
}

pub async fn employee_bar(
    State(state): State<AppState>,
    _caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let employee = state.dashboard.headcount().await?;
    Ok(Json(json!({ "employee": employee })))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
