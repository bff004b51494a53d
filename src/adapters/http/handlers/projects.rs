use crate::adapters::http::AppState;
use crate::adapters::http::auth::Caller;
use crate::adapters::http::error::ApiResult;
use crate::usecases::ProjectInput;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

pub async fn create(
    State(state): State<AppState>,
    _caller: Caller,
    Json(body): Json<ProjectInput>,
) -> ApiResult<impl IntoResponse> {
    let project = state.projects.create(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "project": project })),
    ))
}

pub async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<impl IntoResponse> {
    let projects = state.projects.list().await?;
    Ok(Json(json!({ "success": true, "projects": projects })))
}

/// Mounted on both `PUT` and `POST /projects/:id`.
pub async fn update(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<ProjectInput>,
) -> ApiResult<impl IntoResponse> {
    let project = state.projects.update(&id, body).await?;
    Ok(Json(json!({ "success": true, "project": project })))
}

pub async fn delete(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.projects.delete(&caller, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Project and related tasks deleted successfully",
    })))
}

pub async fn tasks(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let tasks = state.projects.tasks(&id).await?;
    Ok(Json(json!({ "tasks": tasks })))
}
