use crate::adapters::http::AppState;
use crate::adapters::http::auth::Caller;
use crate::adapters::http::error::ApiResult;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct DepartmentBody {
    pub name: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(body): Json<DepartmentBody>,
) -> ApiResult<impl IntoResponse> {
    let department = state.departments.create(&caller, body.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Department created successfully",
            "department": department,
        })),
    ))
}

/// Serves both `GET /department` and `GET /departments-with-employees`.
pub async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<impl IntoResponse> {
    let departments = state.departments.list_with_employees().await?;
    Ok(Json(json!({ "success": true, "departments": departments })))
}

pub async fn update(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    Json(body): Json<DepartmentBody>,
) -> ApiResult<impl IntoResponse> {
    let department = state.departments.update(&caller, &id, body.name).await?;
    Ok(Json(json!({ "success": true, "department": department })))
}

pub async fn delete(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.departments.delete(&caller, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Department deleted successfully",
    })))
}
