use crate::adapters::http::AppState;
use crate::adapters::http::auth::Caller;
use crate::adapters::http::error::ApiResult;
use crate::domain::DomainError;
use crate::usecases::EmployeeInput;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

pub async fn create(
    State(state): State<AppState>,
    _caller: Caller,
    Json(body): Json<EmployeeInput>,
) -> ApiResult<impl IntoResponse> {
    let employee = state.employees.create(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Employee added successfully",
            "employee": employee,
        })),
    ))
}

pub async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<impl IntoResponse> {
    let employees = state.employees.list().await?;
    Ok(Json(json!({ "success": true, "employees": employees })))
}

pub async fn update(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<EmployeeInput>,
) -> ApiResult<impl IntoResponse> {
    let employee = state.employees.update(&id, body).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Employee updated successfully",
        "employee": employee,
    })))
}

/// `PUT /employee/update`: same as `update` with the id in the body.
pub async fn update_by_body(
    State(state): State<AppState>,
    _caller: Caller,
    Json(body): Json<EmployeeInput>,
) -> ApiResult<impl IntoResponse> {
    let id = body
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| DomainError::validation("All fields are required"))?;
    let employee = state.employees.update(id.trim(), body).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Employee updated successfully",
        "employee": employee,
    })))
}

pub async fn delete(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.employees.delete(&caller, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Employee deleted successfully",
    })))
}

pub async fn count(State(state): State<AppState>, _caller: Caller) -> ApiResult<impl IntoResponse> {
    let count = state.employees.count().await?;
    Ok(Json(json!({ "success": true, "count": count })))
}
