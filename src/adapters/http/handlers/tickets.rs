use crate::adapters::http::AppState;
use crate::adapters::http::auth::Caller;
use crate::adapters::http::error::ApiResult;
use crate::usecases::TicketInput;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

pub async fn create(
    State(state): State<AppState>,
    _caller: Caller,
    Json(body): Json<TicketInput>,
) -> ApiResult<impl IntoResponse> {
    let ticket = state.tickets.create(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "ticket": ticket })),
    ))
}

pub async fn list(State(state): State<AppState>, _caller: Caller) -> ApiResult<impl IntoResponse> {
    let tickets = state.tickets.list().await?;
    Ok(Json(json!({ "success": true, "tickets": tickets })))
}

pub async fn get(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let ticket = state.tickets.get(&id).await?;
    Ok(Json(json!({ "success": true, "ticket": ticket })))
}

pub async fn update(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
    Json(body): Json<TicketInput>,
) -> ApiResult<impl IntoResponse> {
    let ticket = state.tickets.update(&id, body).await?;
    Ok(Json(json!({ "success": true, "ticket": ticket })))
}

pub async fn delete(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.tickets.delete(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Ticket deleted successfully",
    })))
}
