//! Task endpoints, including the multipart spreadsheet upload.

use crate::adapters::http::AppState;
use crate::adapters::http::auth::Caller;
use crate::adapters::http::error::ApiResult;
use crate::adapters::import::read_grid;
use crate::domain::{DomainError, Task};
use crate::usecases::{NewTaskInput, TaskListQuery, TaskPatch};
use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Serialize)]
struct CreatedTask {
    #[serde(flatten)]
    task: Task,
    contact_person_name: String,
}

pub async fn list(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = state.tasks.list(&caller, &query).await?;
    Ok(Json(json!({
        "success": true,
        "tasks": page.tasks,
        "totalTasks": page.total_tasks,
        "totalPages": page.total_pages,
        "currentPage": page.current_page,
    })))
}

pub async fn count(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<impl IntoResponse> {
    let count = state.tasks.count(&caller, &query).await?;
    Ok(Json(json!({ "success": true, "count": count })))
}

pub async fn create(
    State(state): State<AppState>,
    _caller: Caller,
    Json(body): Json<NewTaskInput>,
) -> ApiResult<impl IntoResponse> {
    let (task, contact_person_name) = state.tasks.create(body).await?;
    let created = CreatedTask {
        task,
        contact_person_name,
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "task": created })),
    ))
}

/// `:id` is either the task id or its `task_key`.
pub async fn update(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<impl IntoResponse> {
    let task = state.tasks.update(&id, patch).await?;
    Ok(Json(json!({ "success": true, "task": task })))
}

pub async fn delete(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.tasks.delete(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Task deleted successfully",
    })))
}

pub async fn by_ticket(
    State(state): State<AppState>,
    _caller: Caller,
    Path(ticket_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let tasks = state.tasks.by_ticket(&ticket_id).await?;
    Ok(Json(json!({ "success": true, "tasks": tasks })))
}

fn invalid_file() -> DomainError {
    DomainError::validation("Invalid file uploaded")
}

/// Runs the spreadsheet reader on the blocking pool. A panicking reader is an
/// internal error, not a bad upload.
async fn read_off_thread<F>(read: F) -> Result<Vec<Vec<String>>, DomainError>
where
    F: FnOnce() -> Result<Vec<Vec<String>>, DomainError> + Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .map_err(|e| DomainError::Internal(format!("spreadsheet reader failed: {e}")))?
}

/// `POST /tasks/bulk`, multipart field `file`.
pub async fn bulk_upload(
    State(state): State<AppState>,
    _caller: Caller,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|_| invalid_file())? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|_| invalid_file())?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }
    let (file_name, bytes) = upload.ok_or_else(invalid_file)?;
    info!(file = ?file_name, bytes = bytes.len(), "bulk upload received");

    let grid = read_off_thread(move || read_grid(file_name.as_deref(), bytes)).await?;
    let report = state.imports.import(&grid).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": report.message,
            "inserted": report.inserted,
            "updated": report.updated,
            "skipped": report.skipped,
            "invalidRows": report.invalid_rows,
            "createdEmployees": report.created_employees,
            "createdProjects": report.created_projects,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::error::status_of;

    #[tokio::test]
    async fn test_reader_panic_is_internal_error() {
        let err = read_off_thread(|| panic!("reader crashed")).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(status_of(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_reader_errors_pass_through() {
        let err = read_off_thread(|| Err(DomainError::Import("unreadable workbook".into())))
            .await
            .unwrap_err();
        assert_eq!(status_of(&err), StatusCode::BAD_REQUEST);
        let grid = read_off_thread(|| Ok(vec![vec!["NAME".to_string()]])).await.unwrap();
        assert_eq!(grid.len(), 1);
    }
}
