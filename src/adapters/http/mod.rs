//! HTTP inbound adapter: axum router, bearer auth, error mapping.
//!
//! Handlers only decode requests and shape JSON; rules live in the use cases.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;

use crate::usecases::{
    AuthService, DashboardService, DepartmentService, EmployeeService, ImportService,
    ProjectService, TaskService, TicketService,
};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use handlers::{dashboard, departments, employees, projects, tasks, tickets, users};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub departments: Arc<DepartmentService>,
    pub employees: Arc<EmployeeService>,
    pub projects: Arc<ProjectService>,
    pub tasks: Arc<TaskService>,
    pub tickets: Arc<TicketService>,
    pub imports: Arc<ImportService>,
    pub dashboard: Arc<DashboardService>,
    /// Empty allows any origin.
    pub cors_allowed_origins: Arc<Vec<String>>,
    pub max_body_bytes: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(dashboard::health))
        // users
        .route("/register", post(users::register).get(users::list_users))
        .route("/register/check-email", post(users::check_email))
        .route("/login", post(users::login))
        .route("/user/change-password", post(users::change_password))
        .route("/registration/password-change", post(users::change_password))
        // departments
        .route(
            "/department",
            post(departments::create).get(departments::list),
        )
        .route("/departments-with-employees", get(departments::list))
        .route(
            "/department/:id",
            put(departments::update).delete(departments::delete),
        )
        // employees
        .route("/employee", post(employees::create).get(employees::list))
        .route("/employee/update", put(employees::update_by_body))
        .route("/employee/count", get(employees::count))
        .route("/employee/bar", get(dashboard::employee_bar))
        .route(
            "/employee/:id",
            put(employees::update).delete(employees::delete),
        )
        // projects
        .route("/projects", post(projects::create).get(projects::list))
        .route(
            "/projects/:id",
            put(projects::update)
                .post(projects::update)
                .delete(projects::delete),
        )
        .route("/projects/:id/tasks", get(projects::tasks))
        // tasks
        .route("/task", get(tasks::list).post(tasks::create))
        .route("/task/count", get(tasks::count))
        .route("/task/pie", get(dashboard::task_pie))
        .route("/task/bar", get(dashboard::task_bar))
        .route("/task/:id", put(tasks::update).delete(tasks::delete))
        .route("/tasks/by-ticket/:ticket_id", get(tasks::by_ticket))
        .route("/tasks/bulk", post(tasks::bulk_upload))
        // tickets
        .route("/tickets", post(tickets::create).get(tickets::list))
        .route(
            "/tickets/:id",
            get(tickets::get)
                .put(tickets::update)
                .delete(tickets::delete),
        )
        .layer(from_fn_with_state(state.clone(), middleware::cors_middleware))
        .layer(from_fn(middleware::trace_middleware))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "http listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
