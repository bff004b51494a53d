//! Application use cases. Orchestrate domain logic via ports.

pub mod auth_service;
pub mod dashboard_service;
pub mod department_service;
pub mod employee_service;
pub mod import_service;
pub mod project_service;
pub mod task_service;
pub mod ticket_service;

pub use auth_service::{AuthService, LoginOutcome, RegisterInput};
pub use dashboard_service::DashboardService;
pub use department_service::DepartmentService;
pub use employee_service::{EmployeeInput, EmployeeService};
pub use import_service::{ImportReport, ImportService, InvalidRow};
pub use project_service::{ProjectInput, ProjectService};
pub use task_service::{NewTaskInput, TaskListQuery, TaskPage, TaskPatch, TaskService};
pub use ticket_service::{TicketInput, TicketService};

use crate::domain::{DomainError, Principal};

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn require_admin(principal: &Principal) -> Result<(), DomainError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden("Admin access required".into()))
    }
}

/// Trimmed value of an optional input field; blank counts as missing.
pub(crate) fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
