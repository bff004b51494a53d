//! Outbound ports. Application calls into storage.
//!
//! Implemented by adapters. `update_*`/`delete_*` return `false` when the row did not exist.

use crate::domain::{
    Department, DepartmentHeadcount, DomainError, Employee, Project, ProjectTaskCount,
    StatusCount, Task, Ticket, User,
};

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), DomainError>;

    /// Lookup by (already normalized) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, DomainError>;

    async fn list_users(&self) -> Result<Vec<User>, DomainError>;

    async fn count_users(&self) -> Result<u64, DomainError>;

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool, DomainError>;
}

#[async_trait::async_trait]
pub trait DepartmentRepo: Send + Sync {
    async fn insert_department(&self, department: &Department) -> Result<(), DomainError>;

    async fn find_department(&self, id: &str) -> Result<Option<Department>, DomainError>;

    /// Case-insensitive name lookup.
    async fn find_department_by_name(&self, name: &str)
    -> Result<Option<Department>, DomainError>;

    async fn list_departments(&self) -> Result<Vec<Department>, DomainError>;

    /// Also refreshes the denormalized department name on member employees.
    async fn update_department(&self, department: &Department) -> Result<bool, DomainError>;

    async fn delete_department(&self, id: &str) -> Result<bool, DomainError>;
}

#[async_trait::async_trait]
pub trait EmployeeRepo: Send + Sync {
    async fn insert_employee(&self, employee: &Employee) -> Result<(), DomainError>;

    async fn find_employee(&self, id: &str) -> Result<Option<Employee>, DomainError>;

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, DomainError>;

    async fn list_employees(&self) -> Result<Vec<Employee>, DomainError>;

    async fn update_employee(&self, employee: &Employee) -> Result<bool, DomainError>;

    async fn delete_employee(&self, id: &str) -> Result<bool, DomainError>;

    async fn count_employees(&self) -> Result<u64, DomainError>;

    async fn headcount_by_department(&self) -> Result<Vec<DepartmentHeadcount>, DomainError>;
}

#[async_trait::async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn insert_project(&self, project: &Project) -> Result<(), DomainError>;

    async fn find_project(&self, id: &str) -> Result<Option<Project>, DomainError>;

    /// Case-insensitive name lookup.
    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, DomainError>;

    async fn list_projects(&self) -> Result<Vec<Project>, DomainError>;

    /// Writes scalar columns only; team membership goes through `add_team_member`.
    async fn update_project(&self, project: &Project) -> Result<bool, DomainError>;

    /// Deletes the project and its tasks.
    async fn delete_project(&self, id: &str) -> Result<bool, DomainError>;

    /// Idempotent: adding an existing member is a no-op.
    async fn add_team_member(&self, project_id: &str, employee_id: &str)
    -> Result<(), DomainError>;
}

/// Task listing filter. `None` fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<String>,
    /// Restrict to tasks assigned to the employee with this email.
    pub assignee_email: Option<String>,
}

#[async_trait::async_trait]
pub trait TaskRepo: Send + Sync {
    async fn insert_task(&self, task: &Task) -> Result<(), DomainError>;

    /// Lookup by id or by `task_key`.
    async fn find_task(&self, id_or_key: &str) -> Result<Option<Task>, DomainError>;

    /// Ordered by `order_index`, then creation time.
    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Task>, DomainError>;

    async fn count_tasks(&self, filter: &TaskFilter) -> Result<u64, DomainError>;

    async fn list_tasks_by_ticket(&self, ticket_id: &str) -> Result<Vec<Task>, DomainError>;

    /// Exact match on the importer's reconciliation key.
    async fn find_task_by_natural_key(
        &self,
        name: &str,
        project_id: &str,
        description: &str,
        procedure: &str,
    ) -> Result<Option<Task>, DomainError>;

    /// Full-row write keyed by `task.id`.
    async fn update_task(&self, task: &Task) -> Result<bool, DomainError>;

    async fn delete_task(&self, id: &str) -> Result<bool, DomainError>;

    async fn status_counts(&self) -> Result<Vec<StatusCount>, DomainError>;

    async fn project_task_counts(&self) -> Result<Vec<ProjectTaskCount>, DomainError>;
}

#[async_trait::async_trait]
pub trait TicketRepo: Send + Sync {
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), DomainError>;

    /// Returned tickets carry their linked task ids.
    async fn find_ticket(&self, id: &str) -> Result<Option<Ticket>, DomainError>;

    async fn list_tickets(&self) -> Result<Vec<Ticket>, DomainError>;

    async fn update_ticket(&self, ticket: &Ticket) -> Result<bool, DomainError>;

    /// Unlinks tasks that referenced the ticket.
    async fn delete_ticket(&self, id: &str) -> Result<bool, DomainError>;
}
