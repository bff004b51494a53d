//! Aggregates behind the dashboard charts.

use crate::domain::{DepartmentHeadcount, DomainError, ProjectTaskCount, StatusCount};
use crate::ports::{EmployeeRepo, TaskRepo};
use std::sync::Arc;

pub struct DashboardService {
    tasks: Arc<dyn TaskRepo>,
    employees: Arc<dyn EmployeeRepo>,
}

impl DashboardService {
    pub fn new(tasks: Arc<dyn TaskRepo>, employees: Arc<dyn EmployeeRepo>) -> Self {
        Self { tasks, employees }
    }

    /// Task count per status.
    pub async fn status_breakdown(&self) -> Result<Vec<StatusCount>, DomainError> {
        self.tasks.status_counts().await
    }

    /// Task count per project name. Projects without tasks are omitted.
    pub async fn tasks_per_project(&self) -> Result<Vec<ProjectTaskCount>, DomainError> {
        self.tasks.project_task_counts().await
    }

    pub async fn headcount(&self) -> Result<Vec<DepartmentHeadcount>, DomainError> {
        self.employees.headcount_by_department().await
    }
}
