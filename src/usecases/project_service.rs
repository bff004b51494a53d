//! Project CRUD. Deleting a project removes its tasks.

use super::task_service::populate;
use super::{present, require_admin};
use crate::domain::{DomainError, EmployeeSummary, Principal, Project, ProjectView, TaskView};
use crate::ports::{EmployeeRepo, ProjectRepo, TaskFilter, TaskRepo};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Employee id.
    pub contact_person: Option<String>,
}

pub struct ProjectService {
    projects: Arc<dyn ProjectRepo>,
    employees: Arc<dyn EmployeeRepo>,
    tasks: Arc<dyn TaskRepo>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepo>,
        employees: Arc<dyn EmployeeRepo>,
        tasks: Arc<dyn TaskRepo>,
    ) -> Self {
        Self {
            projects,
            employees,
            tasks,
        }
    }

    /// Returns (name, description, contact) after checking the contact exists.
    async fn validate(
        &self,
        input: &ProjectInput,
    ) -> Result<(String, String, EmployeeSummary), DomainError> {
        let (Some(name), Some(description), Some(contact_id)) = (
            present(&input.name),
            present(&input.description),
            present(&input.contact_person),
        ) else {
            return Err(DomainError::validation("All fields are required"));
        };
        let contact = self
            .employees
            .find_employee(&contact_id)
            .await?
            .ok_or_else(|| DomainError::validation("Contact person not found"))?;
        Ok((name, description, EmployeeSummary::from(&contact)))
    }

    pub async fn create(&self, input: ProjectInput) -> Result<ProjectView, DomainError> {
        let (name, description, contact) = self.validate(&input).await?;
        let now = Utc::now();
        let project = Project {
            id: super::new_id(),
            name,
            description,
            contact_person: Some(contact.id.clone()),
            assigned_to: None,
            functional_team: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.projects.insert_project(&project).await?;
        info!(project_id = %project.id, name = %project.name, "project created");
        Ok(ProjectView {
            project,
            contact: Some(contact),
        })
    }

    /// Projects with their contact person populated.
    pub async fn list(&self) -> Result<Vec<ProjectView>, DomainError> {
        let employees: HashMap<String, EmployeeSummary> = self
            .employees
            .list_employees()
            .await?
            .iter()
            .map(|e| (e.id.clone(), EmployeeSummary::from(e)))
            .collect();
        Ok(self
            .projects
            .list_projects()
            .await?
            .into_iter()
            .map(|project| {
                let contact = project
                    .contact_person
                    .as_ref()
                    .and_then(|id| employees.get(id))
                    .cloned();
                ProjectView { project, contact }
            })
            .collect())
    }

    pub async fn update(&self, id: &str, input: ProjectInput) -> Result<ProjectView, DomainError> {
        let (name, description, contact) = self.validate(&input).await?;
        let mut project = self
            .projects
            .find_project(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Project not found"))?;
        project.name = name;
        project.description = description;
        project.contact_person = Some(contact.id.clone());
        project.updated_at = Utc::now();
        if !self.projects.update_project(&project).await? {
            return Err(DomainError::not_found("Project not found"));
        }
        info!(project_id = %project.id, "project updated");
        Ok(ProjectView {
            project,
            contact: Some(contact),
        })
    }

    pub async fn delete(&self, caller: &Principal, id: &str) -> Result<(), DomainError> {
        require_admin(caller)?;
        if !self.projects.delete_project(id).await? {
            return Err(DomainError::not_found("Project not found"));
        }
        info!(project_id = %id, "project and its tasks deleted");
        Ok(())
    }

    /// Tasks of one project with assignee and contact populated.
    pub async fn tasks(&self, id: &str) -> Result<Vec<TaskView>, DomainError> {
        if self.projects.find_project(id).await?.is_none() {
            return Err(DomainError::not_found("Project not found"));
        }
        let filter = TaskFilter {
            project_id: Some(id.to_string()),
            ..Default::default()
        };
        let total = self.tasks.count_tasks(&filter).await?;
        let tasks = self
            .tasks
            .list_tasks(&filter, u32::try_from(total).unwrap_or(u32::MAX).max(1), 0)
            .await?;
        populate(self.employees.as_ref(), tasks).await
    }
}
