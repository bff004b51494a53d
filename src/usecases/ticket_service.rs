//! Ticket CRUD. A ticket's task list is derived from the tasks pointing at it.

use super::present;
use crate::domain::{DomainError, Priority, Ticket, TicketStatus, parse_enum};
use crate::ports::{ProjectRepo, TicketRepo, UserRepo};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Create and patch body. On update, absent fields keep their value and an
/// empty `assigned_to`/`project_key` clears the reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    /// User id.
    pub assigned_to: Option<String>,
    #[serde(alias = "projectId")]
    pub project_key: Option<String>,
}

pub struct TicketService {
    tickets: Arc<dyn TicketRepo>,
    users: Arc<dyn UserRepo>,
    projects: Arc<dyn ProjectRepo>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepo>,
        users: Arc<dyn UserRepo>,
        projects: Arc<dyn ProjectRepo>,
    ) -> Self {
        Self {
            tickets,
            users,
            projects,
        }
    }

    /// Resolves an optional reference: `None` = untouched, `Some(None)` = cleared.
    async fn user_ref(&self, value: &Option<String>) -> Result<Option<Option<String>>, DomainError> {
        match value.as_deref().map(str::trim) {
            None => Ok(None),
            Some("") => Ok(Some(None)),
            Some(id) => match self.users.find_user(id).await? {
                Some(user) => Ok(Some(Some(user.id))),
                None => Err(DomainError::validation("Assigned user not found")),
            },
        }
    }

    async fn project_ref(
        &self,
        value: &Option<String>,
    ) -> Result<Option<Option<String>>, DomainError> {
        match value.as_deref().map(str::trim) {
            None => Ok(None),
            Some("") => Ok(Some(None)),
            Some(id) => match self.projects.find_project(id).await? {
                Some(project) => Ok(Some(Some(project.id))),
                None => Err(DomainError::validation("Selected project not found.")),
            },
        }
    }

    fn priority(value: &Option<String>) -> Result<Option<Priority>, DomainError> {
        present(value)
            .map(|v| {
                parse_enum(&v).ok_or_else(|| DomainError::validation(format!("Invalid priority: '{v}'")))
            })
            .transpose()
    }

    fn status(value: &Option<String>) -> Result<Option<TicketStatus>, DomainError> {
        present(value)
            .map(|v| {
                parse_enum(&v).ok_or_else(|| DomainError::validation(format!("Invalid status: '{v}'")))
            })
            .transpose()
    }

    pub async fn create(&self, input: TicketInput) -> Result<Ticket, DomainError> {
        let title = present(&input.title).ok_or_else(|| DomainError::validation("Title is required"))?;
        let priority = Self::priority(&input.priority)?.unwrap_or_default();
        let status = Self::status(&input.status)?.unwrap_or_default();
        let assigned_to = self.user_ref(&input.assigned_to).await?.flatten();
        let project_id = self.project_ref(&input.project_key).await?.flatten();

        let now = Utc::now();
        let ticket = Ticket {
            id: super::new_id(),
            title,
            description: input.description.as_deref().map(str::trim).unwrap_or_default().to_string(),
            priority,
            status,
            assigned_to,
            project_id,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.tickets.insert_ticket(&ticket).await?;
        info!(ticket_id = %ticket.id, "ticket created");
        Ok(ticket)
    }

    pub async fn list(&self) -> Result<Vec<Ticket>, DomainError> {
        self.tickets.list_tickets().await
    }

    pub async fn get(&self, id: &str) -> Result<Ticket, DomainError> {
        self.tickets
            .find_ticket(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Ticket not found"))
    }

    pub async fn update(&self, id: &str, patch: TicketInput) -> Result<Ticket, DomainError> {
        let mut ticket = self.get(id).await?;
        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(DomainError::validation("Title is required"));
            }
            ticket.title = title.to_string();
        }
        if let Some(description) = &patch.description {
            ticket.description = description.trim().to_string();
        }
        if let Some(priority) = Self::priority(&patch.priority)? {
            ticket.priority = priority;
        }
        if let Some(status) = Self::status(&patch.status)? {
            ticket.status = status;
        }
        if let Some(assigned_to) = self.user_ref(&patch.assigned_to).await? {
            ticket.assigned_to = assigned_to;
        }
        if let Some(project_id) = self.project_ref(&patch.project_key).await? {
            ticket.project_id = project_id;
        }
        ticket.updated_at = Utc::now();

        if !self.tickets.update_ticket(&ticket).await? {
            return Err(DomainError::not_found("Ticket not found"));
        }
        info!(ticket_id = %ticket.id, status = ticket.status.as_str(), "ticket updated");
        Ok(ticket)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        if !self.tickets.delete_ticket(id).await? {
            return Err(DomainError::not_found("Ticket not found"));
        }
        info!(ticket_id = %id, "ticket deleted");
        Ok(())
    }
}
