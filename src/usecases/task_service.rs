//! Task CRUD, paging and notifications.
//!
//! Non-admin callers only see tasks assigned to the employee sharing their email.
//! Mail failures are logged and never fail the request.

use super::present;
use crate::domain::bulk::parse_date;
use crate::domain::{
    DEFAULT_TASK_STATUS, DomainError, Employee, EmployeeSummary, Notification, Principal,
    Priority, RequestType, ResolutionType, Task, TaskCategory, TaskSnapshot, TaskView, parse_enum,
};
use crate::ports::{EmployeeRepo, NotifierPort, ProjectRepo, TaskFilter, TaskRepo, TicketRepo};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Query string of `GET /task` and `GET /task/count`. Numbers are parsed leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    pub project_key: Option<String>,
}

impl TaskListQuery {
    fn project(&self) -> Option<String> {
        present(&self.project_id).or_else(|| present(&self.project_key))
    }
}

#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total_tasks: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTaskInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    pub project_key: Option<String>,
    pub assigned_to: Option<String>,
    pub contact_person: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub request_type: Option<String>,
    pub resolution_type: Option<String>,
    pub category: Option<String>,
    /// Ticket id.
    pub ticket: Option<String>,
    pub procedure: Option<String>,
    pub comments: Option<String>,
    pub sub_module: Option<String>,
    pub qa_status: Option<String>,
    pub uat_status: Option<String>,
}

/// Partial update. Absent fields are left alone; an empty string clears an
/// optional reference or date.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    pub project_key: Option<String>,
    pub assigned_to: Option<String>,
    pub contact_person: Option<String>,
    pub ticket: Option<String>,
    #[serde(rename = "ticketId")]
    pub ticket_ref: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub procedure: Option<String>,
    pub comments: Option<String>,
    pub sub_module: Option<String>,
    pub qa_status: Option<String>,
    pub uat_status: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "orderIndex")]
    pub order_index: Option<i64>,
    pub request_type: Option<String>,
    pub resolution_type: Option<String>,
    pub category: Option<String>,
    pub done: Option<bool>,
    pub completed: Option<bool>,
}

/// Populate assignee and contact person on each task.
pub(crate) async fn populate(
    employees: &dyn EmployeeRepo,
    tasks: Vec<Task>,
) -> Result<Vec<TaskView>, DomainError> {
    let by_id: HashMap<String, EmployeeSummary> = employees
        .list_employees()
        .await?
        .iter()
        .map(|e| (e.id.clone(), EmployeeSummary::from(e)))
        .collect();
    let lookup = |id: &Option<String>| id.as_ref().and_then(|id| by_id.get(id)).cloned();
    Ok(tasks
        .into_iter()
        .map(|task| TaskView {
            assignee: lookup(&task.assigned_to),
            contact: lookup(&task.contact_person),
            task,
        })
        .collect())
}

fn enum_field<T: serde::de::DeserializeOwned>(
    value: &Option<String>,
    field: &str,
) -> Result<Option<T>, DomainError> {
    match present(value) {
        Some(v) => parse_enum(&v)
            .map(Some)
            .ok_or_else(|| DomainError::validation(format!("Invalid {field}: '{v}'"))),
        None => Ok(None),
    }
}

/// `None` = leave as is, `Some(None)` = clear, `Some(Some(d))` = set.
fn date_patch(
    value: &Option<String>,
    field: &str,
) -> Result<Option<Option<DateTime<Utc>>>, DomainError> {
    match value.as_deref().map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(raw) => parse_date(raw)
            .map(|d| Some(Some(d)))
            .ok_or_else(|| DomainError::validation(format!("Invalid {field}"))),
    }
}

pub struct TaskService {
    tasks: Arc<dyn TaskRepo>,
    projects: Arc<dyn ProjectRepo>,
    employees: Arc<dyn EmployeeRepo>,
    tickets: Arc<dyn TicketRepo>,
    notifier: Arc<dyn NotifierPort>,
    default_page_limit: u32,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepo>,
        projects: Arc<dyn ProjectRepo>,
        employees: Arc<dyn EmployeeRepo>,
        tickets: Arc<dyn TicketRepo>,
        notifier: Arc<dyn NotifierPort>,
        default_page_limit: u32,
    ) -> Self {
        Self {
            tasks,
            projects,
            employees,
            tickets,
            notifier,
            default_page_limit: default_page_limit.max(1),
        }
    }

    fn filter_for(caller: &Principal, project: Option<String>) -> TaskFilter {
        TaskFilter {
            project_id: project,
            assignee_email: (!caller.is_admin()).then(|| caller.email.clone()),
        }
    }

    pub async fn list(
        &self,
        caller: &Principal,
        query: &TaskListQuery,
    ) -> Result<TaskPage, DomainError> {
        let page = query
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = query
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<u32>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(self.default_page_limit);

        let filter = Self::filter_for(caller, query.project());
        let total_tasks = self.tasks.count_tasks(&filter).await?;
        let offset = (page - 1).saturating_mul(u64::from(limit));
        let tasks = if offset >= total_tasks {
            Vec::new()
        } else {
            self.tasks.list_tasks(&filter, limit, offset).await?
        };
        Ok(TaskPage {
            tasks,
            total_tasks,
            total_pages: total_tasks.div_ceil(u64::from(limit)),
            current_page: page,
        })
    }

    pub async fn count(&self, caller: &Principal, query: &TaskListQuery) -> Result<u64, DomainError> {
        self.tasks
            .count_tasks(&Self::filter_for(caller, query.project()))
            .await
    }

    async fn require_employee(
        &self,
        id: &str,
        not_found: &str,
    ) -> Result<Employee, DomainError> {
        self.employees
            .find_employee(id)
            .await?
            .ok_or_else(|| DomainError::validation(not_found))
    }

    async fn require_ticket(&self, id: &str) -> Result<(), DomainError> {
        match self.tickets.find_ticket(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::validation("Selected ticket not found.")),
        }
    }

    /// Creates a task and mails its contact person. Returns the task and the
    /// contact person's name ("N/A" when there is none).
    pub async fn create(&self, input: NewTaskInput) -> Result<(Task, String), DomainError> {
        let (Some(name), Some(description), Some(project_id)) = (
            present(&input.name),
            present(&input.description),
            present(&input.project_id).or_else(|| present(&input.project_key)),
        ) else {
            return Err(DomainError::validation(
                "Name, description, and projectId are required",
            ));
        };
        if self.projects.find_project(&project_id).await?.is_none() {
            return Err(DomainError::validation("Selected project not found."));
        }

        let contact = match present(&input.contact_person) {
            Some(id) => Some(self.require_employee(&id, "Contact person not found").await?),
            None => None,
        };
        let assigned_to = match present(&input.assigned_to) {
            Some(id) => Some(self.require_employee(&id, "Assigned employee not found").await?.id),
            None => None,
        };
        let ticket_id = present(&input.ticket);
        if let Some(id) = &ticket_id {
            self.require_ticket(id).await?;
        }

        let now = Utc::now();
        let start_date = date_patch(&input.start_date, "start_date")?.flatten().unwrap_or(now);
        let end_date = date_patch(&input.end_date, "end_date")?.flatten().unwrap_or(now);

        let task = Task {
            id: super::new_id(),
            task_key: super::new_id(),
            name,
            description,
            project_id: Some(project_id),
            assigned_to,
            contact_person: contact.as_ref().map(|c| c.id.clone()),
            ticket_id,
            ticket_ref: None,
            start_date: Some(start_date),
            end_date: Some(end_date),
            procedure: present(&input.procedure).unwrap_or_default(),
            comments: present(&input.comments).unwrap_or_default(),
            sub_module: present(&input.sub_module).unwrap_or_default(),
            qa_status: present(&input.qa_status).unwrap_or_default(),
            uat_status: present(&input.uat_status).unwrap_or_default(),
            priority: enum_field::<Priority>(&input.priority, "priority")?.unwrap_or_default(),
            status: present(&input.status).unwrap_or_else(|| DEFAULT_TASK_STATUS.to_string()),
            order_index: 0,
            request_type: enum_field::<RequestType>(&input.request_type, "request_type")?
                .unwrap_or_default(),
            resolution_type: enum_field::<ResolutionType>(&input.resolution_type, "resolution_type")?
                .unwrap_or_default(),
            category: enum_field::<TaskCategory>(&input.category, "category")?.unwrap_or_default(),
            done: false,
            completed: false,
            from_bulk: false,
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert_task(&task).await?;
        info!(task_id = %task.id, project_id = ?task.project_id, "task created");

        let contact_name = match &contact {
            Some(c) => {
                self.notify(
                    &c.email,
                    &Notification::Assigned {
                        task_name: task.name.clone(),
                        contact_person: Some(c.name.clone()),
                    },
                )
                .await;
                c.name.clone()
            }
            None => "N/A".to_string(),
        };
        Ok((task, contact_name))
    }

    /// Applies a partial update to the task matching `id_or_key` and mails its contact person.
    pub async fn update(&self, id_or_key: &str, patch: TaskPatch) -> Result<Task, DomainError> {
        let previous = self
            .tasks
            .find_task(id_or_key)
            .await?
            .ok_or_else(|| DomainError::not_found("Task not found"))?;
        let mut task = previous.clone();

        if let Some(name) = &patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::validation("Task name cannot be empty"));
            }
            task.name = name.to_string();
        }
        if let Some(description) = &patch.description {
            task.description = description.trim().to_string();
        }
        if let Some(project) = patch.project_id.as_ref().or(patch.project_key.as_ref()) {
            let project = project.trim();
            if project.is_empty() || self.projects.find_project(project).await?.is_none() {
                return Err(DomainError::validation("Selected project not found."));
            }
            task.project_id = Some(project.to_string());
        }
        if let Some(assignee) = &patch.assigned_to {
            task.assigned_to = match assignee.trim() {
                "" => None,
                id => Some(self.require_employee(id, "Assigned employee not found").await?.id),
            };
        }
        if let Some(contact) = &patch.contact_person {
            task.contact_person = match contact.trim() {
                "" => None,
                id => Some(self.require_employee(id, "Contact person not found").await?.id),
            };
        }
        if let Some(ticket) = &patch.ticket {
            task.ticket_id = match ticket.trim() {
                "" => None,
                id => {
                    self.require_ticket(id).await?;
                    Some(id.to_string())
                }
            };
        }
        if let Some(ticket_ref) = &patch.ticket_ref {
            task.ticket_ref = Some(ticket_ref.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Some(start) = date_patch(&patch.start_date, "start_date")? {
            task.start_date = start;
        }
        if let Some(end) = date_patch(&patch.end_date, "end_date")? {
            task.end_date = end;
        }
        for (value, slot) in [
            (&patch.procedure, &mut task.procedure),
            (&patch.comments, &mut task.comments),
            (&patch.sub_module, &mut task.sub_module),
            (&patch.qa_status, &mut task.qa_status),
            (&patch.uat_status, &mut task.uat_status),
        ] {
            if let Some(v) = value {
                *slot = v.trim().to_string();
            }
        }
        if let Some(status) = present(&patch.status) {
            task.status = status;
        }
        if let Some(priority) = enum_field::<Priority>(&patch.priority, "priority")? {
            task.priority = priority;
        }
        if let Some(rt) = enum_field::<RequestType>(&patch.request_type, "request_type")? {
            task.request_type = rt;
        }
        if let Some(rt) = enum_field::<ResolutionType>(&patch.resolution_type, "resolution_type")? {
            task.resolution_type = rt;
        }
        if let Some(category) = enum_field::<TaskCategory>(&patch.category, "category")? {
            task.category = category;
        }
        if let Some(order_index) = patch.order_index {
            task.order_index = order_index;
        }
        if let Some(done) = patch.done {
            task.done = done;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        task.updated_at = Utc::now();

        if !self.tasks.update_task(&task).await? {
            return Err(DomainError::not_found("Task not found"));
        }
        info!(task_id = %task.id, "task updated");

        if let Some(contact_id) = &task.contact_person {
            if let Some(contact) = self.employees.find_employee(contact_id).await? {
                let previous_contact = match &previous.contact_person {
                    Some(id) if id == contact_id => Some(contact.name.clone()),
                    Some(id) => self.employees.find_employee(id).await?.map(|e| e.name),
                    None => None,
                };
                self.notify(
                    &contact.email,
                    &Notification::Updated {
                        previous: TaskSnapshot {
                            name: previous.name.clone(),
                            contact_person: previous_contact,
                        },
                        updated: TaskSnapshot {
                            name: task.name.clone(),
                            contact_person: Some(contact.name.clone()),
                        },
                    },
                )
                .await;
            }
        }
        Ok(task)
    }

    pub async fn delete(&self, id_or_key: &str) -> Result<(), DomainError> {
        let task = self
            .tasks
            .find_task(id_or_key)
            .await?
            .ok_or_else(|| DomainError::not_found("Task not found"))?;
        if !self.tasks.delete_task(&task.id).await? {
            return Err(DomainError::not_found("Task not found"));
        }
        info!(task_id = %task.id, "task deleted");
        Ok(())
    }

    pub async fn by_ticket(&self, ticket_id: &str) -> Result<Vec<TaskView>, DomainError> {
        let tasks = self.tasks.list_tasks_by_ticket(ticket_id).await?;
        populate(self.employees.as_ref(), tasks).await
    }

    async fn notify(&self, recipient: &str, notification: &Notification) {
        if let Err(e) = self.notifier.notify(recipient, notification).await {
            warn!(recipient, error = %e, "notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Project, Ticket};
    use crate::usecases::test_support::{Fixture, admin, fixture, member};
    use pretty_assertions::assert_eq;

    fn service(fx: &Fixture, limit: u32) -> TaskService {
        TaskService::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.repo.clone(),
            fx.repo.clone(),
            fx.notifier.clone(),
            limit,
        )
    }

    async fn seed(fx: &Fixture) {
        let now = Utc::now();
        for (id, name) in [("e1", "Ann"), ("e2", "Bob")] {
            fx.repo
                .insert_employee(&Employee {
                    id: id.into(),
                    name: name.into(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    telephone_no: "555".into(),
                    department_id: None,
                    department: "QA".into(),
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }
        fx.repo
            .insert_project(&Project {
                id: "p1".into(),
                name: "Apollo".into(),
                description: "d".into(),
                contact_person: None,
                assigned_to: None,
                functional_team: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        fx.repo
            .insert_ticket(&Ticket {
                id: "k1".into(),
                title: "Bug".into(),
                description: String::new(),
                priority: Priority::High,
                status: Default::default(),
                assigned_to: None,
                project_id: None,
                tasks: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    fn new_task(name: &str) -> NewTaskInput {
        NewTaskInput {
            name: Some(name.into()),
            description: Some("desc".into()),
            project_key: Some("p1".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_notifies_contact() {
        let fx = fixture().await;
        seed(&fx).await;
        let svc = service(&fx, 1000);

        let (task, contact) = svc
            .create(NewTaskInput {
                contact_person: Some("e1".into()),
                ticket: Some("k1".into()),
                ..new_task("Login page")
            })
            .await
            .unwrap();
        assert_eq!(contact, "Ann");
        assert_eq!(task.status, "NOT STARTED");
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.start_date.is_some() && task.end_date.is_some());
        assert_ne!(task.task_key, task.id);

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ann@example.com");
        assert_eq!(sent[0].1.subject(), "New Task Assigned: Login page");

        let ticket = fx.repo.find_ticket("k1").await.unwrap().unwrap();
        assert_eq!(ticket.tasks, vec![task.id.clone()]);

        let (_, none) = svc.create(new_task("No contact")).await.unwrap();
        assert_eq!(none, "N/A");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let fx = fixture().await;
        seed(&fx).await;
        let svc = service(&fx, 1000);

        let err = svc
            .create(NewTaskInput {
                project_key: None,
                ..new_task("x")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = svc
            .create(NewTaskInput {
                project_key: Some("nope".into()),
                ..new_task("x")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m == "Selected project not found."));

        let err = svc
            .create(NewTaskInput {
                priority: Some("Urgent".into()),
                ..new_task("x")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = svc
            .create(NewTaskInput {
                ticket: Some("nope".into()),
                ..new_task("x")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_pages_and_restricts_non_admins() {
        let fx = fixture().await;
        seed(&fx).await;
        let svc = service(&fx, 2);
        for i in 0..5 {
            let assignee = if i < 2 { "e1" } else { "e2" };
            svc.create(NewTaskInput {
                assigned_to: Some(assignee.into()),
                ..new_task(&format!("t{i}"))
            })
            .await
            .unwrap();
        }

        let page = svc
            .list(
                &admin(),
                &TaskListQuery {
                    page: Some("3".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total_tasks, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.tasks.len(), 1);

        let bogus = svc
            .list(
                &admin(),
                &TaskListQuery {
                    page: Some("-4".into()),
                    limit: Some("zero".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(bogus.current_page, 1);
        assert_eq!(bogus.tasks.len(), 2);

        let past_end = svc
            .list(
                &admin(),
                &TaskListQuery {
                    page: Some(u64::MAX.to_string()),
                    limit: Some("1".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(past_end.current_page, u64::MAX);
        assert_eq!(past_end.total_tasks, 5);
        assert!(past_end.tasks.is_empty());

        let ann = member("ann@example.com");
        let mine = svc.list(&ann, &TaskListQuery::default()).await.unwrap();
        assert_eq!(mine.total_tasks, 2);
        assert_eq!(svc.count(&ann, &TaskListQuery::default()).await.unwrap(), 2);
        let filtered = TaskListQuery {
            project_id: Some("other".into()),
            ..Default::default()
        };
        assert_eq!(svc.count(&admin(), &filtered).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_by_key_validates_and_notifies() {
        let fx = fixture().await;
        seed(&fx).await;
        let svc = service(&fx, 1000);
        let (task, _) = svc
            .create(NewTaskInput {
                contact_person: Some("e1".into()),
                ..new_task("Old name")
            })
            .await
            .unwrap();

        let updated = svc
            .update(
                &task.task_key,
                TaskPatch {
                    name: Some("New name".into()),
                    contact_person: Some("e2".into()),
                    priority: Some("High".into()),
                    end_date: Some(String::new()),
                    done: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.end_date, None);
        assert!(updated.done);

        let sent = fx.notifier.sent();
        let (to, last) = sent.last().unwrap();
        assert_eq!(to, "bob@example.com");
        assert_eq!(
            last,
            &Notification::Updated {
                previous: TaskSnapshot {
                    name: "Old name".into(),
                    contact_person: Some("Ann".into()),
                },
                updated: TaskSnapshot {
                    name: "New name".into(),
                    contact_person: Some("Bob".into()),
                },
            }
        );

        let err = svc
            .update(
                &task.id,
                TaskPatch {
                    request_type: Some("Sideways".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = svc
            .update(
                &task.id,
                TaskPatch {
                    project_key: Some("nope".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(matches!(
            svc.update("missing", TaskPatch::default()).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ticket_link_delete_and_by_ticket() {
        let fx = fixture().await;
        seed(&fx).await;
        let svc = service(&fx, 1000);
        let (task, _) = svc
            .create(NewTaskInput {
                assigned_to: Some("e2".into()),
                ..new_task("Linked")
            })
            .await
            .unwrap();
        svc.update(
            &task.id,
            TaskPatch {
                ticket: Some("k1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let views = svc.by_ticket("k1").await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].assignee.as_ref().map(|a| a.name.as_str()), Some("Bob"));

        svc.delete(&task.id).await.unwrap();
        assert!(svc.by_ticket("k1").await.unwrap().is_empty());
        assert!(matches!(svc.delete(&task.id).await, Err(DomainError::NotFound(_))));
    }
}
