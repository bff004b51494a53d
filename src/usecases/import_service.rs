//! Spreadsheet bulk import: rows become tasks, missing projects and staff are created.
//!
//! Rows are applied in order. Each row is matched on (name, project, description,
//! procedure) and inserted, updated or skipped.

use crate::domain::bulk::{
    ImportField, ReconciledFields, SheetRow, clean, derived_email, normalize_name, parse_date,
    parse_priority, parse_request_type, parse_resolution_type, parse_status, rows_from_grid,
};
use crate::domain::{DomainError, Employee, Notification, Project, Task, TaskCategory, UploadedTask};
use crate::ports::{DepartmentRepo, EmployeeRepo, NotifierPort, ProjectRepo, TaskRepo};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const OWNER_DEPARTMENT: &str = "FUNCTIONAL";
const ASSIGNEE_DEPARTMENT: &str = "QA";
const AUTO_PROJECT_DESCRIPTION: &str = "Auto-created via bulk upload";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRow {
    pub row: usize,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub message: String,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub invalid_rows: Vec<InvalidRow>,
    /// Names of employees created for unknown owners or assignees.
    pub created_employees: Vec<String>,
    /// Names of projects created for unknown modules.
    pub created_projects: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Inserted,
    Updated,
    Skipped,
}

/// Lookup caches for one upload, keyed by normalized name.
#[derive(Default)]
struct Directory {
    projects: HashMap<String, Project>,
    employees: HashMap<String, Employee>,
}

pub struct ImportService {
    tasks: Arc<dyn TaskRepo>,
    projects: Arc<dyn ProjectRepo>,
    employees: Arc<dyn EmployeeRepo>,
    departments: Arc<dyn DepartmentRepo>,
    notifier: Arc<dyn NotifierPort>,
}

impl ImportService {
    pub fn new(
        tasks: Arc<dyn TaskRepo>,
        projects: Arc<dyn ProjectRepo>,
        employees: Arc<dyn EmployeeRepo>,
        departments: Arc<dyn DepartmentRepo>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Self {
        Self {
            tasks,
            projects,
            employees,
            departments,
            notifier,
        }
    }

    /// Import a decoded grid whose first row holds the headers.
    pub async fn import(&self, grid: &[Vec<String>]) -> Result<ImportReport, DomainError> {
        let rows = rows_from_grid(grid)?;
        info!(rows = rows.len(), "bulk import started");

        let mut dir = Directory::default();
        for project in self.projects.list_projects().await? {
            dir.projects.insert(normalize_name(&project.name), project);
        }
        // list is oldest first; keep the first employee per name
        for employee in self.employees.list_employees().await? {
            dir.employees
                .entry(normalize_name(&employee.name))
                .or_insert(employee);
        }

        let mut report = ImportReport::default();
        // owner email -> tasks inserted for them, in upload order
        let mut uploads: Vec<(String, Vec<UploadedTask>)> = Vec::new();

        for row in &rows {
            let name = Some(clean(row.get(ImportField::Name)))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Untitled-{}", row.row_number));

            let module = clean(row.get(ImportField::ModuleName));
            let Some(project) = self.resolve_project(&mut dir, &module, &mut report).await? else {
                report.invalid_rows.push(InvalidRow {
                    row: row.row_number,
                    name,
                    error: format!("Project '{module}' not found and could not be created"),
                });
                continue;
            };

            let owner = self
                .resolve_person(
                    &mut dir,
                    row.get(ImportField::ContactPerson),
                    OWNER_DEPARTMENT,
                    &project,
                    &mut report,
                )
                .await?;
            let assignee = self
                .resolve_person(
                    &mut dir,
                    row.get(ImportField::AssignedTo),
                    ASSIGNEE_DEPARTMENT,
                    &project,
                    &mut report,
                )
                .await?;

            let task = build_task(
                row,
                name,
                &project,
                owner.as_ref().map(|e| e.id.clone()),
                assignee.as_ref().map(|e| e.id.clone()),
            );
            let task_name = task.name.clone();
            match self.reconcile(task).await? {
                Outcome::Inserted => {
                    report.inserted += 1;
                    if let Some(owner) = &owner {
                        let entry = UploadedTask {
                            name: task_name,
                            project: dir
                                .projects
                                .get(&normalize_name(&module))
                                .map(|p| p.name.clone()),
                        };
                        match uploads.iter_mut().find(|(email, _)| *email == owner.email) {
                            Some((_, list)) => list.push(entry),
                            None => uploads.push((owner.email.clone(), vec![entry])),
                        }
                    }
                }
                Outcome::Updated => report.updated += 1,
                Outcome::Skipped => report.skipped += 1,
            }
        }

        report.message = format!(
            "{} inserted, {} updated, {} unchanged.",
            report.inserted, report.updated, report.skipped
        );
        info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            invalid = report.invalid_rows.len(),
            "bulk import finished"
        );

        for (email, tasks) in uploads {
            if let Err(e) = self
                .notifier
                .notify(&email, &Notification::Upload { tasks })
                .await
            {
                warn!(recipient = %email, error = %e, "upload notification failed");
            }
        }
        Ok(report)
    }

    /// Project id for a module name, creating the project when unknown.
    /// An empty module name resolves to nothing.
    async fn resolve_project(
        &self,
        dir: &mut Directory,
        module: &str,
        report: &mut ImportReport,
    ) -> Result<Option<String>, DomainError> {
        if module.is_empty() {
            return Ok(None);
        }
        let key = normalize_name(module);
        if let Some(project) = dir.projects.get(&key) {
            return Ok(Some(project.id.clone()));
        }

        let now = Utc::now();
        let project = Project {
            id: super::new_id(),
            name: module.to_string(),
            description: AUTO_PROJECT_DESCRIPTION.to_string(),
            contact_person: None,
            assigned_to: None,
            functional_team: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        match self.projects.insert_project(&project).await {
            Ok(()) => {}
            // created concurrently under a differently-cased name
            Err(DomainError::Conflict(_)) => {
                return match self.projects.find_project_by_name(module).await? {
                    Some(existing) => {
                        let id = existing.id.clone();
                        dir.projects.insert(key, existing);
                        Ok(Some(id))
                    }
                    None => Ok(None),
                };
            }
            Err(e) => return Err(e),
        }
        info!(project_id = %project.id, name = %project.name, "project auto-created");
        report.created_projects.push(project.name.clone());
        let id = project.id.clone();
        dir.projects.insert(key, project);
        Ok(Some(id))
    }

    /// Employee for a spreadsheet name, created in `department` when unknown,
    /// and attached to the project's functional team. A project without a
    /// contact person adopts a newly created owner.
    async fn resolve_person(
        &self,
        dir: &mut Directory,
        raw_name: &str,
        department: &str,
        project_id: &str,
        report: &mut ImportReport,
    ) -> Result<Option<Employee>, DomainError> {
        let name = clean(raw_name);
        if name.is_empty() {
            return Ok(None);
        }
        let key = normalize_name(&name);

        let employee = match dir.employees.get(&key) {
            Some(existing) => existing.clone(),
            None => {
                let (employee, created) = self.create_employee(&name, department).await?;
                if created {
                    report.created_employees.push(name.clone());
                    if department == OWNER_DEPARTMENT {
                        self.adopt_contact(dir, project_id, &employee.id).await?;
                    }
                }
                dir.employees.insert(key, employee.clone());
                employee
            }
        };
        self.projects
            .add_team_member(project_id, &employee.id)
            .await?;
        Ok(Some(employee))
    }

    /// Inserts a placeholder employee. When the derived email is already taken,
    /// the employee holding it is returned instead, flagged as not created.
    async fn create_employee(
        &self,
        name: &str,
        department: &str,
    ) -> Result<(Employee, bool), DomainError> {
        let now = Utc::now();
        let linked = self.departments.find_department_by_name(department).await?;
        let employee = Employee {
            id: super::new_id(),
            name: name.to_string(),
            email: derived_email(name),
            telephone_no: "N/A".to_string(),
            department_id: linked.map(|d| d.id),
            department: department.to_string(),
            created_at: now,
            updated_at: now,
        };
        match self.employees.insert_employee(&employee).await {
            Ok(()) => {
                info!(employee_id = %employee.id, department, "employee auto-created");
                Ok((employee, true))
            }
            Err(DomainError::Conflict(_)) => self
                .employees
                .find_employee_by_email(&employee.email)
                .await?
                .map(|existing| (existing, false))
                .ok_or_else(|| DomainError::Repo(format!("employee {} vanished", employee.email))),
            Err(e) => Err(e),
        }
    }

    async fn adopt_contact(
        &self,
        dir: &mut Directory,
        project_id: &str,
        employee_id: &str,
    ) -> Result<(), DomainError> {
        let Some(project) = dir.projects.values_mut().find(|p| p.id == project_id) else {
            return Ok(());
        };
        if project.contact_person.is_some() {
            return Ok(());
        }
        project.contact_person = Some(employee_id.to_string());
        project.updated_at = Utc::now();
        self.projects.update_project(project).await?;
        Ok(())
    }

    async fn reconcile(&self, incoming: Task) -> Result<Outcome, DomainError> {
        let existing = self
            .tasks
            .find_task_by_natural_key(
                &incoming.name,
                incoming.project_id.as_deref().unwrap_or_default(),
                &incoming.description,
                &incoming.procedure,
            )
            .await?;
        let Some(existing) = existing else {
            self.tasks.insert_task(&incoming).await?;
            debug!(task_id = %incoming.id, "bulk row inserted");
            return Ok(Outcome::Inserted);
        };

        if ReconciledFields::of(&existing) == ReconciledFields::of(&incoming) {
            return Ok(Outcome::Skipped);
        }
        let merged = Task {
            id: existing.id.clone(),
            task_key: existing.task_key.clone(),
            ticket_id: existing.ticket_id.clone(),
            created_at: existing.created_at,
            ..incoming
        };
        self.tasks.update_task(&merged).await?;
        debug!(task_id = %merged.id, "bulk row updated");
        Ok(Outcome::Updated)
    }
}

fn build_task(
    row: &SheetRow,
    name: String,
    project_id: &str,
    contact_person: Option<String>,
    assigned_to: Option<String>,
) -> Task {
    let now = Utc::now();
    let status = parse_status(row.get(ImportField::Status));
    Task {
        id: super::new_id(),
        task_key: super::new_id(),
        sub_module: clean(row.get(ImportField::Name)),
        name,
        description: clean(row.get(ImportField::Description)),
        project_id: Some(project_id.to_string()),
        assigned_to,
        contact_person,
        ticket_id: None,
        ticket_ref: Some(clean(row.get(ImportField::TicketRef))).filter(|t| !t.is_empty()),
        start_date: parse_date(row.get(ImportField::StartDate)),
        end_date: parse_date(row.get(ImportField::EndDate)),
        procedure: clean(row.get(ImportField::Procedure)),
        comments: clean(row.get(ImportField::Comments)),
        qa_status: clean(row.get(ImportField::QaStatus)),
        uat_status: clean(row.get(ImportField::UatStatus)),
        priority: parse_priority(row.get(ImportField::Priority)),
        completed: status.eq_ignore_ascii_case("done"),
        status,
        order_index: i64::try_from(row.data_index()).unwrap_or(i64::MAX),
        request_type: parse_request_type(row.get(ImportField::RequestType)),
        resolution_type: parse_resolution_type(row.get(ImportField::ResolutionType)),
        category: TaskCategory::Task,
        done: false,
        from_bulk: true,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use crate::ports::TaskFilter;
    use crate::usecases::test_support::{Fixture, fixture};
    use pretty_assertions::assert_eq;

    const HEADER: &[&str] = &[
        "MODULE NAME",
        "PROCESS NAME",
        "SUB MODULE",
        "PROCEDURE",
        "OWNER",
        "ASSIGNED DEV",
        "PRIORITY",
        "STATUS",
        "START DATE",
        "TICKET ID",
    ];

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        std::iter::once(HEADER)
            .chain(rows.iter().copied())
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn service(fx: &Fixture) -> ImportService {
        ImportService::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.repo.clone(),
            fx.repo.clone(),
            fx.notifier.clone(),
        )
    }

    async fn all_tasks(fx: &Fixture) -> Vec<Task> {
        fx.repo
            .list_tasks(&TaskFilter::default(), 1000, 0)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_upload_creates_projects_staff_and_tasks() {
        let fx = fixture().await;
        let svc = service(&fx);
        let g = grid(&[
            &["Billing", "Invoice flow", "Invoices", "p1", "Jane Doe", "Dev One", "high", "done", "2024-01-15", "T-1"],
            &["billing", "Refund flow", "", "p2", "jane doe", "", "", "", "", ""],
            &["", "Orphan", "Lost", "", "", "", "", "", "", ""],
        ]);

        let report = svc.import(&g).await.unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.message, "2 inserted, 0 updated, 0 unchanged.");
        assert_eq!(report.created_projects, vec!["Billing".to_string()]);
        assert_eq!(
            report.created_employees,
            vec!["Jane Doe".to_string(), "Dev One".to_string()]
        );
        assert_eq!(
            report.invalid_rows,
            vec![InvalidRow {
                row: 4,
                name: "Lost".into(),
                error: "Project '' not found and could not be created".into(),
            }]
        );

        let tasks = all_tasks(&fx).await;
        assert_eq!(tasks.len(), 2);
        let first = &tasks[0];
        assert_eq!(first.name, "Invoices");
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.status, "Done");
        assert!(first.completed && first.from_bulk);
        assert_eq!(first.ticket_ref.as_deref(), Some("T-1"));
        assert!(first.start_date.is_some());
        assert_eq!(tasks[1].name, "Untitled-3");
        assert_eq!(tasks[1].order_index, 1);

        let project = fx.repo.find_project_by_name("billing").await.unwrap().unwrap();
        assert_eq!(project.description, "Auto-created via bulk upload");
        assert_eq!(project.contact_person, first.contact_person);
        assert_eq!(project.functional_team.len(), 2);

        let owner = fx.repo.find_employee_by_name("Jane Doe").await.unwrap().unwrap();
        assert_eq!(owner.email, "jane.doe@example.com");
        assert_eq!(owner.department, "FUNCTIONAL");
        let dev = fx.repo.find_employee_by_name("dev one").await.unwrap().unwrap();
        assert_eq!(dev.department, "QA");

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "jane.doe@example.com");
        let Notification::Upload { tasks } = &sent[0].1 else {
            panic!("expected upload mail");
        };
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].project.as_deref(), Some("Billing"));
    }

    #[tokio::test]
    async fn test_reupload_updates_changed_rows_and_skips_the_rest() {
        let fx = fixture().await;
        let svc = service(&fx);
        let base = grid(&[
            &["Billing", "Invoice flow", "Invoices", "p1", "", "", "low", "", "", ""],
            &["Billing", "Refund flow", "Refunds", "p2", "", "", "", "", "", ""],
        ]);
        svc.import(&base).await.unwrap();
        let before = all_tasks(&fx).await;

        let changed = grid(&[
            &["Billing", "Invoice flow", "Invoices", "p1", "", "", "high", "", "", ""],
            &["Billing", "Refund flow", "Refunds", "p2", "", "", "", "", "", ""],
            &["Billing", "Refund flow", "Refunds", "p2", "", "", "", "", "", ""],
        ]);
        let report = svc.import(&changed).await.unwrap();
        assert_eq!((report.inserted, report.updated, report.skipped), (0, 1, 2));
        assert!(report.created_projects.is_empty());

        let after = all_tasks(&fx).await;
        assert_eq!(after.len(), 2);
        let invoices = after.iter().find(|t| t.name == "Invoices").unwrap();
        let original = before.iter().find(|t| t.name == "Invoices").unwrap();
        assert_eq!(invoices.id, original.id);
        assert_eq!(invoices.task_key, original.task_key);
        assert_eq!(invoices.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_existing_staff_and_project_are_reused() {
        let fx = fixture().await;
        let svc = service(&fx);
        svc.import(&grid(&[&["Ops", "a", "A", "", "Sam Lee", "", "", "", "", ""]]))
            .await
            .unwrap();
        let report = svc
            .import(&grid(&[&["OPS", "b", "B", "", " sam  lee ", "Sam Lee", "", "", "", ""]]))
            .await
            .unwrap();
        assert!(report.created_employees.is_empty());
        assert!(report.created_projects.is_empty());
        assert_eq!(fx.repo.count_employees().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_order_index_follows_sheet_position_across_blank_rows() {
        let fx = fixture().await;
        let svc = service(&fx);
        let g = grid(&[
            &["Billing", "Invoice flow", "Invoices", "", "", "", "", "", "", ""],
            &["", "", "", "", "", "", "", "", "", ""],
            &["Billing", "Refund flow", "Refunds", "", "", "", "", "", "", ""],
        ]);

        svc.import(&g).await.unwrap();
        let tasks = all_tasks(&fx).await;
        let order: Vec<(String, i64)> = tasks.into_iter().map(|t| (t.name, t.order_index)).collect();
        assert_eq!(
            order,
            vec![("Invoices".to_string(), 0), ("Refunds".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_header_only_grid_is_rejected() {
        let fx = fixture().await;
        let err = service(&fx).import(&grid(&[])).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m == "Uploaded file is empty"));
    }
}
