//! Domain entities. Pure data structures for the core business.
//!
//! No storage or HTTP types here; adapters map rows and requests into these.
//! Wire names follow the JSON the SPA already consumes (`_id`, `project_key`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parse a wire string into one of the string enums below.
///
/// Every enum here serializes as a plain string, so serde does the matching.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    #[default]
    #[serde(rename = "New Request")]
    NewRequest,
    #[serde(rename = "Existing Request")]
    ExistingRequest,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::NewRequest => "New Request",
            RequestType::ExistingRequest => "Existing Request",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionType {
    #[default]
    Functional,
    Technical,
}

impl ResolutionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionType::Functional => "Functional",
            ResolutionType::Technical => "Technical",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskCategory {
    #[default]
    Task,
    Subtask,
}

impl TaskCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskCategory::Task => "Task",
            TaskCategory::Subtask => "Subtask",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    #[default]
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "IN PROGRESS")]
    InProgress,
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "ON HOLD")]
    OnHold,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN PROGRESS",
            TicketStatus::Done => "DONE",
            TicketStatus::OnHold => "ON HOLD",
        }
    }
}

/// Default status for tasks created through the API or importer.
pub const DEFAULT_TASK_STATUS: &str = "NOT STARTED";

/// A registered login. The hash never leaves the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub telephone_no: String,
    #[serde(rename = "departmentId")]
    pub department_id: Option<String>,
    /// Department name, denormalized so imported staff without a department row still carry one.
    pub department: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub contact_person: Option<String>,
    pub assigned_to: Option<String>,
    /// Employee ids attached by the bulk importer.
    pub functional_team: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub task_key: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "project_key")]
    pub project_id: Option<String>,
    pub assigned_to: Option<String>,
    pub contact_person: Option<String>,
    #[serde(rename = "ticket")]
    pub ticket_id: Option<String>,
    /// Free-text ticket reference carried by spreadsheet rows.
    #[serde(rename = "ticketId")]
    pub ticket_ref: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub procedure: String,
    pub comments: String,
    pub sub_module: String,
    pub qa_status: String,
    pub uat_status: String,
    pub priority: Priority,
    pub status: String,
    #[serde(rename = "orderIndex")]
    pub order_index: i64,
    pub request_type: RequestType,
    pub resolution_type: ResolutionType,
    pub category: TaskCategory,
    pub done: bool,
    pub completed: bool,
    #[serde(rename = "fromBulk")]
    pub from_bulk: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TicketStatus,
    pub assigned_to: Option<String>,
    #[serde(rename = "project_key")]
    pub project_id: Option<String>,
    /// Ids of tasks linked to this ticket; derived from `Task::ticket_id`.
    pub tasks: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// The caller behind a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "id")]
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Principal {
    fn from(u: &User) -> Self {
        Self {
            user_id: u.id.clone(),
            email: u.email.clone(),
            name: u.name.clone(),
            role: u.role,
        }
    }
}

/// `{_id, name, email}` projection used wherever a reference is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&Employee> for EmployeeSummary {
    fn from(e: &Employee) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            email: e.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    #[serde(flatten)]
    pub employee: Employee,
    #[serde(rename = "departmentRef")]
    pub department_ref: Option<DepartmentRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentWithEmployees {
    #[serde(flatten)]
    pub department: Department,
    pub employees: Vec<Employee>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub contact: Option<EmployeeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<EmployeeSummary>,
    pub contact: Option<EmployeeSummary>,
}

/// Count of tasks per status (dashboard pie).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// Count of tasks per project (dashboard bar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTaskCount {
    pub name: String,
    #[serde(rename = "taskCount")]
    pub task_count: u64,
}

/// Count of employees per department name (dashboard bar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentHeadcount {
    pub department: String,
    #[serde(rename = "employeeCount")]
    pub employee_count: u64,
}
