//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod bulk;
pub mod entities;
pub mod errors;
pub mod notification;

pub use entities::{
    DEFAULT_TASK_STATUS, Department, DepartmentHeadcount, DepartmentRef, DepartmentWithEmployees,
    Employee, EmployeeSummary, EmployeeView, Principal, Priority, Project, ProjectTaskCount, ProjectView,
    RequestType, ResolutionType, Role, StatusCount, Task, TaskCategory, TaskView, Ticket,
    TicketStatus, User, parse_enum,
};
pub use errors::DomainError;
pub use notification::{Notification, TaskSnapshot, UploadedTask};
