//! Port traits. API boundaries for the hexagon.
//!
//! - Outbound: Called by application into storage
//! - Notifier: Called by application to deliver mail
//! - Security: Password hashing and bearer tokens

pub mod notifier;
pub mod outbound;
pub mod security;

pub use notifier::NotifierPort;
pub use outbound::{
    DepartmentRepo, EmployeeRepo, ProjectRepo, TaskFilter, TaskRepo, TicketRepo, UserRepo,
};
pub use security::{PasswordPort, TokenPort};
