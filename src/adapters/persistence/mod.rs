//! libsql persistence. One `SqliteRepo` implements every storage port.

mod departments;
mod employees;
mod projects;
pub(crate) mod rows;
pub mod sqlite_repo;
mod tasks;
mod tickets;
mod users;

pub use sqlite_repo::SqliteRepo;
