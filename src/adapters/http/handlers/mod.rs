pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod projects;
pub mod tasks;
pub mod tickets;
pub mod users;
