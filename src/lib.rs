//! projectdesk: project-management REST backend with Hexagonal Architecture.

pub mod adapters;
pub mod bootstrap;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
