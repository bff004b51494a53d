//! Infrastructure adapters. HTTP inbound; storage, mail, credentials and
//! spreadsheet decoding outbound. Map errors to DomainError.

pub mod http;
pub mod import;
pub mod mail;
pub mod persistence;
pub mod security;
