//! Notification delivery adapters. Implement `NotifierPort`.

pub mod log_notifier;
pub mod smtp;

pub use log_notifier::LogNotifier;
pub use smtp::SmtpNotifier;
