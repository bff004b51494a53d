//! Row-to-entity parsing helpers shared by the per-table repos.
//!
//! Timestamps are stored as RFC 3339 TEXT; booleans as INTEGER 0/1.

use crate::domain::DomainError;
use chrono::{DateTime, Utc};

pub(crate) fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

/// Map a write failure, turning UNIQUE violations into `Conflict(message)`.
pub(crate) fn write_err(e: libsql::Error, conflict_message: &str) -> DomainError {
    let text = e.to_string();
    if text.contains("UNIQUE constraint failed") {
        DomainError::conflict(conflict_message)
    } else {
        DomainError::Repo(text)
    }
}

/// Nullable TEXT column. SQL NULL and empty string both read as `None`.
pub(crate) fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DomainError> {
    match row.get::<Option<String>>(idx).map_err(repo_err)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// TEXT column where NULL reads as the empty string.
pub(crate) fn get_text(row: &libsql::Row, idx: i32) -> Result<String, DomainError> {
    Ok(row
        .get::<Option<String>>(idx)
        .map_err(repo_err)?
        .unwrap_or_default())
}

pub(crate) fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DomainError> {
    Ok(row.get::<i64>(idx).map_err(repo_err)? != 0)
}

pub(crate) fn get_count(row: &libsql::Row, idx: i32) -> Result<u64, DomainError> {
    Ok(row.get::<i64>(idx).map_err(repo_err)?.max(0) as u64)
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::Repo(format!("Failed to parse datetime '{s}': {e}")))
}

pub(crate) fn get_datetime(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>, DomainError> {
    parse_datetime(&row.get::<String>(idx).map_err(repo_err)?)
}

pub(crate) fn get_opt_datetime(
    row: &libsql::Row,
    idx: i32,
) -> Result<Option<DateTime<Utc>>, DomainError> {
    match get_opt_string(row, idx)? {
        Some(s) => Ok(Some(parse_datetime(&s)?)),
        None => Ok(None),
    }
}

/// Parse a stored wire string back into one of the domain enums.
pub(crate) fn get_enum<T: serde::de::DeserializeOwned>(
    row: &libsql::Row,
    idx: i32,
) -> Result<T, DomainError> {
    let s = row.get::<String>(idx).map_err(repo_err)?;
    crate::domain::parse_enum(&s)
        .ok_or_else(|| DomainError::Repo(format!("Unknown stored value '{s}'")))
}

pub(crate) fn text(s: &str) -> libsql::Value {
    libsql::Value::Text(s.to_string())
}

pub(crate) fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

pub(crate) fn timestamp(dt: &DateTime<Utc>) -> libsql::Value {
    libsql::Value::Text(dt.to_rfc3339())
}

pub(crate) fn opt_timestamp(dt: Option<&DateTime<Utc>>) -> libsql::Value {
    match dt {
        Some(dt) => timestamp(dt),
        None => libsql::Value::Null,
    }
}

pub(crate) fn flag(b: bool) -> libsql::Value {
    libsql::Value::Integer(i64::from(b))
}
