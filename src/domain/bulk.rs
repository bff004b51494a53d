//! Spreadsheet row rules for the bulk task importer.
//!
//! Pure functions: header mapping, cell cleaning, enum fallbacks, date parsing
//! and the field set compared when deciding update vs. skip.

use crate::domain::entities::{
    DEFAULT_TASK_STATUS, Priority, RequestType, ResolutionType, Task,
};
use crate::domain::errors::DomainError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;

/// Task fields a spreadsheet column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportField {
    ModuleName,
    Description,
    Name,
    Procedure,
    Comments,
    ContactPerson,
    AssignedTo,
    StartDate,
    EndDate,
    Priority,
    Status,
    QaStatus,
    UatStatus,
    RequestType,
    ResolutionType,
    TicketRef,
}

/// Maps a raw header cell to a field. Unknown headers come back as `Err` with
/// their normalized key (lowercase, whitespace runs replaced by `_`).
pub fn map_header(raw: &str) -> Result<ImportField, String> {
    let key = clean(raw).to_uppercase();
    let field = match key.as_str() {
        "MODULE NAME" => ImportField::ModuleName,
        "PROCESS NAME" => ImportField::Description,
        "SUB MODULE" => ImportField::Name,
        "PROCEDURE" => ImportField::Procedure,
        "COMMENTS" => ImportField::Comments,
        "OWNER" => ImportField::ContactPerson,
        "ASSIGNED DEV" | "TESTER" => ImportField::AssignedTo,
        "START DATE" => ImportField::StartDate,
        "END DATE" => ImportField::EndDate,
        "PRIORITY" => ImportField::Priority,
        "STATUS" => ImportField::Status,
        "QA STATUS" => ImportField::QaStatus,
        "UAT STATUS" => ImportField::UatStatus,
        "REQUEST TYPE" => ImportField::RequestType,
        "RESOLUTION TYPE (FUNCTIONAL OR TECHNICAL)" | "RESOLUTION TYPE" => {
            ImportField::ResolutionType
        }
        "TICKET ID" => ImportField::TicketRef,
        _ => {
            return Err(key
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("_"));
        }
    };
    Ok(field)
}

/// Replace non-breaking spaces and trim.
pub fn clean(s: &str) -> String {
    s.replace('\u{a0}', " ").trim().to_string()
}

/// Key used to match people and projects by name.
pub fn normalize_name(s: &str) -> String {
    clean(s).to_lowercase()
}

/// Placeholder address for staff created from a spreadsheet name.
pub fn derived_email(name: &str) -> String {
    let local = normalize_name(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".");
    format!("{local}@example.com")
}

pub fn parse_priority(s: &str) -> Priority {
    match clean(s).to_lowercase().as_str() {
        "high" => Priority::High,
        "low" => Priority::Low,
        _ => Priority::Medium,
    }
}

pub fn parse_request_type(s: &str) -> RequestType {
    match clean(s).to_lowercase().as_str() {
        "existing request" => RequestType::ExistingRequest,
        _ => RequestType::NewRequest,
    }
}

pub fn parse_resolution_type(s: &str) -> ResolutionType {
    match clean(s).to_lowercase().as_str() {
        "technical" => ResolutionType::Technical,
        _ => ResolutionType::Functional,
    }
}

/// Recognized spreadsheet statuses, canonicalized; anything else is "NOT STARTED".
pub fn parse_status(s: &str) -> String {
    let collapsed = clean(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    match collapsed.as_str() {
        "done" => "Done".to_string(),
        "work in progress" => "Work In Progress".to_string(),
        _ => DEFAULT_TASK_STATUS.to_string(),
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%d-%b-%Y", "%b %d, %Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];
// `%Y` also accepts two digits, so short years get their own table.
const SHORT_YEAR_DATE_FORMATS: &[&str] = &["%m/%d/%y", "%d-%m-%y", "%d-%b-%y"];
const SHORT_YEAR_DATETIME_FORMATS: &[&str] = &["%m/%d/%y %H:%M"];

/// True for day-first or month-first dates ending in a two-digit year, as in
/// `1/15/24`. ISO dates lead with the year and never match.
fn has_short_year(s: &str) -> bool {
    let date_part = s.split_whitespace().next().unwrap_or("");
    let mut parts = date_part.split(['/', '-']);
    let first = parts.next().unwrap_or("");
    let Some(year) = parts.last() else {
        return false;
    };
    first.len() <= 2 && year.len() == 2 && year.bytes().all(|b| b.is_ascii_digit())
}

/// Lenient date parsing for spreadsheet cells. Unparseable input is `None`.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = clean(s);
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Utc));
    }
    let (datetime_formats, date_formats) = if has_short_year(&s) {
        (SHORT_YEAR_DATETIME_FORMATS, SHORT_YEAR_DATE_FORMATS)
    } else {
        (DATETIME_FORMATS, DATE_FORMATS)
    };
    for fmt in datetime_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(&s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }
    None
}

/// One data row keyed by field. `row_number` is the spreadsheet row (header = 1).
#[derive(Debug, Clone, Default)]
pub struct SheetRow {
    pub row_number: usize,
    cells: HashMap<ImportField, String>,
}

impl SheetRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    /// Later non-empty cells win over earlier ones for the same field.
    pub fn set(&mut self, field: ImportField, value: &str) {
        let value = clean(value);
        if value.is_empty() && self.cells.contains_key(&field) {
            return;
        }
        self.cells.insert(field, value);
    }

    /// Zero-based position among data rows, blank rows included.
    pub fn data_index(&self) -> usize {
        self.row_number.saturating_sub(2)
    }

    /// Cleaned cell value, empty when the column is absent.
    pub fn get(&self, field: ImportField) -> &str {
        self.cells.get(&field).map(String::as_str).unwrap_or("")
    }
}

/// Turn a raw grid (first row = headers) into keyed rows.
///
/// Fully blank data rows are dropped. Fewer than two grid rows is an empty upload.
pub fn rows_from_grid(grid: &[Vec<String>]) -> Result<Vec<SheetRow>, DomainError> {
    if grid.len() < 2 {
        return Err(DomainError::validation("Uploaded file is empty"));
    }
    let headers: Vec<Option<ImportField>> =
        grid[0].iter().map(|h| map_header(h).ok()).collect();

    let mut rows = Vec::with_capacity(grid.len() - 1);
    for (idx, raw) in grid.iter().enumerate().skip(1) {
        if raw.iter().all(|c| clean(c).is_empty()) {
            continue;
        }
        let mut row = SheetRow::new(idx + 1);
        for (col, header) in headers.iter().enumerate() {
            if let Some(field) = header {
                row.set(*field, raw.get(col).map(String::as_str).unwrap_or(""));
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Fields compared between a stored task and an incoming row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledFields {
    pub procedure: String,
    pub sub_module: String,
    pub comments: String,
    pub description: String,
    pub qa_status: String,
    pub uat_status: String,
    pub contact_person: Option<String>,
    pub assigned_to: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: String,
    pub request_type: RequestType,
    pub resolution_type: ResolutionType,
    pub ticket_ref: Option<String>,
}

impl ReconciledFields {
    pub fn of(task: &Task) -> Self {
        Self {
            procedure: task.procedure.clone(),
            sub_module: task.sub_module.clone(),
            comments: task.comments.clone(),
            description: task.description.clone(),
            qa_status: task.qa_status.clone(),
            uat_status: task.uat_status.clone(),
            contact_person: task.contact_person.clone(),
            assigned_to: task.assigned_to.clone(),
            start_date: task.start_date,
            end_date: task.end_date,
            priority: task.priority,
            status: task.status.clone(),
            request_type: task.request_type,
            resolution_type: task.resolution_type,
            ticket_ref: task.ticket_ref.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use pretty_assertions::assert_eq;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_map_header_known_and_unknown() {
        assert_eq!(map_header(" module name "), Ok(ImportField::ModuleName));
        assert_eq!(map_header("Tester"), Ok(ImportField::AssignedTo));
        assert_eq!(
            map_header("RESOLUTION TYPE (FUNCTIONAL OR TECHNICAL)"),
            Ok(ImportField::ResolutionType)
        );
        assert_eq!(map_header("Go Live  Week"), Err("go_live_week".to_string()));
    }

    #[test]
    fn test_clean_and_normalize() {
        assert_eq!(clean("\u{a0} Jane Doe\u{a0}"), "Jane Doe");
        assert_eq!(normalize_name("  JANE Doe "), "jane doe");
        assert_eq!(derived_email("Jane  van Doe"), "jane.van.doe@example.com");
    }

    #[test]
    fn test_enum_fallbacks() {
        assert_eq!(parse_priority("high"), Priority::High);
        assert_eq!(parse_priority("critical"), Priority::Medium);
        assert_eq!(parse_request_type("Existing Request"), RequestType::ExistingRequest);
        assert_eq!(parse_request_type(""), RequestType::NewRequest);
        assert_eq!(parse_resolution_type("TECHNICAL"), ResolutionType::Technical);
        assert_eq!(parse_status("done"), "Done");
        assert_eq!(parse_status(" Work  In Progress"), "Work In Progress");
        assert_eq!(parse_status("blocked"), "NOT STARTED");
    }

    #[test]
    fn test_parse_date_formats() {
        let jan15 = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(parse_date("2024-01-15"), Some(jan15));
        assert_eq!(parse_date("1/15/2024"), Some(jan15));
        assert_eq!(parse_date("15-01-2024"), Some(jan15));
        assert_eq!(parse_date("15-Jan-2024"), Some(jan15));
        assert_eq!(parse_date("1/15/24"), Some(jan15));
        assert_eq!(parse_date("15-01-24"), Some(jan15));
        assert_eq!(parse_date("15-Jan-24"), Some(jan15));
        assert_eq!(parse_date("1/15/24 09:30").map(|d| d.year()), Some(2024));
        assert!(parse_date("2024-01-15T10:00:00Z").is_some());
        assert_eq!(parse_date("next week"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_rows_from_grid_requires_data_row() {
        let only_header = grid(&[&["MODULE NAME", "SUB MODULE"]]);
        assert!(matches!(
            rows_from_grid(&only_header),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_rows_from_grid_numbers_rows_and_merges_assignee_columns() {
        let g = grid(&[
            &["MODULE NAME", "SUB MODULE", "ASSIGNED DEV", "TESTER", "Extra"],
            &["Billing", "Invoices", "Dev One", "", "x"],
            &["", "", "", "", ""],
            &["Billing", "Refunds", "", "QA Two", "y"],
        ]);
        let rows = rows_from_grid(&g).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].get(ImportField::AssignedTo), "Dev One");
        assert_eq!(rows[1].row_number, 4);
        assert_eq!(rows[1].get(ImportField::AssignedTo), "QA Two");
        assert_eq!(rows[1].get(ImportField::Procedure), "");
    }
}
