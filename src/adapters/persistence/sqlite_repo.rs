//! SQLite-backed repository via libsql. Implements every storage port.
//!
//! One database file (`projectdesk.db`) in the configured data directory.
//! Referential behavior lives in the schema: foreign keys cascade or null out
//! on delete, so services never sweep dependents by hand.

use super::rows::repo_err;
use crate::domain::DomainError;
use libsql::{Connection, Database};
use std::path::{Path, PathBuf};
use tracing::info;

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#;

const DEPARTMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS departments (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#;

const EMPLOYEES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    telephone_no TEXT NOT NULL DEFAULT '',
    department_id TEXT REFERENCES departments (id) ON DELETE SET NULL,
    department TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#;

const PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    contact_person TEXT REFERENCES employees (id) ON DELETE SET NULL,
    assigned_to TEXT REFERENCES employees (id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#;

const PROJECT_TEAM_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS project_team (
    project_id TEXT NOT NULL REFERENCES projects (id) ON DELETE CASCADE,
    employee_id TEXT NOT NULL REFERENCES employees (id) ON DELETE CASCADE,
    PRIMARY KEY (project_id, employee_id)
)"#;

const TICKETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tickets (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    priority TEXT NOT NULL,
    status TEXT NOT NULL,
    assigned_to TEXT REFERENCES users (id) ON DELETE SET NULL,
    project_id TEXT REFERENCES projects (id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#;

const TASKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    task_key TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    project_id TEXT REFERENCES projects (id) ON DELETE CASCADE,
    assigned_to TEXT REFERENCES employees (id) ON DELETE SET NULL,
    contact_person TEXT REFERENCES employees (id) ON DELETE SET NULL,
    ticket_id TEXT REFERENCES tickets (id) ON DELETE SET NULL,
    ticket_ref TEXT,
    start_date TEXT,
    end_date TEXT,
    procedure TEXT NOT NULL DEFAULT '',
    comments TEXT NOT NULL DEFAULT '',
    sub_module TEXT NOT NULL DEFAULT '',
    qa_status TEXT NOT NULL DEFAULT '',
    uat_status TEXT NOT NULL DEFAULT '',
    priority TEXT NOT NULL,
    status TEXT NOT NULL,
    order_index INTEGER NOT NULL DEFAULT 0,
    request_type TEXT NOT NULL,
    resolution_type TEXT NOT NULL,
    category TEXT NOT NULL,
    done INTEGER NOT NULL DEFAULT 0,
    completed INTEGER NOT NULL DEFAULT 0,
    from_bulk INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#;

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_employees_department ON employees (department_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks (project_id, order_index)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_ticket ON tasks (ticket_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks (assigned_to)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_natural_key ON tasks (project_id, name)",
];

const BUSY_TIMEOUT_MS: u32 = 5_000;

/// SQLite repository. Safe to share via Arc; each operation opens its own connection.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) `projectdesk.db` under `base_dir` and ensure the schema exists.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(repo_err)?;
        let db_path = base.join("projectdesk.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;

        // PRAGMA returns a row; use query and consume rows.
        pragma(&conn, "PRAGMA journal_mode=WAL").await?;
        pragma(&conn, "PRAGMA synchronous=NORMAL").await?;

        for ddl in [
            USERS_TABLE,
            DEPARTMENTS_TABLE,
            EMPLOYEES_TABLE,
            PROJECTS_TABLE,
            PROJECT_TEAM_TABLE,
            TICKETS_TABLE,
            TASKS_TABLE,
        ]
        .iter()
        .chain(INDEXES)
        {
            conn.execute(ddl, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Per-operation connection. Foreign keys are a per-connection setting in SQLite.
    pub(crate) async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(repo_err)?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(repo_err)?;
        pragma(&conn, &format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}")).await?;
        Ok(conn)
    }
}

async fn pragma(conn: &Connection, sql: &str) -> Result<(), DomainError> {
    let mut rows = conn
        .query(sql, ())
        .await
        .map_err(|e| DomainError::Repo(format!("pragma failed ({sql}): {e}")))?;
    while rows.next().await.map_err(repo_err)?.is_some() {}
    Ok(())
}

/// Fixtures shared by the per-table repo tests.
#[cfg(test)]
pub(crate) mod test_support {
    use super::SqliteRepo;
    use crate::domain::{
        DEFAULT_TASK_STATUS, Department, Employee, Project, Task, Ticket, User,
    };
    use chrono::Utc;
    use tempfile::TempDir;

    /// Fresh on-disk database. Keep the `TempDir` alive for the test's duration.
    pub async fn test_repo() -> (SqliteRepo, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepo::connect(dir.path()).await.unwrap();
        (repo, dir)
    }

    pub fn user(id: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id: id.into(),
            name: format!("User {id}"),
            email: email.into(),
            password_hash: "$2b$10$hash".into(),
            role: Default::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn department(id: &str, name: &str) -> Department {
        let now = Utc::now();
        Department {
            id: id.into(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn employee(id: &str, name: &str, department: Option<&Department>) -> Employee {
        let now = Utc::now();
        Employee {
            id: id.into(),
            name: name.into(),
            email: format!("{id}@example.com"),
            telephone_no: "555-0100".into(),
            department_id: department.map(|d| d.id.clone()),
            department: department.map(|d| d.name.clone()).unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn project(id: &str, name: &str, contact: Option<&str>) -> Project {
        let now = Utc::now();
        Project {
            id: id.into(),
            name: name.into(),
            description: format!("{name} description"),
            contact_person: contact.map(String::from),
            assigned_to: None,
            functional_team: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn task(id: &str, name: &str, project_id: &str) -> Task {
        let now = Utc::now();
        Task {
            id: id.into(),
            task_key: format!("key-{id}"),
            name: name.into(),
            description: format!("{name} description"),
            project_id: Some(project_id.into()),
            assigned_to: None,
            contact_person: None,
            ticket_id: None,
            ticket_ref: None,
            start_date: Some(now),
            end_date: None,
            procedure: String::new(),
            comments: String::new(),
            sub_module: String::new(),
            qa_status: String::new(),
            uat_status: String::new(),
            priority: Default::default(),
            status: DEFAULT_TASK_STATUS.into(),
            order_index: 0,
            request_type: Default::default(),
            resolution_type: Default::default(),
            category: Default::default(),
            done: false,
            completed: false,
            from_bulk: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn ticket(id: &str, title: &str) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            priority: Default::default(),
            status: Default::default(),
            assigned_to: None,
            project_id: None,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
