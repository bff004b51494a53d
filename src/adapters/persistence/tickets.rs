//! `tickets` table. Linked task ids are derived from `tasks.ticket_id`.

use super::rows::{get_datetime, get_enum, get_opt_string, get_text, opt_text, repo_err, text, timestamp};
use super::sqlite_repo::SqliteRepo;
use crate::domain::{DomainError, Ticket};
use crate::ports::TicketRepo;
use std::collections::HashMap;

const SELECT_COLS: &str =
    "id, title, description, priority, status, assigned_to, project_id, created_at, updated_at";

fn row_to_ticket(row: &libsql::Row) -> Result<Ticket, DomainError> {
    Ok(Ticket {
        id: row.get(0).map_err(repo_err)?,
        title: row.get(1).map_err(repo_err)?,
        description: get_text(row, 2)?,
        priority: get_enum(row, 3)?,
        status: get_enum(row, 4)?,
        assigned_to: get_opt_string(row, 5)?,
        project_id: get_opt_string(row, 6)?,
        tasks: Vec::new(),
        created_at: get_datetime(row, 7)?,
        updated_at: get_datetime(row, 8)?,
    })
}

fn ticket_values(t: &Ticket) -> Vec<libsql::Value> {
    vec![
        text(&t.id),
        text(&t.title),
        text(&t.description),
        text(t.priority.as_str()),
        text(t.status.as_str()),
        opt_text(t.assigned_to.as_deref()),
        opt_text(t.project_id.as_deref()),
        timestamp(&t.created_at),
        timestamp(&t.updated_at),
    ]
}

impl SqliteRepo {
    async fn query_tickets(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<Ticket>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(sql, libsql::params_from_iter(params))
            .await
            .map_err(repo_err)?;
        let mut tickets = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            tickets.push(row_to_ticket(&row)?);
        }
        if tickets.is_empty() {
            return Ok(tickets);
        }

        let mut linked: HashMap<String, Vec<String>> = HashMap::new();
        let mut rows = conn
            .query(
                "SELECT ticket_id, id FROM tasks WHERE ticket_id IS NOT NULL ORDER BY created_at",
                (),
            )
            .await
            .map_err(repo_err)?;
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            let ticket_id: String = row.get(0).map_err(repo_err)?;
            let task_id: String = row.get(1).map_err(repo_err)?;
            linked.entry(ticket_id).or_default().push(task_id);
        }
        for t in &mut tickets {
            t.tasks = linked.remove(&t.id).unwrap_or_default();
        }
        Ok(tickets)
    }
}

#[async_trait::async_trait]
impl TicketRepo for SqliteRepo {
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            &format!("INSERT INTO tickets ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            libsql::params_from_iter(ticket_values(ticket)),
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn find_ticket(&self, id: &str) -> Result<Option<Ticket>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM tickets WHERE id = ?1");
        Ok(self
            .query_tickets(&sql, vec![text(id)])
            .await?
            .into_iter()
            .next())
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM tickets ORDER BY created_at DESC");
        self.query_tickets(&sql, Vec::new()).await
    }

    async fn update_ticket(&self, ticket: &Ticket) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE tickets SET title = ?2, description = ?3, priority = ?4, status = ?5,
                 assigned_to = ?6, project_id = ?7, updated_at = ?9
                 WHERE id = ?1",
                libsql::params_from_iter(ticket_values(ticket)),
            )
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn delete_ticket(&self, id: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute("DELETE FROM tickets WHERE id = ?1", libsql::params![id])
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }
}
