//! `tasks` table: CRUD, filtered listing, natural-key lookup and dashboard aggregates.

use super::rows::{
    flag, get_bool, get_count, get_datetime, get_enum, get_opt_datetime, get_opt_string,
    get_text, opt_text, opt_timestamp, repo_err, text, timestamp, write_err,
};
use super::sqlite_repo::SqliteRepo;
use crate::domain::{DomainError, ProjectTaskCount, StatusCount, Task};
use crate::ports::{TaskFilter, TaskRepo};

const SELECT_COLS: &str = "id, task_key, name, description, project_id, assigned_to, \
    contact_person, ticket_id, ticket_ref, start_date, end_date, procedure, comments, \
    sub_module, qa_status, uat_status, priority, status, order_index, request_type, \
    resolution_type, category, done, completed, from_bulk, created_at, updated_at";

/// Every column but `id` and `created_at`, bound to the same positions as `task_values`.
const UPDATE_SET: &str = "task_key = ?2, name = ?3, description = ?4, project_id = ?5, \
    assigned_to = ?6, contact_person = ?7, ticket_id = ?8, ticket_ref = ?9, \
    start_date = ?10, end_date = ?11, procedure = ?12, comments = ?13, sub_module = ?14, \
    qa_status = ?15, uat_status = ?16, priority = ?17, status = ?18, order_index = ?19, \
    request_type = ?20, resolution_type = ?21, category = ?22, done = ?23, \
    completed = ?24, from_bulk = ?25, updated_at = ?27";

const DUPLICATE: &str = "Task with this key already exists";

fn row_to_task(row: &libsql::Row) -> Result<Task, DomainError> {
    Ok(Task {
        id: row.get(0).map_err(repo_err)?,
        task_key: row.get(1).map_err(repo_err)?,
        name: row.get(2).map_err(repo_err)?,
        description: get_text(row, 3)?,
        project_id: get_opt_string(row, 4)?,
        assigned_to: get_opt_string(row, 5)?,
        contact_person: get_opt_string(row, 6)?,
        ticket_id: get_opt_string(row, 7)?,
        ticket_ref: get_opt_string(row, 8)?,
        start_date: get_opt_datetime(row, 9)?,
        end_date: get_opt_datetime(row, 10)?,
        procedure: get_text(row, 11)?,
        comments: get_text(row, 12)?,
        sub_module: get_text(row, 13)?,
        qa_status: get_text(row, 14)?,
        uat_status: get_text(row, 15)?,
        priority: get_enum(row, 16)?,
        status: get_text(row, 17)?,
        order_index: row.get(18).map_err(repo_err)?,
        request_type: get_enum(row, 19)?,
        resolution_type: get_enum(row, 20)?,
        category: get_enum(row, 21)?,
        done: get_bool(row, 22)?,
        completed: get_bool(row, 23)?,
        from_bulk: get_bool(row, 24)?,
        created_at: get_datetime(row, 25)?,
        updated_at: get_datetime(row, 26)?,
    })
}

fn task_values(t: &Task) -> Vec<libsql::Value> {
    vec![
        text(&t.id),
        text(&t.task_key),
        text(&t.name),
        text(&t.description),
        opt_text(t.project_id.as_deref()),
        opt_text(t.assigned_to.as_deref()),
        opt_text(t.contact_person.as_deref()),
        opt_text(t.ticket_id.as_deref()),
        opt_text(t.ticket_ref.as_deref()),
        opt_timestamp(t.start_date.as_ref()),
        opt_timestamp(t.end_date.as_ref()),
        text(&t.procedure),
        text(&t.comments),
        text(&t.sub_module),
        text(&t.qa_status),
        text(&t.uat_status),
        text(t.priority.as_str()),
        text(&t.status),
        libsql::Value::Integer(t.order_index),
        text(t.request_type.as_str()),
        text(t.resolution_type.as_str()),
        text(t.category.as_str()),
        flag(t.done),
        flag(t.completed),
        flag(t.from_bulk),
        timestamp(&t.created_at),
        timestamp(&t.updated_at),
    ]
}

/// WHERE clause + params for a listing filter.
fn filter_clause(filter: &TaskFilter) -> (String, Vec<libsql::Value>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();
    if let Some(project_id) = &filter.project_id {
        params.push(text(project_id));
        conditions.push(format!("project_id = ?{}", params.len()));
    }
    if let Some(email) = &filter.assignee_email {
        params.push(text(email));
        conditions.push(format!(
            "assigned_to IN (SELECT id FROM employees WHERE email = ?{})",
            params.len()
        ));
    }
    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, params)
}

impl SqliteRepo {
    async fn query_tasks(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<Task>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(sql, libsql::params_from_iter(params))
            .await
            .map_err(repo_err)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            tasks.push(row_to_task(&row)?);
        }
        Ok(tasks)
    }
}

#[async_trait::async_trait]
impl TaskRepo for SqliteRepo {
    async fn insert_task(&self, task: &Task) -> Result<(), DomainError> {
        let placeholders = (1..=27)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let conn = self.conn().await?;
        conn.execute(
            &format!("INSERT INTO tasks ({SELECT_COLS}) VALUES ({placeholders})"),
            libsql::params_from_iter(task_values(task)),
        )
        .await
        .map_err(|e| write_err(e, DUPLICATE))?;
        Ok(())
    }

    async fn find_task(&self, id_or_key: &str) -> Result<Option<Task>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM tasks WHERE id = ?1 OR task_key = ?1 LIMIT 1");
        Ok(self
            .query_tasks(&sql, vec![text(id_or_key)])
            .await?
            .into_iter()
            .next())
    }

    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Task>, DomainError> {
        let (clause, mut params) = filter_clause(filter);
        params.push(libsql::Value::Integer(i64::from(limit)));
        let limit_idx = params.len();
        params.push(libsql::Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        let offset_idx = params.len();
        let sql = format!(
            "SELECT {SELECT_COLS} FROM tasks {clause}
             ORDER BY order_index, created_at
             LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );
        self.query_tasks(&sql, params).await
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> Result<u64, DomainError> {
        let (clause, params) = filter_clause(filter);
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!("SELECT COUNT(*) FROM tasks {clause}"),
                libsql::params_from_iter(params),
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => get_count(&row, 0),
            None => Ok(0),
        }
    }

    async fn list_tasks_by_ticket(&self, ticket_id: &str) -> Result<Vec<Task>, DomainError> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM tasks WHERE ticket_id = ?1 ORDER BY order_index, created_at"
        );
        self.query_tasks(&sql, vec![text(ticket_id)]).await
    }

    async fn find_task_by_natural_key(
        &self,
        name: &str,
        project_id: &str,
        description: &str,
        procedure: &str,
    ) -> Result<Option<Task>, DomainError> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM tasks
             WHERE name = ?1 AND project_id = ?2 AND description = ?3 AND procedure = ?4
             ORDER BY created_at LIMIT 1"
        );
        Ok(self
            .query_tasks(
                &sql,
                vec![text(name), text(project_id), text(description), text(procedure)],
            )
            .await?
            .into_iter()
            .next())
    }

    async fn update_task(&self, task: &Task) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                &format!("UPDATE tasks SET {UPDATE_SET} WHERE id = ?1"),
                libsql::params_from_iter(task_values(task)),
            )
            .await
            .map_err(|e| write_err(e, DUPLICATE))?;
        Ok(changed > 0)
    }

    async fn delete_task(&self, id: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute("DELETE FROM tasks WHERE id = ?1", libsql::params![id])
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn status_counts(&self) -> Result<Vec<StatusCount>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT status, COUNT(*) FROM tasks GROUP BY status ORDER BY status",
                (),
            )
            .await
            .map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(StatusCount {
                status: get_text(&row, 0)?,
                count: get_count(&row, 1)?,
            });
        }
        Ok(out)
    }

    async fn project_task_counts(&self) -> Result<Vec<ProjectTaskCount>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT p.name, COUNT(t.id) FROM tasks t
                 JOIN projects p ON p.id = t.project_id
                 GROUP BY p.id ORDER BY p.name",
                (),
            )
            .await
            .map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(ProjectTaskCount {
                name: get_text(&row, 0)?,
                task_count: get_count(&row, 1)?,
            });
        }
        Ok(out)
    }
}
