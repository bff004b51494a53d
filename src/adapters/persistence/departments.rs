//! `departments` table.

use super::rows::{get_datetime, repo_err, text, timestamp, write_err};
use super::sqlite_repo::SqliteRepo;
use crate::domain::{Department, DomainError};
use crate::ports::DepartmentRepo;

const SELECT_COLS: &str = "id, name, created_at, updated_at";
const DUPLICATE: &str = "Department already exists";

fn row_to_department(row: &libsql::Row) -> Result<Department, DomainError> {
    Ok(Department {
        id: row.get(0).map_err(repo_err)?,
        name: row.get(1).map_err(repo_err)?,
        created_at: get_datetime(row, 2)?,
        updated_at: get_datetime(row, 3)?,
    })
}

impl SqliteRepo {
    async fn query_departments(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<Department>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(sql, libsql::params_from_iter(params))
            .await
            .map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(row_to_department(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl DepartmentRepo for SqliteRepo {
    async fn insert_department(&self, department: &Department) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            &format!("INSERT INTO departments ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4)"),
            libsql::params_from_iter(vec![
                text(&department.id),
                text(&department.name),
                timestamp(&department.created_at),
                timestamp(&department.updated_at),
            ]),
        )
        .await
        .map_err(|e| write_err(e, DUPLICATE))?;
        Ok(())
    }

    async fn find_department(&self, id: &str) -> Result<Option<Department>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM departments WHERE id = ?1");
        Ok(self
            .query_departments(&sql, vec![text(id)])
            .await?
            .into_iter()
            .next())
    }

    async fn find_department_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Department>, DomainError> {
        // name is COLLATE NOCASE
        let sql = format!("SELECT {SELECT_COLS} FROM departments WHERE name = ?1");
        Ok(self
            .query_departments(&sql, vec![text(name.trim())])
            .await?
            .into_iter()
            .next())
    }

    async fn list_departments(&self) -> Result<Vec<Department>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM departments ORDER BY name");
        self.query_departments(&sql, Vec::new()).await
    }

    async fn update_department(&self, department: &Department) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(repo_err)?;
        let changed = tx
            .execute(
                "UPDATE departments SET name = ?2, updated_at = ?3 WHERE id = ?1",
                libsql::params_from_iter(vec![
                    text(&department.id),
                    text(&department.name),
                    timestamp(&department.updated_at),
                ]),
            )
            .await
            .map_err(|e| write_err(e, DUPLICATE))?;
        if changed == 0 {
            return Ok(false);
        }
        tx.execute(
            "UPDATE employees SET department = ?2 WHERE department_id = ?1",
            libsql::params![department.id.as_str(), department.name.as_str()],
        )
        .await
        .map_err(repo_err)?;
        tx.commit().await.map_err(repo_err)?;
        Ok(true)
    }

    async fn delete_department(&self, id: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute("DELETE FROM departments WHERE id = ?1", libsql::params![id])
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }
}
