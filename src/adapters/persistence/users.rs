//! `users` table.

use super::rows::{get_count, get_datetime, get_enum, repo_err, text, timestamp, write_err};
use super::sqlite_repo::SqliteRepo;
use crate::domain::{DomainError, User};
use crate::ports::UserRepo;

const SELECT_COLS: &str = "id, name, email, password_hash, role, created_at, updated_at";

fn row_to_user(row: &libsql::Row) -> Result<User, DomainError> {
    Ok(User {
        id: row.get(0).map_err(repo_err)?,
        name: row.get(1).map_err(repo_err)?,
        email: row.get(2).map_err(repo_err)?,
        password_hash: row.get(3).map_err(repo_err)?,
        role: get_enum(row, 4)?,
        created_at: get_datetime(row, 5)?,
        updated_at: get_datetime(row, 6)?,
    })
}

impl SqliteRepo {
    async fn query_users(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<User>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(sql, libsql::params_from_iter(params))
            .await
            .map_err(repo_err)?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }
}

#[async_trait::async_trait]
impl UserRepo for SqliteRepo {
    async fn insert_user(&self, user: &User) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            &format!("INSERT INTO users ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            libsql::params_from_iter(vec![
                text(&user.id),
                text(&user.name),
                text(&user.email),
                text(&user.password_hash),
                text(user.role.as_str()),
                timestamp(&user.created_at),
                timestamp(&user.updated_at),
            ]),
        )
        .await
        .map_err(|e| write_err(e, "User already exists"))?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM users WHERE email = ?1");
        Ok(self.query_users(&sql, vec![text(email)]).await?.into_iter().next())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM users WHERE id = ?1");
        Ok(self.query_users(&sql, vec![text(id)]).await?.into_iter().next())
    }

    async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM users ORDER BY created_at");
        self.query_users(&sql, Vec::new()).await
    }

    async fn count_users(&self) -> Result<u64, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM users", ())
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => get_count(&row, 0),
            None => Ok(0),
        }
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
                libsql::params![id, password_hash, chrono::Utc::now().to_rfc3339()],
            )
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }
}
