//! `employees` table.

use super::rows::{
    get_count, get_datetime, get_opt_string, get_text, opt_text, repo_err, text, timestamp,
    write_err,
};
use super::sqlite_repo::SqliteRepo;
use crate::domain::{DepartmentHeadcount, DomainError, Employee};
use crate::ports::EmployeeRepo;

const SELECT_COLS: &str =
    "id, name, email, telephone_no, department_id, department, created_at, updated_at";
const DUPLICATE: &str = "Employee with this email already exists";

fn row_to_employee(row: &libsql::Row) -> Result<Employee, DomainError> {
    Ok(Employee {
        id: row.get(0).map_err(repo_err)?,
        name: row.get(1).map_err(repo_err)?,
        email: row.get(2).map_err(repo_err)?,
        telephone_no: get_text(row, 3)?,
        department_id: get_opt_string(row, 4)?,
        department: get_text(row, 5)?,
        created_at: get_datetime(row, 6)?,
        updated_at: get_datetime(row, 7)?,
    })
}

fn employee_values(e: &Employee) -> Vec<libsql::Value> {
    vec![
        text(&e.id),
        text(&e.name),
        text(&e.email),
        text(&e.telephone_no),
        opt_text(e.department_id.as_deref()),
        text(&e.department),
        timestamp(&e.created_at),
        timestamp(&e.updated_at),
    ]
}

impl SqliteRepo {
    async fn query_employees(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<Employee>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(sql, libsql::params_from_iter(params))
            .await
            .map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(row_to_employee(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl EmployeeRepo for SqliteRepo {
    async fn insert_employee(&self, employee: &Employee) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            &format!("INSERT INTO employees ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            libsql::params_from_iter(employee_values(employee)),
        )
        .await
        .map_err(|e| write_err(e, DUPLICATE))?;
        Ok(())
    }

    async fn find_employee(&self, id: &str) -> Result<Option<Employee>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM employees WHERE id = ?1");
        Ok(self
            .query_employees(&sql, vec![text(id)])
            .await?
            .into_iter()
            .next())
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM employees WHERE email = ?1");
        Ok(self
            .query_employees(&sql, vec![text(email)])
            .await?
            .into_iter()
            .next())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM employees ORDER BY name");
        self.query_employees(&sql, Vec::new()).await
    }

    async fn update_employee(&self, employee: &Employee) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE employees SET name = ?2, email = ?3, telephone_no = ?4,
                 department_id = ?5, department = ?6, updated_at = ?8
                 WHERE id = ?1",
                libsql::params_from_iter(employee_values(employee)),
            )
            .await
            .map_err(|e| write_err(e, DUPLICATE))?;
        Ok(changed > 0)
    }

    async fn delete_employee(&self, id: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute("DELETE FROM employees WHERE id = ?1", libsql::params![id])
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn count_employees(&self) -> Result<u64, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM employees", ())
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => get_count(&row, 0),
            None => Ok(0),
        }
    }

    async fn headcount_by_department(&self) -> Result<Vec<DepartmentHeadcount>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT department, COUNT(*) FROM employees GROUP BY department ORDER BY department",
                (),
            )
            .await
            .map_err(repo_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            out.push(DepartmentHeadcount {
                department: get_text(&row, 0)?,
                employee_count: get_count(&row, 1)?,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
impl SqliteRepo {
    /// Case-insensitive, whitespace-trimmed name lookup; oldest match wins.
    pub(crate) async fn find_employee_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Employee>, DomainError> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM employees
             WHERE lower(trim(name)) = lower(trim(?1))
             ORDER BY created_at LIMIT 1"
        );
        Ok(self
            .query_employees(&sql, vec![text(name)])
            .await?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::super::sqlite_repo::test_support::{
        department, employee, project, task, test_repo,
    };
    use crate::domain::{DepartmentHeadcount, DomainError};
    use crate::ports::{DepartmentRepo, EmployeeRepo, ProjectRepo, TaskRepo};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (repo, _dir) = test_repo().await;
        repo.insert_employee(&employee("e1", "Ann", None)).await.unwrap();
        let mut dup = employee("e2", "Other", None);
        dup.email = "e1@example.com".into();
        let err = repo.insert_employee(&dup).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_by_name_ignores_case_and_padding() {
        let (repo, _dir) = test_repo().await;
        repo.insert_employee(&employee("e1", "Jane Doe", None))
            .await
            .unwrap();
        let found = repo.find_employee_by_name("  JANE doe ").await.unwrap();
        assert_eq!(found.map(|e| e.id), Some("e1".to_string()));
    }

    #[tokio::test]
    async fn test_delete_clears_references() {
        let (repo, _dir) = test_repo().await;
        repo.insert_employee(&employee("e1", "Ann", None)).await.unwrap();
        repo.insert_project(&project("p1", "Apollo", Some("e1")))
            .await
            .unwrap();
        repo.add_team_member("p1", "e1").await.unwrap();
        let mut t = task("t1", "Build", "p1");
        t.assigned_to = Some("e1".into());
        t.contact_person = Some("e1".into());
        repo.insert_task(&t).await.unwrap();

        assert!(repo.delete_employee("e1").await.unwrap());

        let p = repo.find_project("p1").await.unwrap().unwrap();
        assert_eq!(p.contact_person, None);
        assert!(p.functional_team.is_empty());
        let t = repo.find_task("t1").await.unwrap().unwrap();
        assert_eq!(t.assigned_to, None);
        assert_eq!(t.contact_person, None);
    }

    #[tokio::test]
    async fn test_headcount_by_department() {
        let (repo, _dir) = test_repo().await;
        let qa = department("d1", "QA");
        repo.insert_department(&qa).await.unwrap();
        repo.insert_employee(&employee("e1", "Ann", Some(&qa))).await.unwrap();
        repo.insert_employee(&employee("e2", "Bob", Some(&qa))).await.unwrap();
        assert_eq!(
            repo.headcount_by_department().await.unwrap(),
            vec![DepartmentHeadcount {
                department: "QA".into(),
                employee_count: 2
            }]
        );
        assert_eq!(repo.count_employees().await.unwrap(), 2);
    }
}
