//! `projects` and `project_team` tables.

use super::rows::{get_datetime, get_opt_string, get_text, opt_text, repo_err, text, timestamp, write_err};
use super::sqlite_repo::SqliteRepo;
use crate::domain::{DomainError, Project};
use crate::ports::ProjectRepo;
use std::collections::HashMap;

const SELECT_COLS: &str =
    "id, name, description, contact_person, assigned_to, created_at, updated_at";
const DUPLICATE: &str = "Project with this name already exists";

fn row_to_project(row: &libsql::Row) -> Result<Project, DomainError> {
    Ok(Project {
        id: row.get(0).map_err(repo_err)?,
        name: row.get(1).map_err(repo_err)?,
        description: get_text(row, 2)?,
        contact_person: get_opt_string(row, 3)?,
        assigned_to: get_opt_string(row, 4)?,
        functional_team: Vec::new(),
        created_at: get_datetime(row, 5)?,
        updated_at: get_datetime(row, 6)?,
    })
}

impl SqliteRepo {
    /// Load projects and attach their functional teams.
    async fn query_projects(
        &self,
        sql: &str,
        params: Vec<libsql::Value>,
    ) -> Result<Vec<Project>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(sql, libsql::params_from_iter(params))
            .await
            .map_err(repo_err)?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            projects.push(row_to_project(&row)?);
        }
        if projects.is_empty() {
            return Ok(projects);
        }

        let mut teams: HashMap<String, Vec<String>> = HashMap::new();
        let mut rows = conn
            .query(
                "SELECT project_id, employee_id FROM project_team ORDER BY rowid",
                (),
            )
            .await
            .map_err(repo_err)?;
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            let project_id: String = row.get(0).map_err(repo_err)?;
            let employee_id: String = row.get(1).map_err(repo_err)?;
            teams.entry(project_id).or_default().push(employee_id);
        }
        for p in &mut projects {
            p.functional_team = teams.remove(&p.id).unwrap_or_default();
        }
        Ok(projects)
    }
}

#[async_trait::async_trait]
impl ProjectRepo for SqliteRepo {
    async fn insert_project(&self, project: &Project) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(repo_err)?;
        tx.execute(
            &format!("INSERT INTO projects ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            libsql::params_from_iter(vec![
                text(&project.id),
                text(&project.name),
                text(&project.description),
                opt_text(project.contact_person.as_deref()),
                opt_text(project.assigned_to.as_deref()),
                timestamp(&project.created_at),
                timestamp(&project.updated_at),
            ]),
        )
        .await
        .map_err(|e| write_err(e, DUPLICATE))?;
        for member in &project.functional_team {
            tx.execute(
                "INSERT OR IGNORE INTO project_team (project_id, employee_id) VALUES (?1, ?2)",
                libsql::params![project.id.as_str(), member.as_str()],
            )
            .await
            .map_err(repo_err)?;
        }
        tx.commit().await.map_err(repo_err)?;
        Ok(())
    }

    async fn find_project(&self, id: &str) -> Result<Option<Project>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1");
        Ok(self
            .query_projects(&sql, vec![text(id)])
            .await?
            .into_iter()
            .next())
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, DomainError> {
        // name is COLLATE NOCASE
        let sql = format!("SELECT {SELECT_COLS} FROM projects WHERE name = ?1");
        Ok(self
            .query_projects(&sql, vec![text(name.trim())])
            .await?
            .into_iter()
            .next())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, DomainError> {
        let sql = format!("SELECT {SELECT_COLS} FROM projects ORDER BY created_at");
        self.query_projects(&sql, Vec::new()).await
    }

    async fn update_project(&self, project: &Project) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE projects SET name = ?2, description = ?3, contact_person = ?4,
                 assigned_to = ?5, updated_at = ?6
                 WHERE id = ?1",
                libsql::params_from_iter(vec![
                    text(&project.id),
                    text(&project.name),
                    text(&project.description),
                    opt_text(project.contact_person.as_deref()),
                    opt_text(project.assigned_to.as_deref()),
                    timestamp(&project.updated_at),
                ]),
            )
            .await
            .map_err(|e| write_err(e, DUPLICATE))?;
        Ok(changed > 0)
    }

    async fn delete_project(&self, id: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute("DELETE FROM projects WHERE id = ?1", libsql::params![id])
            .await
            .map_err(repo_err)?;
        Ok(changed > 0)
    }

    async fn add_team_member(
        &self,
        project_id: &str,
        employee_id: &str,
    ) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT OR IGNORE INTO project_team (project_id, employee_id) VALUES (?1, ?2)",
            libsql::params![project_id, employee_id],
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::sqlite_repo::test_support::{employee, project, task, test_repo, ticket};
    use crate::domain::DomainError;
    use crate::ports::{EmployeeRepo, ProjectRepo, TaskRepo, TicketRepo};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_team_membership_is_idempotent() {
        let (repo, _dir) = test_repo().await;
        repo.insert_employee(&employee("e1", "Ann", None)).await.unwrap();
        repo.insert_employee(&employee("e2", "Bob", None)).await.unwrap();
        repo.insert_project(&project("p1", "Apollo", None)).await.unwrap();

        repo.add_team_member("p1", "e1").await.unwrap();
        repo.add_team_member("p1", "e2").await.unwrap();
        repo.add_team_member("p1", "e1").await.unwrap();

        let p = repo.find_project("p1").await.unwrap().unwrap();
        assert_eq!(p.functional_team, vec!["e1".to_string(), "e2".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let (repo, _dir) = test_repo().await;
        repo.insert_project(&project("p1", "Apollo", None)).await.unwrap();
        let err = repo
            .insert_project(&project("p2", "apollo", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(repo.find_project_by_name("APOLLO").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_cascades_tasks_and_unlinks_tickets() {
        let (repo, _dir) = test_repo().await;
        repo.insert_project(&project("p1", "Apollo", None)).await.unwrap();
        repo.insert_task(&task("t1", "Build", "p1")).await.unwrap();
        let mut tk = ticket("k1", "Bug");
        tk.project_id = Some("p1".into());
        repo.insert_ticket(&tk).await.unwrap();

        assert!(repo.delete_project("p1").await.unwrap());
        assert!(repo.find_task("t1").await.unwrap().is_none());
        let tk = repo.find_ticket("k1").await.unwrap().unwrap();
        assert_eq!(tk.project_id, None);
        assert!(!repo.delete_project("p1").await.unwrap());
    }
}
