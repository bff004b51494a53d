//! Department CRUD. Mutations are admin-only.

use super::{present, require_admin};
use crate::domain::{Department, DepartmentWithEmployees, DomainError, Principal};
use crate::ports::{DepartmentRepo, EmployeeRepo};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct DepartmentService {
    departments: Arc<dyn DepartmentRepo>,
    employees: Arc<dyn EmployeeRepo>,
}

impl DepartmentService {
    pub fn new(departments: Arc<dyn DepartmentRepo>, employees: Arc<dyn EmployeeRepo>) -> Self {
        Self {
            departments,
            employees,
        }
    }

    pub async fn create(
        &self,
        caller: &Principal,
        name: Option<String>,
    ) -> Result<Department, DomainError> {
        require_admin(caller)?;
        let name =
            present(&name).ok_or_else(|| DomainError::validation("Department name is required"))?;
        let now = Utc::now();
        let department = Department {
            id: super::new_id(),
            name,
            created_at: now,
            updated_at: now,
        };
        self.departments.insert_department(&department).await?;
        info!(department_id = %department.id, name = %department.name, "department created");
        Ok(department)
    }

    /// Every department with its employees embedded.
    pub async fn list_with_employees(&self) -> Result<Vec<DepartmentWithEmployees>, DomainError> {
        let departments = self.departments.list_departments().await?;
        let employees = self.employees.list_employees().await?;
        Ok(departments
            .into_iter()
            .map(|department| {
                let members = employees
                    .iter()
                    .filter(|e| e.department_id.as_deref() == Some(department.id.as_str()))
                    .cloned()
                    .collect();
                DepartmentWithEmployees {
                    department,
                    employees: members,
                }
            })
            .collect())
    }

    pub async fn update(
        &self,
        caller: &Principal,
        id: &str,
        name: Option<String>,
    ) -> Result<Department, DomainError> {
        require_admin(caller)?;
        let name = present(&name).ok_or_else(|| DomainError::validation("Name is required"))?;
        let mut department = self
            .departments
            .find_department(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Department not found"))?;
        department.name = name;
        department.updated_at = Utc::now();
        if !self.departments.update_department(&department).await? {
            return Err(DomainError::not_found("Department not found"));
        }
        info!(department_id = %department.id, name = %department.name, "department renamed");
        Ok(department)
    }

    pub async fn delete(&self, caller: &Principal, id: &str) -> Result<(), DomainError> {
        require_admin(caller)?;
        if !self.departments.delete_department(id).await? {
            return Err(DomainError::not_found("Department not found"));
        }
        info!(department_id = %id, "department deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::employee_service::{EmployeeInput, EmployeeService};
    use crate::usecases::test_support::{admin, fixture, member};

    #[tokio::test]
    async fn test_crud_with_embedded_employees() {
        let fx = fixture().await;
        let svc = DepartmentService::new(fx.repo.clone(), fx.repo.clone());
        let employees = EmployeeService::new(fx.repo.clone(), fx.repo.clone());

        let qa = svc.create(&admin(), Some(" QA ".into())).await.unwrap();
        assert_eq!(qa.name, "QA");
        svc.create(&admin(), Some("Finance".into())).await.unwrap();
        employees
            .create(EmployeeInput {
                name: Some("Ann".into()),
                email: Some("ann@example.com".into()),
                telephone_no: Some("555".into()),
                department_id: Some(qa.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        let listed = svc.list_with_employees().await.unwrap();
        let qa_entry = listed.iter().find(|d| d.department.id == qa.id).unwrap();
        assert_eq!(qa_entry.employees.len(), 1);

        let renamed = svc
            .update(&admin(), &qa.id, Some("Quality".into()))
            .await
            .unwrap();
        assert_eq!(renamed.name, "Quality");
        svc.delete(&admin(), &qa.id).await.unwrap();
        let err = svc.delete(&admin(), &qa.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mutations_require_admin_and_name() {
        let fx = fixture().await;
        let svc = DepartmentService::new(fx.repo.clone(), fx.repo.clone());
        let err = svc
            .create(&member("ann@example.com"), Some("QA".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        let err = svc.create(&admin(), Some("  ".into())).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        svc.create(&admin(), Some("QA".into())).await.unwrap();
        let err = svc.create(&admin(), Some("qa".into())).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let err = svc
            .update(&admin(), "missing", Some("X".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
