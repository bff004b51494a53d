//! Employee CRUD and headcount.

use super::{normalize_email, present, require_admin};
use crate::domain::{Department, DepartmentRef, DomainError, Employee, EmployeeView, Principal};
use crate::ports::{DepartmentRepo, EmployeeRepo};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Body of create/update requests. `id` is only read by `PUT /employee/update`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub telephone_no: Option<String>,
    #[serde(rename = "departmentId")]
    pub department_id: Option<String>,
}

struct ValidEmployee {
    name: String,
    email: String,
    telephone_no: String,
    department: Department,
}

pub struct EmployeeService {
    employees: Arc<dyn EmployeeRepo>,
    departments: Arc<dyn DepartmentRepo>,
}

impl EmployeeService {
    pub fn new(employees: Arc<dyn EmployeeRepo>, departments: Arc<dyn DepartmentRepo>) -> Self {
        Self {
            employees,
            departments,
        }
    }

    async fn validate(&self, input: &EmployeeInput) -> Result<ValidEmployee, DomainError> {
        let (Some(name), Some(email), Some(telephone_no), Some(department_id)) = (
            present(&input.name),
            present(&input.email),
            present(&input.telephone_no),
            present(&input.department_id),
        ) else {
            return Err(DomainError::validation("All fields are required"));
        };
        let department = self
            .departments
            .find_department(&department_id)
            .await?
            .ok_or_else(|| DomainError::validation("Invalid department"))?;
        Ok(ValidEmployee {
            name,
            email: normalize_email(&email),
            telephone_no,
            department,
        })
    }

    fn view(employee: Employee, department: Option<&Department>) -> EmployeeView {
        EmployeeView {
            department_ref: department.map(|d| DepartmentRef {
                id: d.id.clone(),
                name: d.name.clone(),
            }),
            employee,
        }
    }

    pub async fn create(&self, input: EmployeeInput) -> Result<EmployeeView, DomainError> {
        let valid = self.validate(&input).await?;
        let now = Utc::now();
        let employee = Employee {
            id: super::new_id(),
            name: valid.name,
            email: valid.email,
            telephone_no: valid.telephone_no,
            department_id: Some(valid.department.id.clone()),
            department: valid.department.name.clone(),
            created_at: now,
            updated_at: now,
        };
        self.employees.insert_employee(&employee).await?;
        info!(employee_id = %employee.id, "employee created");
        Ok(Self::view(employee, Some(&valid.department)))
    }

    /// Employees with their department's `{_id, name}`.
    pub async fn list(&self) -> Result<Vec<EmployeeView>, DomainError> {
        let departments: HashMap<String, Department> = self
            .departments
            .list_departments()
            .await?
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        Ok(self
            .employees
            .list_employees()
            .await?
            .into_iter()
            .map(|e| {
                let dept = e.department_id.as_ref().and_then(|id| departments.get(id));
                Self::view(e, dept)
            })
            .collect())
    }

    pub async fn update(&self, id: &str, input: EmployeeInput) -> Result<EmployeeView, DomainError> {
        let valid = self.validate(&input).await?;
        let mut employee = self
            .employees
            .find_employee(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Employee not found"))?;
        employee.name = valid.name;
        employee.email = valid.email;
        employee.telephone_no = valid.telephone_no;
        employee.department_id = Some(valid.department.id.clone());
        employee.department = valid.department.name.clone();
        employee.updated_at = Utc::now();
        if !self.employees.update_employee(&employee).await? {
            return Err(DomainError::not_found("Employee not found"));
        }
        info!(employee_id = %employee.id, "employee updated");
        Ok(Self::view(employee, Some(&valid.department)))
    }

    pub async fn delete(&self, caller: &Principal, id: &str) -> Result<(), DomainError> {
        require_admin(caller)?;
        if !self.employees.delete_employee(id).await? {
            return Err(DomainError::not_found("Employee not found"));
        }
        info!(employee_id = %id, "employee deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, DomainError> {
        self.employees.count_employees().await
    }
}
