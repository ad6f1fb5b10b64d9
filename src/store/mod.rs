//! Storage access for the HR records.
//!
//! Every read and write goes through a [`Transaction`] opened with
//! [`Store::begin`]. Writes become visible only after `commit`; dropping a
//! transaction without committing discards them.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use crate::models::department::Department;
use crate::models::employee::{Employee, EmployeeData};
use crate::models::history::{Assignment, HistoryEntry};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// The statements a transaction can issue. Failures are tagged with the
/// statement that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {
    Begin,
    Commit,
    SelectEmployees,
    SelectEmployee,
    SelectHistory,
    SelectCurrentAssignment,
    InsertEmployee,
    InsertHistory,
    UpdateEmployee,
    CloseOpenHistory,
    DeleteHistory,
    DeleteEmployee,
    SelectDepartments,
    InsertDepartment,
    UpdateDepartment,
    DeleteDepartment,
    CountAssigned,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Statement::Begin => "BEGIN",
            Statement::Commit => "COMMIT",
            Statement::SelectEmployees => "SELECT employees with current department",
            Statement::SelectEmployee => "SELECT employee by id",
            Statement::SelectHistory => "SELECT employee_history by employee",
            Statement::SelectCurrentAssignment => "SELECT current department",
            Statement::InsertEmployee => "INSERT INTO employees",
            Statement::InsertHistory => "INSERT INTO employee_history",
            Statement::UpdateEmployee => "UPDATE employees",
            Statement::CloseOpenHistory => "UPDATE employee_history SET end_date",
            Statement::DeleteHistory => "DELETE FROM employee_history",
            Statement::DeleteEmployee => "DELETE FROM employees",
            Statement::SelectDepartments => "SELECT departments",
            Statement::InsertDepartment => "INSERT INTO departments",
            Statement::UpdateDepartment => "UPDATE departments",
            Statement::DeleteDepartment => "DELETE FROM departments",
            Statement::CountAssigned => "SELECT COUNT open assignments",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{statement} failed: {source}")]
    Database {
        statement: Statement,
        #[source]
        source: sqlx::Error,
    },
    #[error("{0} was rejected by the store")]
    Rejected(Statement),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;
}

/// A unit of work against the store.
#[async_trait]
pub trait Transaction: Send {
    /// Employees holding an open history row, ordered by id.
    async fn employees(&mut self) -> Result<Vec<Employee>, StoreError>;

    /// A single employee, whether or not it holds an open history row.
    async fn employee(&mut self, id: i64) -> Result<Option<Employee>, StoreError>;

    /// All history rows of an employee, most recent start first.
    async fn history(&mut self, employee_id: i64) -> Result<Vec<HistoryEntry>, StoreError>;

    /// `None` when the employee does not exist.
    async fn current_assignment(&mut self, employee_id: i64) -> Result<Option<Assignment>, StoreError>;

    async fn insert_employee(&mut self, data: &EmployeeData, created_at: DateTime<Utc>) -> Result<i64, StoreError>;

    async fn insert_history(
        &mut self,
        employee_id: i64,
        department_id: i64,
        start_date: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Replaces the employee's fields. The avatar is only replaced when
    /// `data.avatar` is set.
    async fn update_employee(&mut self, id: i64, data: &EmployeeData) -> Result<u64, StoreError>;

    async fn close_open_history(&mut self, employee_id: i64, end_date: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn delete_history(&mut self, employee_id: i64) -> Result<u64, StoreError>;

    async fn delete_employee(&mut self, id: i64) -> Result<u64, StoreError>;

    async fn departments(&mut self) -> Result<Vec<Department>, StoreError>;

    async fn insert_department(&mut self, name: &str) -> Result<i64, StoreError>;

    async fn rename_department(&mut self, id: i64, name: &str) -> Result<u64, StoreError>;

    async fn delete_department(&mut self, id: i64) -> Result<u64, StoreError>;

    /// Number of open history rows pointing at the department.
    async fn count_assigned(&mut self, department_id: i64) -> Result<i64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
