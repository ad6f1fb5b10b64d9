use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::models::history::HistoryEntry;

/// Everything a caller supplies when creating or replacing an employee.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeData {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub department_id: i64,
    pub active: bool,
    pub avatar: Option<String>,
}

/// An employee joined with its current department and hire date.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub active: bool,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    // earliest start_date across the employee's history
    pub hire_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWithHistory {
    #[serde(flatten)]
    pub employee: Employee,
    pub history: Vec<HistoryEntry>,
}
