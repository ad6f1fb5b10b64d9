use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// One department-assignment interval of an employee.
///
/// Rows are only appended; the single mutable field is `end_date`, which is
/// set when the employee moves to another department. An open row
/// (`end_date == None`) is the employee's current assignment.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub employee_id: i64,
    pub department_id: i64,
    // None once the department itself has been removed
    pub department_name: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Where an employee currently sits, as read from its open history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Unassigned,
    Department(i64),
}

impl Assignment {
    pub fn department_id(self) -> Option<i64> {
        match self {
            Assignment::Unassigned => None,
            Assignment::Department(id) => Some(id),
        }
    }
}

impl From<Option<i64>> for Assignment {
    fn from(department_id: Option<i64>) -> Self {
        department_id.map_or(Assignment::Unassigned, Assignment::Department)
    }
}
