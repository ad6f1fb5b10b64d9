use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use crate::models::department::Department;
use crate::models::employee::{Employee, EmployeeData};
use crate::models::history::{Assignment, HistoryEntry};
use crate::store::{Statement, Store, StoreError, Transaction};

#[derive(Debug, Clone)]
struct EmployeeRow {
    first_name: String,
    last_name: String,
    phone: String,
    address: String,
    active: bool,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct HistoryRow {
    id: i64,
    employee_id: i64,
    department_id: i64,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    employees: BTreeMap<i64, EmployeeRow>,
    history: Vec<HistoryRow>,
    departments: BTreeMap<i64, String>,
    last_employee_id: i64,
    last_history_id: i64,
    last_department_id: i64,
    rejected: HashSet<Statement>,
}

impl Tables {
    fn open_row(&self, employee_id: i64) -> Option<&HistoryRow> {
        self.history
            .iter()
            .filter(|row| row.employee_id == employee_id && row.end_date.is_none())
            .max_by_key(|row| row.start_date)
    }

    fn view(&self, id: i64, row: &EmployeeRow) -> Employee {
        let department_id = self.open_row(id).map(|open| open.department_id);
        let hire_date = self
            .history
            .iter()
            .filter(|h| h.employee_id == id)
            .map(|h| h.start_date)
            .min();

        Employee {
            id,
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            phone: row.phone.clone(),
            address: row.address.clone(),
            active: row.active,
            avatar: row.avatar.clone(),
            created_at: row.created_at,
            department_id,
            department_name: department_id.and_then(|d| self.departments.get(&d).cloned()),
            hire_date,
        }
    }
}

/// Store kept entirely in process memory.
///
/// A transaction holds the store lock for its whole lifetime and works on a
/// copy of the tables that replaces the shared state on commit, so
/// transactions are serialized and a dropped transaction leaves no trace.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later execution of `statement` fail with
    /// [`StoreError::Rejected`].
    pub async fn reject(&self, statement: Statement) {
        self.tables.lock().await.rejected.insert(statement);
    }

    pub async fn accept(&self, statement: Statement) {
        self.tables.lock().await.rejected.remove(&statement);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        if guard.rejected.contains(&Statement::Begin) {
            return Err(StoreError::Rejected(Statement::Begin));
        }
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl MemoryTransaction {
    fn check(&self, statement: Statement) -> Result<(), StoreError> {
        if self.working.rejected.contains(&statement) {
            Err(StoreError::Rejected(statement))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn employees(&mut self) -> Result<Vec<Employee>, StoreError> {
        self.check(Statement::SelectEmployees)?;
        let tables = &self.working;
        Ok(tables
            .employees
            .iter()
            .filter(|(id, _)| tables.open_row(**id).is_some())
            .map(|(id, row)| tables.view(*id, row))
            .collect())
    }

    async fn employee(&mut self, id: i64) -> Result<Option<Employee>, StoreError> {
        self.check(Statement::SelectEmployee)?;
        let tables = &self.working;
        Ok(tables.employees.get(&id).map(|row| tables.view(id, row)))
    }

    async fn history(&mut self, employee_id: i64) -> Result<Vec<HistoryEntry>, StoreError> {
        self.check(Statement::SelectHistory)?;
        let tables = &self.working;
        let mut entries: Vec<HistoryEntry> = tables
            .history
            .iter()
            .filter(|row| row.employee_id == employee_id)
            .map(|row| HistoryEntry {
                id: row.id,
                employee_id: row.employee_id,
                department_id: row.department_id,
                department_name: tables.departments.get(&row.department_id).cloned(),
                start_date: row.start_date,
                end_date: row.end_date,
            })
            .collect();
        entries.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn current_assignment(&mut self, employee_id: i64) -> Result<Option<Assignment>, StoreError> {
        self.check(Statement::SelectCurrentAssignment)?;
        let tables = &self.working;
        if !tables.employees.contains_key(&employee_id) {
            return Ok(None);
        }
        Ok(Some(Assignment::from(
            tables.open_row(employee_id).map(|row| row.department_id),
        )))
    }

    async fn insert_employee(&mut self, data: &EmployeeData, created_at: DateTime<Utc>) -> Result<i64, StoreError> {
        self.check(Statement::InsertEmployee)?;
        let tables = &mut self.working;
        tables.last_employee_id += 1;
        let id = tables.last_employee_id;
        tables.employees.insert(
            id,
            EmployeeRow {
                first_name: data.first_name.clone(),
                last_name: data.last_name.clone(),
                phone: data.phone.clone(),
                address: data.address.clone(),
                active: data.active,
                avatar: data.avatar.clone(),
                created_at,
            },
        );
        Ok(id)
    }

    async fn insert_history(
        &mut self,
        employee_id: i64,
        department_id: i64,
        start_date: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.check(Statement::InsertHistory)?;
        let tables = &mut self.working;
        // employee_history.employee_id references employees
        if !tables.employees.contains_key(&employee_id) {
            return Err(StoreError::Rejected(Statement::InsertHistory));
        }
        tables.last_history_id += 1;
        tables.history.push(HistoryRow {
            id: tables.last_history_id,
            employee_id,
            department_id,
            start_date,
            end_date: None,
        });
        Ok(1)
    }

    async fn update_employee(&mut self, id: i64, data: &EmployeeData) -> Result<u64, StoreError> {
        self.check(Statement::UpdateEmployee)?;
        let Some(row) = self.working.employees.get_mut(&id) else {
            return Ok(0);
        };
        row.first_name = data.first_name.clone();
        row.last_name = data.last_name.clone();
        row.phone = data.phone.clone();
        row.address = data.address.clone();
        row.active = data.active;
        if let Some(avatar) = &data.avatar {
            row.avatar = Some(avatar.clone());
        }
        Ok(1)
    }

    async fn close_open_history(&mut self, employee_id: i64, end_date: DateTime<Utc>) -> Result<u64, StoreError> {
        self.check(Statement::CloseOpenHistory)?;
        let mut closed = 0;
        for row in self
            .working
            .history
            .iter_mut()
            .filter(|row| row.employee_id == employee_id && row.end_date.is_none())
        {
            row.end_date = Some(end_date);
            closed += 1;
        }
        Ok(closed)
    }

    async fn delete_history(&mut self, employee_id: i64) -> Result<u64, StoreError> {
        self.check(Statement::DeleteHistory)?;
        let before = self.working.history.len();
        self.working.history.retain(|row| row.employee_id != employee_id);
        Ok((before - self.working.history.len()) as u64)
    }

    async fn delete_employee(&mut self, id: i64) -> Result<u64, StoreError> {
        self.check(Statement::DeleteEmployee)?;
        let tables = &mut self.working;
        if tables.history.iter().any(|row| row.employee_id == id) {
            return Err(StoreError::Rejected(Statement::DeleteEmployee));
        }
        Ok(u64::from(tables.employees.remove(&id).is_some()))
    }

    async fn departments(&mut self) -> Result<Vec<Department>, StoreError> {
        self.check(Statement::SelectDepartments)?;
        Ok(self
            .working
            .departments
            .iter()
            .map(|(id, name)| Department { id: *id, name: name.clone() })
            .collect())
    }

    async fn insert_department(&mut self, name: &str) -> Result<i64, StoreError> {
        self.check(Statement::InsertDepartment)?;
        let tables = &mut self.working;
        tables.last_department_id += 1;
        tables.departments.insert(tables.last_department_id, name.to_string());
        Ok(tables.last_department_id)
    }

    async fn rename_department(&mut self, id: i64, name: &str) -> Result<u64, StoreError> {
        self.check(Statement::UpdateDepartment)?;
        match self.working.departments.get_mut(&id) {
            Some(current) => {
                *current = name.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_department(&mut self, id: i64) -> Result<u64, StoreError> {
        self.check(Statement::DeleteDepartment)?;
        Ok(u64::from(self.working.departments.remove(&id).is_some()))
    }

    async fn count_assigned(&mut self, department_id: i64) -> Result<i64, StoreError> {
        self.check(Statement::CountAssigned)?;
        let count = self
            .working
            .history
            .iter()
            .filter(|row| row.department_id == department_id && row.end_date.is_none())
            .count();
        Ok(count as i64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.check(Statement::Commit)?;
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
