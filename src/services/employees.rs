//! Employee lifecycle: every read or write of an employee together with its
//! department history ledger.
//!
//! Ledger rules upheld here:
//! - an employee holds at most one open history row (`end_date` unset);
//! - creating an employee opens exactly one row for its first department;
//! - a department change closes the open row and appends a new one, earlier
//!   rows are never rewritten;
//! - deleting an employee removes its history rows before the employee row.
//!
//! Each operation runs in a single store transaction, so a failure part way
//! through leaves nothing behind.

use std::sync::Arc;
use chrono::Utc;
use log::{debug, info};
use crate::models::employee::{Employee, EmployeeData, EmployeeWithHistory};
use crate::services::{persistence, Result};
use crate::store::Store;

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn Store>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Inserts the employee and its first history row; returns the new id.
    pub async fn create(&self, data: &EmployeeData) -> Result<i64> {
        const ACTION: &str = "create employee";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, None))?;
        let now = Utc::now();

        let id = tx
            .insert_employee(data, now)
            .await
            .map_err(persistence(ACTION, None))?;
        tx.insert_history(id, data.department_id, now)
            .await
            .map_err(persistence(ACTION, Some(id)))?;
        tx.commit().await.map_err(persistence(ACTION, Some(id)))?;

        info!("Created employee {} in department {}", id, data.department_id);
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Employee>> {
        const ACTION: &str = "fetch employee";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, Some(id)))?;
        tx.employee(id).await.map_err(persistence(ACTION, Some(id)))
    }

    pub async fn get_by_id_with_history(&self, id: i64) -> Result<Option<EmployeeWithHistory>> {
        const ACTION: &str = "fetch employee history";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, Some(id)))?;
        let Some(employee) = tx.employee(id).await.map_err(persistence(ACTION, Some(id)))? else {
            return Ok(None);
        };
        let history = tx.history(id).await.map_err(persistence(ACTION, Some(id)))?;

        Ok(Some(EmployeeWithHistory { employee, history }))
    }

    /// Employees with a current assignment. An employee without an open
    /// history row does not appear here.
    pub async fn get_all(&self) -> Result<Vec<Employee>> {
        const ACTION: &str = "fetch employees";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, None))?;
        tx.employees().await.map_err(persistence(ACTION, None))
    }

    /// Replaces the employee's fields and, when the department changed,
    /// moves the open history row to the new department.
    ///
    /// Returns `false` when no such employee exists.
    pub async fn update(&self, id: i64, data: &EmployeeData) -> Result<bool> {
        const ACTION: &str = "update employee";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, Some(id)))?;

        let Some(previous) = tx
            .current_assignment(id)
            .await
            .map_err(persistence(ACTION, Some(id)))?
        else {
            debug!("Employee {} not found, nothing to update", id);
            return Ok(false);
        };

        let updated = tx
            .update_employee(id, data)
            .await
            .map_err(persistence(ACTION, Some(id)))?;
        if updated == 0 {
            return Ok(false);
        }

        if previous.department_id() != Some(data.department_id) {
            let now = Utc::now();
            let closed = tx
                .close_open_history(id, now)
                .await
                .map_err(persistence(ACTION, Some(id)))?;
            tx.insert_history(id, data.department_id, now)
                .await
                .map_err(persistence(ACTION, Some(id)))?;
            debug!(
                "Employee {} moved from {:?} to department {} ({} row(s) closed)",
                id, previous, data.department_id, closed
            );
        }

        tx.commit().await.map_err(persistence(ACTION, Some(id)))?;

        info!("Updated employee {}", id);
        Ok(true)
    }

    /// Removes the employee's history rows, then the employee.
    ///
    /// Returns `false` when no such employee existed.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        const ACTION: &str = "delete employee";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, Some(id)))?;
        let history_rows = tx
            .delete_history(id)
            .await
            .map_err(persistence(ACTION, Some(id)))?;
        let removed = tx
            .delete_employee(id)
            .await
            .map_err(persistence(ACTION, Some(id)))?;
        tx.commit().await.map_err(persistence(ACTION, Some(id)))?;

        if removed > 0 {
            info!("Deleted employee {} with {} history row(s)", id, history_rows);
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::HistoryEntry;
    use crate::services::ServiceError;
    use crate::store::{MemoryStore, Statement};

    fn john_doe(department_id: i64) -> EmployeeData {
        EmployeeData {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            phone: "1234567890".to_string(),
            address: "123 Main St".to_string(),
            department_id,
            active: true,
            avatar: None,
        }
    }

    fn setup() -> (MemoryStore, EmployeeService) {
        let store = MemoryStore::new();
        let service = EmployeeService::new(Arc::new(store.clone()));
        (store, service)
    }

    async fn history(service: &EmployeeService, id: i64) -> Vec<HistoryEntry> {
        service
            .get_by_id_with_history(id)
            .await
            .unwrap()
            .expect("employee exists")
            .history
    }

    fn open_rows(history: &[HistoryEntry]) -> usize {
        history.iter().filter(|entry| entry.is_open()).count()
    }

    #[tokio::test]
    async fn create_opens_exactly_one_history_row() {
        let (_, service) = setup();

        let id = service.create(&john_doe(3)).await.unwrap();

        let history = history(&service, id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].department_id, 3);
        assert_eq!(history[0].end_date, None);

        let employee = service.get_by_id(id).await.unwrap().unwrap();
        assert!(employee.active);
        assert_eq!(employee.hire_date, Some(history[0].start_date));
        assert_eq!(employee.created_at, history[0].start_date);
    }

    #[tokio::test]
    async fn john_doe_moves_department_and_is_deleted() {
        let (_, service) = setup();

        let id = service.create(&john_doe(1)).await.unwrap();
        let employee = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(employee.department_id, Some(1));

        assert!(service.update(id, &john_doe(2)).await.unwrap());
        let employee = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(employee.department_id, Some(2));

        let history = history(&service, id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].department_id, 2);
        assert!(history[0].is_open());
        assert_eq!(history[1].department_id, 1);
        assert!(history[1].end_date.is_some());

        assert!(service.delete_by_id(id).await.unwrap());
        assert_eq!(service.get_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn same_department_update_leaves_ledger_alone() {
        let (_, service) = setup();
        let id = service.create(&john_doe(1)).await.unwrap();
        let before = history(&service, id).await;

        let mut data = john_doe(1);
        data.address = "742 Evergreen Terrace".to_string();
        data.active = false;
        assert!(service.update(id, &data).await.unwrap());

        let after = history(&service, id).await;
        assert_eq!(after, before);

        let employee = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(employee.address, "742 Evergreen Terrace");
        assert!(!employee.active);
    }

    #[tokio::test]
    async fn department_change_closes_one_row_and_opens_one() {
        let (_, service) = setup();
        let id = service.create(&john_doe(1)).await.unwrap();

        service.update(id, &john_doe(2)).await.unwrap();

        let history = history(&service, id).await;
        let (opened, closed) = (&history[0], &history[1]);
        assert_eq!(opened.department_id, 2);
        assert_eq!(opened.end_date, None);
        let end = closed.end_date.expect("previous row closed");
        assert!(opened.start_date >= end);
        assert!(end >= closed.start_date);
    }

    #[tokio::test]
    async fn at_most_one_open_row_across_moves() {
        let (_, service) = setup();
        let id = service.create(&john_doe(1)).await.unwrap();

        for department_id in [2, 2, 3, 1, 1, 4] {
            service.update(id, &john_doe(department_id)).await.unwrap();
            assert_eq!(open_rows(&history(&service, id).await), 1);
        }

        let history = history(&service, id).await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].department_id, 4);
        let employee = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(employee.hire_date, Some(history[4].start_date));
    }

    #[tokio::test]
    async fn update_of_missing_employee_returns_false() {
        let (_, service) = setup();

        assert!(!service.update(42, &john_doe(1)).await.unwrap());
        assert_eq!(service.get_by_id_with_history(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_keeps_avatar_when_none_given() {
        let (_, service) = setup();
        let mut data = john_doe(1);
        data.avatar = Some("uploads/john.png".to_string());
        let id = service.create(&data).await.unwrap();

        service.update(id, &john_doe(1)).await.unwrap();
        let employee = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(employee.avatar.as_deref(), Some("uploads/john.png"));
    }

    #[tokio::test]
    async fn unassigned_employee_gets_assigned_on_update() {
        let (store, service) = setup();
        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_employee(&john_doe(1), Utc::now()).await.unwrap();
        tx.commit().await.unwrap();

        let employee = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(employee.department_id, None);
        assert_eq!(employee.hire_date, None);

        assert!(service.update(id, &john_doe(5)).await.unwrap());
        let history = history(&service, id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].department_id, 5);
        assert!(history[0].is_open());
    }

    #[tokio::test]
    async fn get_all_excludes_employees_without_open_row() {
        let (store, service) = setup();
        let assigned = service.create(&john_doe(1)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let unassigned = tx.insert_employee(&john_doe(1), Utc::now()).await.unwrap();
        tx.commit().await.unwrap();

        let all = service.get_all().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|employee| employee.id).collect();
        assert_eq!(ids, vec![assigned]);
        assert!(service.get_by_id(unassigned).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_removes_history_and_employee() {
        let (store, service) = setup();
        let id = service.create(&john_doe(1)).await.unwrap();
        service.update(id, &john_doe(2)).await.unwrap();

        assert!(service.delete_by_id(id).await.unwrap());
        assert_eq!(service.get_by_id_with_history(id).await.unwrap(), None);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.history(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_of_missing_employee_returns_false() {
        let (_, service) = setup();
        assert!(!service.delete_by_id(99).await.unwrap());
    }

    fn assert_delete_failed(err: ServiceError, expected_id: i64) {
        match err {
            ServiceError::Persistence { action, id, .. } => {
                assert_eq!(action, "delete employee");
                assert_eq!(id, Some(expected_id));
            }
            other => panic!("expected a persistence error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_employee_delete_keeps_history() {
        let (store, service) = setup();
        let id = service.create(&john_doe(1)).await.unwrap();
        store.reject(Statement::DeleteEmployee).await;

        assert_delete_failed(service.delete_by_id(id).await.unwrap_err(), id);

        store.accept(Statement::DeleteEmployee).await;
        let history = history(&service, id).await;
        assert_eq!(history.len(), 1);
        assert!(history[0].is_open());
    }

    #[tokio::test]
    async fn failed_history_delete_keeps_employee() {
        let (store, service) = setup();
        let id = service.create(&john_doe(1)).await.unwrap();
        store.reject(Statement::DeleteHistory).await;

        assert_delete_failed(service.delete_by_id(id).await.unwrap_err(), id);

        store.accept(Statement::DeleteHistory).await;
        assert_eq!(history(&service, id).await.len(), 1);
        assert_eq!(service.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_history_insert_leaves_no_orphan_employee() {
        let (store, service) = setup();
        store.reject(Statement::InsertHistory).await;

        let id = match service.create(&john_doe(1)).await.unwrap_err() {
            ServiceError::Persistence { action, id, .. } => {
                assert_eq!(action, "create employee");
                id.expect("employee id is reported")
            }
            other => panic!("expected a persistence error, got {:?}", other),
        };

        store.accept(Statement::InsertHistory).await;
        assert_eq!(service.get_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_move_keeps_previous_assignment() {
        let (store, service) = setup();
        let id = service.create(&john_doe(1)).await.unwrap();
        store.reject(Statement::InsertHistory).await;

        let err = service.update(id, &john_doe(2)).await.unwrap_err();
        assert_eq!(err.to_string(), format!("failed to update employee with id {}", id));

        store.accept(Statement::InsertHistory).await;
        let history = history(&service, id).await;
        assert_eq!(history.len(), 1);
        assert!(history[0].is_open());
        assert_eq!(history[0].department_id, 1);
    }

    #[tokio::test]
    async fn read_failure_is_surfaced() {
        let (store, service) = setup();
        store.reject(Statement::SelectEmployees).await;

        let err = service.get_all().await.unwrap_err();
        assert_eq!(err.to_string(), "failed to fetch employees");
    }
}
