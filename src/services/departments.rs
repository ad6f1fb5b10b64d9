use std::sync::Arc;
use log::info;
use crate::models::department::Department;
use crate::services::{persistence, Result, ServiceError};
use crate::store::Store;

/// Plain department CRUD. Departments never touch the history ledger, except
/// that one with currently assigned employees cannot be deleted.
#[derive(Clone)]
pub struct DepartmentService {
    store: Arc<dyn Store>,
}

impl DepartmentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Result<Vec<Department>> {
        const ACTION: &str = "fetch departments";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, None))?;
        tx.departments().await.map_err(persistence(ACTION, None))
    }

    pub async fn create(&self, name: &str) -> Result<i64> {
        const ACTION: &str = "create department";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, None))?;
        let id = tx.insert_department(name).await.map_err(persistence(ACTION, None))?;
        tx.commit().await.map_err(persistence(ACTION, Some(id)))?;

        info!("Created department {} ({})", id, name);
        Ok(id)
    }

    /// Returns `false` when no such department exists.
    pub async fn rename(&self, id: i64, name: &str) -> Result<bool> {
        const ACTION: &str = "rename department";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, Some(id)))?;
        let updated = tx
            .rename_department(id, name)
            .await
            .map_err(persistence(ACTION, Some(id)))?;
        tx.commit().await.map_err(persistence(ACTION, Some(id)))?;

        Ok(updated > 0)
    }

    /// Deletes the department unless an employee is currently assigned to it.
    /// Closed history rows may keep pointing at a deleted department.
    ///
    /// Returns `false` when no such department exists.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        const ACTION: &str = "delete department";

        let mut tx = self.store.begin().await.map_err(persistence(ACTION, Some(id)))?;
        let assigned = tx
            .count_assigned(id)
            .await
            .map_err(persistence(ACTION, Some(id)))?;
        if assigned > 0 {
            return Err(ServiceError::DepartmentInUse(id));
        }

        let removed = tx
            .delete_department(id)
            .await
            .map_err(persistence(ACTION, Some(id)))?;
        tx.commit().await.map_err(persistence(ACTION, Some(id)))?;

        if removed > 0 {
            info!("Deleted department {}", id);
        }
        Ok(removed > 0)
    }
}
