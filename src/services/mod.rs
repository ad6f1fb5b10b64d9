pub mod departments;
pub mod employees;

use thiserror::Error;
use crate::store::StoreError;

pub use departments::DepartmentService;
pub use employees::EmployeeService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to {action}{}", with_id(.id))]
    Persistence {
        action: &'static str,
        id: Option<i64>,
        #[source]
        source: StoreError,
    },
    #[error("department {0} still has assigned employees")]
    DepartmentInUse(i64),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

fn with_id(id: &Option<i64>) -> String {
    id.map(|id| format!(" with id {}", id)).unwrap_or_default()
}

/// Wraps a store failure with the operation and entity it interrupted.
fn persistence(action: &'static str, id: Option<i64>) -> impl FnOnce(StoreError) -> ServiceError {
    move |source| ServiceError::Persistence { action, id, source }
}
