use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use crate::models::department::Department;
use crate::models::employee::{Employee, EmployeeData};
use crate::models::history::{Assignment, HistoryEntry};
use crate::store::{Statement, Store, StoreError, Transaction};

const SELECT_EMPLOYEES: &str = r#"
    SELECT
        e.id, e.first_name, e.last_name, e.phone, e.address, e.active, e.avatar, e.created_at,
        eh.department_id,
        d.name AS department_name,
        (SELECT MIN(h.start_date) FROM employee_history h WHERE h.employee_id = e.id) AS hire_date
    FROM employees e
    JOIN employee_history eh ON eh.employee_id = e.id AND eh.end_date IS NULL
    LEFT JOIN departments d ON d.id = eh.department_id
    ORDER BY e.id
"#;

const SELECT_EMPLOYEE: &str = r#"
    SELECT
        e.id, e.first_name, e.last_name, e.phone, e.address, e.active, e.avatar, e.created_at,
        eh.department_id,
        d.name AS department_name,
        (SELECT MIN(h.start_date) FROM employee_history h WHERE h.employee_id = e.id) AS hire_date
    FROM employees e
    LEFT JOIN employee_history eh ON eh.employee_id = e.id AND eh.end_date IS NULL
    LEFT JOIN departments d ON d.id = eh.department_id
    WHERE e.id = $1
    ORDER BY eh.start_date DESC
    LIMIT 1
"#;

const SELECT_HISTORY: &str = r#"
    SELECT
        eh.id, eh.employee_id, eh.department_id,
        d.name AS department_name,
        eh.start_date, eh.end_date
    FROM employee_history eh
    LEFT JOIN departments d ON d.id = eh.department_id
    WHERE eh.employee_id = $1
    ORDER BY eh.start_date DESC, eh.id DESC
"#;

const SELECT_CURRENT_ASSIGNMENT: &str = r#"
    SELECT e.id, eh.department_id
    FROM employees e
    LEFT JOIN employee_history eh ON eh.employee_id = e.id AND eh.end_date IS NULL
    WHERE e.id = $1
    ORDER BY eh.start_date DESC
    LIMIT 1
"#;

fn db_error(statement: Statement) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |source| StoreError::Database { statement, source }
}

/// PostgreSQL-backed store. The schema lives in `schema.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let tx = self.pool.begin().await.map_err(db_error(Statement::Begin))?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn employees(&mut self) -> Result<Vec<Employee>, StoreError> {
        sqlx::query_as::<_, Employee>(SELECT_EMPLOYEES)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error(Statement::SelectEmployees))
    }

    async fn employee(&mut self, id: i64) -> Result<Option<Employee>, StoreError> {
        sqlx::query_as::<_, Employee>(SELECT_EMPLOYEE)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error(Statement::SelectEmployee))
    }

    async fn history(&mut self, employee_id: i64) -> Result<Vec<HistoryEntry>, StoreError> {
        sqlx::query_as::<_, HistoryEntry>(SELECT_HISTORY)
            .bind(employee_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error(Statement::SelectHistory))
    }

    async fn current_assignment(&mut self, employee_id: i64) -> Result<Option<Assignment>, StoreError> {
        let row = sqlx::query_as::<_, (i64, Option<i64>)>(SELECT_CURRENT_ASSIGNMENT)
            .bind(employee_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error(Statement::SelectCurrentAssignment))?;

        Ok(row.map(|(_, department_id)| Assignment::from(department_id)))
    }

    async fn insert_employee(&mut self, data: &EmployeeData, created_at: DateTime<Utc>) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO employees (first_name, last_name, phone, address, active, avatar, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(data.active)
        .bind(&data.avatar)
        .bind(created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error(Statement::InsertEmployee))
    }

    async fn insert_history(
        &mut self,
        employee_id: i64,
        department_id: i64,
        start_date: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO employee_history (employee_id, department_id, start_date) VALUES ($1, $2, $3)",
        )
        .bind(employee_id)
        .bind(department_id)
        .bind(start_date)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error(Statement::InsertHistory))?;

        Ok(result.rows_affected())
    }

    async fn update_employee(&mut self, id: i64, data: &EmployeeData) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE employees SET first_name = $1, last_name = $2, phone = $3, address = $4, active = $5, avatar = COALESCE($6, avatar) WHERE id = $7",
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(data.active)
        .bind(&data.avatar)
        .bind(id)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error(Statement::UpdateEmployee))?;

        Ok(result.rows_affected())
    }

    async fn close_open_history(&mut self, employee_id: i64, end_date: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE employee_history SET end_date = $1 WHERE employee_id = $2 AND end_date IS NULL",
        )
        .bind(end_date)
        .bind(employee_id)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error(Statement::CloseOpenHistory))?;

        Ok(result.rows_affected())
    }

    async fn delete_history(&mut self, employee_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM employee_history WHERE employee_id = $1")
            .bind(employee_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error(Statement::DeleteHistory))?;

        Ok(result.rows_affected())
    }

    async fn delete_employee(&mut self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error(Statement::DeleteEmployee))?;

        Ok(result.rows_affected())
    }

    async fn departments(&mut self) -> Result<Vec<Department>, StoreError> {
        sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_error(Statement::SelectDepartments))
    }

    async fn insert_department(&mut self, name: &str) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("INSERT INTO departments (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_error(Statement::InsertDepartment))
    }

    async fn rename_department(&mut self, id: i64, name: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE departments SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error(Statement::UpdateDepartment))?;

        Ok(result.rows_affected())
    }

    async fn delete_department(&mut self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error(Statement::DeleteDepartment))?;

        Ok(result.rows_affected())
    }

    async fn count_assigned(&mut self, department_id: i64) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM employee_history WHERE department_id = $1 AND end_date IS NULL",
        )
        .bind(department_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error(Statement::CountAssigned))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(db_error(Statement::Commit))
    }
}
