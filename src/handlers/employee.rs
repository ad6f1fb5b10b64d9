use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;
use crate::errors::AppError;
use crate::models::employee::EmployeeData;
use crate::services::EmployeeService;
use crate::utils::validation::validate_payload;

/// Body of both create and update. `active` defaults to true on create and
/// is required on update; every other field is required on both.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    #[validate(length(min = 1, message = "first name is required"))]
    first_name: String,
    #[validate(length(min = 1, message = "last name is required"))]
    last_name: String,
    #[validate(length(min = 10, message = "The phone is too short"))]
    phone: String,
    address: String,
    #[validate(range(min = 1, message = "department id must be positive"))]
    department_id: i64,
    active: Option<bool>,
    avatar: Option<String>,
}

impl EmployeePayload {
    fn into_data(self, active: bool) -> EmployeeData {
        EmployeeData {
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            address: self.address,
            department_id: self.department_id,
            active,
            avatar: self.avatar,
        }
    }
}

fn employee_not_found() -> AppError {
    AppError::NotFound("Employee not found".to_string())
}

pub async fn create_employee(
    service: web::Data<EmployeeService>,
    new_employee: web::Json<EmployeePayload>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*new_employee)?;

    let new_employee = new_employee.into_inner();
    let active = new_employee.active.unwrap_or(true);
    let id = service.create(&new_employee.into_data(active)).await?;

    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

pub async fn get_employees(service: web::Data<EmployeeService>) -> Result<HttpResponse, AppError> {
    let employees = service.get_all().await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn get_employee(
    service: web::Data<EmployeeService>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let employee = service
        .get_by_id(id.into_inner())
        .await?
        .ok_or_else(employee_not_found)?;

    Ok(HttpResponse::Ok().json(employee))
}

pub async fn get_employee_history(
    service: web::Data<EmployeeService>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let employee = service
        .get_by_id_with_history(id.into_inner())
        .await?
        .ok_or_else(employee_not_found)?;

    Ok(HttpResponse::Ok().json(employee))
}

pub async fn update_employee(
    service: web::Data<EmployeeService>,
    id: web::Path<i64>,
    updates: web::Json<EmployeePayload>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*updates)?;

    let updates = updates.into_inner();
    let active = updates
        .active
        .ok_or_else(|| AppError::BadRequest("Validation failed: active: [active is required]".to_string()))?;
    if !service.update(id.into_inner(), &updates.into_data(active)).await? {
        return Err(employee_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated" })))
}

pub async fn delete_employee(
    service: web::Data<EmployeeService>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    if !service.delete_by_id(id.into_inner()).await? {
        return Err(employee_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee deleted" })))
}
