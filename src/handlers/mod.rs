pub mod department;
pub mod employee;

use actix_web::{web, HttpResponse};
use serde_json::json;
use crate::errors::AppError;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Registers every route. Expects `web::Data<EmployeeService>` and
/// `web::Data<DepartmentService>` to be present in the app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/v1/health", web::get().to(health))
    .service(
        web::resource("/v1/employee")
            .route(web::get().to(employee::get_employees))
            .route(web::post().to(employee::create_employee)),
    )
    .service(
        web::resource("/v1/employee/{id}")
            .route(web::get().to(employee::get_employee))
            .route(web::put().to(employee::update_employee))
            .route(web::delete().to(employee::delete_employee)),
    )
    .service(
        web::resource("/v1/employee/{id}/history")
            .route(web::get().to(employee::get_employee_history)),
    )
    .service(
        web::resource("/v1/department")
            .route(web::get().to(department::get_departments))
            .route(web::post().to(department::create_department)),
    )
    .service(
        web::resource("/v1/department/{id}")
            .route(web::patch().to(department::update_department))
            .route(web::delete().to(department::delete_department)),
    );
}
