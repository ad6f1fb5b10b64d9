use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;
use crate::errors::AppError;
use crate::services::DepartmentService;
use crate::utils::validation::validate_payload;

#[derive(Deserialize, Validate)]
pub struct NewDepartment {
    #[validate(length(min = 1, max = 100))]
    name: String,
}

#[derive(Deserialize, Validate)]
pub struct DepartmentUpdate {
    #[validate(length(min = 1, max = 100))]
    name: String,
}

fn department_not_found() -> AppError {
    AppError::NotFound("Department not found".to_string())
}

pub async fn create_department(
    service: web::Data<DepartmentService>,
    new_department: web::Json<NewDepartment>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*new_department)?;

    let id = service.create(&new_department.name).await?;

    Ok(HttpResponse::Created().json(json!({
        "id": id,
        "name": new_department.name,
    })))
}

pub async fn get_departments(service: web::Data<DepartmentService>) -> Result<HttpResponse, AppError> {
    let departments = service.get_all().await?;
    Ok(HttpResponse::Ok().json(departments))
}

pub async fn update_department(
    service: web::Data<DepartmentService>,
    department_id: web::Path<i64>,
    updates: web::Json<DepartmentUpdate>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*updates)?;

    let department_id = department_id.into_inner();
    if !service.rename(department_id, &updates.name).await? {
        return Err(department_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({
        "id": department_id,
        "name": updates.name,
    })))
}

pub async fn delete_department(
    service: web::Data<DepartmentService>,
    department_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    if !service.delete_by_id(department_id.into_inner()).await? {
        return Err(department_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};
    use crate::handlers::tests::test_app;

    #[actix_web::test]
    async fn create_rename_and_list_departments() {
        let app = test::init_service(test_app()).await;

        let req = test::TestRequest::post()
            .uri("/v1/department")
            .set_json(json!({ "name": "HR" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["id"].as_i64().unwrap();

        let req = test::TestRequest::patch()
            .uri(&format!("/v1/department/{}", id))
            .set_json(json!({ "name": "People" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/v1/department").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([{ "id": id, "name": "People" }]));
    }

    #[actix_web::test]
    async fn deleting_unknown_department_is_not_found() {
        let app = test::init_service(test_app()).await;

        let req = test::TestRequest::delete().uri("/v1/department/404").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Department not found" }));
    }

    #[actix_web::test]
    async fn department_with_employees_conflicts() {
        let app = test::init_service(test_app()).await;

        let req = test::TestRequest::post()
            .uri("/v1/department")
            .set_json(json!({ "name": "IT" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri("/v1/employee")
            .set_json(json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "phone": "9876543210",
                "address": "456 Elm St",
                "departmentId": id
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::delete()
            .uri(&format!("/v1/department/{}", id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn empty_department_name_is_rejected() {
        let app = test::init_service(test_app()).await;

        let req = test::TestRequest::post()
            .uri("/v1/department")
            .set_json(json!({ "name": "" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
