mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;
mod store;
mod utils;

use std::io;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use crate::config::AppConfig;
use crate::services::{DepartmentService, EmployeeService};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|err| {
        error!("Invalid configuration: {}", err);
        io::Error::new(io::ErrorKind::InvalidInput, err)
    })?;

    let store = db::connect(&config).await.map_err(|err| {
        error!("Failed to connect to the database: {}", err);
        io::Error::new(io::ErrorKind::Other, err)
    })?;

    let employees = web::Data::new(EmployeeService::new(store.clone()));
    let departments = web::Data::new(DepartmentService::new(store));

    info!("Starting server at {}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(employees.clone())
            .app_data(departments.clone())
            .configure(handlers::configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
