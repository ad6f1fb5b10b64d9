use std::sync::Arc;
use log::info;
use sqlx::postgres::PgPoolOptions;
use crate::config::{AppConfig, StoreBackend};
use crate::store::{MemoryStore, PgStore, Store};

pub async fn connect(config: &AppConfig) -> Result<Arc<dyn Store>, sqlx::Error> {
    match (config.backend, config.database_url.as_deref()) {
        (StoreBackend::Postgres, Some(database_url)) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await?;
            info!("Connected to PostgreSQL ({} connections max)", config.max_connections);
            Ok(Arc::new(PgStore::new(pool)))
        }
        (StoreBackend::Postgres, None) => Err(sqlx::Error::Configuration(
            "DATABASE_URL must be set".into(),
        )),
        (StoreBackend::Memory, _) => {
            info!("Using the in-memory store, data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
