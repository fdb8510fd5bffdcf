use std::sync::Arc;

use axum::Router;
use catalog_core::config::{AppConfig, ConfigError, LoadOptions, StorageBackend};
use catalog_db::{
    migrations, open_pool, DbPool, InMemoryProductRepository, ProductRepository,
    SqlProductRepository,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{api, health, service::ProductService};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: Option<DbPool>,
    pub service: Arc<ProductService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        storage_backend = config.storage.backend.as_str(),
        "starting application bootstrap"
    );

    let (repository, db_pool): (Arc<dyn ProductRepository>, Option<DbPool>) =
        match config.storage.backend {
            StorageBackend::Memory => (Arc::new(InMemoryProductRepository::default()), None),
            StorageBackend::Sqlite => {
                let pool =
                    open_pool(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
                info!(
                    event_name = "system.bootstrap.database_connected",
                    correlation_id = "bootstrap",
                    "database connection established"
                );

                migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
                info!(
                    event_name = "system.bootstrap.migrations_applied",
                    correlation_id = "bootstrap",
                    "database migrations applied"
                );

                (Arc::new(SqlProductRepository::new(pool.clone())), Some(pool))
            }
        };

    Ok(Application { config, db_pool, service: Arc::new(ProductService::new(repository)) })
}

impl Application {
    /// Product API and health endpoint on a single router, with request tracing.
    pub fn router(&self) -> Router {
        let health_state =
            health::HealthState::new(self.config.storage.backend, self.db_pool.clone());

        Router::new()
            .merge(api::router(Arc::clone(&self.service)))
            .merge(health::router(health_state))
            .layer(TraceLayer::new_for_http())
    }
}
