//! Application wiring
//!
//! Opens the store, bootstraps the schema and builds the service context from
//! configuration.

use std::sync::Arc;

use reaction_client::SlackClient;
use reaction_common::{AppConfig, AppError};
use reaction_core::SystemClock;
use reaction_db::{create_pool, init_schema};
use reaction_service::ServiceContextBuilder;
use reaction_service::ServiceContext;
use tracing::info;

/// State shared by every command
pub struct AppState {
    service_context: ServiceContext,
    config: AppConfig,
}

impl AppState {
    pub fn new(service_context: ServiceContext, config: AppConfig) -> Self {
        Self {
            service_context,
            config,
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Close the pool so WAL contents are checkpointed before exit
    pub async fn close(&self) {
        self.service_context.pool().close().await;
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &"ServiceContext")
            .field("config", &"AppConfig")
            .finish()
    }
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!(url = %config.database.url, "Opening database");
    let db_config = reaction_db::DatabaseConfig::from(&config.database);
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    init_schema(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let slack = SlackClient::from_config(&config.slack, &config.retry)
        .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

    let service_context = ServiceContextBuilder::new()
        .pool(pool)
        .slack(slack)
        .clock(Arc::new(SystemClock))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config))
}
