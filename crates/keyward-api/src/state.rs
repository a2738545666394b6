//! # Application State
//!
//! Shared state handed to every handler: the license engine, the runtime
//! configuration, and the optional database pool and metrics handle.

use std::sync::Arc;

use keyward_state::LicenseEngine;
use keyward_store::{LicenseStore, MemoryLicenseStore};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::PgLicenseStore;

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub engine: LicenseEngine,
    pub config: AppConfig,
    /// Present when running against Postgres; used by readiness checks.
    pub db_pool: Option<PgPool>,
    /// Present when a Prometheus recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .field("db_pool", &self.db_pool.is_some())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State over Postgres when a pool is given, otherwise in-memory.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let store: Arc<dyn LicenseStore> = match &db_pool {
            Some(pool) => Arc::new(PgLicenseStore::new(pool.clone())),
            None => Arc::new(MemoryLicenseStore::new()),
        };
        let engine = LicenseEngine::new(store).with_config(config.engine_config());
        Self {
            engine,
            config,
            db_pool,
            metrics: None,
        }
    }

    /// State around a pre-built engine (custom clock or store).
    pub fn with_engine(engine: LicenseEngine, config: AppConfig) -> Self {
        Self {
            engine,
            config,
            db_pool: None,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_in_memory() {
        let state = AppState::new();
        assert_eq!(state.engine.backend_name(), "memory");
        assert!(state.db_pool.is_none());
        assert!(state.metrics.is_none());
    }

    #[test]
    fn engine_takes_configured_tunables() {
        let config = AppConfig {
            renewal_extension_days: 90,
            max_key_attempts: 2,
            ..AppConfig::default()
        };
        let state = AppState::with_config(config, None);
        assert_eq!(state.engine.config().renewal_extension_days, 90);
        assert_eq!(state.engine.config().max_key_attempts, 2);
    }

    #[test]
    fn debug_does_not_print_token() {
        let config = AppConfig {
            admin_token: Some("tok-123".into()),
            ..AppConfig::default()
        };
        let state = AppState::with_config(config, None);
        assert!(!format!("{state:?}").contains("tok-123"));
    }
}
