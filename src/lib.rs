pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::config::Config;
use crate::database::{
    memory::MemoryStore,
    postgres::PgStore,
    repository::{ResultStore, StudentDirectory, TestCatalog},
};
use crate::middleware::auth::AuthKeys;
use crate::services::{
    attempt_service::AttemptService,
    eligibility_service::{EligibilityService, EligibilityWindow},
    test_service::TestService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub test_service: TestService,
    pub attempt_service: AttemptService,
    pub eligibility_service: EligibilityService,
    pub auth: AuthKeys,
}

impl AppState {
    pub fn new(config: &Config, pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self::with_stores(
            store.clone(),
            store.clone(),
            store,
            EligibilityWindow::from_config(config),
            AuthKeys::from_secret(config.jwt_secret.as_bytes()),
        )
    }

    /// Non-persistent state for local runs without a database.
    pub fn in_memory(config: &Config) -> Self {
        Self::with_memory_store(Arc::new(MemoryStore::new()), config)
    }

    pub fn with_memory_store(store: Arc<MemoryStore>, config: &Config) -> Self {
        Self::with_stores(
            store.clone(),
            store.clone(),
            store,
            EligibilityWindow::from_config(config),
            AuthKeys::from_secret(config.jwt_secret.as_bytes()),
        )
    }

    pub fn with_stores(
        tests: Arc<dyn TestCatalog>,
        results: Arc<dyn ResultStore>,
        students: Arc<dyn StudentDirectory>,
        window: EligibilityWindow,
        auth: AuthKeys,
    ) -> Self {
        Self {
            test_service: TestService::new(tests.clone(), results.clone()),
            attempt_service: AttemptService::new(tests, results.clone(), students.clone()),
            eligibility_service: EligibilityService::new(students, results, window),
            auth,
        }
    }
}
