//! Test utilities for integration testing (available with `test-utils` feature).

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::anyhow;
use axum_test::TestServer;

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    auth::{password, session},
    config::{Config, DatabaseConfig, EmailTransportConfig},
    db::{
        errors::{DbError, Result as DbResult},
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
        store::{MemoryStore, Query, Row, Store, TableName, WriteBatch},
    },
};

/// Password given to every user made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Service key configured by [`create_test_config`].
pub const TEST_SERVICE_KEY: &str = "test-service-key";

pub fn create_test_config() -> Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("sitectl-test-emails-{}", std::process::id()));

    let mut config = Config {
        database: DatabaseConfig::Memory,
        host: "127.0.0.1".to_string(),
        port: 0,
        public_url: "http://localhost:3001".to_string(),
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        service_key: Some(TEST_SERVICE_KEY.to_string()),
        enable_metrics: false,
        ..Default::default()
    };
    config.email.transport = EmailTransportConfig::File {
        path: temp_dir.to_string_lossy().into_owned(),
    };
    // Cheap hashing keeps the suite fast
    config.auth.native.password.argon2_memory_kib = 1024;
    config.auth.native.password.argon2_iterations = 1;
    config
}

pub fn create_test_state_with_store(store: Arc<dyn Store>) -> AppState {
    AppState::new(store, create_test_config()).expect("Failed to create test state")
}

/// Application state over a fresh in-memory store.
pub fn create_test_state() -> AppState {
    create_test_state_with_store(Arc::new(MemoryStore::new()))
}

/// A user with a profile of the given role and [`TEST_PASSWORD`] as password.
pub async fn create_test_user(state: &AppState, role: Role) -> CurrentUser {
    let params = state.config.auth.native.password.argon2_params();
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, Some(params)).expect("Failed to hash password");
    let email = format!("{}-{}@example.com", role, uuid::Uuid::new_v4().simple());

    let user = Users::new(state.store.as_ref())
        .create(&UserCreateDBRequest {
            email,
            password_hash: Some(password_hash),
            role,
            full_name: Some(format!("Test {role}")),
            app_metadata: Default::default(),
        })
        .await
        .expect("Failed to create test user");

    CurrentUser {
        id: user.id,
        email: user.email,
        role,
        is_admin: false,
    }
}

/// `Cookie` header value carrying a session for `user`.
pub fn session_cookie(state: &AppState, user: &CurrentUser) -> String {
    let token = session::create_session_token(user, &state.config).expect("Failed to create session token");
    format!("{}={}", state.config.auth.native.session.cookie_name, token)
}

/// A test server over the full router.
pub fn create_test_server(state: AppState) -> TestServer {
    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// An in-memory store that counts the batches applied to it.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    applies: AtomicUsize,
}

impl CountingStore {
    pub fn apply_calls(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }

    pub fn row_count(&self, table: TableName) -> usize {
        self.inner.row_count(table)
    }
}

#[async_trait::async_trait]
impl Store for CountingStore {
    async fn select(&self, table: TableName, query: &Query) -> DbResult<Vec<Row>> {
        self.inner.select(table, query).await
    }

    async fn apply(&self, batch: WriteBatch) -> DbResult<Vec<Vec<Row>>> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        self.inner.apply(batch).await
    }
}

/// A store whose every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

#[async_trait::async_trait]
impl Store for FailingStore {
    async fn select(&self, table: TableName, _query: &Query) -> DbResult<Vec<Row>> {
        Err(DbError::Other(anyhow!("store unavailable while reading {table}")))
    }

    async fn apply(&self, _batch: WriteBatch) -> DbResult<Vec<Vec<Row>>> {
        Err(DbError::Other(anyhow!("store unavailable")))
    }
}
