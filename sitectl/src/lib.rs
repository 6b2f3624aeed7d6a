//! # sitectl: marketing site server and admin content console
//!
//! `sitectl` serves a single-page marketing site and the console its editors use to maintain it.
//! Every section of the landing page (hero, about, services, FAQs, pricing, reviews, ...) is a row
//! or an ordered set of rows in the content store. Visitors read them through the rendered page,
//! editors change them through a role-gated JSON API, and leads arrive through the contact form.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer. All
//! persistence goes through the [`db::store::Store`] boundary, implemented over PostgreSQL for
//! production and in memory for development and tests.
//!
//! ### Surfaces
//!
//! - **Public site** (`/`, `/service/{slug}`): server-rendered HTML assembled from every content
//!   section. A section that fails to load renders an error notice in its place; the rest of the
//!   page is unaffected.
//! - **Public API** (`/api/v1/*`): the landing content as JSON and the contact form endpoint.
//! - **Admin console** (`/admin/*`): sign-in, invitation acceptance and one screen per content
//!   type. Anonymous visitors and members without the required role are redirected to
//!   `/admin/login`.
//! - **Admin API** (`/admin/api/v1/*`): content editing, lead triage and user management. Requests
//!   without a session answer 401, requests from a role outside the route's set answer 403.
//! - **Functions** (`/functions/v1/*`): privileged operations authorised by the configured service
//!   key instead of a session.
//!
//! ### Core Components
//!
//! The **content layer** ([`content`]) owns the editing rules: single-step reorders that persist
//! both swapped rows atomically before reporting success, diff-based replacement of whole lists,
//! and sections that hold at most one row.
//!
//! The **authentication layer** ([`auth`]) issues JWT sessions and resolves each request's role
//! through a [`auth::session_context::SessionContext`] whose role cache is invalidated by auth
//! events.
//!
//! The **database layer** ([`db`]) exposes typed tables and repositories on top of the store.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use sitectl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = sitectl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     sitectl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
mod email;
pub mod errors;
mod openapi;
pub mod pages;
mod static_assets;
pub mod submissions;
pub mod telemetry;
pub mod templates;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::{
        events::AuthEventBus,
        guard::{Admins, Members, require_html_role},
        password::{self, Argon2Params},
        session_context::SessionContext,
    },
    config::{CorsOrigin, DatabaseConfig},
    db::{
        handlers::{Repository, Users, users::UserUpdateDBRequest},
        models::users::UserCreateDBRequest,
        store::{MemoryStore, PgStore, Store},
    },
    openapi::ApiDoc,
};
use axum::{
    Router,
    http::{self, HeaderName, HeaderValue},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use serde_json::{Map, Value};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::UserId;

/// Application state shared across all request handlers.
///
/// - `store`: the content store every handler reads and writes through
/// - `config`: application configuration loaded from file and environment
/// - `sessions`: per-request session resolution and the role cache
/// - `auth_events`: the bus sign-in, sign-out and user-management events are published on
/// - `templates`: compiled HTML templates
///
/// # Example
///
/// ```ignore
/// let state = AppState::new(Arc::new(MemoryStore::new()), config)?;
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub sessions: SessionContext,
    pub auth_events: AuthEventBus,
    pub templates: Arc<minijinja::Environment<'static>>,
}

impl AppState {
    /// Wire the session context to a fresh event bus and compile the templates.
    pub fn new(store: Arc<dyn Store>, config: Config) -> anyhow::Result<Self> {
        let auth_events = AuthEventBus::new();
        let sessions = SessionContext::new(store.clone(), &auth_events);
        Ok(Self::builder()
            .store(store)
            .config(config)
            .sessions(sessions)
            .auth_events(auth_events)
            .templates(Arc::new(templates::environment()?))
            .build())
    }
}

/// Get the sitectl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the bootstrap admin user if it doesn't exist.
///
/// Idempotent: an existing user with this email gets the password reset, the `admin` role on
/// its profile and `is_admin` in its app metadata. Returns the user's id either way.
#[instrument(skip_all, fields(email = %email))]
pub async fn create_initial_admin_user(
    store: &dyn Store,
    email: &str,
    password: &str,
    params: Argon2Params,
) -> anyhow::Result<UserId> {
    let password_hash = password::hash_string_with_params(password, Some(params))
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;
    let mut admin_metadata = Map::new();
    admin_metadata.insert("is_admin".to_string(), Value::Bool(true));

    let mut users = Users::new(store);
    if let Some(existing) = users.get_user_by_email(email).await? {
        users
            .update(
                existing.id,
                &UserUpdateDBRequest {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;
        users.set_role(existing.id, Role::Admin).await?;
        users.merge_app_metadata(existing.id, admin_metadata).await?;
        debug!(user_id = %existing.id, "bootstrap admin already present");
        return Ok(existing.id);
    }

    let created = users
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            password_hash: Some(password_hash),
            role: Role::Admin,
            full_name: None,
            app_metadata: admin_metadata,
        })
        .await?;
    info!(user_id = %created.id, "bootstrap admin created");
    Ok(created.id)
}

/// Open the configured store, running migrations against PostgreSQL.
/// Returns the store and, for PostgreSQL, the pool to close on shutdown.
async fn setup_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgPool>)> {
    let (store, pool): (Arc<dyn Store>, Option<PgPool>) = match &config.database {
        DatabaseConfig::External { url, max_connections } => {
            info!("Using external database");
            let pool = PgPoolOptions::new().max_connections(*max_connections).connect(url).await?;
            migrator().run(&pool).await?;
            (Arc::new(PgStore::new(pool.clone())), Some(pool))
        }
        DatabaseConfig::Memory => {
            info!("Using in-memory store: content will be lost on shutdown");
            (Arc::new(MemoryStore::new()), None)
        }
    };

    match config.admin_password.as_deref() {
        Some(admin_password) => {
            let params = config.auth.native.password.argon2_params();
            create_initial_admin_user(store.as_ref(), &config.admin_email, admin_password, params)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {e}"))?;
        }
        None => debug!("No admin_password configured, skipping bootstrap admin"),
    }

    Ok((store, pool))
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;
    let mut origins = Vec::new();
    for origin in &cors_config.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut exposed = vec![http::header::LOCATION];
    for name in &cors_config.exposed_headers {
        let name = name.parse::<HeaderName>()?;
        if !exposed.contains(&name) {
            exposed.push(name);
        }
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(cors_config.allow_credentials)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .expose_headers(exposed);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// - Authentication routes
/// - Admin API routes, gated per handler by role
/// - Public API and privileged functions
/// - Public pages and the admin console, whose screens redirect to the login page
/// - Embedded static assets and the OpenAPI documentation
/// - Optional Prometheus metrics
/// - CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .route("/authentication/session", get(api::handlers::auth::get_session))
        .route("/authentication/refresh", post(api::handlers::auth::refresh))
        .route(
            "/authentication/invitations/accept",
            post(api::handlers::auth::accept_invitation),
        );

    let api_routes = Router::new()
        .route("/dashboard", get(api::handlers::dashboard::get_dashboard))
        // Item-at-a-time collections
        .route(
            "/content/{collection}",
            get(api::handlers::content::list_items).post(api::handlers::content::create_item),
        )
        .route(
            "/content/{collection}/{id}",
            get(api::handlers::content::get_item)
                .put(api::handlers::content::update_item)
                .delete(api::handlers::content::delete_item),
        )
        .route("/content/{collection}/{id}/move", post(api::handlers::content::move_item))
        // Whole-list collections
        .route(
            "/lists/{list}",
            get(api::handlers::content::get_list).put(api::handlers::content::replace_list),
        )
        // Single-row sections and settings
        .route(
            "/sections/{section}",
            get(api::handlers::content::get_section).put(api::handlers::content::save_section_content),
        )
        .route(
            "/settings/{name}",
            get(api::handlers::content::get_setting).put(api::handlers::content::put_setting),
        )
        // Leads
        .route("/submissions", get(api::handlers::submissions::list_submissions))
        .route("/submissions/{id}", get(api::handlers::submissions::get_submission))
        .route("/submissions/{id}", patch(api::handlers::submissions::update_submission))
        .route("/submissions/{id}", delete(api::handlers::submissions::delete_submission))
        .route(
            "/submission-options/{list}",
            get(api::handlers::submissions::list_options).post(api::handlers::submissions::create_option),
        )
        .route(
            "/submission-options/{list}/{id}",
            delete(api::handlers::submissions::delete_option),
        )
        // User management (admin only)
        .route("/users", get(api::handlers::users::list_users))
        .route("/users/invitations", post(api::handlers::users::invite_user))
        .route("/users/{id}/role", patch(api::handlers::users::update_role))
        .route("/users/{id}", delete(api::handlers::users::delete_user));

    let public_api_routes = Router::new()
        .route("/landing", get(pages::site::landing_json))
        .route(
            "/contact-submissions",
            post(api::handlers::submissions::submit_contact_form),
        );

    let function_routes = Router::new()
        .route("/create-admin-user", post(api::handlers::functions::create_admin_user))
        .route("/set-admin-metadata", post(api::handlers::functions::set_admin_metadata));

    let public_pages = Router::new()
        .route("/", get(pages::site::landing))
        .route("/service/{slug}", get(pages::site::service_page))
        .route(
            "/admin/login",
            get(pages::admin::login_page).post(pages::admin::login_submit),
        )
        .route("/admin/logout", post(pages::admin::logout))
        .route(
            "/admin/accept-invitation",
            get(pages::admin::accept_invitation_page).post(pages::admin::accept_invitation_submit),
        );

    let member_pages = Router::new()
        .route("/admin/dashboard", get(pages::admin::dashboard))
        .route("/admin/{screen}", get(pages::admin::screen))
        .route_layer(from_fn_with_state(state.clone(), require_html_role::<Members>));

    let admin_pages = Router::new()
        .route("/admin/users", get(pages::admin::users))
        .route_layer(from_fn_with_state(state.clone(), require_html_role::<Admins>));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/static/{*path}",
            get(api::handlers::static_assets::serve_embedded_asset),
        )
        .merge(auth_routes)
        .merge(public_pages)
        .merge(member_pages)
        .merge(admin_pages)
        .nest("/admin/api/v1", api_routes)
        .nest("/api/v1", public_api_routes)
        .nest("/functions/v1", function_routes)
        .fallback(pages::fallback)
        .with_state(state.clone())
        .merge(Scalar::with_url("/admin/docs", ApiDoc::openapi()));

    let mut router = router.layer(create_cors_layer(&state.config)?);

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The HTTP server with its store.
///
/// 1. **Create**: [`Application::new`] opens the store, runs migrations, ensures the bootstrap
///    admin and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish, the pool closes
///    and pending spans are flushed
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting sitectl with configuration: {:#?}", config);

        let (store, pool) = setup_store(&config).await?;
        let state = AppState::new(store, config.clone())?;
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "sitectl listening on http://{}, available at {}",
            bind_addr, self.config.public_url
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{AppState, build_router, create_initial_admin_user};
    use crate::{
        api::models::users::Role,
        auth::password,
        config::{CorsOrigin, DatabaseConfig},
        db::{handlers::Users, store::MemoryStore},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    fn params() -> password::Argon2Params {
        create_test_config().auth.native.password.argon2_params()
    }

    #[tokio::test]
    async fn test_create_initial_admin_user_new_user() {
        let store = MemoryStore::new();
        let user_id = create_initial_admin_user(&store, "New-Admin@example.com", "first-password", params())
            .await
            .expect("Should create admin user successfully");

        let mut users = Users::new(&store);
        let user = users.get_user_by_email("new-admin@example.com").await.unwrap().unwrap();
        assert_eq!(user.id, user_id);
        assert!(user.is_admin());
        assert!(password::verify_string("first-password", user.password_hash.as_deref().unwrap()).unwrap());
        assert_eq!(users.get_profile(user_id).await.unwrap().unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn test_create_initial_admin_user_existing_user() {
        let state = create_test_state();
        let existing = create_test_user(&state, Role::Viewer).await;

        let returned = create_initial_admin_user(state.store.as_ref(), &existing.email, "rotated-password", params())
            .await
            .expect("Should handle existing user successfully");
        assert_eq!(returned, existing.id);

        let mut users = Users::new(state.store.as_ref());
        let user = users.get_user_by_email(&existing.email).await.unwrap().unwrap();
        assert!(user.is_admin());
        assert!(password::verify_string("rotated-password", user.password_hash.as_deref().unwrap()).unwrap());
        assert_eq!(users.get_profile(existing.id).await.unwrap().unwrap().role, Role::Admin);
        assert_eq!(users.list_profiles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_health_and_docs() {
        let server = create_test_server(create_test_state());

        let health = server.get("/healthz").await;
        health.assert_status_ok();
        assert_eq!(health.text(), "OK");

        let docs = server.get("/admin/docs").await;
        docs.assert_status_ok();
        assert!(docs.text().contains("sitectl API"));
    }

    #[tokio::test]
    async fn test_unknown_path_renders_not_found_page() {
        let server = create_test_server(create_test_state());
        let response = server.get("/nowhere/at/all").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.text().contains("404"));
    }

    #[tokio::test]
    async fn test_build_router_with_metrics_disabled() {
        let server = create_test_server(create_test_state());
        let response = server.get("/internal/metrics").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert!(!response.text().contains("# TYPE"));
    }

    #[tokio::test]
    async fn test_build_router_with_metrics_enabled() {
        let mut config = create_test_config();
        config.enable_metrics = true;
        let state = AppState::new(Arc::new(MemoryStore::new()), config).unwrap();
        let router = build_router(state).expect("Failed to build router");
        let server = axum_test::TestServer::new(router).expect("Failed to create test server");

        server.get("/healthz").await.assert_status_ok();
        let metrics = server.get("/internal/metrics").await;
        metrics.assert_status_ok();
        assert!(metrics.text().contains("# TYPE"));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let mut config = create_test_config();
        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Url("https://admin.example.com".parse().unwrap())];
        let state = AppState::new(Arc::new(MemoryStore::new()), config).unwrap();
        let server = create_test_server(state);

        let response = server
            .get("/api/v1/landing")
            .add_header("origin", "https://admin.example.com")
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://admin.example.com"
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_application_integration() {
        let mut config = create_test_config();
        config.database = DatabaseConfig::Memory;
        config.admin_email = "owner@example.com".to_string();
        config.admin_password = Some("bootstrap-password".to_string());

        let app = crate::Application::new(config).await;
        assert!(app.is_ok(), "Application::new should succeed");
        let server = app.unwrap().into_test_server();

        server.get("/healthz").await.assert_status_ok();
        server
            .get("/admin/api/v1/users")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let login = server
            .post("/authentication/login")
            .json(&json!({"email": "owner@example.com", "password": "bootstrap-password"}))
            .await;
        login.assert_status_ok();
        let cookie = login.cookie("sitectl_session");

        let users = server.get("/admin/api/v1/users").add_cookie(cookie).await;
        users.assert_status_ok();
        let profiles: serde_json::Value = users.json();
        assert_eq!(profiles[0]["role"], "admin");
    }
}
