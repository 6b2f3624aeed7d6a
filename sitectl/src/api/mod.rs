//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for the JSON endpoints
//! - **[`models`]**: request and response structures
//!
//! # API Structure
//!
//! - **Authentication** (`/authentication/*`): sign-in, sign-out, session, invitation acceptance
//! - **Content** (`/admin/api/v1/content/*`, `/lists/*`, `/sections/*`, `/settings/*`)
//! - **Leads** (`/admin/api/v1/submissions/*`, `/submission-options/*`)
//! - **Users** (`/admin/api/v1/users/*`): admin-only user management
//! - **Dashboard** (`/admin/api/v1/dashboard`)
//! - **Public** (`/api/v1/*`): landing content and the contact form
//! - **Functions** (`/functions/v1/*`): service-key operations
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations. The documentation is served at
//! `/admin/docs`.

pub mod handlers;
pub mod models;
