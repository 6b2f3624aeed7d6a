//! API request and response data models.
//!
//! API models are distinct from the records in [`crate::db::models`] so the wire and storage
//! shapes can evolve separately. Input models implement [`crate::validation::Validate`]; all of
//! them derive `utoipa::ToSchema` for the generated documentation.
//!
//! - [`auth`]: login, session and invitation-acceptance payloads
//! - [`content`]: collection, list and section inputs plus the kind enums routing them
//! - [`dashboard`]: the dashboard summary
//! - [`functions`]: payloads of the service-key functions
//! - [`submissions`]: contact form, review query and triage update
//! - [`users`]: roles, the current user, profiles and invitations

pub mod auth;
pub mod content;
pub mod dashboard;
pub mod functions;
pub mod submissions;
pub mod users;
