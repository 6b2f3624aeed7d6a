//! HTTP request handlers for the JSON endpoints.
//!
//! Each handler validates its input, checks the caller's role through its extractors and
//! delegates to the content services or repositories.
//!
//! # Handler Modules
//!
//! - [`auth`]: sign-in, sign-out, session refresh and invitation acceptance
//! - [`content`]: collections, whole lists, single-row sections and site settings
//! - [`dashboard`]: configured sections, collection sizes and lead totals
//! - [`functions`]: privileged operations behind the service key
//! - [`static_assets`]: embedded stylesheet and scripts
//! - [`submissions`]: the public contact form, lead triage and option lists
//! - [`users`]: profiles, invitations, role changes and deletion
//!
//! # Authentication
//!
//! Gated handlers take a [`crate::auth::guard::RequireRole`] extractor naming the role set they
//! admit. It answers 401 without a session and 403 for a role outside the set.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching status code.

pub mod auth;
pub mod content;
pub mod dashboard;
pub mod functions;
pub mod static_assets;
pub mod submissions;
pub mod users;
