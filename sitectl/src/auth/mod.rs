//! Authentication and authorization.
//!
//! # Sessions
//!
//! Users sign in with email and password via `/authentication/login` (JSON) or the
//! `/admin/login` form. A signed JWT naming the user is set as an HTTP-only cookie; API clients
//! may send the same token as `Authorization: Bearer <token>`.
//!
//! The token carries no role. Each request resolves it through the
//! [`session_context::SessionContext`], which reads the role from the user's profile and caches it
//! until an [`events::AuthEvent`] for that user invalidates it (sign-in, sign-out, token refresh,
//! role change, deletion).
//!
//! # Authorization
//!
//! Routes admit a [`guard::RoleSet`]:
//!
//! - [`guard::Members`]: dashboard and read endpoints (admin, editor, viewer)
//! - [`guard::Editors`]: content and lead mutations (admin, editor)
//! - [`guard::Admins`]: user management (admin)
//!
//! ```ignore
//! use sitectl::auth::guard::{Editors, RequireRole};
//!
//! async fn delete_faq(RequireRole(user, _): RequireRole<Editors>) -> Result<StatusCode> {
//!     // only admins and editors get here
//! }
//! ```
//!
//! # Modules
//!
//! - [`current_user`]: token extraction and the `CurrentUser` extractor
//! - [`events`]: auth-event publication and subscription
//! - [`guard`]: role sets, the JSON extractor and the HTML redirect middleware
//! - [`password`]: Argon2 hashing and the password length policy
//! - [`session`]: JWT creation and verification
//! - [`session_context`]: per-request session state and the role cache

pub mod current_user;
pub mod events;
pub mod guard;
pub mod password;
pub mod session;
pub mod session_context;
