//! Role-gated access to admin routes.
//!
//! Every admin route names the set of roles it admits. [`evaluate`] turns a session state into a
//! [`GuardDecision`]; the JSON API applies it through the [`RequireRole`] extractor (401 without a
//! session, 403 for a role outside the set) and the HTML screens through
//! [`require_html_role`], which redirects to the login page instead.

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    auth::{current_user::resolve_session, session_context::SessionState},
    errors::Error,
};

pub const LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    /// Session still resolving
    Pending,
    Authorized(CurrentUser),
    Redirect,
}

pub fn evaluate(state: &SessionState, allowed: &[Role]) -> GuardDecision {
    match state {
        SessionState::Uninitialized | SessionState::Loading => GuardDecision::Pending,
        SessionState::Anonymous => GuardDecision::Redirect,
        SessionState::Authenticated { user } if allowed.contains(&user.role) => GuardDecision::Authorized(user.clone()),
        SessionState::Authenticated { .. } => GuardDecision::Redirect,
    }
}

/// A set of roles admitted by a route.
pub trait RoleSet: Send + Sync + 'static {
    const ROLES: &'static [Role];
    /// Used in error messages
    const ACTION: &'static str;
}

/// User management.
#[derive(Debug, Clone, Copy)]
pub struct Admins;

impl RoleSet for Admins {
    const ROLES: &'static [Role] = &[Role::Admin];
    const ACTION: &'static str = "manage";
}

/// Content and lead mutations.
#[derive(Debug, Clone, Copy)]
pub struct Editors;

impl RoleSet for Editors {
    const ROLES: &'static [Role] = &[Role::Admin, Role::Editor];
    const ACTION: &'static str = "edit";
}

/// Dashboard and read endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Members;

impl RoleSet for Members {
    const ROLES: &'static [Role] = &[Role::Admin, Role::Editor, Role::Viewer];
    const ACTION: &'static str = "view";
}

/// Extractor admitting only users whose role is in `R`.
///
/// ```ignore
/// async fn delete_faq(RequireRole(user, _): RequireRole<Editors>, ...) -> Result<StatusCode>
/// ```
#[derive(Debug, Clone)]
pub struct RequireRole<R>(pub CurrentUser, pub PhantomData<R>);

impl<R: RoleSet> FromRequestParts<AppState> for RequireRole<R> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let session = resolve_session(parts, state).await?;
        match evaluate(&session, R::ROLES) {
            GuardDecision::Authorized(user) => Ok(RequireRole(user, PhantomData)),
            GuardDecision::Redirect => match session.user() {
                Some(user) => Err(Error::InsufficientRole {
                    required: R::ROLES.to_vec(),
                    actual: user.role,
                    action: R::ACTION.to_string(),
                    resource: parts.uri.path().to_string(),
                }),
                None => Err(Error::Unauthenticated { message: None }),
            },
            GuardDecision::Pending => Err(Error::Internal {
                operation: "resolve session".to_string(),
            }),
        }
    }
}

/// Middleware for HTML screens: unauthorized visitors are sent to the login page. Admitted
/// requests carry the [`CurrentUser`] as an extension.
pub async fn require_html_role<R: RoleSet>(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let session = match resolve_session(&mut parts, &state).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };
    match evaluate(&session, R::ROLES) {
        GuardDecision::Authorized(user) => {
            parts.extensions.insert(user);
            next.run(Request::from_parts(parts, body)).await
        }
        decision => {
            debug!(path = %parts.uri.path(), ?decision, "redirecting to login");
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn signed_in(role: Role) -> SessionState {
        SessionState::Authenticated {
            user: CurrentUser {
                id: Uuid::new_v4(),
                email: "u@example.com".into(),
                role,
                is_admin: false,
            },
        }
    }

    #[test]
    fn unresolved_sessions_are_pending() {
        assert_eq!(evaluate(&SessionState::Uninitialized, Members::ROLES), GuardDecision::Pending);
        assert_eq!(evaluate(&SessionState::Loading, Admins::ROLES), GuardDecision::Pending);
    }

    #[test]
    fn anonymous_is_redirected() {
        assert_eq!(evaluate(&SessionState::Anonymous, Members::ROLES), GuardDecision::Redirect);
    }

    #[test]
    fn role_sets_nest() {
        assert!(matches!(evaluate(&signed_in(Role::Viewer), Members::ROLES), GuardDecision::Authorized(_)));
        assert_eq!(evaluate(&signed_in(Role::Viewer), Editors::ROLES), GuardDecision::Redirect);
        assert!(matches!(evaluate(&signed_in(Role::Editor), Editors::ROLES), GuardDecision::Authorized(_)));
        assert_eq!(evaluate(&signed_in(Role::Editor), Admins::ROLES), GuardDecision::Redirect);
        assert!(matches!(evaluate(&signed_in(Role::Admin), Admins::ROLES), GuardDecision::Authorized(_)));
    }
}
