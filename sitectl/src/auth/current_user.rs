//! Request-side session resolution and the [`CurrentUser`] extractor.
//!
//! The session token is read from the session cookie, or failing that from an
//! `Authorization: Bearer` header. The settled [`SessionState`] is kept in the request extensions
//! so extractors and middleware running for the same request resolve it once.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::{
        session::{self, SessionClaims},
        session_context::SessionState,
    },
    config::Config,
    errors::{Error, Result},
};

/// Session token from the configured cookie, if present.
fn cookie_token<'p>(parts: &'p Parts, config: &Config) -> Option<&'p str> {
    let cookie_name = &config.auth.native.session.cookie_name;
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| name == cookie_name)
        .map(|(_, value)| value)
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Verified claims from the request, or `None` when no valid token is present.
///
/// Expired or tampered tokens are treated as absent.
#[instrument(skip_all)]
pub fn session_claims(parts: &Parts, config: &Config) -> Option<SessionClaims> {
    for token in [cookie_token(parts, config), bearer_token(parts)].into_iter().flatten() {
        match session::verify_session_token(token, config) {
            Ok(claims) => return Some(claims),
            Err(e) => trace!("Ignoring session token: {e}"),
        }
    }
    None
}

/// Settle the request's session, reusing an earlier resolution for the same request.
pub async fn resolve_session(parts: &mut Parts, state: &AppState) -> Result<SessionState> {
    if let Some(settled) = parts.extensions.get::<SessionState>().filter(|s| s.is_settled()) {
        return Ok(settled.clone());
    }
    parts.extensions.insert(SessionState::Loading);

    let claims = session_claims(parts, &state.config);
    let resolved = match state.sessions.resolve(claims.as_ref()).await {
        Ok(resolved) => resolved,
        Err(e) => {
            parts.extensions.remove::<SessionState>();
            return Err(e);
        }
    };
    if let Some(user) = resolved.user() {
        debug!(user_id = %user.id, role = %user.role, "resolved session");
    }
    parts.extensions.insert(resolved.clone());
    Ok(resolved)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match resolve_session(parts, state).await? {
            SessionState::Authenticated { user } => Ok(user),
            _ => Err(Error::Unauthenticated { message: None }),
        }
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Option<Self>> {
        Ok(resolve_session(parts, state).await?.user().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_config, create_test_state, create_test_user};

    fn parts_with(name: header::HeaderName, value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(name, value)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[tokio::test]
    async fn cookie_session_resolves_to_user_with_profile_role() {
        let state = create_test_state();
        let user = create_test_user(&state, Role::Editor).await;
        let token = session::create_session_token(&user, &state.config).unwrap();
        let mut parts = parts_with(header::COOKIE, &format!("theme=dark; sitectl_session={token}"));

        let current = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(current.id, user.id);
        assert_eq!(current.role, Role::Editor);
        assert!(parts.extensions.get::<SessionState>().is_some_and(SessionState::is_settled));
    }

    #[tokio::test]
    async fn bearer_token_is_accepted() {
        let state = create_test_state();
        let user = create_test_user(&state, Role::Viewer).await;
        let token = session::create_session_token(&user, &state.config).unwrap();
        let mut parts = parts_with(header::AUTHORIZATION, &format!("Bearer {token}"));

        let current = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(current.role, Role::Viewer);
    }

    #[tokio::test]
    async fn missing_or_invalid_token_is_unauthorized() {
        let state = create_test_state();

        let mut parts = parts_with(header::COOKIE, "sitectl_session=garbage");
        let err = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);

        let mut parts = parts_with(header::COOKIE, "sitectl_session=garbage");
        let optional = <CurrentUser as OptionalFromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(optional.is_none());
    }

    #[test]
    fn cookie_lookup_matches_exact_name() {
        let config = create_test_config();
        let parts = parts_with(header::COOKIE, "sitectl_session_old=a; sitectl_session=b");
        assert_eq!(cookie_token(&parts, &config), Some("b"));
    }
}
