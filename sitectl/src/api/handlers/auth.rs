use axum::{Json, extract::State};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    api::models::{
        auth::{AcceptInvitationRequest, AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse},
        users::CurrentUser,
    },
    auth::{
        events::AuthEvent,
        password::{self, Argon2Params},
        session,
    },
    config::Config,
    db::handlers::{Invitations, Repository, Users},
    errors::Error,
};

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

fn invalid_invitation() -> Error {
    Error::BadRequest {
        message: "This invitation link is invalid or has expired".to_string(),
    }
}

/// Verify a password hash on a blocking thread to avoid blocking the async runtime.
async fn verify_blocking(secret: String, hash: String) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || password::verify_string(&secret, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}

async fn hash_blocking(secret: String, params: Argon2Params) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || password::hash_string_with_params(&secret, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Check credentials and announce the sign-in. Shared by the JSON API and the login form.
pub(crate) async fn authenticate(state: &AppState, request: &LoginRequest) -> Result<CurrentUser, Error> {
    let mut users = Users::new(state.store.as_ref());
    let user = users
        .get_user_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // Invited users cannot sign in until they choose a password
    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;
    if !verify_blocking(request.password.clone(), hash).await? {
        return Err(invalid_credentials());
    }

    state.auth_events.publish(AuthEvent::SignedIn { user_id: user.id });
    let role = state.sessions.role_of(user.id).await?.unwrap_or_default();
    tracing::info!(user_id = %user.id, %role, "user signed in");

    Ok(CurrentUser {
        id: user.id,
        is_admin: user.is_admin(),
        email: user.email,
        role,
    })
}

/// `Set-Cookie` value carrying a session token.
pub(crate) fn create_session_cookie(token: &str, config: &Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = config.auth.security.jwt_expiry.as_secs();
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, secure, session_config.cookie_same_site, max_age
    )
}

/// `Set-Cookie` value removing the session cookie.
pub(crate) fn expired_session_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0",
        config.auth.native.session.cookie_name
    )
}

fn session_response(user: CurrentUser, message: &str, config: &Config) -> Result<LoginResponse, Error> {
    let token = session::create_session_token(&user, config)?;
    Ok(LoginResponse {
        cookie: create_session_cookie(&token, config),
        auth_response: AuthResponse {
            user,
            message: message.to_string(),
        },
    })
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let user = authenticate(&state, &request).await?;
    session_response(user, "Login successful", &state.config)
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, user: Option<CurrentUser>) -> Result<LogoutResponse, Error> {
    if let Some(user) = user {
        state.auth_events.publish(AuthEvent::SignedOut { user_id: user.id });
    }

    Ok(LogoutResponse {
        cookie: expired_session_cookie(&state.config),
        auth_response: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
    })
}

/// The current session
#[utoipa::path(
    get,
    path = "/authentication/session",
    tag = "authentication",
    responses(
        (status = 200, description = "Active session", body = AuthResponse),
        (status = 401, description = "No session"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_session(user: CurrentUser) -> Result<Json<AuthResponse>, Error> {
    Ok(Json(AuthResponse {
        user,
        message: "Session active".to_string(),
    }))
}

/// Re-issue the session token with a fresh expiry
#[utoipa::path(
    post,
    path = "/authentication/refresh",
    tag = "authentication",
    responses(
        (status = 200, description = "Session refreshed", body = AuthResponse),
        (status = 401, description = "No session"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, user: CurrentUser) -> Result<LoginResponse, Error> {
    state.auth_events.publish(AuthEvent::TokenRefreshed { user_id: user.id });
    // The role may have changed since the old token was issued
    let role = state.sessions.role_of(user.id).await?.ok_or(Error::Unauthenticated { message: None })?;
    session_response(CurrentUser { role, ..user }, "Session refreshed", &state.config)
}

/// Split an emailed token into the invitation id and its secret part.
pub(crate) fn parse_invitation_token(token: &str) -> Option<(Uuid, &str)> {
    let (id, secret) = token.trim().split_once('.')?;
    let id = Uuid::parse_str(id).ok()?;
    (!secret.is_empty()).then_some((id, secret))
}

/// Token as it travels in the invitation link.
pub(crate) fn format_invitation_token(id: Uuid, secret: &str) -> String {
    format!("{id}.{secret}")
}

/// Check an invitation token and set the invited user's password. Shared by the JSON API and the
/// accept-invitation form.
pub(crate) async fn redeem_invitation(state: &AppState, token: &str, new_password: String) -> Result<(), Error> {
    let (invitation_id, secret) = parse_invitation_token(token).ok_or_else(invalid_invitation)?;

    let mut invitations = Invitations::new(state.store.as_ref());
    let invitation = invitations
        .get_by_id(invitation_id)
        .await?
        .ok_or_else(invalid_invitation)?;
    if invitation.expires_at <= Utc::now() {
        return Err(invalid_invitation());
    }
    if !verify_blocking(secret.to_string(), invitation.token_hash.clone()).await? {
        return Err(invalid_invitation());
    }

    password::check_password_policy(&new_password, &state.config.auth.native.password)?;
    let password_hash = hash_blocking(new_password, state.config.auth.native.password.argon2_params()).await?;
    invitations.accept(&invitation, password_hash).await?;
    tracing::info!(user_id = %invitation.user_id, "invitation accepted");
    Ok(())
}

pub(crate) const INVITATION_ACCEPTED: &str = "Password set. You can now sign in.";

/// Set the password of an invited user
#[utoipa::path(
    post,
    path = "/authentication/invitations/accept",
    request_body = AcceptInvitationRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password set", body = AuthSuccessResponse),
        (status = 400, description = "Invalid or expired invitation, or password rejected"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn accept_invitation(
    State(state): State<AppState>,
    Json(request): Json<AcceptInvitationRequest>,
) -> Result<Json<AuthSuccessResponse>, Error> {
    redeem_invitation(&state, &request.token, request.password).await?;
    Ok(Json(AuthSuccessResponse {
        message: INVITATION_ACCEPTED.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::handlers::invitations::InvitationCreateRequest;
    use crate::test_utils::{TEST_PASSWORD, create_test_server, create_test_state, create_test_user, session_cookie};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let state = create_test_state();
        let user = create_test_user(&state, Role::Editor).await;
        let server = create_test_server(state);

        let response = server
            .post("/authentication/login")
            .json(&json!({"email": user.email.to_uppercase(), "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_string();
        assert!(cookie.starts_with("sitectl_session="));
        assert!(cookie.contains("HttpOnly"));
        let body: AuthResponse = response.json();
        assert_eq!(body.user.id, user.id);
        assert_eq!(body.user.role, Role::Editor);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_email() {
        let state = create_test_state();
        let user = create_test_user(&state, Role::Viewer).await;
        let server = create_test_server(state);

        let response = server
            .post("/authentication/login")
            .json(&json!({"email": user.email, "password": "not-the-password"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.text(), "Invalid email or password");

        let response = server
            .post("/authentication/login")
            .json(&json!({"email": "nobody@example.com", "password": TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_requires_a_valid_cookie() {
        let state = create_test_state();
        let user = create_test_user(&state, Role::Admin).await;
        let cookie = session_cookie(&state, &user);
        let server = create_test_server(state);

        server
            .get("/authentication/session")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server.get("/authentication/session").add_header("cookie", &cookie).await;
        response.assert_status_ok();
        let body: AuthResponse = response.json();
        assert_eq!(body.user.role, Role::Admin);
    }

    #[tokio::test]
    async fn refresh_picks_up_a_changed_role() {
        let state = create_test_state();
        let user = create_test_user(&state, Role::Viewer).await;
        let cookie = session_cookie(&state, &user);
        Users::new(state.store.as_ref()).set_role(user.id, Role::Editor).await.unwrap();
        let server = create_test_server(state);

        let response = server.post("/authentication/refresh").add_header("cookie", &cookie).await;
        response.assert_status_ok();
        let body: AuthResponse = response.json();
        assert_eq!(body.user.role, Role::Editor);
        assert!(response.headers().get("set-cookie").is_some());
    }

    #[tokio::test]
    async fn logout_expires_the_cookie() {
        let state = create_test_state();
        let server = create_test_server(state);

        let response = server.post("/authentication/logout").await;
        response.assert_status_ok();
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    async fn invite(state: &AppState, expires_in: chrono::Duration) -> (CurrentUser, String) {
        let user = create_test_user(state, Role::Viewer).await;
        let secret = password::generate_invitation_token();
        let invitation = Invitations::new(state.store.as_ref())
            .create(&InvitationCreateRequest {
                user_id: user.id,
                raw_token: secret.clone(),
                expires_at: Utc::now() + expires_in,
                argon2_params: state.config.auth.native.password.argon2_params(),
            })
            .await
            .unwrap();
        (user, format_invitation_token(invitation.id, &secret))
    }

    #[tokio::test]
    async fn accepted_invitation_sets_password_once() {
        let state = create_test_state();
        let (user, token) = invite(&state, chrono::Duration::days(1)).await;
        let server = create_test_server(state);

        server
            .post("/authentication/invitations/accept")
            .json(&json!({"token": token, "password": "a-brand-new-password"}))
            .await
            .assert_status_ok();

        server
            .post("/authentication/login")
            .json(&json!({"email": user.email, "password": "a-brand-new-password"}))
            .await
            .assert_status_ok();

        // Consumed
        server
            .post("/authentication/invitations/accept")
            .json(&json!({"token": token, "password": "another-password"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn expired_or_tampered_invitations_are_rejected() {
        let state = create_test_state();
        let (_, expired) = invite(&state, chrono::Duration::seconds(-1)).await;
        let (_, valid) = invite(&state, chrono::Duration::days(1)).await;
        let server = create_test_server(state);

        server
            .post("/authentication/invitations/accept")
            .json(&json!({"token": expired, "password": "a-brand-new-password"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let (id, _) = valid.split_once('.').unwrap();
        server
            .post("/authentication/invitations/accept")
            .json(&json!({"token": format!("{id}.wrong"), "password": "a-brand-new-password"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invitation_password_must_meet_policy() {
        let state = create_test_state();
        let (_, token) = invite(&state, chrono::Duration::days(1)).await;
        let server = create_test_server(state);

        let response = server
            .post("/authentication/invitations/accept")
            .json(&json!({"token": token, "password": "short"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["errors"][0]["field"], "password");
    }

    #[test]
    fn invitation_tokens_round_trip() {
        let id = Uuid::new_v4();
        let token = format_invitation_token(id, "abc_DEF-123");
        assert_eq!(parse_invitation_token(&token), Some((id, "abc_DEF-123")));
        assert_eq!(parse_invitation_token("not-a-uuid.abc"), None);
        assert_eq!(parse_invitation_token(&format!("{id}.")), None);
    }

    #[test]
    fn session_cookie_honours_config() {
        let mut config = crate::test_utils::create_test_config();
        config.auth.native.session.cookie_secure = false;
        let cookie = create_session_cookie("tok", &config);
        assert!(cookie.starts_with("sitectl_session=tok; Path=/; HttpOnly; SameSite=lax"));
        assert!(!cookie.contains("Secure"));
        assert!(cookie.ends_with(&format!("Max-Age={}", config.auth.security.jwt_expiry.as_secs())));
    }
}
