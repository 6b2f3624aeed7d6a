//! Privileged functions callable with the service key.
//!
//! These sit outside the session model: the caller presents `Authorization: Bearer <service_key>`
//! and failures are reported as `{"error": ...}`. Without a configured service key the routes
//! answer 404.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use serde_json::{Map, Value};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        functions::{CreateAdminUser, FunctionError, FunctionFailure, FunctionResponse, SetAdminMetadata, function_error},
        users::{Role, UserResponse},
    },
    auth::password,
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    types::abbrev_uuid,
};

fn authorize(headers: &HeaderMap, state: &AppState) -> Result<(), FunctionFailure> {
    let Some(expected) = state.config.service_key.as_deref() else {
        return Err(function_error(StatusCode::NOT_FOUND, "Not found"));
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match presented {
        None => Err(function_error(StatusCode::UNAUTHORIZED, "Missing authorization header")),
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => Ok(()),
        Some(_) => Err(function_error(StatusCode::UNAUTHORIZED, "Invalid service key")),
    }
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn admin_flag() -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("is_admin".to_string(), Value::Bool(true));
    metadata
}

#[utoipa::path(
    post,
    path = "/create-admin-user",
    tag = "functions",
    summary = "Create an administrator",
    request_body = CreateAdminUser,
    responses(
        (status = 200, description = "Admin created", body = FunctionResponse),
        (status = 401, description = "Missing or wrong service key", body = FunctionError),
        (status = 500, description = "Creation failed, e.g. the email is taken", body = FunctionError),
    ),
    security(("ServiceKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_admin_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateAdminUser>,
) -> Result<Json<FunctionResponse>, FunctionFailure> {
    authorize(&headers, &state)?;

    let params = state.config.auth.native.password.argon2_params();
    let plain = request.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&plain, Some(params)))
        .await
        .map_err(function_error_from)?
        .map_err(function_error_from)?;

    let user = Users::new(state.store.as_ref())
        .create(&UserCreateDBRequest {
            email: request.email,
            password_hash: Some(password_hash),
            role: Role::Admin,
            full_name: None,
            app_metadata: admin_flag(),
        })
        .await
        .map_err(function_error_from)?;

    info!(user_id = %abbrev_uuid(&user.id), "created admin user");
    Ok(Json(FunctionResponse {
        message: "Admin user created successfully".to_string(),
        user: UserResponse::from(user),
    }))
}

#[utoipa::path(
    post,
    path = "/set-admin-metadata",
    tag = "functions",
    summary = "Flag an existing user as administrator",
    request_body = SetAdminMetadata,
    responses(
        (status = 200, description = "Metadata merged", body = FunctionResponse),
        (status = 401, description = "Missing or wrong service key", body = FunctionError),
        (status = 404, description = "User not found", body = FunctionError),
    ),
    security(("ServiceKey" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn set_admin_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SetAdminMetadata>,
) -> Result<Json<FunctionResponse>, FunctionFailure> {
    authorize(&headers, &state)?;

    let user = Users::new(state.store.as_ref())
        .merge_app_metadata(request.user_id, admin_flag())
        .await
        .map_err(function_error_from)?
        .ok_or_else(|| function_error(StatusCode::NOT_FOUND, "User not found"))?;

    info!(user_id = %abbrev_uuid(&user.id), "set admin metadata");
    Ok(Json(FunctionResponse {
        message: "User metadata updated successfully".to_string(),
        user: UserResponse::from(user),
    }))
}

fn function_error_from(error: impl std::fmt::Display) -> FunctionFailure {
    function_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::users::Role,
        db::{handlers::Users, store::MemoryStore},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn bearer(key: &str) -> String {
        format!("Bearer {key}")
    }

    #[test]
    fn key_comparison_requires_an_exact_match() {
        use super::constant_time_eq;
        assert!(constant_time_eq(b"service-key", b"service-key"));
        assert!(!constant_time_eq(b"service-key", b"service-kez"));
        assert!(!constant_time_eq(b"service-key", b"service-key-longer"));
        assert!(!constant_time_eq(b"", b"x"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test_log::test(tokio::test)]
    async fn create_admin_user_requires_the_service_key() {
        let server = create_test_server(create_test_state());
        let body = json!({"email": "owner@example.com", "password": "long-enough-password"});

        let response = server.post("/functions/v1/create-admin-user").json(&body).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response.json::<Value>()["error"].is_string());

        server
            .post("/functions/v1/create-admin-user")
            .add_header("authorization", bearer("wrong"))
            .json(&body)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .post("/functions/v1/create-admin-user")
            .add_header("authorization", bearer(TEST_SERVICE_KEY))
            .json(&body)
            .await;
        response.assert_status_ok();
        let created: Value = response.json();
        assert_eq!(created["message"], "Admin user created successfully");
        assert_eq!(created["user"]["app_metadata"]["is_admin"], true);

        let duplicate = server
            .post("/functions/v1/create-admin-user")
            .add_header("authorization", bearer(TEST_SERVICE_KEY))
            .json(&body)
            .await;
        duplicate.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(duplicate.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn created_admin_can_sign_in() {
        let state = create_test_state();
        let store = state.store.clone();
        let server = create_test_server(state);

        server
            .post("/functions/v1/create-admin-user")
            .add_header("authorization", bearer(TEST_SERVICE_KEY))
            .json(&json!({"email": "owner@example.com", "password": "long-enough-password"}))
            .await
            .assert_status_ok();

        let profiles = Users::new(store.as_ref()).list_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].role, Role::Admin);

        server
            .post("/authentication/login")
            .json(&json!({"email": "owner@example.com", "password": "long-enough-password"}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn set_admin_metadata_merges_into_existing() {
        let store = Arc::new(MemoryStore::new());
        let state = create_test_state_with_store(store.clone());
        let user = create_test_user(&state, Role::Editor).await;
        let server = create_test_server(state);

        let response = server
            .post("/functions/v1/set-admin-metadata")
            .add_header("authorization", bearer(TEST_SERVICE_KEY))
            .json(&json!({"userId": user.id}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "User metadata updated successfully");
        assert_eq!(body["user"]["app_metadata"]["is_admin"], true);

        let response = server
            .post("/functions/v1/set-admin-metadata")
            .add_header("authorization", bearer(TEST_SERVICE_KEY))
            .json(&json!({"userId": uuid::Uuid::new_v4()}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "User not found");
    }

    #[tokio::test]
    async fn functions_are_hidden_without_a_service_key() {
        let mut state = create_test_state();
        state.config.service_key = None;
        let server = create_test_server(state);

        server
            .post("/functions/v1/set-admin-metadata")
            .add_header("authorization", bearer(TEST_SERVICE_KEY))
            .json(&json!({"userId": uuid::Uuid::new_v4()}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
