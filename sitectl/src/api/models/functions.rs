//! Bodies of the service-key functions.

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::users::UserResponse;
use crate::types::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAdminUser {
    #[schema(example = "owner@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetAdminMetadata {
    #[serde(rename = "userId")]
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FunctionResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Failure body of a function.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FunctionError {
    pub error: String,
}

pub type FunctionFailure = (StatusCode, Json<FunctionError>);

pub fn function_error(status: StatusCode, error: impl Into<String>) -> FunctionFailure {
    let error = error.into();
    if status.is_server_error() {
        tracing::error!(%error, "function failed");
    }
    (status, Json(FunctionError { error }))
}
