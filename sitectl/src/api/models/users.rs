//! API request/response models for users, profiles and invitations.

use crate::db::models::users::{Profile, UserRecord};
use crate::types::{InvitationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use utoipa::ToSchema;

/// Role attached to a profile, gating access to admin routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    #[default]
    Viewer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user as seen by handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub role: Role,
    /// Set by the privileged `create-admin-user` and `set-admin-metadata` functions
    pub is_admin: bool,
}

/// An identity without its credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    #[schema(value_type = Object)]
    pub app_metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    /// Whether a password has been set (false for invitations not yet accepted)
    pub has_password: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(db: UserRecord) -> Self {
        Self {
            id: db.id,
            email: db.email,
            app_metadata: db.app_metadata,
            created_at: db.created_at,
            has_password: db.password_hash.is_some(),
        }
    }
}

/// A row of the user management table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(db: Profile) -> Self {
        Self {
            id: db.id,
            email: db.email,
            full_name: db.full_name,
            role: db.role,
            created_at: db.created_at,
        }
    }
}

/// Request body for inviting a user by email.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InviteUser {
    #[schema(example = "new.editor@example.com")]
    pub email: String,
    /// Initial role; defaults to `viewer`
    #[serde(default)]
    pub role: Option<Role>,
    pub full_name: Option<String>,
}

/// Response to a created invitation. The token itself only travels by email.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvitationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: InvitationId,
    pub profile: ProfileResponse,
    pub expires_at: DateTime<Utc>,
}

/// Request body for changing a user's role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleUpdate {
    pub role: Role,
}
