//! Records for identities, their profiles and pending invitations.

use crate::api::models::users::Role;
use crate::db::handlers::Record;
use crate::db::store::TableName;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// An identity that can sign in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    /// Absent until an invited user accepts their invitation
    pub password_hash: Option<String>,
    /// Privileged metadata such as `is_admin`, only written by the privileged functions
    #[serde(default)]
    pub app_metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.app_metadata.get("is_admin").and_then(Value::as_bool).unwrap_or(false)
    }
}

impl Record for UserRecord {
    const TABLE: TableName = TableName::Users;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// One row per identity carrying the role used for route gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Record for Profile {
    const TABLE: TableName = TableName::Profiles;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Database request for creating an identity together with its profile
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub full_name: Option<String>,
    pub app_metadata: Map<String, Value>,
}

/// A one-time token letting an invited user choose a password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Record for Invitation {
    const TABLE: TableName = TableName::Invitations;

    fn id(&self) -> Uuid {
        self.id
    }
}
