//! Repository for identities and their profiles.

use crate::types::{UserId, abbrev_uuid};
use crate::{
    api::models::users::Role,
    db::{
        errors::{DbError, Result},
        handlers::{
            repository::Repository,
            table::{Table, from_row, to_row},
        },
        models::users::{Profile, UserCreateDBRequest, UserRecord},
        store::{Filter, Query, Row, SortOrder, Store, TableName, WriteBatch},
    },
};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::instrument;
use uuid::Uuid;

/// Database request for updating an identity. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub password_hash: Option<String>,
    pub app_metadata: Option<Map<String, Value>>,
}

/// Emails are stored and compared lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct Users<'s> {
    store: &'s dyn Store,
}

impl<'s> Users<'s> {
    pub fn new(store: &'s dyn Store) -> Self {
        Self { store }
    }

    fn users(&self) -> Table<'s, UserRecord> {
        Table::new(self.store)
    }

    fn profiles(&self) -> Table<'s, Profile> {
        Table::new(self.store)
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserRecord>> {
        self.users()
            .fetch_single(Query::new().eq("email", normalize_email(email)))
            .await
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn get_profile(&mut self, id: UserId) -> Result<Option<Profile>> {
        self.profiles().fetch_single(Query::new().eq("id", id.to_string())).await
    }

    /// Every profile, oldest first.
    #[instrument(skip(self), err)]
    pub async fn list_profiles(&mut self) -> Result<Vec<Profile>> {
        self.profiles()
            .select(&Query::new().order_by("created_at", SortOrder::Asc))
            .await
    }

    /// Change the role on a user's profile, creating the profile if the user had none.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn set_role(&mut self, id: UserId, role: Role) -> Result<Profile> {
        let user = self.get_by_id(id).await?.ok_or(DbError::NotFound)?;
        let profile = match self.get_profile(id).await? {
            Some(existing) => Profile { role, ..existing },
            None => Profile {
                id,
                email: user.email,
                full_name: None,
                role,
                created_at: Utc::now(),
            },
        };
        let mut written = self.profiles().upsert(std::slice::from_ref(&profile), "id").await?;
        written.pop().ok_or(DbError::NotFound)
    }

    /// Merge `metadata` into the user's existing app metadata, keeping keys it does not mention.
    #[instrument(skip(self, metadata), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn merge_app_metadata(&mut self, id: UserId, metadata: Map<String, Value>) -> Result<Option<UserRecord>> {
        let Some(user) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let mut merged = user.app_metadata;
        merged.extend(metadata);
        let request = UserUpdateDBRequest {
            app_metadata: Some(merged),
            ..Default::default()
        };
        self.update(id, &request).await.map(Some)
    }

    /// Remove the identity along with its profile and invitations.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: UserId) -> Result<bool> {
        let batch = WriteBatch::new()
            .delete(TableName::Invitations, Filter::all().eq("user_id", id.to_string()))
            .delete(TableName::Profiles, Filter::all().eq("id", id.to_string()))
            .delete(TableName::Users, Filter::all().eq("id", id.to_string()));
        let written = self.store.apply(batch).await?;
        Ok(written.last().is_some_and(|rows| !rows.is_empty()))
    }

    /// Overwrite the fields the request sets.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserRecord> {
        let mut patch = Row::new();
        if let Some(hash) = &request.password_hash {
            patch.insert("password_hash".into(), Value::String(hash.clone()));
        }
        if let Some(metadata) = &request.app_metadata {
            patch.insert("app_metadata".into(), Value::Object(metadata.clone()));
        }
        if patch.is_empty() {
            return self.get_by_id(id).await?.ok_or(DbError::NotFound);
        }
        self.users().update_fields(id, patch).await?.ok_or(DbError::NotFound)
    }
}

#[async_trait::async_trait]
impl<'s> Repository for Users<'s> {
    type CreateRequest = UserCreateDBRequest;
    type Response = UserRecord;
    type Id = UserId;

    /// Insert the identity and its profile in one batch.
    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: normalize_email(&request.email),
            password_hash: request.password_hash.clone(),
            app_metadata: request.app_metadata.clone(),
            created_at: now,
        };
        let profile = Profile {
            id: user.id,
            email: user.email.clone(),
            full_name: request.full_name.clone(),
            role: request.role,
            created_at: now,
        };

        let batch = WriteBatch::new()
            .insert(TableName::Users, vec![to_row(TableName::Users, &user)?])
            .insert(TableName::Profiles, vec![to_row(TableName::Profiles, &profile)?]);
        let mut written = self.store.apply(batch).await?;
        let row = written
            .first_mut()
            .and_then(|rows| rows.pop())
            .ok_or(DbError::NotFound)?;
        from_row(TableName::Users, row)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        self.users().fetch_single(Query::new().eq("id", id.to_string())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MemoryStore;
    use serde_json::json;

    fn request(email: &str, role: Role) -> UserCreateDBRequest {
        UserCreateDBRequest {
            email: email.to_string(),
            password_hash: None,
            role,
            full_name: None,
            app_metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn create_writes_user_and_profile() {
        let store = MemoryStore::new();
        let mut users = Users::new(&store);

        let user = users.create(&request("Editor@Example.com", Role::Editor)).await.unwrap();
        assert_eq!(user.email, "editor@example.com");

        let profile = users.get_profile(user.id).await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Editor);
        assert_eq!(
            users.get_user_by_email("EDITOR@example.com").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = MemoryStore::new();
        let mut users = Users::new(&store);
        users.create(&request("a@example.com", Role::Viewer)).await.unwrap();
        let err = users.create(&request("a@example.com", Role::Admin)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        // The profile insert of the failed batch must not have landed either.
        assert_eq!(users.list_profiles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn merge_keeps_existing_metadata() {
        let store = MemoryStore::new();
        let mut users = Users::new(&store);
        let mut initial = request("meta@example.com", Role::Viewer);
        initial.app_metadata.insert("provider".into(), json!("email"));
        let user = users.create(&initial).await.unwrap();

        let mut stamp = Map::new();
        stamp.insert("is_admin".into(), json!(true));
        let updated = users.merge_app_metadata(user.id, stamp).await.unwrap().unwrap();

        assert!(updated.is_admin());
        assert_eq!(updated.app_metadata["provider"], "email");
        assert!(users.merge_app_metadata(Uuid::new_v4(), Map::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_profile_too() {
        let store = MemoryStore::new();
        let mut users = Users::new(&store);
        let user = users.create(&request("gone@example.com", Role::Viewer)).await.unwrap();

        assert!(users.delete(user.id).await.unwrap());
        assert!(users.get_profile(user.id).await.unwrap().is_none());
        assert!(!users.delete(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn set_role_updates_profile() {
        let store = MemoryStore::new();
        let mut users = Users::new(&store);
        let user = users.create(&request("r@example.com", Role::Viewer)).await.unwrap();

        let profile = users.set_role(user.id, Role::Admin).await.unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert!(matches!(users.set_role(Uuid::new_v4(), Role::Admin).await, Err(DbError::NotFound)));
    }
}
