//! Repository for invitation tokens.

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::password,
    db::{
        errors::{DbError, Result},
        handlers::{repository::Repository, table::Table},
        models::users::Invitation,
        store::{Filter, Query, Row, Store, TableName, WriteBatch},
    },
    types::{InvitationId, UserId, abbrev_uuid},
};

/// Request for creating an invitation. The raw token is hashed before it is stored.
#[derive(Debug, Clone)]
pub struct InvitationCreateRequest {
    pub user_id: UserId,
    pub raw_token: String,
    pub expires_at: DateTime<Utc>,
    pub argon2_params: password::Argon2Params,
}

pub struct Invitations<'s> {
    store: &'s dyn Store,
}

impl<'s> Invitations<'s> {
    pub fn new(store: &'s dyn Store) -> Self {
        Self { store }
    }

    fn table(&self) -> Table<'s, Invitation> {
        Table::new(self.store)
    }

    /// Set the invited user's password and drop every invitation they hold, atomically.
    #[instrument(skip(self, invitation, password_hash), fields(user_id = %abbrev_uuid(&invitation.user_id)), err)]
    pub async fn accept(&mut self, invitation: &Invitation, password_hash: String) -> Result<()> {
        let mut patch = Row::new();
        patch.insert("password_hash".into(), password_hash.into());

        let batch = WriteBatch::new()
            .update(
                TableName::Users,
                Filter::all().eq("id", invitation.user_id.to_string()),
                patch,
            )
            .delete(
                TableName::Invitations,
                Filter::all().eq("user_id", invitation.user_id.to_string()),
            );
        let written = self.store.apply(batch).await?;
        if written.first().is_none_or(|rows| rows.is_empty()) {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<'s> Repository for Invitations<'s> {
    type CreateRequest = InvitationCreateRequest;
    type Response = Invitation;
    type Id = InvitationId;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &InvitationCreateRequest) -> Result<Invitation> {
        let token_hash = password::hash_string_with_params(&request.raw_token, Some(request.argon2_params))
            .map_err(|e| DbError::Other(anyhow::anyhow!(e)))?;

        let invitation = Invitation {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            token_hash,
            expires_at: request.expires_at,
            created_at: Utc::now(),
        };
        self.table().insert(&invitation).await
    }

    #[instrument(skip(self), fields(invitation_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: InvitationId) -> Result<Option<Invitation>> {
        self.table().fetch_single(Query::new().eq("id", id.to_string())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::handlers::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use crate::db::store::MemoryStore;
    use chrono::Duration;

    async fn invited_user(store: &MemoryStore) -> UserId {
        let mut users = Users::new(store);
        users
            .create(&UserCreateDBRequest {
                email: "new@example.com".into(),
                password_hash: None,
                role: Role::Viewer,
                full_name: None,
                app_metadata: Default::default(),
            })
            .await
            .unwrap()
            .id
    }

    fn fast_params() -> password::Argon2Params {
        password::Argon2Params {
            memory_kib: 128,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[tokio::test]
    async fn accept_sets_password_and_consumes_invitation() {
        let store = MemoryStore::new();
        let user_id = invited_user(&store).await;
        let mut invitations = Invitations::new(&store);

        let invitation = invitations
            .create(&InvitationCreateRequest {
                user_id,
                raw_token: "raw".into(),
                expires_at: Utc::now() + Duration::days(1),
                argon2_params: fast_params(),
            })
            .await
            .unwrap();
        assert!(password::verify_string("raw", &invitation.token_hash).unwrap());

        invitations.accept(&invitation, "hash".into()).await.unwrap();
        assert!(invitations.get_by_id(invitation.id).await.unwrap().is_none());

        let user = Users::new(&store).get_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.password_hash.as_deref(), Some("hash"));
    }
}
