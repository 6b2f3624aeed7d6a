//! The seam shared by the identity repositories.

use crate::db::errors::Result;

/// Creation and lookup by id for one kind of identity record.
///
/// Operations beyond these two differ per record (a user is deleted together with its profile,
/// an invitation is consumed on acceptance) and live on the repositories themselves.
#[async_trait::async_trait]
pub trait Repository {
    type CreateRequest;

    type Response;

    type Id: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// `Ok(None)` when no record has this id.
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;
}
