//! Resolution of a session token to the signed-in user and their role.
//!
//! A request's session moves through `Uninitialized -> Loading -> {Authenticated, Anonymous}`.
//! Roles are read from the user's profile and cached until an [`AuthEvent`] for that user
//! invalidates the entry; nothing else evicts them.
//!
//! The context drains its event receiver before every cache read and again before every cache
//! fill. Each drained event advances an epoch, and a fill is skipped when the epoch moved while
//! the profile was being read, so a role fetched just before a change is never cached.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use moka::sync::Cache;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, instrument, warn};

use crate::api::models::users::{CurrentUser, Role};
use crate::auth::events::{AuthEvent, AuthEventBus};
use crate::auth::session::SessionClaims;
use crate::db::handlers::{Repository, Users};
use crate::db::store::Store;
use crate::errors::Result;
use crate::types::{UserId, abbrev_uuid};

const ROLE_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Authenticated {
        user: CurrentUser,
    },
    Anonymous,
}

impl SessionState {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            SessionState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    /// Whether resolution has finished.
    pub fn is_settled(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. } | SessionState::Anonymous)
    }
}

/// Read position in the auth event stream.
struct EventCursor {
    events: broadcast::Receiver<AuthEvent>,
    epoch: u64,
}

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn Store>,
    roles: Cache<UserId, Role>,
    cursor: Arc<Mutex<EventCursor>>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("cached_roles", &self.roles.entry_count())
            .finish()
    }
}

impl SessionContext {
    /// Build a context whose role cache follows `events`.
    pub fn new(store: Arc<dyn Store>, events: &AuthEventBus) -> Self {
        Self {
            store,
            roles: Cache::new(ROLE_CACHE_CAPACITY),
            cursor: Arc::new(Mutex::new(EventCursor {
                events: events.subscribe(),
                epoch: 0,
            })),
        }
    }

    /// Apply every pending event to the cache. The guard keeps other lookups from draining until
    /// the caller is done with the cache.
    fn sync_events(&self) -> MutexGuard<'_, EventCursor> {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match cursor.events.try_recv() {
                Ok(event) => {
                    cursor.epoch += 1;
                    self.roles.invalidate(&event.user_id());
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth events lagged, clearing the role cache");
                    cursor.epoch += 1;
                    self.roles.invalidate_all();
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        cursor
    }

    pub fn cached_role(&self, user_id: UserId) -> Option<Role> {
        let _cursor = self.sync_events();
        self.roles.get(&user_id)
    }

    /// The user's role, or `None` when the user no longer exists. A user without a profile is a
    /// viewer.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn role_of(&self, user_id: UserId) -> Result<Option<Role>> {
        let epoch = {
            let cursor = self.sync_events();
            if let Some(role) = self.roles.get(&user_id) {
                return Ok(Some(role));
            }
            cursor.epoch
        };

        let mut users = Users::new(self.store.as_ref());
        if users.get_by_id(user_id).await?.is_none() {
            return Ok(None);
        }
        let role = users
            .get_profile(user_id)
            .await?
            .map(|profile| profile.role)
            .unwrap_or_default();

        let cursor = self.sync_events();
        if cursor.epoch == epoch {
            debug!(%role, "caching role");
            self.roles.insert(user_id, role);
        } else {
            debug!(%role, "auth event during lookup, not caching role");
        }
        Ok(Some(role))
    }

    /// Settle the session named by `claims`, if any.
    pub async fn resolve(&self, claims: Option<&SessionClaims>) -> Result<SessionState> {
        let Some(claims) = claims else {
            return Ok(SessionState::Anonymous);
        };
        Ok(match self.role_of(claims.sub).await? {
            Some(role) => SessionState::Authenticated {
                user: CurrentUser {
                    id: claims.sub,
                    email: claims.email.clone(),
                    role,
                    is_admin: claims.is_admin,
                },
            },
            None => SessionState::Anonymous,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::Result as DbResult;
    use crate::db::models::users::UserCreateDBRequest;
    use crate::db::store::{MemoryStore, Query, Row, TableName, WriteBatch};
    use crate::test_utils::FailingStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Demotes `user_id` and announces it right after the first profile read, as a concurrent
    /// admin request would.
    #[derive(Debug)]
    struct DemoteAfterProfileRead {
        inner: MemoryStore,
        events: AuthEventBus,
        user_id: UserId,
        fired: AtomicBool,
    }

    #[async_trait::async_trait]
    impl Store for DemoteAfterProfileRead {
        async fn select(&self, table: TableName, query: &Query) -> DbResult<Vec<Row>> {
            let rows = self.inner.select(table, query).await?;
            if table == TableName::Profiles && !self.fired.swap(true, Ordering::SeqCst) {
                Users::new(&self.inner).set_role(self.user_id, Role::Viewer).await?;
                self.events.publish(AuthEvent::RoleChanged {
                    user_id: self.user_id,
                    role: Role::Viewer,
                });
            }
            Ok(rows)
        }

        async fn apply(&self, batch: WriteBatch) -> DbResult<Vec<Vec<Row>>> {
            self.inner.apply(batch).await
        }
    }

    fn claims_for(user_id: UserId) -> SessionClaims {
        SessionClaims {
            sub: user_id,
            email: "someone@example.com".into(),
            is_admin: false,
            exp: 0,
            iat: 0,
        }
    }

    async fn create_user(store: &dyn Store, role: Role) -> UserId {
        Users::new(store)
            .create(&UserCreateDBRequest {
                email: format!("{}@example.com", uuid::Uuid::new_v4()),
                password_hash: None,
                role,
                full_name: None,
                app_metadata: Default::default(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn no_claims_is_anonymous() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let sessions = SessionContext::new(store, &AuthEventBus::new());
        assert_eq!(sessions.resolve(None).await.unwrap(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn role_is_cached_until_an_event_names_the_user() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let events = AuthEventBus::new();
        let sessions = SessionContext::new(Arc::clone(&store), &events);
        let user_id = create_user(store.as_ref(), Role::Editor).await;

        let state = sessions.resolve(Some(&claims_for(user_id))).await.unwrap();
        assert_eq!(state.user().map(|u| u.role), Some(Role::Editor));

        // Changed behind the cache's back: still the cached value.
        Users::new(store.as_ref()).set_role(user_id, Role::Admin).await.unwrap();
        assert_eq!(sessions.role_of(user_id).await.unwrap(), Some(Role::Editor));

        events.publish(AuthEvent::RoleChanged {
            user_id,
            role: Role::Admin,
        });
        assert_eq!(sessions.cached_role(user_id), None);
        assert_eq!(sessions.role_of(user_id).await.unwrap(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn role_changed_during_lookup_is_not_cached() {
        let inner = MemoryStore::new();
        let user_id = create_user(&inner, Role::Admin).await;
        let events = AuthEventBus::new();
        let store = Arc::new(DemoteAfterProfileRead {
            inner,
            events: events.clone(),
            user_id,
            fired: AtomicBool::new(false),
        });
        let sessions = SessionContext::new(store, &events);

        // The lookup read the profile before the demotion landed.
        assert_eq!(sessions.role_of(user_id).await.unwrap(), Some(Role::Admin));
        assert_eq!(sessions.cached_role(user_id), None);

        assert_eq!(sessions.role_of(user_id).await.unwrap(), Some(Role::Viewer));
        assert_eq!(sessions.cached_role(user_id), Some(Role::Viewer));
    }

    #[tokio::test]
    async fn event_drained_by_another_lookup_still_blocks_the_fill() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let events = AuthEventBus::new();
        let sessions = SessionContext::new(Arc::clone(&store), &events);
        let user_id = create_user(store.as_ref(), Role::Editor).await;

        let epoch = sessions.sync_events().epoch;
        events.publish(AuthEvent::RoleChanged {
            user_id,
            role: Role::Viewer,
        });
        // Some other request drains the event first.
        assert_eq!(sessions.cached_role(uuid::Uuid::new_v4()), None);
        assert_ne!(sessions.sync_events().epoch, epoch);
    }

    #[tokio::test]
    async fn lagging_clears_every_cached_role() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let events = AuthEventBus::new();
        let sessions = SessionContext::new(Arc::clone(&store), &events);
        let user_id = create_user(store.as_ref(), Role::Editor).await;
        sessions.role_of(user_id).await.unwrap();
        assert_eq!(sessions.cached_role(user_id), Some(Role::Editor));

        for _ in 0..=crate::auth::events::AUTH_EVENT_CAPACITY {
            events.publish(AuthEvent::SignedIn {
                user_id: uuid::Uuid::new_v4(),
            });
        }
        assert_eq!(sessions.cached_role(user_id), None);
    }

    #[tokio::test]
    async fn missing_profile_resolves_to_viewer() {
        let store = Arc::new(MemoryStore::new());
        let user_id = create_user(store.as_ref(), Role::Admin).await;
        store
            .apply(crate::db::store::WriteBatch::new().delete(
                TableName::Profiles,
                crate::db::store::Filter::all().eq("id", user_id.to_string()),
            ))
            .await
            .unwrap();

        let sessions = SessionContext::new(store, &AuthEventBus::new());
        assert_eq!(sessions.role_of(user_id).await.unwrap(), Some(Role::Viewer));
    }

    #[tokio::test]
    async fn deleted_user_becomes_anonymous() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let events = AuthEventBus::new();
        let sessions = SessionContext::new(Arc::clone(&store), &events);
        let user_id = create_user(store.as_ref(), Role::Viewer).await;
        assert!(sessions.resolve(Some(&claims_for(user_id))).await.unwrap().is_settled());

        Users::new(store.as_ref()).delete(user_id).await.unwrap();
        events.publish(AuthEvent::UserDeleted { user_id });

        assert_eq!(
            sessions.resolve(Some(&claims_for(user_id))).await.unwrap(),
            SessionState::Anonymous
        );
    }

    #[tokio::test]
    async fn store_failure_is_an_error() {
        let sessions = SessionContext::new(Arc::new(FailingStore), &AuthEventBus::new());
        assert!(sessions.resolve(Some(&claims_for(uuid::Uuid::new_v4()))).await.is_err());
    }

    #[test]
    fn only_final_states_are_settled() {
        assert!(!SessionState::Uninitialized.is_settled());
        assert!(!SessionState::Loading.is_settled());
        assert!(SessionState::Anonymous.is_settled());
    }
}
