//! Auth-state change notifications.
//!
//! Identity handlers publish an [`AuthEvent`] after every change to a user's session or role.
//! The bus is a [`broadcast`] channel: publishing never blocks, and each subscriber reads the
//! events through its own receiver. A slow receiver that falls behind by more than
//! [`AUTH_EVENT_CAPACITY`] events observes `Lagged` and has to treat all of its state as stale.

use tokio::sync::broadcast;
use tracing::debug;

use crate::api::models::users::Role;
use crate::types::{UserId, abbrev_uuid};

pub const AUTH_EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: UserId },
    SignedOut { user_id: UserId },
    TokenRefreshed { user_id: UserId },
    RoleChanged { user_id: UserId, role: Role },
    UserDeleted { user_id: UserId },
}

impl AuthEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            AuthEvent::SignedIn { user_id }
            | AuthEvent::SignedOut { user_id }
            | AuthEvent::TokenRefreshed { user_id }
            | AuthEvent::RoleChanged { user_id, .. }
            | AuthEvent::UserDeleted { user_id } => *user_id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn { .. } => "signed_in",
            AuthEvent::SignedOut { .. } => "signed_out",
            AuthEvent::TokenRefreshed { .. } => "token_refreshed",
            AuthEvent::RoleChanged { .. } => "role_changed",
            AuthEvent::UserDeleted { .. } => "user_deleted",
        }
    }
}

/// Cloneable handle to one broadcast channel of auth events.
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { sender }
    }

    /// A receiver that sees every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: AuthEvent) {
        debug!(
            event = event.name(),
            user_id = %abbrev_uuid(&event.user_id()),
            subscribers = self.sender.receiver_count(),
            "publishing auth event"
        );
        // No receivers is not an error: nothing is cached yet.
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
