//! # Session Store
//!
//! The concurrent keyed store of per-user [`Session`]s.
//!
//! One outer read/write lock guards the map; each entry is an
//! `Arc<Mutex<Session>>` so handling a user's update serializes on that
//! user's mutex alone. Distinct users never contend past the brief map
//! access, and a session entry, once created, lives for the process
//! lifetime — nothing evicts it.

use bibliofi_core::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Lazily-populated map from user id to that user's session.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The session handle for `user_id`, created on first contact.
    pub async fn session(&self, user_id: i64) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&user_id) {
            return Arc::clone(session);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(Session::new()))),
        )
    }

    /// Number of sessions currently held.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bibliofi_core::ChatState;

    #[tokio::test]
    async fn sessions_are_created_lazily_and_reused() {
        let store = SessionStore::new();
        assert!(store.is_empty().await);

        let first = store.session(1).await;
        first.lock().await.set_state(ChatState::FileUploaded);

        let again = store.session(1).await;
        assert_eq!(again.lock().await.state(), ChatState::FileUploaded);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn users_get_disjoint_sessions() {
        let store = SessionStore::new();
        store
            .session(1)
            .await
            .lock()
            .await
            .set_state(ChatState::AwaitingSorting);

        let other = store.session(2).await;
        assert_eq!(other.lock().await.state(), ChatState::Initial);
        assert_eq!(store.len().await, 2);
    }
}
