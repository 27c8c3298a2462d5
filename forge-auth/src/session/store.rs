//! Session persistence.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use secrecy::ExposeSecret;

use super::Session;
use crate::error::Error;

/// Persists issued sessions.
///
/// Implementations keep at most one session per login: saving a new session for a
/// login supersedes the previous token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: &Session) -> Result<(), Error>;

    /// Look up an unexpired session by its token.
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, Error>;
}

/// Process-local [`SessionStore`], keyed by lowercased login.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session: &Session) -> Result<(), Error> {
        self.sessions
            .insert(session.login.to_lowercase(), session.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, Error> {
        let session = self
            .sessions
            .iter()
            .find(|entry| entry.token.expose_secret() == token && !entry.is_expired())
            .map(|entry| entry.value().clone());
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::{Identity, ProviderKind};
    use chrono::{Duration, Utc};

    fn session_for(login: &str) -> Session {
        Session::issue(&Identity::with_login(ProviderKind::GitHub, login)).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = MemorySessionStore::new();
        let session = session_for("octocat");
        store.save(&session).await.unwrap();

        let found = store
            .find_by_token(session.token.expose_secret())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.login, "octocat");
    }

    #[tokio::test]
    async fn test_new_login_supersedes_previous_token() {
        let store = MemorySessionStore::new();
        let first = session_for("octocat");
        let second = session_for("OctoCat");
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store
            .find_by_token(first.token.expose_secret())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_token(second.token.expose_secret())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_expired_session_not_found() {
        let store = MemorySessionStore::new();
        let mut session = session_for("octocat");
        session.expires_at = Utc::now() - Duration::seconds(1);
        store.save(&session).await.unwrap();

        assert!(store
            .find_by_token(session.token.expose_secret())
            .await
            .unwrap()
            .is_none());
    }
}
