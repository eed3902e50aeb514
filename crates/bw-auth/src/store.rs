use std::sync::{Arc, RwLock};

use crate::errors::Result;
use crate::session::Session;

/// Trait for persisting the storefront session between runs
///
/// A process owns exactly one session slot; writes are last-writer-wins and
/// there is no cross-process coordination. Saving never signals anyone:
/// callers own the auth-changed broadcast.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session, if any
    async fn load(&self) -> Option<Session>;

    /// Overwrite the stored session
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove the stored session; used by logout
    async fn clear(&self) -> Result<()>;
}

/// In-memory session store for testing and simple embedding
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Arc<RwLock<Option<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            session: Arc::new(RwLock::new(None)),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Option<Session> {
        self.session.read().ok()?.clone()
    }

    async fn save(&self, session: &Session) -> Result<()> {
        *self
            .session
            .write()
            .map_err(|_| crate::errors::AuthError::InvalidResponse("Lock poisoned".to_string()))? =
            Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self
            .session
            .write()
            .map_err(|_| crate::errors::AuthError::InvalidResponse("Lock poisoned".to_string()))? =
            None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AuthTokens;

    #[tokio::test]
    async fn round_trip_returns_the_saved_session() {
        let store = MemorySessionStore::new();
        let session = Session::from_tokens(AuthTokens::new(
            "access".to_string(),
            "refresh".to_string(),
            3600,
        ));

        store.save(&session).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn clear_leaves_an_anonymous_store() {
        let store = MemorySessionStore::new();
        let session = Session::from_tokens(AuthTokens::new(
            "access".to_string(),
            "refresh".to_string(),
            3600,
        ));

        store.save(&session).await.unwrap();
        store.clear().await.unwrap();

        assert!(store.load().await.is_none());
    }
}
