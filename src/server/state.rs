use crate::assistant::{Assistant, QuerySession};
use crate::dataset::Facility;
use crate::favorites::FavoritesStore;
use crate::proximity::ProximityFinder;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub struct AppState {
    pub facilities: Arc<[Facility]>,
    pub loaded_at: DateTime<Utc>,
    pub favorites: Mutex<FavoritesStore>,
    pub proximity: ProximityFinder,
    pub assistant: Arc<Assistant>,
    pub sessions: SessionRegistry,
}

/// One conversation per client-chosen session id, kept only while a
/// question on it is in flight.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<QuerySession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `id`, created on first use. Pair with [`Self::release`].
    pub fn acquire(&self, id: &str, assistant: &Arc<Assistant>) -> Arc<QuerySession> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            sessions
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(QuerySession::new(Arc::clone(assistant)))),
        )
    }

    /// Drop the caller's handle and evict every session no request holds,
    /// including ones left behind by requests that were dropped mid-flight.
    pub fn release(&self, session: Arc<QuerySession>) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        drop(session);
        sessions.retain(|_, s| Arc::strong_count(s) > 1);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::GeminiClient;
    use crate::config::GeminiSettings;
    use std::time::Duration;

    fn assistant() -> Arc<Assistant> {
        let client = Arc::new(GeminiClient::new(&GeminiSettings::default(), Duration::from_secs(1)));
        Arc::new(Assistant::new(client.clone(), client))
    }

    #[test]
    fn test_released_session_is_evicted() {
        let registry = SessionRegistry::new();
        let assistant = assistant();

        for i in 0..50 {
            let id = format!("client-{}", i);
            let session = registry.acquire(&id, &assistant);
            registry.release(session);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_session_shared_while_in_use() {
        let registry = SessionRegistry::new();
        let assistant = assistant();

        let first = registry.acquire("tab", &assistant);
        let second = registry.acquire("tab", &assistant);
        assert!(Arc::ptr_eq(&first, &second));

        registry.release(first);
        assert_eq!(registry.len(), 1);
        registry.release(second);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_abandoned_session_swept_on_next_release() {
        let registry = SessionRegistry::new();
        let assistant = assistant();

        drop(registry.acquire("gone", &assistant));
        assert_eq!(registry.len(), 1);

        let live = registry.acquire("live", &assistant);
        registry.release(live);
        assert!(registry.is_empty());
    }
}
