use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{ChatSession, SessionHandle};

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct Entry {
    handle: SessionHandle,
    last_active: Instant,
}

/// In-memory sessions keyed by id. Nothing survives a restart.
///
/// Sessions idle longer than `idle_ttl` are dropped on the next insert, and
/// the least recently used one makes room once `max_sessions` is reached.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn insert(&self, session: ChatSession) -> SessionHandle {
        let id = session.id();
        let handle = SessionHandle::new(session);
        let now = Instant::now();

        let mut guard = self.inner.write().await;
        let expired = evict_idle(&mut guard, now, self.idle_ttl);

        let mut displaced = 0;
        while guard.len() >= self.max_sessions {
            let oldest = guard
                .iter()
                .min_by_key(|(_, entry)| entry.last_active)
                .map(|(id, _)| *id);
            match oldest {
                Some(oldest) => {
                    guard.remove(&oldest);
                    displaced += 1;
                }
                None => break,
            }
        }

        if expired + displaced > 0 {
            info!(expired, displaced, remaining = guard.len(), "Evicted sessions");
        }

        guard.insert(
            id,
            Entry {
                handle: handle.clone(),
                last_active: now,
            },
        );
        handle
    }

    /// Look up a session and mark it active.
    pub async fn get(&self, session_id: &Uuid) -> Option<SessionHandle> {
        let mut guard = self.inner.write().await;
        let entry = guard.get_mut(session_id)?;
        if entry.last_active.elapsed() >= self.idle_ttl {
            guard.remove(session_id);
            return None;
        }
        entry.last_active = Instant::now();
        Some(entry.handle.clone())
    }

    /// Drop every idle session now. Returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        let mut guard = self.inner.write().await;
        evict_idle(&mut guard, Instant::now(), self.idle_ttl)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

fn evict_idle(sessions: &mut HashMap<Uuid, Entry>, now: Instant, idle_ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| now.duration_since(entry.last_active) < idle_ttl);
    before - sessions.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = SessionRegistry::default();
        assert!(registry.is_empty().await);

        let session = ChatSession::with_seed(1, 0.5);
        let id = session.id();
        registry.insert(session).await;

        let handle = registry.get(&id).await.expect("session should be registered");
        assert_eq!(handle.snapshot().await.id, id);
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let registry = SessionRegistry::new(Duration::from_millis(50), 100);

        let stale = ChatSession::with_seed(1, 0.5);
        let stale_id = stale.id();
        registry.insert(stale).await;

        tokio::time::sleep(Duration::from_millis(80)).await;

        let fresh = ChatSession::with_seed(2, 0.5);
        let fresh_id = fresh.id();
        registry.insert(fresh).await;

        assert_eq!(registry.len().await, 1);
        assert!(registry.get(&stale_id).await.is_none());
        assert!(registry.get(&fresh_id).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_not_returned() {
        let registry = SessionRegistry::new(Duration::from_millis(30), 100);
        let session = ChatSession::with_seed(3, 0.5);
        let id = session.id();
        registry.insert(session).await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(registry.get(&id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_evict_idle_sweeps_everything_stale() {
        let registry = SessionRegistry::new(Duration::from_millis(30), 100);
        for seed in 0..3 {
            registry.insert(ChatSession::with_seed(seed, 0.5)).await;
        }

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(registry.evict_idle().await, 3);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_cap_displaces_least_recently_used() {
        let registry = SessionRegistry::new(DEFAULT_IDLE_TTL, 2);

        let first = ChatSession::with_seed(1, 0.5);
        let first_id = first.id();
        let second = ChatSession::with_seed(2, 0.5);
        let second_id = second.id();
        registry.insert(first).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        registry.insert(second).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Touching the first makes the second the oldest.
        assert!(registry.get(&first_id).await.is_some());
        tokio::time::sleep(Duration::from_millis(5)).await;

        registry.insert(ChatSession::with_seed(3, 0.5)).await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(&first_id).await.is_some());
        assert!(registry.get(&second_id).await.is_none());
    }
}
