//! In-memory session store with capacity eviction and TTL expiration.

use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::repository::SessionRepository;
use crate::session::Session;

/// Entry held in the store.
///
/// `last_accessed` mirrors the session's wall-clock timestamp on a
/// monotonic clock so expiry checks are immune to clock adjustments.
#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    last_accessed: Instant,
}

impl Entry {
    fn new(session: Session) -> Self {
        Self {
            session,
            last_accessed: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.last_accessed.elapsed() >= ttl)
    }
}

/// Inner state protected by RwLock.
///
/// The LRU order doubles as last-accessed order: every read and update
/// promotes its entry, so the least recently used entry is always the one
/// with the oldest access time.
struct StoreInner {
    sessions: LruCache<String, Entry>,
    destroyed: bool,
}

impl StoreInner {
    /// Remove the entry if it has outlived the TTL. Returns true when an
    /// expired entry was removed.
    fn expire_if_stale(&mut self, id: &str, ttl: Option<Duration>) -> bool {
        let stale = self.sessions.peek(id).is_some_and(|e| e.is_expired(ttl));
        if stale {
            self.sessions.pop(id);
            debug!(session_id = %id, "removed expired session on access");
        }
        stale
    }

    /// Remove every expired entry, returning how many were removed.
    fn remove_expired(&mut self, ttl: Option<Duration>) -> usize {
        let Some(ttl) = ttl else { return 0 };

        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, entry)| entry.last_accessed.elapsed() >= ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.sessions.pop(id);
            trace!(session_id = %id, "removed expired session");
        }
        expired.len()
    }
}

/// Bounded, time-expiring, in-process session store.
///
/// Sessions live only in memory and are lost on restart. The store
/// enforces two policies:
/// - a capacity bound: creating past `max_sessions` evicts the least
///   recently accessed session first
/// - a TTL: sessions idle longer than `ttl` are removed, both lazily on
///   access and by a periodic sweep task
///
/// All state sits behind a single `RwLock`; the sweep task takes the same
/// write lock as foreground operations, so no two views of the map can
/// diverge. Cloning the store shares the underlying state.
pub struct MemorySessionStore {
    inner: Arc<RwLock<StoreInner>>,
    sweep: Arc<StdMutex<Option<JoinHandle<()>>>>,
    config: StoreConfig,
}

impl MemorySessionStore {
    /// Create a new store, validating the configuration and starting the
    /// periodic sweep task when a TTL is configured.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let sessions = match config.max_sessions {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };

        let inner = Arc::new(RwLock::new(StoreInner {
            sessions,
            destroyed: false,
        }));

        // No timer at all when sessions cannot expire.
        let sweep = if config.ttl.is_some() && config.enable_cleanup_task {
            Some(Self::spawn_sweep(
                Arc::downgrade(&inner),
                config.ttl,
                config.cleanup_interval,
            ))
        } else {
            None
        };

        Ok(Self {
            inner,
            sweep: Arc::new(StdMutex::new(sweep)),
            config,
        })
    }

    fn spawn_sweep(
        inner: Weak<RwLock<StoreInner>>,
        ttl: Option<Duration>,
        period: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; skip it.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(inner) = inner.upgrade() else {
                    trace!("all store handles dropped, stopping sweep task");
                    break;
                };

                let mut guard = inner.write().await;
                if guard.destroyed {
                    break;
                }

                let removed = guard.remove_expired(ttl);
                if removed > 0 {
                    debug!(removed, "swept expired sessions");
                }
            }
        })
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Raw number of stored entries, including any expired entries the
    /// sweep has not reached yet.
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Check if the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.sessions.is_empty()
    }

    /// Create a session from caller fields.
    ///
    /// Assigns a fresh identifier and timestamps. When the store is at
    /// capacity, the least recently accessed session is evicted first so
    /// the bound holds when this returns.
    pub async fn create(&self, fields: Map<String, Value>) -> Result<Session> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            return Err(Error::Destroyed);
        }

        if let Some(cap) = self.config.max_sessions
            && inner.sessions.len() >= cap.get()
            && let Some((evicted_id, _)) = inner.sessions.pop_lru()
        {
            debug!(session_id = %evicted_id, "evicting least recently accessed session");
        }

        let session = Session::new(fields);
        inner
            .sessions
            .put(session.id.clone(), Entry::new(session.clone()));

        trace!(
            session_id = %session.id,
            count = inner.sessions.len(),
            "session created"
        );
        Ok(session)
    }

    /// Fetch a live session by id.
    ///
    /// A hit refreshes the session's access time, extending its TTL. An
    /// expired entry is removed on the spot and reported as absent.
    pub async fn get(&self, id: &str) -> Result<Option<Session>> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            return Err(Error::Destroyed);
        }

        if inner.expire_if_stale(id, self.config.ttl) {
            return Ok(None);
        }

        match inner.sessions.get_mut(id) {
            Some(entry) => {
                entry.last_accessed = Instant::now();
                entry.session.touch();
                Ok(Some(entry.session.clone()))
            }
            None => Ok(None),
        }
    }

    /// Merge partial fields into a live session and refresh its access
    /// time. An absent or expired id fails with [`Error::NotFound`].
    pub async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<Session> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            return Err(Error::Destroyed);
        }

        if inner.expire_if_stale(id, self.config.ttl) {
            return Err(Error::NotFound(id.to_string()));
        }

        match inner.sessions.get_mut(id) {
            Some(entry) => {
                entry.session.merge(fields);
                entry.session.touch();
                entry.last_accessed = Instant::now();
                trace!(session_id = %id, "session updated");
                Ok(entry.session.clone())
            }
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    /// Remove a session. Deleting a missing id is a no-op success.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            return Err(Error::Destroyed);
        }

        if inner.sessions.pop(id).is_some() {
            trace!(session_id = %id, "session deleted");
        }
        Ok(())
    }

    /// Snapshot all live sessions, purging expired ones as a side effect.
    /// Ordered most recently accessed first; stable within one call.
    pub async fn list(&self) -> Result<Vec<Session>> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            return Err(Error::Destroyed);
        }

        inner.remove_expired(self.config.ttl);
        Ok(inner
            .sessions
            .iter()
            .map(|(_, entry)| entry.session.clone())
            .collect())
    }

    /// All live sessions whose fields equal every field in the filter.
    /// An empty filter returns all live sessions.
    pub async fn find(&self, filter: &Map<String, Value>) -> Result<Vec<Session>> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            return Err(Error::Destroyed);
        }

        inner.remove_expired(self.config.ttl);
        Ok(inner
            .sessions
            .iter()
            .filter(|(_, entry)| entry.session.matches(filter))
            .map(|(_, entry)| entry.session.clone())
            .collect())
    }

    /// Remove every session immediately.
    pub async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            return Err(Error::Destroyed);
        }

        inner.sessions.clear();
        debug!("session store cleared");
        Ok(())
    }

    /// Get store statistics.
    ///
    /// Expired entries are purged first, so `count` matches what `list`
    /// would return.
    pub async fn stats(&self) -> Result<StoreStats> {
        let mut inner = self.inner.write().await;
        if inner.destroyed {
            return Err(Error::Destroyed);
        }

        inner.remove_expired(self.config.ttl);
        Ok(StoreStats {
            count: inner.sessions.len(),
            max_sessions: self.config.max_sessions.map(|n| n.get()),
            ttl: self.config.ttl,
        })
    }

    /// Destroy the store: drop every session and stop the sweep task.
    ///
    /// Idempotent. The `destroyed` flag is set under the map lock and the
    /// sweep body re-checks it under the same lock, so no sweep mutation
    /// lands after this returns. Every subsequent operation fails with
    /// [`Error::Destroyed`].
    pub async fn destroy(&self) {
        {
            let mut inner = self.inner.write().await;
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.sessions.clear();
            debug!("session store destroyed");
        }

        let handle = {
            let mut guard = self.sweep.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Clone for MemorySessionStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            sweep: Arc::clone(&self.sweep),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl SessionRepository for MemorySessionStore {
    async fn create(&self, fields: Map<String, Value>) -> Result<Session> {
        MemorySessionStore::create(self, fields).await
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        MemorySessionStore::get(self, id).await
    }

    async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<Session> {
        MemorySessionStore::update(self, id, fields).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        MemorySessionStore::delete(self, id).await
    }

    async fn list(&self) -> Result<Vec<Session>> {
        MemorySessionStore::list(self).await
    }

    async fn find(&self, filter: &Map<String, Value>) -> Result<Vec<Session>> {
        MemorySessionStore::find(self, filter).await
    }

    async fn clear(&self) -> Result<()> {
        MemorySessionStore::clear(self).await
    }
}

/// Store statistics.
#[derive(Debug, Clone)]
pub struct StoreStats {
    /// Number of live sessions after purging expired entries.
    pub count: usize,

    /// Configured capacity bound, if any.
    pub max_sessions: Option<usize>,

    /// Configured TTL, if any.
    pub ttl: Option<Duration>,
}
