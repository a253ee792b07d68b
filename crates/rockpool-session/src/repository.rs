//! Repository contract for session storage backends.
//!
//! The store in this crate is one backend behind this trait; callers pick a
//! backend at construction time (e.g. a future persistent variant) and the
//! rest of the application only sees the trait surface.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::session::Session;

/// Operations every session storage backend must provide.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a session from caller fields; identity and timestamps are
    /// assigned by the backend.
    async fn create(&self, fields: Map<String, Value>) -> Result<Session>;

    /// Fetch a live session by id, refreshing its access time.
    /// Returns `Ok(None)` when no live session exists.
    async fn get(&self, id: &str) -> Result<Option<Session>>;

    /// Merge partial fields into a live session and refresh its access
    /// time. Fails with [`Error::NotFound`](crate::Error::NotFound) when
    /// the id has no live session.
    async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<Session>;

    /// Remove a session. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Snapshot all live sessions.
    async fn list(&self) -> Result<Vec<Session>>;

    /// All live sessions whose fields equal every field in the filter.
    /// An empty filter returns all live sessions.
    async fn find(&self, filter: &Map<String, Value>) -> Result<Vec<Session>>;

    /// Remove every session immediately.
    async fn clear(&self) -> Result<()>;
}
