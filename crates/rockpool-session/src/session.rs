//! The session record stored and returned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A session record: store-managed identity and timestamps plus an opaque
/// bag of caller-supplied fields.
///
/// The store never interprets `fields`; it only copies and merges them.
/// Filtering compares field values for equality, nothing more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier, assigned by the store at creation.
    pub id: String,

    /// When the session was created. Immutable after creation.
    pub created_at: DateTime<Utc>,

    /// When the session was last read or updated.
    pub last_accessed_at: DateTime<Utc>,

    /// Caller-defined fields, carried opaquely.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Session {
    /// Create a new session with a generated identifier and fresh
    /// timestamps.
    pub fn new(fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            last_accessed_at: now,
            fields,
        }
    }

    /// Refresh the last-accessed timestamp.
    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }

    /// Merge partial fields into this session, overwriting existing keys.
    pub fn merge(&mut self, fields: Map<String, Value>) {
        self.fields.extend(fields);
    }

    /// Check whether every field in the filter equals the corresponding
    /// field of this session. An empty filter matches every session.
    pub fn matches(&self, filter: &Map<String, Value>) -> bool {
        filter
            .iter()
            .all(|(key, value)| self.fields.get(key) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_new_assigns_unique_ids() {
        let a = Session::new(Map::new());
        let b = Session::new(Map::new());
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.last_accessed_at);
    }

    #[test]
    fn test_merge_overwrites_existing_keys() {
        let mut session = Session::new(fields(&[("role", json!("guest")), ("seat", json!(4))]));
        session.merge(fields(&[("role", json!("admin")), ("theme", json!("dark"))]));

        assert_eq!(session.fields.get("role"), Some(&json!("admin")));
        assert_eq!(session.fields.get("seat"), Some(&json!(4)));
        assert_eq!(session.fields.get("theme"), Some(&json!("dark")));
    }

    #[test]
    fn test_matches_requires_all_filter_fields() {
        let session = Session::new(fields(&[("user", json!("ada")), ("active", json!(true))]));

        assert!(session.matches(&Map::new()));
        assert!(session.matches(&fields(&[("user", json!("ada"))])));
        assert!(session.matches(&fields(&[("user", json!("ada")), ("active", json!(true))])));
        assert!(!session.matches(&fields(&[("user", json!("grace"))])));
        assert!(!session.matches(&fields(&[("user", json!("ada")), ("missing", json!(1))])));
    }
}
