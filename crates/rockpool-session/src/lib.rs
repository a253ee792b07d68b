//! Bounded, time-expiring, in-process session store.
//!
//! This crate provides an in-memory key-value store for short-lived
//! session records with:
//! - a capacity bound enforced by evicting the least recently accessed
//!   session
//! - optional TTL expiration, applied lazily on access and by a periodic
//!   sweep task
//! - filtered and bulk queries over the opaque caller-supplied fields
//!
//! State is deliberately not persisted; everything is lost on restart.
//! Backends are swappable behind the [`SessionRepository`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use rockpool_session::{MemorySessionStore, StoreConfig};
//!
//! let config = StoreConfig::default()
//!     .with_max_sessions(1000)
//!     .with_ttl(Duration::from_secs(3600));
//!
//! let store = MemorySessionStore::new(config)?;
//! ```

mod config;
mod error;
mod repository;
mod session;
mod store;

pub use config::{DEFAULT_CLEANUP_INTERVAL, StoreConfig};
pub use error::{Error, Result};
pub use repository::SessionRepository;
pub use session::Session;
pub use store::{MemorySessionStore, StoreStats};
