//! Nexus Session - Local user store and current-session slot
//!
//! Simulates authentication state on top of a pluggable key-value store:
//!
//! - [`KeyValueStore`]: the persistence seam, with [`MemoryStore`] and [`FileStore`]
//!   implementations
//! - [`SessionStore`]: list/persist all users, read/persist/clear the current session
//!
//! Reads never fail: a missing or corrupt slot is reported as "no data".

pub mod kv;
pub mod store;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use store::{SessionStore, StorageKeys};
