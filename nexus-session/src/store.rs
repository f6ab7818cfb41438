//! User list and current-session operations
//!
//! All operations are synchronous read/modify/write calls against one key-value namespace.
//! There is no locking: concurrent writers race and the last one wins.

use crate::kv::KeyValueStore;
use nexus_core::{
    NexusResult, StorageConfig, StoredUser, User, DEFAULT_SESSION_KEY, DEFAULT_USERS_KEY,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

/// Names of the two slots the session store owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub users: String,
    pub session: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            users: DEFAULT_USERS_KEY.to_string(),
            session: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

impl From<&StorageConfig> for StorageKeys {
    fn from(config: &StorageConfig) -> Self {
        Self {
            users: config.users_key.clone(),
            session: config.session_key.clone(),
        }
    }
}

/// Local user database plus the current-session slot
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Create a session store using the default slot names
    pub fn new(store: S) -> Self {
        Self::with_keys(store, StorageKeys::default())
    }

    pub fn with_keys(store: S, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    /// All stored users. A missing, unreadable or malformed slot yields an empty list.
    pub fn get_users(&self) -> Vec<StoredUser> {
        self.decode_slot(&self.keys.users).unwrap_or_default()
    }

    /// Replace the stored user list
    pub fn save_users(&self, users: &[StoredUser]) -> NexusResult<()> {
        let json = serde_json::to_string(users)?;
        self.store.set(&self.keys.users, &json)?;
        debug!("Saved {} users to slot {}", users.len(), self.keys.users);
        Ok(())
    }

    /// First stored user whose id, username or email matches `identifier`
    pub fn find_user(&self, identifier: &str) -> Option<StoredUser> {
        self.get_users()
            .into_iter()
            .find(|user| user.matches(identifier))
    }

    /// The signed-in user, or `None` when nobody is signed in or the slot is corrupt
    pub fn get_current_user(&self) -> Option<User> {
        self.decode_slot(&self.keys.session)
    }

    /// Persist the signed-in user. The value is converted to [`User`] first, so a
    /// [`StoredUser`] loses its password hash before anything is written.
    pub fn save_current_user(&self, user: impl Into<User>) -> NexusResult<()> {
        let user: User = user.into();
        let json = serde_json::to_string(&user)?;
        self.store.set(&self.keys.session, &json)?;
        debug!("Saved current session for user {}", user.id);
        Ok(())
    }

    /// Sign out
    pub fn clear_current_user(&self) -> NexusResult<()> {
        self.store.remove(&self.keys.session)?;
        debug!("Cleared current session");
        Ok(())
    }

    /// Read and decode a slot, treating every failure as absent data
    fn decode_slot<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to read slot {}: {}", key, e);
                return None;
            }
        };

        // `null` decodes to None here, the same as an absent slot
        match serde_json::from_str::<Option<T>>(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse slot {}, treating it as empty: {}", key, e);
                None
            }
        }
    }
}
