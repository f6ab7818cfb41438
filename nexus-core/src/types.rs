//! Core data type definitions

use serde::{Deserialize, Serialize};

/// Snippet used when a search hit carries no description
pub const DEFAULT_SNIPPET: &str = "No snippet available.";

/// Public profile of a user. This is the shape written to the current-session slot,
/// so it deliberately has no credential field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Profile banner image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
}

/// User record as kept in the all-users slot, including the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

impl StoredUser {
    pub fn new(user: User, password_hash: impl Into<String>) -> Self {
        Self {
            user,
            password_hash: password_hash.into(),
        }
    }

    /// Does `identifier` name this user? Ids match exactly, username and email ignore case.
    pub fn matches(&self, identifier: &str) -> bool {
        if self.user.id == identifier {
            return true;
        }

        let identifier = identifier.to_lowercase();
        self.user.username.to_lowercase() == identifier
            || self.user.email.to_lowercase() == identifier
    }
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        stored.user
    }
}

impl From<&StoredUser> for User {
    fn from(stored: &StoredUser) -> Self {
        stored.user.clone()
    }
}

/// Normalized web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// `{url}-{page}-{index}`; unique only within one fetch
    pub id: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// No explicit-content detection exists, so this is always `false`
    pub is_explicit: bool,
}

impl SearchResult {
    /// Build a result from a raw hit at `index` of the filtered list for `page`
    pub fn new(
        url: String,
        title: String,
        description: Option<String>,
        page: u32,
        index: usize,
    ) -> Self {
        let snippet = description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_SNIPPET.to_string());

        Self {
            id: format!("{}-{}-{}", url, page, index),
            title,
            url,
            snippet,
            is_explicit: false,
        }
    }
}
