//! Nexus Search - Web search through LibreX instances
//!
//! Queries a list of LibreX-compatible `api.php` endpoints in order, moving on to the
//! next one only when an endpoint answers with a non-success status, and normalizes the
//! JSON response into [`nexus_core::SearchResult`]s.

pub mod client;
pub mod librex;


pub use client::{LibreXClient, SearchClientConfig, SearchProvider};
pub use librex::{normalize_results, LibreXResult};
