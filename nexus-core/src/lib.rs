//! Nexus Core - Shared data structures, errors, logging and configuration
//!
//! Everything the session store, the search client and the CLI have in common lives here

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
