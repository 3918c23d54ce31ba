//! Utility modules for common functionality.
//!
//! - `logging`: Tracing setup and error context utilities
//! - `session_storage`: Generic per-network session storage

pub mod logging;
mod session_storage;

pub use session_storage::SessionStorage;
