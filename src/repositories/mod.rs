//! Read-only data sources for the access layer.
//!
//! The only repository today is the default peer dataset: the built-in map
//! of well-known peers per network, with optional loading from a
//! caller-supplied file in the same format.

mod error;
mod peers;

pub use error::RepositoryError;
pub use peers::PeerDatasetRepository;
