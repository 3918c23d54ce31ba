//! Core domain models.
//!
//! Defines the fundamental data structures used throughout the crate:
//! networks ("coins"), peer addresses in their two shapes, and the uniform
//! call envelope.

mod envelope;
mod network;
mod peer;

pub use envelope::{correlation_id, Envelope};
pub use network::Network;
pub use peer::{DatasetPeer, Peer, PeerEntry, Protocol};
