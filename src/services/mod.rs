//! Core business logic for the peer access layer.
//!
//! Services are organized by domain:
//!
//! - `client`: The uniform envelope-returning query facade
//! - `connection`: Peer selection, failover and session management
//! - `transport`: The wire collaborator contract and TCP/TLS implementation

pub mod client;
pub mod connection;
pub mod transport;
