//! Client-side access layer for Electrum-style blockchain-indexing servers.
//!
//! Consumers request blockchain data (balances, histories, block headers,
//! transaction broadcast, fee estimates) without managing connections
//! themselves: the crate selects a peer from a per-network pool, health
//! checks the connection, demotes failed peers, and dispatches every query
//! over a single established session per network. It includes:
//!
//! - Per-network peer pools seeded from an embedded default dataset or
//!   caller-supplied override lists
//! - Random peer selection with bounded retry and eviction of failed peers
//! - A uniform envelope-returning query facade over the whole protocol
//!   surface, including push subscriptions
//! - A pluggable transport contract with a TCP/TLS implementation
//!
//! # Module Structure
//!
//! - `models`: Data structures for configuration, peers and envelopes
//! - `repositories`: The default peer dataset
//! - `services`: Connection management, transport and the query facade
//! - `utils`: Common utilities and helper functions
//!
//! # Example
//!
//! ```no_run
//! use electrum_pool::{
//! 	models::ClientConfig,
//! 	services::client::{CallOptions, ElectrumApi},
//! };
//!
//! # async fn run() {
//! let api = ElectrumApi::new(ClientConfig::default());
//! let response = api
//! 	.get_address_balance("bc1q...", CallOptions::default())
//! 	.await;
//! if !response.error {
//! 	println!("balance: {}", response.data);
//! }
//! # }
//! ```

pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
