//! Per-network peer pools.
//!
//! Holds the working list of selection candidates for each network. Two
//! sources populate a pool: a caller-supplied override list (stored and
//! reused until replaced) and the built-in default dataset (recomputed on
//! demand, never stored). Selection evicts failed peers from stored lists
//! through an explicit write-back.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
	models::{Network, PeerEntry, Protocol},
	repositories::PeerDatasetRepository,
};

/// Candidate peer lists per network
pub struct PeerPool {
	/// Stored lists, keyed by network; populated only by overrides and
	/// eviction write-backs
	lists: RwLock<HashMap<String, Vec<PeerEntry>>>,
	repository: PeerDatasetRepository,
}

impl PeerPool {
	pub fn new(repository: PeerDatasetRepository) -> Self {
		Self {
			lists: RwLock::new(HashMap::new()),
			repository,
		}
	}

	pub fn repository(&self) -> &PeerDatasetRepository {
		&self.repository
	}

	/// Produces the working list for one selection attempt.
	///
	/// A non-empty `override_peers` replaces the stored list for the
	/// network and is returned. Otherwise a previously stored list wins.
	/// Otherwise a fresh list is synthesized from the default dataset with
	/// `default_protocol` — synthesized lists are not persisted, so a new
	/// default set is recomputed each time one is needed.
	pub async fn working_list(
		&self,
		network: &Network,
		override_peers: Vec<PeerEntry>,
		default_protocol: Protocol,
	) -> Vec<PeerEntry> {
		if !override_peers.is_empty() {
			self.lists
				.write()
				.await
				.insert(network.as_str().to_string(), override_peers.clone());
			return override_peers;
		}

		if let Some(stored) = self.lists.read().await.get(network.as_str()) {
			return stored.clone();
		}

		self.repository.default_peers(network, default_protocol)
	}

	/// Replaces the stored list for a network; used by selection to write
	/// evictions back so known-bad peers stay out of later attempts
	pub async fn replace(&self, network: &Network, entries: Vec<PeerEntry>) {
		self.lists
			.write()
			.await
			.insert(network.as_str().to_string(), entries);
	}

	pub async fn has_stored(&self, network: &Network) -> bool {
		self.lists.read().await.contains_key(network.as_str())
	}

	pub async fn stored(&self, network: &Network) -> Option<Vec<PeerEntry>> {
		self.lists.read().await.get(network.as_str()).cloned()
	}
}
