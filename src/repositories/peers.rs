//! Default peer dataset repository implementation.
//!
//! Provides the built-in dataset of well-known peers per network and
//! optional loading of a caller-supplied dataset file in the same format:
//! a map from network name to a list of protocol-keyed peer records.
//! Malformed records are skipped best-effort rather than failing the whole
//! dataset, so one bad upstream entry never takes the default pool down.

use std::{collections::HashMap, path::Path};

use lazy_static::lazy_static;
use serde_json::Value;

use crate::{
	models::{DatasetPeer, Network, PeerEntry, Protocol},
	repositories::error::RepositoryError,
};

/// The dataset shipped with the crate
const DEFAULT_DATASET: &str = include_str!("default_peers.json");

lazy_static! {
	static ref EMBEDDED: HashMap<String, Vec<DatasetPeer>> =
		parse_dataset(DEFAULT_DATASET).expect("embedded default peer dataset is well-formed");
}

/// Repository for the default peer dataset
#[derive(Debug, Clone)]
pub struct PeerDatasetRepository {
	/// Map of network names to their dataset records
	datasets: HashMap<String, Vec<DatasetPeer>>,
}

impl PeerDatasetRepository {
	/// Creates a repository backed by the embedded dataset
	pub fn new() -> Self {
		Self {
			datasets: EMBEDDED.clone(),
		}
	}

	/// Creates a repository from a dataset file in the embedded format
	pub fn from_path(path: &Path) -> Result<Self, RepositoryError> {
		let raw = std::fs::read_to_string(path).map_err(|e| {
			RepositoryError::load_error(
				"Failed to read peer dataset",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					path.display().to_string(),
				)])),
			)
		})?;

		let datasets = parse_dataset(&raw).map_err(|e| {
			RepositoryError::load_error(
				"Failed to parse peer dataset",
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					path.display().to_string(),
				)])),
			)
		})?;

		if datasets.is_empty() {
			return Err(RepositoryError::validation_error(
				"Peer dataset contains no networks",
				None,
				Some(HashMap::from([(
					"path".to_string(),
					path.display().to_string(),
				)])),
			));
		}

		Ok(Self { datasets })
	}

	/// Raw dataset records for a network; empty when the network is unknown
	pub fn entries(&self, network: &Network) -> Vec<DatasetPeer> {
		self.datasets
			.get(network.as_str())
			.cloned()
			.unwrap_or_default()
	}

	/// Dataset records for a network as selection candidates, dropping
	/// records that do not resolve for the given protocol
	pub fn default_peers(&self, network: &Network, protocol: Protocol) -> Vec<PeerEntry> {
		self.entries(network)
			.into_iter()
			.filter(|entry| {
				let usable = entry.resolve(protocol).is_some();
				if !usable {
					tracing::debug!(
						host = %entry.host,
						%protocol,
						"skipping dataset record without a usable port"
					);
				}
				usable
			})
			.map(PeerEntry::Dataset)
			.collect()
	}

	pub fn networks(&self) -> Vec<Network> {
		self.datasets.keys().map(Network::new).collect()
	}
}

impl Default for PeerDatasetRepository {
	fn default() -> Self {
		Self::new()
	}
}

/// Parses a dataset, dropping records that do not deserialize
fn parse_dataset(raw: &str) -> Result<HashMap<String, Vec<DatasetPeer>>, serde_json::Error> {
	let networks: HashMap<String, Vec<Value>> = serde_json::from_str(raw)?;

	Ok(networks
		.into_iter()
		.map(|(network, records)| {
			let parsed = records
				.into_iter()
				.filter_map(|record| match serde_json::from_value(record) {
					Ok(entry) => Some(entry),
					Err(e) => {
						tracing::warn!(%network, error = %e, "dropping malformed peer record");
						None
					}
				})
				.collect();
			(network, parsed)
		})
		.collect())
}
