use proptest::prelude::*;

use electrum_pool::{
	models::{Network, Protocol},
	repositories::PeerDatasetRepository,
	services::connection::PeerPool,
};

use crate::properties::strategies;

fn runtime() -> tokio::runtime::Runtime {
	tokio::runtime::Builder::new_current_thread()
		.build()
		.expect("building a test runtime")
}

proptest! {
	/// A non-empty override list replaces the stored pool and every later
	/// call without an override returns exactly the stored override.
	#[test]
	fn prop_override_replacement_persists(
		override_peers in strategies::explicit_peer_list(8),
		network in "[a-z]{1,12}",
	) {
		runtime().block_on(async {
			let pool = PeerPool::new(PeerDatasetRepository::new());
			let network = Network::new(network);

			let first = pool
				.working_list(&network, override_peers.clone(), Protocol::Ssl)
				.await;
			prop_assert_eq!(&first, &override_peers);

			let second = pool.working_list(&network, Vec::new(), Protocol::Ssl).await;
			prop_assert_eq!(&second, &override_peers);
			prop_assert!(pool.has_stored(&network).await);
			Ok(())
		})?;
	}

	/// Default-derived lists are synthesized fresh and never persisted.
	#[test]
	fn prop_default_synthesis_never_persists(network in "[a-z]{1,12}") {
		runtime().block_on(async {
			let pool = PeerPool::new(PeerDatasetRepository::new());
			let network = Network::new(network);

			let first = pool.working_list(&network, Vec::new(), Protocol::Ssl).await;
			prop_assert!(!pool.has_stored(&network).await);

			let second = pool.working_list(&network, Vec::new(), Protocol::Ssl).await;
			prop_assert_eq!(first, second);
			Ok(())
		})?;
	}

	/// A dataset record resolves exactly when it carries a parseable port
	/// for the requested protocol.
	#[test]
	fn prop_dataset_resolution_matches_port_validity(entry in strategies::dataset_peer()) {
		for protocol in [Protocol::Tcp, Protocol::Ssl] {
			let port = match protocol {
				Protocol::Tcp => entry.tcp.as_deref(),
				Protocol::Ssl => entry.ssl.as_deref(),
			};
			let expected = port.map(|p| p.parse::<u16>().is_ok()).unwrap_or(false);
			let resolved = entry.resolve(protocol);
			prop_assert_eq!(resolved.is_some(), expected);
			if let Some(peer) = resolved {
				prop_assert_eq!(&peer.host, &entry.host);
				prop_assert_eq!(peer.protocol, protocol);
			}
		}
	}

	/// Explicit entries always resolve to themselves, ignoring the default
	/// protocol.
	#[test]
	fn prop_explicit_entries_resolve_verbatim(
		peer in strategies::explicit_peer(),
		default_protocol in strategies::protocol(),
	) {
		let entry = electrum_pool::models::PeerEntry::Explicit(peer.clone());
		prop_assert_eq!(entry.resolve(default_protocol), Some(peer));
	}
}
