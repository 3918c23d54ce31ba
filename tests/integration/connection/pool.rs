use electrum_pool::{
	models::{Network, Peer, PeerEntry, Protocol},
	repositories::PeerDatasetRepository,
	services::connection::PeerPool,
};

fn explicit(host: &str) -> PeerEntry {
	PeerEntry::Explicit(Peer::new(host, 50002, Protocol::Ssl))
}

#[tokio::test]
async fn test_default_list_matches_dataset_entry_count() {
	let repository = PeerDatasetRepository::new();
	let expected = repository.entries(&Network::default()).len();
	let pool = PeerPool::new(repository);

	let list = pool
		.working_list(&Network::default(), Vec::new(), Protocol::Ssl)
		.await;

	assert_eq!(list.len(), expected);
	assert!(!list.is_empty());
}

#[tokio::test]
async fn test_default_list_is_not_persisted() {
	let pool = PeerPool::new(PeerDatasetRepository::new());
	let network = Network::default();

	pool.working_list(&network, Vec::new(), Protocol::Ssl).await;

	assert!(!pool.has_stored(&network).await);
}

#[tokio::test]
async fn test_override_replaces_and_persists() {
	let pool = PeerPool::new(PeerDatasetRepository::new());
	let network = Network::default();
	let override_peers = vec![explicit("x"), explicit("y")];

	let list = pool
		.working_list(&network, override_peers.clone(), Protocol::Ssl)
		.await;
	assert_eq!(list, override_peers);

	// A later call without an override returns exactly the stored list
	let stored = pool.working_list(&network, Vec::new(), Protocol::Ssl).await;
	assert_eq!(stored, override_peers);
	assert!(pool.has_stored(&network).await);
}

#[tokio::test]
async fn test_pools_are_independent_per_network() {
	let pool = PeerPool::new(PeerDatasetRepository::new());

	pool.working_list(&Network::default(), vec![explicit("x")], Protocol::Ssl)
		.await;

	assert!(pool.has_stored(&Network::default()).await);
	assert!(!pool.has_stored(&Network::new("litecoin")).await);
}

#[tokio::test]
async fn test_replace_overwrites_the_stored_list() {
	let pool = PeerPool::new(PeerDatasetRepository::new());
	let network = Network::default();

	pool.working_list(&network, vec![explicit("x"), explicit("y")], Protocol::Ssl)
		.await;
	pool.replace(&network, vec![explicit("y")]).await;

	let stored = pool.stored(&network).await.unwrap();
	assert_eq!(stored, vec![explicit("y")]);
}
