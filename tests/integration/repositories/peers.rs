use electrum_pool::{
	models::{Network, Protocol},
	repositories::{PeerDatasetRepository, RepositoryError},
};

use crate::integration::mocks::{dataset_from_json, ABC_DATASET};

#[test]
fn test_embedded_dataset_covers_the_default_network() {
	let repository = PeerDatasetRepository::new();
	let peers = repository.default_peers(&Network::default(), Protocol::Ssl);
	assert!(!peers.is_empty());
}

#[test]
fn test_dataset_file_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let repository = dataset_from_json(&dir, ABC_DATASET);

	let entries = repository.entries(&Network::default());
	assert_eq!(entries.len(), 3);
	assert_eq!(entries[0].host, "a");
}

#[test]
fn test_malformed_records_are_skipped_not_fatal() {
	let dir = tempfile::tempdir().unwrap();
	let repository = dataset_from_json(
		&dir,
		r#"{
			"bitcoin": [
				{ "host": "good.example.org", "ssl": "50002" },
				{ "port": "not even a record" },
				{ "host": "also-good.example.org", "tcp": "50001" }
			]
		}"#,
	);

	let entries = repository.entries(&Network::default());
	assert_eq!(entries.len(), 2);
}

#[test]
fn test_records_without_a_matching_port_resolve_to_nothing() {
	let dir = tempfile::tempdir().unwrap();
	let repository = dataset_from_json(
		&dir,
		r#"{ "bitcoin": [ { "host": "tcp-only.example.org", "tcp": "50001" } ] }"#,
	);

	assert_eq!(
		repository
			.default_peers(&Network::default(), Protocol::Ssl)
			.len(),
		0
	);
	assert_eq!(
		repository
			.default_peers(&Network::default(), Protocol::Tcp)
			.len(),
		1
	);
}

#[test]
fn test_missing_file_is_a_load_error() {
	let dir = tempfile::tempdir().unwrap();
	let result = PeerDatasetRepository::from_path(&dir.path().join("nope.json"));
	assert!(matches!(result, Err(RepositoryError::LoadError(_))));
}

#[test]
fn test_empty_dataset_is_a_validation_error() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("peers.json");
	std::fs::write(&path, "{}").unwrap();

	let result = PeerDatasetRepository::from_path(&path);
	assert!(matches!(result, Err(RepositoryError::ValidationError(_))));
}

#[test]
fn test_unparseable_file_is_a_load_error() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("peers.json");
	std::fs::write(&path, "not json at all").unwrap();

	let result = PeerDatasetRepository::from_path(&path);
	assert!(matches!(result, Err(RepositoryError::LoadError(_))));
}
