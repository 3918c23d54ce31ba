use std::{sync::Arc, time::Duration};

use serde_json::{json, Value};

use electrum_pool::{
	models::{ClientConfig, Network, Peer, Protocol},
	repositories::PeerDatasetRepository,
	services::client::{CallOptions, ElectrumApi},
};

use crate::integration::mocks::{PeerScript, ScriptedFactory};

fn api_with(factory: ScriptedFactory) -> ElectrumApi<ScriptedFactory> {
	ElectrumApi::with_factory(
		factory,
		ClientConfig::default(),
		PeerDatasetRepository::new(),
	)
}

/// Connects the default network to the scripted host "x"
async fn connect(api: &ElectrumApi<ScriptedFactory>) {
	let response = api
		.connect_to_peer(
			Vec::new(),
			vec![Peer::new("x", 50001, Protocol::Tcp)],
			CallOptions::default(),
		)
		.await;
	assert!(!response.error, "test connect failed: {}", response.data);
}

#[tokio::test]
async fn test_success_envelope_shape() {
	let factory = ScriptedFactory::new()
		.script("x", PeerScript::Healthy)
		.respond(
			"blockchain.scripthash.get_balance",
			json!({ "confirmed": 103873966, "unconfirmed": 23684400 }),
		);
	let api = api_with(factory);
	connect(&api).await;

	let response = api
		.get_address_script_hash_balance("8b01df4e368ea28f8dc0423bcf7a4923e3a12d307c875e47a0cfbf90b5c39161", CallOptions::default())
		.await;

	assert!(!response.error);
	assert_eq!(response.method, "getAddressScriptHashBalance");
	assert_eq!(response.coin, "bitcoin");
	assert_eq!(response.data["confirmed"], 103873966);
}

#[tokio::test]
async fn test_server_rejection_becomes_an_error_envelope() {
	let factory = ScriptedFactory::new()
		.script("x", PeerScript::Healthy)
		.respond_error("blockchain.transaction.broadcast", "dust output");
	let api = api_with(factory);
	connect(&api).await;

	let response = api
		.broadcast_transaction("0200aabbcc", CallOptions::default())
		.await;

	assert!(response.error);
	assert!(response.data.to_string().contains("dust output"));
}

#[tokio::test]
async fn test_network_mismatch_is_reported_and_issues_no_request() {
	let factory = ScriptedFactory::new().script("x", PeerScript::Healthy);
	let api = api_with(factory.clone());
	connect(&api).await;

	let response = api
		.get_banner(CallOptions::coin("litecoin"))
		.await;

	assert!(response.error);
	assert_eq!(response.coin, "litecoin");
	assert!(response.data.to_string().contains("Network mismatch"));
	assert_eq!(factory.requests_for("server.banner").await, 0);
}

#[tokio::test]
async fn test_caller_supplied_correlation_id_round_trips() {
	let factory = ScriptedFactory::new().script("x", PeerScript::Healthy);
	let api = api_with(factory);
	connect(&api).await;

	let response = api
		.get_banner(CallOptions::default().with_id("my-correlation-id"))
		.await;

	assert_eq!(response.id, "my-correlation-id");
}

#[tokio::test]
async fn test_generated_correlation_ids_differ() {
	let factory = ScriptedFactory::new().script("x", PeerScript::Healthy);
	let api = api_with(factory);
	connect(&api).await;

	let first = api.get_banner(CallOptions::default()).await;
	let second = api.get_banner(CallOptions::default()).await;

	assert!(!first.id.is_empty());
	assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_queries_lazily_connect_through_the_stored_pool() {
	let factory = ScriptedFactory::new().script("x", PeerScript::Healthy);
	let api = api_with(factory.clone());

	// Store a candidate list without establishing a session
	api.manager()
		.pool()
		.working_list(
			&Network::default(),
			vec![Peer::new("x", 50001, Protocol::Tcp).into()],
			Protocol::Ssl,
		)
		.await;
	assert_eq!(factory.attempts().await, 0);

	let response = api.get_banner(CallOptions::default()).await;

	assert!(!response.error);
	assert_eq!(factory.attempts().await, 1);
}

#[tokio::test]
async fn test_disconnect_without_session_reports_success() {
	let api = api_with(ScriptedFactory::new());

	let response = api.disconnect_from_peer(CallOptions::default()).await;

	assert!(!response.error);
	assert_eq!(response.data["message"], "No peer to disconnect from.");
	assert_eq!(
		api.manager().selected_network().await,
		Network::default()
	);
}

#[tokio::test]
async fn test_connect_then_disconnect_round_trip() {
	let factory = ScriptedFactory::new().script("x", PeerScript::Healthy);
	let api = api_with(factory);

	let connected = api
		.connect_to_peer(
			Vec::new(),
			vec![Peer::new("x", 50001, Protocol::Tcp)],
			CallOptions::coin("litecoin"),
		)
		.await;
	assert!(!connected.error);
	assert_eq!(connected.data["host"], "x");
	assert_eq!(
		api.manager().selected_network().await,
		Network::new("litecoin")
	);

	let disconnected = api
		.disconnect_from_peer(CallOptions::coin("litecoin"))
		.await;
	assert!(!disconnected.error);
	assert_eq!(
		api.manager().selected_network().await,
		Network::default()
	);
}

#[tokio::test]
async fn test_explicit_connect_skips_random_selection() {
	let factory = ScriptedFactory::new().script("x", PeerScript::Healthy);
	let api = api_with(factory.clone());

	let response = api
		.connect_to_peer(
			Vec::new(),
			vec![Peer::new("x", 50001, Protocol::Ssl)],
			CallOptions::default(),
		)
		.await;

	assert!(!response.error);
	assert_eq!(factory.attempted_hosts().await, vec!["x".to_string()]);
	assert_eq!(factory.requests_for("server.ping").await, 0);
}

#[tokio::test]
async fn test_broadcast_is_not_gated_by_the_selected_network() {
	// "electrum-ltc.bysh.me" is in the embedded litecoin dataset
	let factory = ScriptedFactory::new()
		.script("x", PeerScript::Healthy)
		.script("electrum-ltc.bysh.me", PeerScript::Healthy)
		.respond("blockchain.transaction.broadcast", json!("txid"));
	let api = api_with(factory);
	connect(&api).await;
	assert_eq!(api.manager().selected_network().await, Network::default());

	let response = api
		.broadcast_transaction("0200aabbcc", CallOptions::coin("litecoin"))
		.await;

	// The selected network stays bitcoin, yet the call went through
	assert!(!response.error);
	assert_eq!(response.data, json!("txid"));
	assert_eq!(api.manager().selected_network().await, Network::default());
}

#[tokio::test]
async fn test_batch_operations_aggregate_responses() {
	let factory = ScriptedFactory::new()
		.script("x", PeerScript::Healthy)
		.respond(
			"blockchain.scripthash.get_balance",
			json!({ "confirmed": 1 }),
		);
	let api = api_with(factory.clone());
	connect(&api).await;

	let response = api
		.get_address_script_hashes_balance(
			vec!["hash-one".to_string(), "hash-two".to_string()],
			CallOptions::default(),
		)
		.await;

	assert!(!response.error);
	assert_eq!(response.data.as_array().unwrap().len(), 2);
	assert_eq!(
		factory.requests_for("blockchain.scripthash.get_balance").await,
		2
	);
}

#[tokio::test]
async fn test_get_available_peers_reads_the_dataset_without_connecting() {
	let factory = ScriptedFactory::new();
	let api = api_with(factory.clone());

	let response = api.get_available_peers(CallOptions::default()).await;

	assert!(!response.error);
	assert!(!response.data.as_array().unwrap().is_empty());
	assert_eq!(factory.attempts().await, 0);
}

#[tokio::test]
async fn test_subscribe_address_resolves_on_the_first_push() {
	let factory = ScriptedFactory::new().script("x", PeerScript::Healthy);
	let api = Arc::new(api_with(factory.clone()));
	connect(&api).await;

	let call = {
		let api = api.clone();
		tokio::spawn(async move {
			api.subscribe_address("a-script-hash", CallOptions::default())
				.await
		})
	};

	// Wait for the subscription to register, then push a status change
	let payload = json!(["a-script-hash", "new-status-hash"]);
	let mut delivered = 0;
	for _ in 0..50 {
		delivered = factory
			.push("blockchain.scripthash.subscribe", payload.clone())
			.await;
		if delivered > 0 {
			break;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	assert!(delivered > 0, "the subscription never registered");

	let response = call.await.unwrap();
	assert!(!response.error);
	assert_eq!(response.data, payload);
	// The enrollment request went over the wire
	assert_eq!(
		factory.requests_for("blockchain.scripthash.subscribe").await,
		1
	);
}

#[tokio::test]
async fn test_get_version_reconnects_for_a_non_selected_network() {
	let factory = ScriptedFactory::new()
		.script("x", PeerScript::Healthy)
		.script("electrum-ltc.bysh.me", PeerScript::Healthy)
		.respond("server.version", json!(["ElectrumX 1.16.0", "1.4"]));
	let api = api_with(factory.clone());
	connect(&api).await;

	let response = api
		.get_version(None, None, CallOptions::coin("litecoin"))
		.await;

	assert!(!response.error);
	assert_eq!(response.data[1], "1.4");
	// A session for litecoin was established on demand, selection untouched
	assert!(api
		.manager()
		.session(&Network::new("litecoin"))
		.await
		.is_some());
	assert_eq!(api.manager().selected_network().await, Network::default());
}

#[tokio::test]
async fn test_selection_failure_surfaces_as_an_error_envelope() {
	// No scripted hosts: every dataset peer refuses
	let api = api_with(ScriptedFactory::new());

	let response = api
		.connect_to_peer(Vec::new(), Vec::new(), CallOptions::default())
		.await;

	assert!(response.error);
	let reason = match &response.data {
		Value::String(reason) => reason.clone(),
		other => other.to_string(),
	};
	assert!(
		reason.contains("unreachable") || reason.contains("exhausted"),
		"unexpected failure data: {}",
		reason
	);
}
