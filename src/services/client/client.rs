//! Query facade over the connection manager.
//!
//! Every operation follows the same shape: resolve the call options, check
//! the requested network against the selected one where the operation is
//! gated, ensure an established session exists, issue the protocol call and
//! normalize the outcome into an [`Envelope`]. Nothing here throws across
//! the public boundary — the envelope's `error` flag is the only failure
//! channel.

use std::fmt::Display;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
	models::{correlation_id, ClientConfig, Envelope, Network, Peer, PeerEntry},
	repositories::PeerDatasetRepository,
	services::{
		connection::{ConnectionManager, DisconnectOutcome},
		transport::{TcpTransportFactory, TransportFactory},
	},
};

/// Protocol method constants
const RPC_SERVER_VERSION: &str = "server.version";
const RPC_SERVER_BANNER: &str = "server.banner";
const RPC_SERVER_PING: &str = "server.ping";
const RPC_SERVER_DONATION_ADDRESS: &str = "server.donation_address";
const RPC_SERVER_PEERS_SUBSCRIBE: &str = "server.peers.subscribe";
const RPC_NUMBLOCKS_SUBSCRIBE: &str = "blockchain.numblocks.subscribe";
const RPC_HEADERS_SUBSCRIBE: &str = "blockchain.headers.subscribe";
const RPC_ADDRESS_SUBSCRIBE: &str = "blockchain.address.subscribe";
const RPC_ADDRESS_GET_HISTORY: &str = "blockchain.address.get_history";
const RPC_ADDRESS_GET_MEMPOOL: &str = "blockchain.address.get_mempool";
const RPC_ADDRESS_GET_BALANCE: &str = "blockchain.address.get_balance";
const RPC_ADDRESS_GET_PROOF: &str = "blockchain.address.get_proof";
const RPC_ADDRESS_LISTUNSPENT: &str = "blockchain.address.listunspent";
const RPC_SCRIPTHASH_SUBSCRIBE: &str = "blockchain.scripthash.subscribe";
const RPC_SCRIPTHASH_UNSUBSCRIBE: &str = "blockchain.scripthash.unsubscribe";
const RPC_SCRIPTHASH_GET_HISTORY: &str = "blockchain.scripthash.get_history";
const RPC_SCRIPTHASH_GET_MEMPOOL: &str = "blockchain.scripthash.get_mempool";
const RPC_SCRIPTHASH_GET_BALANCE: &str = "blockchain.scripthash.get_balance";
const RPC_SCRIPTHASH_LISTUNSPENT: &str = "blockchain.scripthash.listunspent";
const RPC_UTXO_GET_ADDRESS: &str = "blockchain.utxo.get_address";
const RPC_BLOCK_GET_HEADER: &str = "blockchain.block.get_header";
const RPC_BLOCK_HEADER: &str = "blockchain.block.header";
const RPC_BLOCK_GET_CHUNK: &str = "blockchain.block.get_chunk";
const RPC_TRANSACTION_BROADCAST: &str = "blockchain.transaction.broadcast";
const RPC_TRANSACTION_GET_MERKLE: &str = "blockchain.transaction.get_merkle";
const RPC_TRANSACTION_GET: &str = "blockchain.transaction.get";
const RPC_ESTIMATE_FEE: &str = "blockchain.estimatefee";

/// Per-call options shared by every operation.
///
/// `coin` defaults to the configured default network and `id` to a
/// generated correlation value.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
	pub coin: Option<Network>,
	pub id: Option<String>,
}

impl CallOptions {
	pub fn coin(coin: impl Into<Network>) -> Self {
		Self {
			coin: Some(coin.into()),
			id: None,
		}
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}
}

/// The public access layer: uniform envelope-returning query operations
/// over a shared [`ConnectionManager`].
pub struct ElectrumApi<F: TransportFactory> {
	manager: Arc<ConnectionManager<F>>,
}

impl ElectrumApi<TcpTransportFactory> {
	/// Creates an API over the built-in TCP/TLS transport and the embedded
	/// default peer dataset
	pub fn new(config: ClientConfig) -> Self {
		let factory = TcpTransportFactory::new(config.clone());
		Self::with_factory(factory, config, PeerDatasetRepository::new())
	}
}

impl<F: TransportFactory> ElectrumApi<F> {
	/// Creates an API over a custom transport factory and peer dataset
	pub fn with_factory(factory: F, config: ClientConfig, repository: PeerDatasetRepository) -> Self {
		Self {
			manager: Arc::new(ConnectionManager::new(factory, config, repository)),
		}
	}

	/// The underlying connection manager, for direct session access (e.g.
	/// long-lived subscription streams)
	pub fn manager(&self) -> &Arc<ConnectionManager<F>> {
		&self.manager
	}

	fn resolve_opts(&self, opts: CallOptions) -> (String, Network) {
		let id = opts.id.unwrap_or_else(correlation_id);
		let coin = opts
			.coin
			.unwrap_or_else(|| self.manager.config().default_network.clone());
		(id, coin)
	}

	/// Dispatch with the selected-network gate applied
	async fn gated_call(
		&self,
		method: &str,
		rpc_method: &str,
		params: Vec<Value>,
		opts: CallOptions,
	) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		if let Err(e) = self.manager.check_selected(&coin).await {
			return Envelope::fail(id, method, &coin, error_data(&e));
		}
		self.dispatch(id, method, rpc_method, params, coin).await
	}

	/// Dispatch without the gate, for operations valid on any network
	async fn open_call(
		&self,
		method: &str,
		rpc_method: &str,
		params: Vec<Value>,
		opts: CallOptions,
	) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		self.dispatch(id, method, rpc_method, params, coin).await
	}

	/// Dispatch against whatever network is currently selected
	async fn selected_call(
		&self,
		method: &str,
		rpc_method: &str,
		params: Vec<Value>,
		opts: CallOptions,
	) -> Envelope {
		let id = opts.id.unwrap_or_else(correlation_id);
		let coin = self.manager.selected_network().await;
		self.dispatch(id, method, rpc_method, params, coin).await
	}

	#[instrument(skip(self, id, params), fields(coin = %coin))]
	async fn dispatch(
		&self,
		id: String,
		method: &str,
		rpc_method: &str,
		params: Vec<Value>,
		coin: Network,
	) -> Envelope {
		let session = match self.manager.ensure_connected(&coin).await {
			Ok(session) => session,
			Err(e) => return Envelope::fail(id, method, &coin, error_data(&e)),
		};
		match session.request(rpc_method, params).await {
			Ok(data) => Envelope::ok(id, method, &coin, data),
			Err(e) => Envelope::fail(id, method, &coin, error_data(&e)),
		}
	}

	/// One protocol call per item, aggregated into one envelope. Individual
	/// item failures are skipped best-effort.
	async fn batch_call(
		&self,
		gated: bool,
		method: &str,
		rpc_method: &str,
		items: Vec<String>,
		params_for: impl Fn(&str) -> Vec<Value>,
		opts: CallOptions,
	) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		if gated {
			if let Err(e) = self.manager.check_selected(&coin).await {
				return Envelope::fail(id, method, &coin, error_data(&e));
			}
		}

		let session = match self.manager.ensure_connected(&coin).await {
			Ok(session) => session,
			Err(e) => return Envelope::fail(id, method, &coin, error_data(&e)),
		};

		let calls = items
			.iter()
			.map(|item| session.request(rpc_method, params_for(item)));
		let responses: Vec<Value> = join_all(calls)
			.await
			.into_iter()
			.filter_map(Result::ok)
			.collect();

		Envelope::ok(id, method, &coin, Value::Array(responses))
	}

	// --- Connection control ---

	/// Connects the requested network, marking it selected.
	///
	/// A non-empty `custom_peers` bypasses random selection entirely and
	/// binds to exactly its first peer, with no retry or eviction. Otherwise
	/// random selection runs over `peers` (or the network's stored or
	/// default pool when `peers` is empty).
	pub async fn connect_to_peer(
		&self,
		peers: Vec<PeerEntry>,
		custom_peers: Vec<Peer>,
		opts: CallOptions,
	) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		let result = match custom_peers.into_iter().next() {
			Some(custom) => self.manager.connect_explicit(&coin, custom).await,
			None => self.manager.connect(&coin, peers).await,
		};
		match result {
			Ok(info) => Envelope::ok(
				id,
				"connectToPeer",
				&coin,
				serde_json::to_value(info).unwrap_or(Value::Null),
			),
			Err(e) => Envelope::fail(id, "connectToPeer", &coin, error_data(&e)),
		}
	}

	/// Runs random selection for the requested network without changing
	/// which network is selected
	pub async fn connect_to_random_peer(&self, peers: Vec<PeerEntry>, opts: CallOptions) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		match self.manager.select_peer(&coin, peers).await {
			Ok(info) => Envelope::ok(
				id,
				"connectToRandomPeer",
				&coin,
				serde_json::to_value(info).unwrap_or(Value::Null),
			),
			Err(e) => Envelope::fail(id, "connectToRandomPeer", &coin, error_data(&e)),
		}
	}

	/// Tears down the requested network's session and resets the selection
	/// to the default network. Reports success when there is nothing to
	/// disconnect from.
	pub async fn disconnect_from_peer(&self, opts: CallOptions) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		match self.manager.disconnect(&coin).await {
			Ok(DisconnectOutcome::Disconnected) => {
				Envelope::ok(id, "disconnectFromPeer", &coin, Value::Null)
			}
			Ok(DisconnectOutcome::NothingToDisconnect) => Envelope::ok(
				id,
				"disconnectFromPeer",
				&coin,
				json!({ "message": "No peer to disconnect from.", "coin": coin.as_str() }),
			),
			Err(e) => Envelope::fail(id, "disconnectFromPeer", &coin, error_data(&e)),
		}
	}

	/// The built-in default dataset for the requested network, without
	/// touching the connection
	pub async fn get_available_peers(&self, opts: CallOptions) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		if let Err(e) = self.manager.check_selected(&coin).await {
			return Envelope::fail(id, "getAvailablePeers", &coin, error_data(&e));
		}
		let peers = self.manager.pool().repository().entries(&coin);
		Envelope::ok(
			id,
			"getAvailablePeers",
			&coin,
			serde_json::to_value(peers).unwrap_or(Value::Null),
		)
	}

	// --- Server operations ---

	/// Version handshake. Usually the first message a client sends, and
	/// repeated as a keep-alive; the server answers with the protocol
	/// version it will speak.
	///
	/// Unlike the gated queries, addressing a non-selected network here
	/// re-runs selection for that network first.
	pub async fn get_version(
		&self,
		v1: Option<String>,
		v2: Option<String>,
		opts: CallOptions,
	) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);

		let selected = self.manager.selected_network().await;
		if selected != coin {
			if let Err(e) = self.manager.select_peer(&coin, Vec::new()).await {
				return Envelope::fail(id, "getVersion", &coin, error_data(&e));
			}
		}

		let config = self.manager.config();
		let v1 = v1.unwrap_or_else(|| config.client_version.clone());
		let v2 = v2.unwrap_or_else(|| config.protocol_version.clone());
		self.dispatch(
			id,
			"getVersion",
			RPC_SERVER_VERSION,
			vec![json!(v1), json!(v2)],
			coin,
		)
		.await
	}

	pub async fn get_banner(&self, opts: CallOptions) -> Envelope {
		self.gated_call("getBanner", RPC_SERVER_BANNER, Vec::new(), opts)
			.await
	}

	/// Keep-alive probe against the selected network's session
	pub async fn ping_server(&self, opts: CallOptions) -> Envelope {
		self.selected_call("pingServer", RPC_SERVER_PING, Vec::new(), opts)
			.await
	}

	pub async fn get_donation_address(&self, opts: CallOptions) -> Envelope {
		self.selected_call(
			"getDonationAddress",
			RPC_SERVER_DONATION_ADDRESS,
			Vec::new(),
			opts,
		)
		.await
	}

	/// Asks the server for the peers it knows about. Servers answer with a
	/// one-time response rather than an ongoing subscription.
	pub async fn get_peers(&self, opts: CallOptions) -> Envelope {
		self.gated_call("getPeers", RPC_SERVER_PEERS_SUBSCRIBE, Vec::new(), opts)
			.await
	}

	// --- Subscriptions ---

	/// Enrolls for new-block height notifications; answers with the current
	/// block height
	pub async fn new_block_height_subscribe(&self, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getNewBlockHeightSubscribe",
			RPC_NUMBLOCKS_SUBSCRIBE,
			Vec::new(),
			opts,
		)
		.await
	}

	/// Enrolls for new-block header notifications; answers with the current
	/// chain tip
	pub async fn new_block_headers_subscribe(&self, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getNewBlockHeadersSubscribe",
			RPC_HEADERS_SUBSCRIBE,
			Vec::new(),
			opts,
		)
		.await
	}

	/// Enrolls for status-change notifications of a single address. The
	/// status is a hash of the address's transaction history, `null` when
	/// it has none yet.
	pub async fn hash_of_address_changes_subscribe(
		&self,
		address: &str,
		opts: CallOptions,
	) -> Envelope {
		self.gated_call(
			"getHashOfAddressChangesSubscribe",
			RPC_ADDRESS_SUBSCRIBE,
			vec![json!(address)],
			opts,
		)
		.await
	}

	/// Resolves with the next server-pushed block header.
	///
	/// Enrollment is separate: call [`Self::new_block_headers_subscribe`]
	/// first, then await pushes here (or take a long-lived receiver from
	/// the session directly).
	pub async fn subscribe_header(&self, opts: CallOptions) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		let session = match self.manager.ensure_connected(&coin).await {
			Ok(session) => session,
			Err(e) => return Envelope::fail(id, "subscribeHeader", &coin, error_data(&e)),
		};
		let mut receiver = match session.subscribe(RPC_HEADERS_SUBSCRIBE).await {
			Ok(receiver) => receiver,
			Err(e) => return Envelope::fail(id, "subscribeHeader", &coin, error_data(&e)),
		};
		match receiver.recv().await {
			Some(data) => Envelope::ok(id, "subscribeHeader", &coin, data),
			None => Envelope::fail(
				id,
				"subscribeHeader",
				&coin,
				Value::String("subscription closed before a notification arrived".to_string()),
			),
		}
	}

	/// Enrolls a script hash for status-change notifications and resolves
	/// with the first pushed change
	pub async fn subscribe_address(&self, script_hash: &str, opts: CallOptions) -> Envelope {
		let (id, coin) = self.resolve_opts(opts);
		let session = match self.manager.ensure_connected(&coin).await {
			Ok(session) => session,
			Err(e) => return Envelope::fail(id, "subscribeAddress", &coin, error_data(&e)),
		};
		// Register for pushes before enrolling so no change is missed
		let mut receiver = match session.subscribe(RPC_SCRIPTHASH_SUBSCRIBE).await {
			Ok(receiver) => receiver,
			Err(e) => return Envelope::fail(id, "subscribeAddress", &coin, error_data(&e)),
		};
		if let Err(e) = session
			.request(RPC_SCRIPTHASH_SUBSCRIBE, vec![json!(script_hash)])
			.await
		{
			return Envelope::fail(id, "subscribeAddress", &coin, error_data(&e));
		}
		match receiver.recv().await {
			Some(data) => Envelope::ok(id, "subscribeAddress", &coin, data),
			None => Envelope::fail(
				id,
				"subscribeAddress",
				&coin,
				Value::String("subscription closed before a notification arrived".to_string()),
			),
		}
	}

	/// Unsubscribes a batch of script hashes; individual failures are
	/// skipped and the collected responses returned
	pub async fn unsubscribe_address(
		&self,
		script_hashes: Vec<String>,
		opts: CallOptions,
	) -> Envelope {
		self.batch_call(
			false,
			"unSubscribeAddress",
			RPC_SCRIPTHASH_UNSUBSCRIBE,
			script_hashes,
			|hash| vec![json!(hash)],
			opts,
		)
		.await
	}

	// --- Address and script-hash queries ---

	/// Transactions and their heights for a given address
	pub async fn get_address_history(&self, address: &str, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getAddressHistory",
			RPC_ADDRESS_GET_HISTORY,
			vec![json!(address)],
			opts,
		)
		.await
	}

	/// Transactions and their heights for a given script hash
	pub async fn get_address_script_hash_history(
		&self,
		script_hash: &str,
		opts: CallOptions,
	) -> Envelope {
		self.gated_call(
			"getAddressScriptHashHistory",
			RPC_SCRIPTHASH_GET_HISTORY,
			vec![json!(script_hash)],
			opts,
		)
		.await
	}

	pub async fn get_address_script_hashes_history(
		&self,
		script_hashes: Vec<String>,
		opts: CallOptions,
	) -> Envelope {
		self.batch_call(
			true,
			"getAddressScriptHashesHistory",
			RPC_SCRIPTHASH_GET_HISTORY,
			script_hashes,
			|hash| vec![json!(hash)],
			opts,
		)
		.await
	}

	pub async fn get_mempool(&self, address: &str, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getMempool",
			RPC_ADDRESS_GET_MEMPOOL,
			vec![json!(address)],
			opts,
		)
		.await
	}

	pub async fn get_address_script_hash_mempool(
		&self,
		script_hash: &str,
		opts: CallOptions,
	) -> Envelope {
		self.gated_call(
			"getAddressScriptHashMempool",
			RPC_SCRIPTHASH_GET_MEMPOOL,
			vec![json!(script_hash)],
			opts,
		)
		.await
	}

	pub async fn get_address_script_hashes_mempool(
		&self,
		script_hashes: Vec<String>,
		opts: CallOptions,
	) -> Envelope {
		self.batch_call(
			true,
			"getAddressScriptHashesMempool",
			RPC_SCRIPTHASH_GET_MEMPOOL,
			script_hashes,
			|hash| vec![json!(hash)],
			opts,
		)
		.await
	}

	pub async fn get_address_balance(&self, address: &str, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getAddressBalance",
			RPC_ADDRESS_GET_BALANCE,
			vec![json!(address)],
			opts,
		)
		.await
	}

	pub async fn get_address_script_hash_balance(
		&self,
		script_hash: &str,
		opts: CallOptions,
	) -> Envelope {
		self.gated_call(
			"getAddressScriptHashBalance",
			RPC_SCRIPTHASH_GET_BALANCE,
			vec![json!(script_hash)],
			opts,
		)
		.await
	}

	pub async fn get_address_script_hashes_balance(
		&self,
		script_hashes: Vec<String>,
		opts: CallOptions,
	) -> Envelope {
		self.batch_call(
			true,
			"getAddressScriptHashesBalance",
			RPC_SCRIPTHASH_GET_BALANCE,
			script_hashes,
			|hash| vec![json!(hash)],
			opts,
		)
		.await
	}

	pub async fn get_address_proof(&self, address: &str, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getAddressProof",
			RPC_ADDRESS_GET_PROOF,
			vec![json!(address)],
			opts,
		)
		.await
	}

	pub async fn list_unspent_address(&self, address: &str, opts: CallOptions) -> Envelope {
		self.gated_call(
			"listUnspentAddress",
			RPC_ADDRESS_LISTUNSPENT,
			vec![json!(address)],
			opts,
		)
		.await
	}

	pub async fn list_unspent_address_script_hash(
		&self,
		script_hash: &str,
		opts: CallOptions,
	) -> Envelope {
		self.gated_call(
			"listUnspentAddressScriptHash",
			RPC_SCRIPTHASH_LISTUNSPENT,
			vec![json!(script_hash)],
			opts,
		)
		.await
	}

	pub async fn list_unspent_address_script_hashes(
		&self,
		script_hashes: Vec<String>,
		opts: CallOptions,
	) -> Envelope {
		self.batch_call(
			true,
			"listUnspentAddressScriptHashes",
			RPC_SCRIPTHASH_LISTUNSPENT,
			script_hashes,
			|hash| vec![json!(hash)],
			opts,
		)
		.await
	}

	pub async fn get_address_utxo(&self, tx_hash: &str, index: u32, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getAddressUtxo",
			RPC_UTXO_GET_ADDRESS,
			vec![json!(tx_hash), json!(index)],
			opts,
		)
		.await
	}

	// --- Block and transaction queries ---

	pub async fn get_block_header(&self, height: u64, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getBlockHeader",
			RPC_BLOCK_GET_HEADER,
			vec![json!(height)],
			opts,
		)
		.await
	}

	/// Same as [`Self::get_block_header`] via the newer method name; some
	/// networks only answer one of the two
	pub async fn get_header(&self, height: u64, opts: CallOptions) -> Envelope {
		self.gated_call("getHeader", RPC_BLOCK_HEADER, vec![json!(height)], opts)
			.await
	}

	pub async fn get_block_chunk(&self, index: u64, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getBlockChunk",
			RPC_BLOCK_GET_CHUNK,
			vec![json!(index)],
			opts,
		)
		.await
	}

	/// Submits a raw serialized, hex-encoded transaction to the network.
	/// Answers with the transaction id, or an error when the transaction is
	/// invalid for any reason.
	pub async fn broadcast_transaction(&self, raw_tx: &str, opts: CallOptions) -> Envelope {
		self.open_call(
			"broadcastTransaction",
			RPC_TRANSACTION_BROADCAST,
			vec![json!(raw_tx)],
			opts,
		)
		.await
	}

	pub async fn get_transaction_merkle(
		&self,
		tx_hash: &str,
		height: u64,
		opts: CallOptions,
	) -> Envelope {
		self.gated_call(
			"getTransactionMerkle",
			RPC_TRANSACTION_GET_MERKLE,
			vec![json!(tx_hash), json!(height)],
			opts,
		)
		.await
	}

	/// The raw hex-encoded transaction for a given txid
	pub async fn get_transaction_hex(&self, tx_id: &str, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getTransactionHex",
			RPC_TRANSACTION_GET,
			vec![json!(tx_id)],
			opts,
		)
		.await
	}

	/// The decoded transaction for a given txid
	pub async fn get_transaction(&self, tx_hash: &str, opts: CallOptions) -> Envelope {
		self.gated_call(
			"getTransaction",
			RPC_TRANSACTION_GET,
			vec![json!(tx_hash), json!(true)],
			opts,
		)
		.await
	}

	pub async fn get_transactions(&self, tx_hashes: Vec<String>, opts: CallOptions) -> Envelope {
		self.batch_call(
			true,
			"getTransactions",
			RPC_TRANSACTION_GET,
			tx_hashes,
			|hash| vec![json!(hash), json!(true)],
			opts,
		)
		.await
	}

	/// Estimated fee per kilobyte for confirmation within the given number
	/// of blocks; `-1` when the server lacks the data for an estimate
	pub async fn get_fee_estimate(
		&self,
		blocks_willing_to_wait: Option<u32>,
		opts: CallOptions,
	) -> Envelope {
		let blocks = blocks_willing_to_wait.unwrap_or(8);
		self.gated_call(
			"getFeeEstimate",
			RPC_ESTIMATE_FEE,
			vec![json!(blocks)],
			opts,
		)
		.await
	}
}

fn error_data(error: &impl Display) -> Value {
	Value::String(error.to_string())
}
