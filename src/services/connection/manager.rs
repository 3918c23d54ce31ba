//! Peer selection and failover.
//!
//! The connection manager owns at most one session per network and is the
//! sole mutator of the selected network. Selection draws peers uniformly at
//! random from the working list, evicts candidates that fail to connect or
//! fail the health probe, and gives up once the bounded round budget is
//! spent. Random sampling avoids ordering bias from a fixed peer list;
//! per-peer eviction keeps a known-bad peer from being retried within the
//! same selection attempt.

use std::{collections::HashMap, sync::Arc};

use rand::Rng;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use crate::{
	models::{ClientConfig, Network, Peer, PeerEntry},
	repositories::PeerDatasetRepository,
	services::{
		connection::{ConnectionError, PeerPool, Session},
		transport::{ConnectInfo, ElectrumTransport, TransportFactory},
	},
	utils::SessionStorage,
};

/// Result of a disconnect command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
	/// An established session was discarded and the selection reset
	Disconnected,
	/// There was nothing to disconnect from; reported as success
	NothingToDisconnect,
}

/// Outcome of one selection round against one drawn candidate.
///
/// Selection decides per round whether to install the session, evict the
/// candidate and continue, or abort the whole attempt — nothing is
/// swallowed.
enum RoundOutcome<T> {
	Connected {
		transport: T,
		peer: Peer,
		info: ConnectInfo,
	},
	Retryable {
		reason: String,
	},
	Fatal(ConnectionError),
}

/// Owns the per-network session slots, the peer pools and the selected
/// network, and produces healthy established sessions on demand.
pub struct ConnectionManager<F: TransportFactory> {
	factory: F,
	config: ClientConfig,
	pool: PeerPool,
	sessions: SessionStorage<Session<F::Transport>>,
	/// Last successfully connected peer per network
	current_peers: RwLock<HashMap<String, Peer>>,
	/// Per-network serialization of connection establishment
	connect_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
	/// The single network queries are currently dispatched for
	selected: RwLock<Network>,
}

impl<F: TransportFactory> ConnectionManager<F> {
	pub fn new(factory: F, config: ClientConfig, repository: PeerDatasetRepository) -> Self {
		let selected = config.default_network.clone();
		Self {
			factory,
			config,
			pool: PeerPool::new(repository),
			sessions: SessionStorage::new(),
			current_peers: RwLock::new(HashMap::new()),
			connect_locks: Mutex::new(HashMap::new()),
			selected: RwLock::new(selected),
		}
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub fn pool(&self) -> &PeerPool {
		&self.pool
	}

	pub async fn selected_network(&self) -> Network {
		self.selected.read().await.clone()
	}

	/// Rejects operations addressed to a network other than the selected one
	pub async fn check_selected(&self, network: &Network) -> Result<(), ConnectionError> {
		let selected = self.selected_network().await;
		if *network != selected {
			return Err(ConnectionError::network_mismatch(
				network.as_str(),
				selected.as_str(),
			));
		}
		Ok(())
	}

	/// The established session for a network, if any
	pub async fn session(&self, network: &Network) -> Option<Arc<Session<F::Transport>>> {
		self.sessions.get(network.as_str()).await
	}

	/// The peer the network's current session was established against
	pub async fn current_peer(&self, network: &Network) -> Option<Peer> {
		self.current_peers.read().await.get(network.as_str()).cloned()
	}

	/// Produces an established session for the network, connecting if none
	/// exists.
	///
	/// Establishment is serialized per network: concurrent callers that
	/// both observe an empty slot converge on the one winning session
	/// instead of racing the slot.
	pub async fn ensure_connected(
		&self,
		network: &Network,
	) -> Result<Arc<Session<F::Transport>>, ConnectionError> {
		// Fast path: an established session already exists
		if let Some(session) = self.sessions.get(network.as_str()).await {
			return Ok(session);
		}

		let lock = self.connect_lock(network).await;
		let _guard = lock.lock().await;

		// A racing caller may have connected while we waited on the lock
		if let Some(session) = self.sessions.get(network.as_str()).await {
			return Ok(session);
		}

		self.select_peer_locked(network, Vec::new()).await?;
		self.sessions.get(network.as_str()).await.ok_or_else(|| {
			ConnectionError::exhausted(
				"Session was torn down before it could be used",
				None,
				Some(HashMap::from([(
					"coin".to_string(),
					network.as_str().to_string(),
				)])),
			)
		})
	}

	/// Selects and connects a peer for the network, tolerating unreachable
	/// candidates. See the module docs for the retry/eviction policy.
	pub async fn select_peer(
		&self,
		network: &Network,
		candidate_peers: Vec<PeerEntry>,
	) -> Result<ConnectInfo, ConnectionError> {
		let lock = self.connect_lock(network).await;
		let _guard = lock.lock().await;
		self.select_peer_locked(network, candidate_peers).await
	}

	/// Marks the network selected and runs random selection for it
	pub async fn connect(
		&self,
		network: &Network,
		candidate_peers: Vec<PeerEntry>,
	) -> Result<ConnectInfo, ConnectionError> {
		*self.selected.write().await = network.clone();
		self.select_peer(network, candidate_peers).await
	}

	/// Marks the network selected and connects to exactly the given peer.
	///
	/// Bypasses random selection entirely: no retry, no eviction, no health
	/// probe — the caller already knows which peer to use.
	#[instrument(skip(self))]
	pub async fn connect_explicit(
		&self,
		network: &Network,
		peer: Peer,
	) -> Result<ConnectInfo, ConnectionError> {
		*self.selected.write().await = network.clone();

		let lock = self.connect_lock(network).await;
		let _guard = lock.lock().await;

		let connection = self.factory.connect(&peer).await.map_err(|e| {
			ConnectionError::transport(
				format!("Failed to connect to {}", peer),
				Some(Box::new(e)),
				Some(HashMap::from([(
					"coin".to_string(),
					network.as_str().to_string(),
				)])),
			)
		})?;

		let info = connection.info.clone();
		self.install(network, peer, connection.transport).await;
		Ok(info)
	}

	/// Tears down the network's session and resets the selection to the
	/// default network. Disconnecting a network with no session is a
	/// successful no-op.
	pub async fn disconnect(&self, network: &Network) -> Result<DisconnectOutcome, ConnectionError> {
		self.check_selected(network).await?;

		match self.sessions.remove(network.as_str()).await {
			Some(session) => {
				session.close().await;
				*self.selected.write().await = self.config.default_network.clone();
				debug!(coin = %network, "disconnected");
				Ok(DisconnectOutcome::Disconnected)
			}
			None => Ok(DisconnectOutcome::NothingToDisconnect),
		}
	}

	async fn connect_lock(&self, network: &Network) -> Arc<Mutex<()>> {
		let mut locks = self.connect_locks.lock().await;
		locks
			.entry(network.as_str().to_string())
			.or_insert_with(|| Arc::new(Mutex::new(())))
			.clone()
	}

	async fn install(&self, network: &Network, peer: Peer, transport: F::Transport) {
		let session = Arc::new(Session::established(peer.clone(), transport));
		self.sessions.insert(network.as_str(), session).await;
		self.current_peers
			.write()
			.await
			.insert(network.as_str().to_string(), peer);
	}

	/// The selection loop. Must be called with the network's connect lock
	/// held.
	#[instrument(skip(self, candidate_peers), fields(coin = %network))]
	async fn select_peer_locked(
		&self,
		network: &Network,
		candidate_peers: Vec<PeerEntry>,
	) -> Result<ConnectInfo, ConnectionError> {
		let mut working = self
			.pool
			.working_list(network, candidate_peers, self.config.default_protocol)
			.await;
		// Whether evictions must be written back: true for override and
		// previously stored lists, false for synthesized default lists
		let stored = self.pool.has_stored(network).await;

		let initial_len = working.len();
		if initial_len == 0 {
			return Err(ConnectionError::exhausted(
				"No peers known for network",
				None,
				Some(HashMap::from([(
					"coin".to_string(),
					network.as_str().to_string(),
				)])),
			));
		}

		for round in 0..=initial_len {
			if working.is_empty() {
				break;
			}

			// Uniform draw over the current working list; the list shrinks
			// as peers are evicted
			let index = rand::rng().random_range(0..working.len());
			let entry = working[index].clone();
			debug!(round, host = entry.host(), remaining = working.len(), "trying peer");

			match self.attempt_round(&entry).await {
				RoundOutcome::Connected {
					transport,
					peer,
					info,
				} => {
					debug!(peer = %peer, "selection succeeded");
					self.install(network, peer, transport).await;
					return Ok(info);
				}
				RoundOutcome::Retryable { reason } => {
					if working.len() == 1 {
						// Nothing left to evict; the attempt is over
						return Err(ConnectionError::peer_unreachable(
							reason,
							None,
							Some(HashMap::from([
								("coin".to_string(), network.as_str().to_string()),
								("host".to_string(), entry.host().to_string()),
							])),
						));
					}
					warn!(host = entry.host(), %reason, "evicting peer from working list");
					working.remove(index);
					if stored {
						self.pool.replace(network, working.clone()).await;
					}
				}
				RoundOutcome::Fatal(error) => return Err(error),
			}
		}

		Err(ConnectionError::exhausted(
			"Unable to connect to any peer",
			None,
			Some(HashMap::from([(
				"coin".to_string(),
				network.as_str().to_string(),
			)])),
		))
	}

	/// One selection round: resolve, connect, probe.
	async fn attempt_round(&self, entry: &PeerEntry) -> RoundOutcome<F::Transport> {
		let Some(peer) = entry.resolve(self.config.default_protocol) else {
			return RoundOutcome::Retryable {
				reason: format!("peer record for {} has no usable port", entry.host()),
			};
		};

		let connection = match self.factory.connect(&peer).await {
			Ok(connection) => connection,
			Err(error) if error.is_retryable() => {
				return RoundOutcome::Retryable {
					reason: error.to_string(),
				}
			}
			Err(error) => {
				// A local configuration failure will fail identically
				// against every peer; abort instead of draining the pool
				return RoundOutcome::Fatal(ConnectionError::transport(
					format!("Connection to {} cannot succeed", peer),
					Some(Box::new(error)),
					None,
				));
			}
		};

		// The server must be responsive beyond a successful connect: the
		// probe has to answer with the no-error sentinel before the
		// session is trusted
		match connection.transport.ping().await {
			Ok(value) if value.is_null() => RoundOutcome::Connected {
				transport: connection.transport,
				peer,
				info: connection.info,
			},
			Ok(value) => {
				connection.transport.close().await;
				RoundOutcome::Retryable {
					reason: format!("health probe returned unexpected value: {}", value),
				}
			}
			Err(error) => {
				connection.transport.close().await;
				RoundOutcome::Retryable {
					reason: format!("health probe failed: {}", error),
				}
			}
		}
	}
}
