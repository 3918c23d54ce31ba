use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Generic per-network session storage.
///
/// Sessions are stored in a thread-safe way using a HashMap and an RwLock.
/// The HashMap is indexed by the network identifier and the value is an Arc
/// of the stored session, so lookups on the hot query path stay cheap while
/// installs and teardowns take the write lock.
#[derive(Default)]
pub struct SessionStorage<S> {
	pub sessions: Arc<RwLock<HashMap<String, Arc<S>>>>,
}

impl<S> SessionStorage<S> {
	pub fn new() -> Self {
		Self {
			sessions: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Returns the stored session for a network, if any
	pub async fn get(&self, network: &str) -> Option<Arc<S>> {
		self.sessions.read().await.get(network).cloned()
	}

	/// Installs a session for a network, superseding any previous one
	pub async fn insert(&self, network: &str, session: Arc<S>) {
		self.sessions
			.write()
			.await
			.insert(network.to_string(), session);
	}

	/// Discards the session slot for a network, returning the evicted entry
	pub async fn remove(&self, network: &str) -> Option<Arc<S>> {
		self.sessions.write().await.remove(network)
	}

	pub async fn len(&self) -> usize {
		self.sessions.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.sessions.read().await.is_empty()
	}
}
