//! One live connection to one peer for one network.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
	models::Peer,
	services::transport::{ElectrumTransport, TransportError},
};

/// Lifecycle of a session slot. A network without a slot entry is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Connecting,
	Established,
	Failed,
}

/// A transport bound to the peer it was established against.
///
/// Sessions are created by the connection manager once a peer has passed
/// the health probe, and are discarded wholesale on disconnect or when a
/// new connection for the same network supersedes them.
pub struct Session<T> {
	peer: Peer,
	state: SessionState,
	transport: T,
}

impl<T: ElectrumTransport> Session<T> {
	/// Wraps a transport that has already connected and passed its probe
	pub fn established(peer: Peer, transport: T) -> Self {
		Self {
			peer,
			state: SessionState::Established,
			transport,
		}
	}

	pub fn peer(&self) -> &Peer {
		&self.peer
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn is_established(&self) -> bool {
		self.state == SessionState::Established
	}

	/// Issues one protocol call over the established transport
	pub async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
		self.transport.request(method, params).await
	}

	pub async fn ping(&self) -> Result<Value, TransportError> {
		self.transport.ping().await
	}

	pub async fn subscribe(
		&self,
		topic: &str,
	) -> Result<mpsc::UnboundedReceiver<Value>, TransportError> {
		self.transport.subscribe(topic).await
	}

	pub async fn close(&self) {
		self.transport.close().await;
	}
}
