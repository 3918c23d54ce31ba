//! Transport contract and implementations.
//!
//! Defines the collaborator interface a session is built on — connect,
//! request dispatch, the ping health probe and push subscriptions — and
//! provides the concrete TCP/TLS implementation speaking
//! newline-delimited JSON-RPC. The wire details live entirely behind
//! [`ElectrumTransport`]/[`TransportFactory`]; the selection and facade
//! layers never see them.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{PeerStream, TcpTransport, TcpTransportFactory};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::models::Peer;

/// Keep-alive probe method; a healthy server answers with JSON `null`
pub const METHOD_SERVER_PING: &str = "server.ping";

/// Addressing data carried by a successful connect
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConnectInfo {
	pub host: String,
	pub port: u16,
}

/// A freshly established transport together with its connect data
pub struct Connection<T> {
	pub transport: T,
	pub info: ConnectInfo,
}

/// One live connection to one peer
#[async_trait]
pub trait ElectrumTransport: Send + Sync + 'static {
	/// Issues one protocol call and awaits the matching response
	async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError>;

	/// Health probe. A healthy round-trip returns exactly the JSON `null`
	/// sentinel; any other value or error counts as a failed probe.
	async fn ping(&self) -> Result<Value, TransportError> {
		self.request(METHOD_SERVER_PING, Vec::new()).await
	}

	/// Registers for server-pushed notifications on a topic (a protocol
	/// method name such as `blockchain.headers.subscribe`). Delivery stops
	/// when the transport closes.
	async fn subscribe(&self, topic: &str)
		-> Result<mpsc::UnboundedReceiver<Value>, TransportError>;

	/// Releases the transport
	async fn close(&self);
}

/// Establishes transports for resolved peers
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
	type Transport: ElectrumTransport;

	/// Attempts to establish a connection to the given peer
	async fn connect(&self, peer: &Peer) -> Result<Connection<Self::Transport>, TransportError>;
}
