use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Wire protocol a peer is reachable over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
	/// Plaintext TCP
	Tcp,
	/// TLS-encrypted TCP
	Ssl,
}

impl Default for Protocol {
	fn default() -> Self {
		Protocol::Ssl
	}
}

impl fmt::Display for Protocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Protocol::Tcp => write!(f, "tcp"),
			Protocol::Ssl => write!(f, "ssl"),
		}
	}
}

/// A fully resolved peer address: one server offering the query protocol
/// for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
	pub host: String,
	/// Accepts both numeric and string ports, as found in peer datasets
	#[serde(deserialize_with = "port_from_string_or_number")]
	pub port: u16,
	#[serde(default)]
	pub protocol: Protocol,
}

impl Peer {
	pub fn new(host: impl Into<String>, port: u16, protocol: Protocol) -> Self {
		Self {
			host: host.into(),
			port,
			protocol,
		}
	}
}

impl fmt::Display for Peer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
	}
}

/// A record from the built-in default dataset: one host carrying a port per
/// supported protocol, ports stored as strings as in the upstream server
/// list format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPeer {
	pub host: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tcp: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ssl: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pruning: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
}

impl DatasetPeer {
	/// Resolves the record to a concrete peer address for the given
	/// protocol. `None` when the record carries no usable port for it.
	pub fn resolve(&self, protocol: Protocol) -> Option<Peer> {
		let port = match protocol {
			Protocol::Tcp => self.tcp.as_deref(),
			Protocol::Ssl => self.ssl.as_deref(),
		}?;
		let port = port.parse().ok()?;
		Some(Peer::new(self.host.clone(), port, protocol))
	}
}

/// A selection candidate in one of its two shapes.
///
/// The shape is chosen explicitly by the caller's mode: override lists carry
/// `Explicit` entries with a fixed `{host, port, protocol}`, while entries
/// synthesized from the default dataset stay `Dataset` and resolve their
/// protocol-keyed port at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeerEntry {
	Explicit(Peer),
	Dataset(DatasetPeer),
}

impl PeerEntry {
	/// Resolves the entry to a connectable peer. Explicit entries keep their
	/// own protocol; dataset entries are resolved with `default_protocol`.
	/// Malformed entries resolve to `None` and are skipped by selection.
	pub fn resolve(&self, default_protocol: Protocol) -> Option<Peer> {
		match self {
			PeerEntry::Explicit(peer) => Some(peer.clone()),
			PeerEntry::Dataset(entry) => entry.resolve(default_protocol),
		}
	}

	pub fn host(&self) -> &str {
		match self {
			PeerEntry::Explicit(peer) => &peer.host,
			PeerEntry::Dataset(entry) => &entry.host,
		}
	}
}

impl From<Peer> for PeerEntry {
	fn from(peer: Peer) -> Self {
		PeerEntry::Explicit(peer)
	}
}

impl From<DatasetPeer> for PeerEntry {
	fn from(entry: DatasetPeer) -> Self {
		PeerEntry::Dataset(entry)
	}
}

fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum PortRepr {
		Number(u16),
		Text(String),
	}

	match PortRepr::deserialize(deserializer)? {
		PortRepr::Number(port) => Ok(port),
		PortRepr::Text(text) => text.parse().map_err(serde::de::Error::custom),
	}
}
