use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{config::ConfigError, Network, Protocol};

/// --- Default values for client configuration settings ---
fn default_connect_timeout() -> Duration {
	Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
	Duration::from_secs(30)
}

fn default_client_version() -> String {
	"3.2.3".to_string()
}

fn default_protocol_version() -> String {
	"1.4".to_string()
}

/// Configuration for the access layer: selection defaults, transport
/// timeouts, and the version strings announced during the server handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
	/// Network assumed when an operation does not name one
	#[serde(default)]
	pub default_network: Network,

	/// Protocol used to resolve default-dataset entries
	#[serde(default)]
	pub default_protocol: Protocol,

	/// Bound on a single connection establishment attempt
	#[serde(default = "default_connect_timeout")]
	pub connect_timeout: Duration,

	/// Bound on a single request round-trip over an established session
	#[serde(default = "default_request_timeout")]
	pub request_timeout: Duration,

	/// Client software version sent with `server.version`
	#[serde(default = "default_client_version")]
	pub client_version: String,

	/// Protocol version negotiated with `server.version`
	#[serde(default = "default_protocol_version")]
	pub protocol_version: String,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			default_network: Network::default(),
			default_protocol: Protocol::default(),
			connect_timeout: default_connect_timeout(),
			request_timeout: default_request_timeout(),
			client_version: default_client_version(),
			protocol_version: default_protocol_version(),
		}
	}
}

impl ClientConfig {
	/// Validates the configuration
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.connect_timeout.is_zero() {
			return Err(ConfigError::validation_error(
				"connect_timeout must be greater than zero",
				None,
				None,
			));
		}
		if self.request_timeout.is_zero() {
			return Err(ConfigError::validation_error(
				"request_timeout must be greater than zero",
				None,
				None,
			));
		}
		if self.client_version.is_empty() || self.protocol_version.is_empty() {
			return Err(ConfigError::validation_error(
				"handshake version strings must not be empty",
				None,
				None,
			));
		}
		Ok(())
	}
}
