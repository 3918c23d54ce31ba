use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one independent peer universe (a chain, e.g. "bitcoin").
///
/// Every network has its own peer list and its own session slot. The
/// connection manager keeps exactly one selected network at a time; query
/// operations addressed to any other network are rejected with an explicit
/// mismatch error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Network(String);

impl Network {
	/// Creates a network identifier from any string-like value
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Default for Network {
	/// The network assumed when a caller does not name one
	fn default() -> Self {
		Self("bitcoin".to_string())
	}
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for Network {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for Network {
	fn from(id: String) -> Self {
		Self(id)
	}
}
