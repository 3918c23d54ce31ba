use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::Network;

/// The uniform result shape returned by every public query operation.
///
/// Success and failure are discriminated by the `error` flag rather than a
/// language-level error: `data` carries the server response on success and
/// a description of the cause on failure. `id` correlates the response with
/// the caller's request and is generated when not supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	pub id: String,
	pub method: String,
	pub error: bool,
	pub coin: String,
	pub data: Value,
}

impl Envelope {
	pub fn ok(id: String, method: &str, coin: &Network, data: Value) -> Self {
		Self {
			id,
			method: method.to_string(),
			error: false,
			coin: coin.as_str().to_string(),
			data,
		}
	}

	pub fn fail(id: String, method: &str, coin: &Network, data: Value) -> Self {
		Self {
			id,
			method: method.to_string(),
			error: true,
			coin: coin.as_str().to_string(),
			data,
		}
	}
}

/// Generates a correlation id for calls that did not supply one
pub fn correlation_id() -> String {
	Uuid::new_v4().to_string()
}
