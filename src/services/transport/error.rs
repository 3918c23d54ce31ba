//! Error types for transport services
//!
//! Provides error handling for connection establishment, request dispatch
//! and the TLS layer.

use std::collections::HashMap;

use thiserror::Error;

use crate::utils::logging::error::{ErrorContext, TraceableError};

#[derive(Debug, Error)]
pub enum TransportError {
	/// Network error while connecting or sending
	#[error("Network error: {0}")]
	Network(ErrorContext),

	/// An operation exceeded its time budget
	#[error("Timeout: {0}")]
	Timeout(ErrorContext),

	/// The server reported a protocol-level error
	#[error("Server error: {0}")]
	Rpc(ErrorContext),

	/// Request body serialization error
	#[error("Failed to serialize request JSON: {0}")]
	RequestSerialization(ErrorContext),

	/// TLS configuration or handshake error
	#[error("TLS error: {0}")]
	Tls(ErrorContext),

	/// The connection went away
	#[error("Connection closed: {0}")]
	Closed(ErrorContext),
}

impl TransportError {
	pub fn network(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Network(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn timeout(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Timeout(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn rpc(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Rpc(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn request_serialization(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::RequestSerialization(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn tls(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Tls(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn closed(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Closed(ErrorContext::new_with_log(msg, source, metadata))
	}

	/// Whether retrying another peer can plausibly help.
	///
	/// TLS configuration problems and request serialization failures are
	/// local and will fail identically against every peer.
	pub fn is_retryable(&self) -> bool {
		!matches!(self, Self::Tls(_) | Self::RequestSerialization(_))
	}
}

impl TraceableError for TransportError {
	fn trace_id(&self) -> String {
		match self {
			Self::Network(ctx) => ctx.trace_id.clone(),
			Self::Timeout(ctx) => ctx.trace_id.clone(),
			Self::Rpc(ctx) => ctx.trace_id.clone(),
			Self::RequestSerialization(ctx) => ctx.trace_id.clone(),
			Self::Tls(ctx) => ctx.trace_id.clone(),
			Self::Closed(ctx) => ctx.trace_id.clone(),
		}
	}
}
