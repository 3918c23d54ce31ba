//! Error types for connection management
//!
//! Covers selection failures (a single unreachable peer, a fully exhausted
//! pool), explicit connect failures, and the selected-network gate.

use std::collections::HashMap;

use thiserror::Error;

use crate::utils::logging::error::{ErrorContext, TraceableError};

#[derive(Debug, Error)]
pub enum ConnectionError {
	/// The last remaining candidate peer failed; selection aborted
	#[error("Peer unreachable: {0}")]
	PeerUnreachable(ErrorContext),

	/// Every candidate peer failed within the bounded retry budget
	#[error("Peer pool exhausted: {0}")]
	Exhausted(ErrorContext),

	/// An explicit connection attempt failed, or a failure was classified
	/// as unable to succeed against any peer
	#[error("Connection failed: {0}")]
	Transport(ErrorContext),

	/// The operation addressed a network other than the selected one
	#[error("Network mismatch: requested {requested}, selected {selected}")]
	NetworkMismatch {
		requested: String,
		selected: String,
		context: ErrorContext,
	},
}

impl ConnectionError {
	pub fn peer_unreachable(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::PeerUnreachable(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn exhausted(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Exhausted(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn transport(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Transport(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn network_mismatch(requested: impl Into<String>, selected: impl Into<String>) -> Self {
		let requested = requested.into();
		let selected = selected.into();
		let msg = format!(
			"Network mismatch: requested {}, selected {}",
			requested, selected
		);
		Self::NetworkMismatch {
			requested,
			selected,
			context: ErrorContext::new_with_log(msg, None, None),
		}
	}
}

impl TraceableError for ConnectionError {
	fn trace_id(&self) -> String {
		match self {
			Self::PeerUnreachable(ctx) => ctx.trace_id.clone(),
			Self::Exhausted(ctx) => ctx.trace_id.clone(),
			Self::Transport(ctx) => ctx.trace_id.clone(),
			Self::NetworkMismatch { context, .. } => context.trace_id.clone(),
		}
	}
}
