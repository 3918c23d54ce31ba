//! Error types for configuration handling

use std::collections::HashMap;

use thiserror::Error;

use crate::utils::logging::error::{ErrorContext, TraceableError};

#[derive(Debug, Error)]
pub enum ConfigError {
	/// Configuration failed validation
	#[error("Invalid configuration: {0}")]
	ValidationError(ErrorContext),
}

impl ConfigError {
	pub fn validation_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ValidationError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for ConfigError {
	fn trace_id(&self) -> String {
		match self {
			Self::ValidationError(ctx) => ctx.trace_id.clone(),
		}
	}
}
