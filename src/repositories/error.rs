//! Error types for repository operations

use std::collections::HashMap;

use thiserror::Error;

use crate::utils::logging::error::{ErrorContext, TraceableError};

#[derive(Debug, Error)]
pub enum RepositoryError {
	/// A dataset could not be read or parsed
	#[error("Load error: {0}")]
	LoadError(ErrorContext),

	/// A dataset was readable but structurally unusable
	#[error("Validation error: {0}")]
	ValidationError(ErrorContext),
}

impl RepositoryError {
	pub fn load_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::LoadError(ErrorContext::new_with_log(msg, source, metadata))
	}

	pub fn validation_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ValidationError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for RepositoryError {
	fn trace_id(&self) -> String {
		match self {
			Self::LoadError(ctx) => ctx.trace_id.clone(),
			Self::ValidationError(ctx) => ctx.trace_id.clone(),
		}
	}
}
