//! Sets up logging by reading configuration from environment variables.
//!
//! Environment variables used:
//! - LOG_LEVEL: log level ("trace", "debug", "info", "warn", "error"); default is "info"
//! - RUST_LOG: takes precedence over LOG_LEVEL when set, full EnvFilter syntax

pub mod error;

use std::env;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Computes the filter from the environment.
///
/// `RUST_LOG` wins when present; otherwise `LOG_LEVEL` is applied to this
/// crate only, so an embedding application's own logging stays untouched.
fn compute_filter() -> EnvFilter {
	if env::var("RUST_LOG").is_ok() {
		EnvFilter::from_default_env()
	} else {
		let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
		EnvFilter::new(format!("electrum_pool={}", level))
	}
}

/// Initializes the tracing subscriber for stdout logging.
///
/// Intended for binaries and examples embedding this crate; libraries
/// should leave subscriber installation to the host application. Calling
/// this twice is an error, so it is a no-op when a global subscriber is
/// already set.
pub fn setup_logging() {
	let result = tracing_subscriber::registry()
		.with(compute_filter())
		.with(fmt::layer().with_target(true))
		.try_init();

	if result.is_err() {
		tracing::debug!("global tracing subscriber already installed");
	}
}
