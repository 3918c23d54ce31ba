//! The uniform query facade.

mod client;

pub use client::{CallOptions, ElectrumApi};
