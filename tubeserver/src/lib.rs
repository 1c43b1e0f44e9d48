//! HTTP server layer for tubegrab
//!
//! Provides the explicit [`Server`] object (route registration, startup,
//! graceful shutdown), environment-driven [`config`], and logging
//! initialization. The server knows nothing about extraction; API routers are
//! mounted onto it by the application.

pub mod config;
pub mod server;

pub use config::{Config, get_config};
pub use server::{Server, ServerBuilder, ServerInfo};

use tracing_subscriber::EnvFilter;

/// Initialize tracing with an env-filtered fmt subscriber.
///
/// `RUST_LOG` controls filtering; defaults to `info` when unset. Call once
/// from the binary before anything logs.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
