// src/observability/mod.rs
//! Tracing setup
//!
//! Events routed to a named log level are emitted through `tracing` under the
//! `envtrace` target. Nothing is printed until a subscriber is installed;
//! [`init_tracing`] installs the default one.
//!
//! Counters (`envtrace_events_total`, `envtrace_bypass_total`) go through the
//! `metrics` facade and are discarded unless the host application installs a
//! recorder.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install the global fmt subscriber, plain or JSON, writing to stderr
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
