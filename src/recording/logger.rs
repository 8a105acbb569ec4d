// src/recording/logger.rs
//! Event logger
//!
//! Formats an [`Event`] and hands it to the configured sink, synchronously.
//! There is no retry and no buffering; a failing custom sink fails the
//! operation that produced the event.

use crate::recording::event::Event;
use crate::utils::config::LogLevel;
use crate::utils::errors::Result;
use tracing::{debug, error, info, trace, warn};

/// Tracing target for emitted events
pub const EVENT_TARGET: &str = "envtrace";

/// Severity selected by a level name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Resolve a level name; `None` for names with no channel
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" | "log" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Routes events to the configured sink
#[derive(Debug, Clone)]
pub struct EventLogger {
    level: LogLevel,
}

impl EventLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Emit one event
    pub fn emit(&self, event: &Event) -> Result<()> {
        metrics::counter!("envtrace_events_total", "operation" => event.operation.as_str())
            .increment(1);

        match &self.level {
            LogLevel::Lines(sink) => sink(&event.to_string()),
            LogLevel::Events(sink) => sink(event),
            LogLevel::Named(name) => {
                // Unknown channels fall back to the default one.
                let severity = Severity::parse(name).unwrap_or(Severity::Info);
                emit_tracing(severity, event);
                Ok(())
            }
        }
    }
}

fn emit_tracing(severity: Severity, event: &Event) {
    let subject = event.subject.as_deref().unwrap_or("");
    match severity {
        Severity::Trace => trace!(
            target: EVENT_TARGET,
            actor = %event.actor,
            operation = %event.operation,
            subject,
            "{}",
            event
        ),
        Severity::Debug => debug!(
            target: EVENT_TARGET,
            actor = %event.actor,
            operation = %event.operation,
            subject,
            "{}",
            event
        ),
        Severity::Info => info!(
            target: EVENT_TARGET,
            actor = %event.actor,
            operation = %event.operation,
            subject,
            "{}",
            event
        ),
        Severity::Warn => warn!(
            target: EVENT_TARGET,
            actor = %event.actor,
            operation = %event.operation,
            subject,
            "{}",
            event
        ),
        Severity::Error => error!(
            target: EVENT_TARGET,
            actor = %event.actor,
            operation = %event.operation,
            subject,
            "{}",
            event
        ),
    }
}
