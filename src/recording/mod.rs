// src/recording/mod.rs
//! Event recording
//!
//! - **Event**: one intercepted operation and its single-line form
//! - **Serializer**: renders logged values without masking failures
//! - **Logger**: routes events to the configured sink
//!
//! # Flow
//!
//! ```text
//! trap handler → Event::new() → EventLogger::emit() → tracing target `envtrace`
//!                                                   ↘ caller-supplied sink
//! ```

pub mod event;
pub mod logger;
pub mod serializer;

pub use event::{Event, Operation};
pub use logger::EventLogger;
pub use serializer::{serialize, serialize_args, serialize_descriptor};
