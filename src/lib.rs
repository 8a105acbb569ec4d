// src/lib.rs
//! Sentra Lab Environment Tracer
//!
//! Transparent interception for a live scripting environment: wrap a root
//! object (or a single function) and every structural operation performed
//! against it, transitively, is recorded as a single-line event while the
//! wrapped values behave exactly like the originals.
//!
//! # Architecture
//!
//! - **host**: the value model instrumented environments are built from
//! - **interception**: object and function wrappers, hooks, the `instrument` facade
//! - **recording**: events, leak-free serialization, sink routing
//! - **observability**: tracing subscriber setup
//! - **utils**: options and errors
//!
//! # Example
//!
//! ```
//! use sentra_lab_envtrace::{instrument, HostObject, InstrumentOptions, Value};
//! use sentra_lab_envtrace::host::{ObjectTarget, PropertyKey};
//!
//! let navigator = HostObject::with_class("Navigator")
//!     .with_property("language", "en-US")
//!     .into_value();
//! let env = HostObject::new().with_property("navigator", navigator).into_value();
//!
//! let env = instrument(env, InstrumentOptions::new("env")).unwrap();
//! let navigator = env.as_object().unwrap().get(&PropertyKey::from("navigator"), &env).unwrap();
//! let language = navigator
//!     .as_object()
//!     .unwrap()
//!     .get(&PropertyKey::from("language"), &navigator)
//!     .unwrap();
//! assert_eq!(language, Value::from("en-US"));
//! ```

// Public module exports
pub mod host;
pub mod interception;
pub mod observability;
pub mod recording;
pub mod utils;

// Re-export commonly used types
pub use host::{HostObject, NativeFunction, PropertyKey, Value};
pub use interception::{instrument, HookSet, InterceptHooks};
pub use recording::{Event, Operation};
pub use utils::config::{InstrumentOptions, LogLevel, Mode, SerializationPolicy};
pub use utils::errors::{HostError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
