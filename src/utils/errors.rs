// src/utils/errors.rs
//! Error types
//!
//! The interception path has exactly one error channel: [`HostError`], the
//! exception an un-instrumented host operation would have raised. Anything
//! the layer itself can fail on (serialization, hooks, sinks) surfaces through
//! that same channel so failures look like the native ones.

use crate::host::Value;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = HostError> = std::result::Result<T, E>;

/// Exception raised by a host operation
#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// `TypeError` with the host's message
    #[error("TypeError: {0}")]
    TypeError(String),

    /// `RangeError` with the host's message
    #[error("RangeError: {0}")]
    RangeError(String),

    /// Arbitrary value thrown by host or hook code
    #[error("Uncaught {0}")]
    Thrown(Value),
}

impl HostError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::RangeError(message.into())
    }
}

/// Structural serialization failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// The value graph contains a cycle
    #[error("Converting circular structure to JSON")]
    CircularStructure,

    /// BigInt values have no JSON form
    #[error("Do not know how to serialize a BigInt")]
    BigInt,
}

impl From<SerializeError> for HostError {
    fn from(err: SerializeError) -> Self {
        // Both failures are TypeErrors on the host.
        HostError::TypeError(err.to_string())
    }
}

/// Options loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load options: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid option `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_error_maps_to_type_error() {
        let err: HostError = SerializeError::CircularStructure.into();
        assert!(matches!(err, HostError::TypeError(_)));
        assert_eq!(
            err.to_string(),
            "TypeError: Converting circular structure to JSON"
        );
    }

    #[test]
    fn test_thrown_display() {
        let err = HostError::Thrown(Value::from("boom"));
        assert_eq!(err.to_string(), "Uncaught boom");
    }
}
