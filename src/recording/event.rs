// src/recording/event.rs
//! Intercepted-operation events
//!
//! An [`Event`] is created and consumed inside one trap handler. Its
//! `Display` form is the single-line wire format downstream parsers key on:
//!
//! ```text
//! caller => [env.navigator.userAgent] get property => [userAgent], value => ["Mozilla/5.0"]
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    ReadProperty,
    WriteProperty,
    HasProperty,
    DeleteProperty,
    DefineProperty,
    GetPrototype,
    SetPrototype,
    PreventExtensions,
    IsExtensible,
    Invoke,
    Construct,
}

impl Operation {
    /// Machine name (kebab-case)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadProperty => "read-property",
            Self::WriteProperty => "write-property",
            Self::HasProperty => "has-property",
            Self::DeleteProperty => "delete-property",
            Self::DefineProperty => "define-property",
            Self::GetPrototype => "get-prototype",
            Self::SetPrototype => "set-prototype",
            Self::PreventExtensions => "prevent-extensions",
            Self::IsExtensible => "is-extensible",
            Self::Invoke => "invoke",
            Self::Construct => "construct",
        }
    }

    /// Phrase used in the log line
    pub fn label(self) -> &'static str {
        match self {
            Self::ReadProperty => "get property",
            Self::WriteProperty => "set property",
            Self::HasProperty => "has property",
            Self::DeleteProperty => "delete property",
            Self::DefineProperty => "define property",
            Self::GetPrototype => "get prototype",
            Self::SetPrototype => "set prototype",
            Self::PreventExtensions => "prevent extensions",
            Self::IsExtensible => "is extensible",
            Self::Invoke => "call function",
            Self::Construct => "construct",
        }
    }

    /// Label of the third field
    pub fn outcome_label(self) -> &'static str {
        match self {
            Self::ReadProperty | Self::WriteProperty => "value",
            _ => "result",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One intercepted operation
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Unique event ID
    pub id: Ulid,

    /// Wall-clock time the event was emitted
    pub timestamp: DateTime<Utc>,

    /// Access path of the actor
    pub actor: String,

    /// Operation kind
    pub operation: Operation,

    /// Property key or function name, when the operation has one
    pub subject: Option<String>,

    /// Serialized detail (key, arguments, descriptor)
    pub detail: String,

    /// Serialized result or value
    pub result: String,
}

impl Event {
    pub fn new(
        actor: impl Into<String>,
        operation: Operation,
        subject: Option<String>,
        detail: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            id: Ulid::new(),
            timestamp: Utc::now(),
            actor: actor.into(),
            operation,
            subject,
            detail: detail.into(),
            result: result.into(),
        }
    }

    /// Structured single-line form
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "caller => [{}] {} => [{}], {} => [{}]",
            self.actor,
            self.operation.label(),
            self.detail,
            self.operation.outcome_label(),
            self.result
        )
    }
}
