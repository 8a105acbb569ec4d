// src/utils/config.rs
//! Instrumentation options
//!
//! [`InstrumentOptions`] is what callers build (or load from a file); it is
//! resolved once per `instrument` call into an immutable [`Config`] shared by
//! every wrapper in that tree.

use crate::host::{PropertyKey, Value};
use crate::interception::hooks::InterceptHooks;
use crate::recording::event::Event;
use crate::recording::logger::EventLogger;
use crate::recording::serializer;
use crate::utils::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, warn};

/// Root label used when the caller does not pick one
pub const DEFAULT_CONTEXT_NAME: &str = "target";

/// Prefix for option environment variables (`ENVTRACE_CONTEXT_NAME`, ...)
pub const ENV_PREFIX: &str = "ENVTRACE";

/// How a callable root target is wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Wrap as an object (universal fallback)
    #[default]
    Object,

    /// Wrap a callable root as a function, intercepting invocation
    #[serde(alias = "function-only")]
    Method,
}

/// What happens when a logged value cannot be serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SerializationPolicy {
    /// The failure aborts the operation, exactly like the native failure
    #[default]
    Propagate,

    /// The line carries `<unserializable: ...>` and the operation proceeds
    Annotate,
}

/// Line sink: receives the formatted single-line event
pub type LineSink = Rc<dyn Fn(&str) -> Result<()>>;

/// Structured sink: receives the event record
pub type EventSink = Rc<dyn Fn(&Event) -> Result<()>>;

/// Sink selection
#[derive(Clone)]
pub enum LogLevel {
    /// Named severity routed through `tracing` (`trace`, `debug`, `info`,
    /// `log`, `warn`, `error`); unknown names fall back to `log`
    Named(String),

    /// Caller-supplied line sink
    Lines(LineSink),

    /// Caller-supplied structured sink
    Events(EventSink),
}

impl LogLevel {
    pub fn lines<F>(sink: F) -> Self
    where
        F: Fn(&str) -> Result<()> + 'static,
    {
        Self::Lines(Rc::new(sink))
    }

    pub fn events<F>(sink: F) -> Self
    where
        F: Fn(&Event) -> Result<()> + 'static,
    {
        Self::Events(Rc::new(sink))
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Named("log".to_string())
    }
}

impl From<&str> for LogLevel {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl fmt::Debug for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Lines(_) => f.write_str("Lines(<sink>)"),
            Self::Events(_) => f.write_str("Events(<sink>)"),
        }
    }
}

/// Caller-facing options, merged over defaults
#[derive(Clone)]
pub struct InstrumentOptions {
    /// Root path label
    pub context_name: String,

    /// Whether a callable root is wrapped as a function
    pub mode: Mode,

    /// Sink selection
    pub log_level: LogLevel,

    /// When set, only these keys are instrumented
    pub watched_properties: Option<BTreeSet<PropertyKey>>,

    /// Invoke wrapped functions with the raw function as receiver
    pub bind_receiver_to_target: bool,

    /// Before/after hooks
    pub hooks: Option<Rc<dyn InterceptHooks>>,

    /// Root members whose subtree is never instrumented
    pub exempt_subtrees: Vec<String>,

    /// Function names whose invoke detail is only the first argument
    pub condensed_calls: BTreeSet<String>,

    /// Serialization failure handling for logged values
    pub serialization_failure: SerializationPolicy,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            context_name: DEFAULT_CONTEXT_NAME.to_string(),
            mode: Mode::Object,
            log_level: LogLevel::default(),
            watched_properties: None,
            bind_receiver_to_target: false,
            hooks: None,
            exempt_subtrees: vec!["console".to_string()],
            condensed_calls: BTreeSet::from(["addEventListener".to_string()]),
            serialization_failure: SerializationPolicy::Propagate,
        }
    }
}

impl fmt::Debug for InstrumentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentOptions")
            .field("context_name", &self.context_name)
            .field("mode", &self.mode)
            .field("log_level", &self.log_level)
            .field("watched_properties", &self.watched_properties)
            .field("bind_receiver_to_target", &self.bind_receiver_to_target)
            .field("hooks", &self.hooks.is_some())
            .field("exempt_subtrees", &self.exempt_subtrees)
            .field("condensed_calls", &self.condensed_calls)
            .field("serialization_failure", &self.serialization_failure)
            .finish()
    }
}

impl InstrumentOptions {
    pub fn new(context_name: impl Into<String>) -> Self {
        Self {
            context_name: context_name.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_log_level(mut self, log_level: impl Into<LogLevel>) -> Self {
        self.log_level = log_level.into();
        self
    }

    /// Restrict instrumentation to `keys`
    pub fn watch<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PropertyKey>,
    {
        self.watched_properties = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn bind_receiver_to_target(mut self, bind: bool) -> Self {
        self.bind_receiver_to_target = bind;
        self
    }

    pub fn with_hooks(mut self, hooks: impl InterceptHooks + 'static) -> Self {
        self.hooks = Some(Rc::new(hooks));
        self
    }

    /// Add a root member to the exempt set
    pub fn exempt(mut self, member: impl Into<String>) -> Self {
        self.exempt_subtrees.push(member.into());
        self
    }

    /// Add a function name to the condensed-call set
    pub fn condense(mut self, name: impl Into<String>) -> Self {
        self.condensed_calls.insert(name.into());
        self
    }

    pub fn with_serialization_policy(mut self, policy: SerializationPolicy) -> Self {
        self.serialization_failure = policy;
        self
    }

    /// Load the serializable options from `path` (TOML, YAML or JSON, by
    /// extension) and `ENVTRACE_*` environment variables, over defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("watched_properties")
                    .with_list_parse_key("exempt_subtrees")
                    .with_list_parse_key("condensed_calls"),
            )
            .build()?;
        let file: OptionsFile = settings.try_deserialize()?;
        debug!("Options loaded: {:?}", file);
        file.try_into()
    }
}

/// Serializable subset of [`InstrumentOptions`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct OptionsFile {
    context_name: String,
    mode: Mode,
    log_level: String,
    watched_properties: Option<Vec<String>>,
    bind_receiver_to_target: bool,
    exempt_subtrees: Vec<String>,
    condensed_calls: Vec<String>,
    serialization_failure: SerializationPolicy,
}

impl Default for OptionsFile {
    fn default() -> Self {
        let defaults = InstrumentOptions::default();
        Self {
            context_name: defaults.context_name,
            mode: defaults.mode,
            log_level: "log".to_string(),
            watched_properties: None,
            bind_receiver_to_target: defaults.bind_receiver_to_target,
            exempt_subtrees: defaults.exempt_subtrees,
            condensed_calls: defaults.condensed_calls.into_iter().collect(),
            serialization_failure: defaults.serialization_failure,
        }
    }
}

impl TryFrom<OptionsFile> for InstrumentOptions {
    type Error = ConfigError;

    fn try_from(file: OptionsFile) -> Result<Self, ConfigError> {
        if file.context_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "context_name",
                reason: "must not be empty".to_string(),
            });
        }
        if file.exempt_subtrees.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "exempt_subtrees",
                reason: "entries must not be empty".to_string(),
            });
        }
        Ok(Self {
            context_name: file.context_name,
            mode: file.mode,
            log_level: LogLevel::Named(file.log_level),
            watched_properties: file
                .watched_properties
                .map(|keys| keys.into_iter().map(PropertyKey::from).collect()),
            bind_receiver_to_target: file.bind_receiver_to_target,
            hooks: None,
            exempt_subtrees: file.exempt_subtrees,
            condensed_calls: file.condensed_calls.into_iter().collect(),
            serialization_failure: file.serialization_failure,
        })
    }
}

/// Resolved, immutable configuration of one wrapped tree
pub struct Config {
    pub context_name: String,
    pub mode: Mode,
    pub watched_properties: Option<BTreeSet<PropertyKey>>,
    pub bind_receiver_to_target: bool,
    pub hooks: Option<Rc<dyn InterceptHooks>>,
    pub condensed_calls: BTreeSet<String>,
    pub serialization_failure: SerializationPolicy,
    exempt_paths: Vec<String>,
    logger: EventLogger,
}

impl Config {
    pub fn from_options(options: InstrumentOptions) -> Self {
        let root = options.context_name;
        let exempt_paths = options
            .exempt_subtrees
            .iter()
            .map(|member| {
                if member == &root || member.starts_with(&format!("{root}.")) {
                    member.clone()
                } else {
                    format!("{root}.{member}")
                }
            })
            .collect();
        Self {
            context_name: root,
            mode: options.mode,
            watched_properties: options.watched_properties,
            bind_receiver_to_target: options.bind_receiver_to_target,
            hooks: options.hooks,
            condensed_calls: options.condensed_calls,
            serialization_failure: options.serialization_failure,
            exempt_paths,
            logger: EventLogger::new(options.log_level),
        }
    }

    /// Is `key` covered by the watched set (or is there no watched set)?
    pub fn is_watched(&self, key: &PropertyKey) -> bool {
        self.watched_properties
            .as_ref()
            .map_or(true, |watched| watched.contains(key))
    }

    /// Is `path` inside an exempt subtree?
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|prefix| {
            path == prefix
                || (path.starts_with(prefix.as_str())
                    && path.as_bytes().get(prefix.len()) == Some(&b'.'))
        })
    }

    pub fn exempt_paths(&self) -> &[String] {
        &self.exempt_paths
    }

    pub fn hooks(&self) -> Option<&dyn InterceptHooks> {
        self.hooks.as_deref()
    }

    /// Serialize `value` for a log line under the configured failure policy
    pub fn render(&self, value: &Value) -> Result<String> {
        self.apply_policy(serializer::serialize(value))
    }

    /// Serialize an argument list for a log line
    pub fn render_args(&self, args: &[Value]) -> Result<String> {
        self.apply_policy(serializer::serialize_args(args))
    }

    pub fn apply_policy(&self, rendered: Result<String>) -> Result<String> {
        match (rendered, self.serialization_failure) {
            (Ok(text), _) => Ok(text),
            (Err(err), SerializationPolicy::Propagate) => Err(err),
            (Err(err), SerializationPolicy::Annotate) => {
                warn!("Logged value not serializable: {}", err);
                Ok(format!("<unserializable: {err}>"))
            }
        }
    }

    /// Route an event to the sink
    pub fn emit(&self, event: &Event) -> Result<()> {
        self.logger.emit(event)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("context_name", &self.context_name)
            .field("mode", &self.mode)
            .field("exempt_paths", &self.exempt_paths)
            .finish_non_exhaustive()
    }
}
