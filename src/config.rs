//! Server options and configuration resolution.
//!
//! [`ServeOptions`] is the caller-facing options mapping: a `port`, an
//! event channel capacity, and an open set of pipeline-specific options
//! passed through unmodified. [`ServeOptions::resolve`] produces the
//! immutable [`ServerConfig`] the bootstrap hands to its collaborators.
//! The binary loads options 12-factor style from environment variables
//! (or a `.env` file via `dotenvy`).

use serde::Deserialize;
use serde_json::Value;

/// Port the listener binds when the options leave it unset (or zero).
pub const DEFAULT_PORT: u16 = 3000;

/// Default capacity of the event bus broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Caller-supplied server options.
///
/// All fields are optional; [`ServeOptions::resolve`] fills in defaults.
/// Unrecognized concerns belong in [`ServeOptions::pipeline`], which is
/// handed to the pipeline factory untouched — no validation happens here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServeOptions {
    /// Server port. `None` or `Some(0)` resolves to [`DEFAULT_PORT`].
    pub port: Option<u16>,

    /// Event bus channel capacity. `None` resolves to
    /// [`DEFAULT_EVENT_CAPACITY`].
    pub event_capacity: Option<usize>,

    /// Pipeline-specific options, passed through unmodified.
    pub pipeline: serde_json::Map<String, Value>,
}

impl ServeOptions {
    /// Creates an empty options mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the event bus channel capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Adds a pipeline-specific option.
    #[must_use]
    pub fn pipeline_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.pipeline.insert(key.into(), value);
        self
    }

    /// Loads options from environment variables.
    ///
    /// Recognized variables: `PORT`, `EVENT_CAPACITY`, and `WWW_ROOT`
    /// (stored as the `root` pipeline option). Falls back to unset on
    /// missing or unparsable values. Calls `dotenvy::dotenv().ok()` to
    /// optionally load a `.env` file.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut options = Self {
            port: parse_env("PORT"),
            event_capacity: parse_env("EVENT_CAPACITY"),
            pipeline: serde_json::Map::new(),
        };

        if let Ok(root) = std::env::var("WWW_ROOT") {
            options.pipeline.insert("root".to_string(), Value::String(root));
        }

        options
    }

    /// Resolves the options into an immutable [`ServerConfig`].
    ///
    /// `port` defaults to [`DEFAULT_PORT`] when unset or zero; pipeline
    /// options pass through unchanged.
    #[must_use]
    pub fn resolve(self) -> ServerConfig {
        ServerConfig {
            port: self.port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT),
            event_capacity: self.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY),
            pipeline: self.pipeline,
        }
    }
}

/// Resolved server configuration.
///
/// Immutable once produced by [`ServeOptions::resolve`]. Owned by the
/// bootstrap during setup; collaborators copy what they need.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the listener binds.
    pub port: u16,

    /// Capacity of the event bus broadcast channel.
    pub event_capacity: usize,

    pipeline: serde_json::Map<String, Value>,
}

impl ServerConfig {
    /// Looks up a single pipeline-specific option.
    #[must_use]
    pub fn pipeline_option(&self, key: &str) -> Option<&Value> {
        self.pipeline.get(key)
    }

    /// Returns the full pipeline options map.
    #[must_use]
    pub fn pipeline_options(&self) -> &serde_json::Map<String, Value> {
        &self.pipeline
    }
}

/// Parses an environment variable as `T`, returning `None` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
