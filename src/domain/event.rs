//! Server events and the pipeline forwarding table.
//!
//! [`ServerEvent`] is the alphabet of the bus the caller observes:
//! `complete` fires exactly once when the socket binds, `log` carries a
//! variadic argument list, and `error` carries a shared native error
//! value. Pipeline events map onto server events through the `From`
//! impl at the bottom of this module, which preserves payloads verbatim.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::SharedError;
use crate::pipeline::PipelineEvent;
use crate::server::Server;

/// Payload of the `complete` event.
///
/// Composed synchronously at most once per listener, immediately after
/// the socket binds. Shared read-only with every subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct ReadyInfo {
    /// Resolved local network address.
    pub address: String,
    /// Port the socket is bound to.
    pub port: u16,
    /// Handle to the running server.
    #[serde(skip)]
    pub server: Server,
}

/// Event published on the server bus.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// The socket bound successfully; fires exactly once.
    Complete(ReadyInfo),

    /// Informational entry with a variadic argument list, e.g.
    /// `[status, path]` per dispatched request or free-form strings
    /// for bootstrap messages.
    Log {
        /// Ordered argument list, preserved exactly as emitted.
        args: Vec<Value>,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },

    /// A transport or pipeline fault.
    Error {
        /// Native error value, shared across subscribers.
        error: SharedError,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },
}

impl ServerEvent {
    /// Builds a `log` event stamped with the current time.
    #[must_use]
    pub fn log(args: Vec<Value>) -> Self {
        Self::Log {
            args,
            timestamp: Utc::now(),
        }
    }

    /// Builds an `error` event stamped with the current time.
    #[must_use]
    pub fn error(error: SharedError) -> Self {
        Self::Error {
            error,
            timestamp: Utc::now(),
        }
    }

    /// Returns the event name as a static string slice.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Complete(_) => "complete",
            Self::Log { .. } => "log",
            Self::Error { .. } => "error",
        }
    }
}

/// Forwarding table from pipeline events to server events.
///
/// One-directional: each pipeline event name maps to the server event
/// of the same name, with the payload (argument list or error value,
/// plus the original timestamp) passed through untouched.
impl From<PipelineEvent> for ServerEvent {
    fn from(event: PipelineEvent) -> Self {
        match event {
            PipelineEvent::Log { args, timestamp } => Self::Log { args, timestamp },
            PipelineEvent::Error { error, timestamp } => Self::Error { error, timestamp },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn kind_matches_event_names() {
        let log = ServerEvent::log(vec![json!("hello")]);
        assert_eq!(log.kind(), "log");

        let error = ServerEvent::error(Arc::new(std::io::Error::other("x")));
        assert_eq!(error.kind(), "error");
    }

    #[test]
    fn forwarded_log_preserves_argument_list() {
        let source = PipelineEvent::log(vec![json!(200), json!("/index.html"), json!(null)]);
        let PipelineEvent::Log { args: expected, .. } = source.clone() else {
            panic!("expected log event");
        };

        let forwarded = ServerEvent::from(source);
        let ServerEvent::Log { args, .. } = forwarded else {
            panic!("expected log event");
        };
        assert_eq!(args, expected);
    }

    #[test]
    fn forwarded_error_is_the_same_value() {
        let payload: SharedError = Arc::new(std::io::Error::other("pipeline fault"));
        let source = PipelineEvent::error(Arc::clone(&payload));

        let forwarded = ServerEvent::from(source);
        let ServerEvent::Error { error, .. } = forwarded else {
            panic!("expected error event");
        };
        assert!(Arc::ptr_eq(&error, &payload));
    }
}
