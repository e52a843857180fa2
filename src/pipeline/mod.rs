//! Pipeline collaborator boundary.
//!
//! A [`Pipeline`] is the request-handling unit the listener dispatches
//! connections to. It is also an event source: implementations may emit
//! `log` and `error` events at any time between construction and
//! disposal, and the bootstrap forwards them verbatim onto the server
//! bus. Implementations hold a [`PipelineEvents`] emitter and hand out
//! receivers through [`Pipeline::subscribe`].
//!
//! The pipeline must not emit before the bootstrap has finished wiring;
//! events published before the forwarding subscription exists are lost.

pub mod static_files;

pub use static_files::StaticPipeline;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::SharedError;

/// Event emitted by a pipeline on its own channel.
///
/// The bootstrap maps each variant onto the server event of the same
/// name with the payload passed through untouched.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Informational entry with a variadic argument list.
    Log {
        /// Ordered argument list, delivered to the bus unchanged.
        args: Vec<Value>,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },

    /// A fault inside the pipeline. No retry or recovery is attempted;
    /// the value is re-observable on the server bus.
    Error {
        /// Native error value.
        error: SharedError,
        /// Emission time.
        timestamp: DateTime<Utc>,
    },
}

impl PipelineEvent {
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
}

/// Request handler bound to the listener, doubling as an event source.
///
/// The listener is the sole consumer of the dispatch capability; the
/// bootstrap wiring is the sole subscriber of the event channel.
/// Handling is infallible at this boundary: faults are reported through
/// the event channel, not the return value.
#[async_trait]
pub trait Pipeline: Send + Sync + std::fmt::Debug + 'static {
    /// Handles one request, producing the response to send back.
    async fn handle(&self, request: Request) -> Response;

    /// Returns a receiver for the pipeline's own `log`/`error` events.
    fn subscribe(&self) -> broadcast::Receiver<PipelineEvent>;
}

/// Emitter held by pipeline implementations.
///
/// Thin wrapper over a broadcast sender so implementations share one
/// way of publishing events.
#[derive(Debug, Clone)]
pub struct PipelineEvents {
    sender: broadcast::Sender<PipelineEvent>,
}

impl PipelineEvents {
    /// Creates an emitter with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new receiver for the pipeline's events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    /// Emits a `log` event, returning the number of receivers reached.
    pub fn emit_log(&self, args: Vec<Value>) -> usize {
        self.sender.send(PipelineEvent::log(args)).unwrap_or(0)
    }

    /// Emits an `error` event, returning the number of receivers reached.
    pub fn emit_error(&self, error: SharedError) -> usize {
        self.sender.send(PipelineEvent::error(error)).unwrap_or(0)
    }
}
