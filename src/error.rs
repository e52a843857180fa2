//! Server fault types.
//!
//! [`ServeError`] covers the transport-level faults the core itself can
//! produce. Faults are never returned synchronously from the bootstrap
//! call; they travel as `error` events on the bus, so every variant is
//! `Clone` with `Arc`-wrapped sources.

use std::net::SocketAddr;
use std::sync::Arc;

/// Shared, cloneable error payload carried by `error` events.
///
/// Pipeline faults are forwarded verbatim: the bus re-emits the same
/// `Arc`, so every subscriber observes the identical error value.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Transport-level faults raised by the listener.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServeError {
    /// The TCP socket could not be bound to the requested address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the listener attempted to bind.
        addr: SocketAddr,
        /// Underlying I/O failure.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The accept/serve loop terminated with an I/O failure.
    #[error("transport error: {source}")]
    Transport {
        /// Underlying I/O failure.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl ServeError {
    /// Wraps a bind failure.
    #[must_use]
    pub fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind {
            addr,
            source: Arc::new(source),
        }
    }

    /// Wraps a fault from the running transport.
    #[must_use]
    pub fn transport(source: std::io::Error) -> Self {
        Self::Transport {
            source: Arc::new(source),
        }
    }

    /// Converts the fault into the shared payload published on the bus.
    #[must_use]
    pub fn into_shared(self) -> SharedError {
        Arc::new(self)
    }
}
