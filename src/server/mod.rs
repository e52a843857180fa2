//! Server lifecycle: bootstrap orchestration, listener state machine,
//! and the caller-facing handle.
//!
//! [`serve`] wires everything together and returns a [`Server`], which
//! is both the handle to the running listener and the subscription
//! point for the unified event stream.

pub mod bootstrap;
pub mod listener;

pub use bootstrap::{serve, serve_with};
pub use listener::{Listener, ListenerState};

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use tokio::sync::{Notify, broadcast, watch};

use crate::domain::{EventBus, ServerEvent};

/// Handle to a running listener, doubling as the event bus the caller
/// observes.
///
/// Cloneable; every clone addresses the same listener. Returned already
/// started: observers attached before the socket binds see the
/// synthesized `complete` event, later observers do not.
#[derive(Debug, Clone)]
pub struct Server {
    bus: EventBus,
    state: watch::Receiver<ListenerState>,
    local_addr: Arc<OnceLock<SocketAddr>>,
    shutdown: Arc<Notify>,
    port: u16,
}

impl Server {
    pub(crate) fn new(
        bus: EventBus,
        state: watch::Receiver<ListenerState>,
        local_addr: Arc<OnceLock<SocketAddr>>,
        shutdown: Arc<Notify>,
        port: u16,
    ) -> Self {
        Self {
            bus,
            state,
            local_addr,
            shutdown,
            port,
        }
    }

    /// Creates a new receiver for all future server events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.bus.subscribe()
    }

    /// Returns a reference to the underlying [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns the current lifecycle state of the listener.
    #[must_use]
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Returns the bound socket address, once the listener reached
    /// [`ListenerState::Listening`].
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Returns the configured port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Asks the transport to stop accepting connections and drain.
    ///
    /// Idempotent; completion is observable via [`Server::stopped`] or
    /// the state channel.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Waits until the listener reaches a terminal state
    /// ([`ListenerState::Closed`] or [`ListenerState::Faulted`]).
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        let _ = state
            .wait_for(|s| matches!(s, ListenerState::Closed | ListenerState::Faulted))
            .await;
    }
}
