//! Broadcast channel for server events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The listener
//! publishes lifecycle events through the bus, forwarded pipeline events
//! are re-published on it, and every caller-attached observer subscribes
//! to receive the merged stream.

use tokio::sync::broadcast;

use super::ServerEvent;

/// Broadcast bus for [`ServerEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest events are dropped for
/// lagging receivers. Subscribers only observe events published after
/// they subscribed, so the synthesized `complete` event is seen only by
/// observers attached before the socket binds.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: ServerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
