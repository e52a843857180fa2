//! Domain layer: server events and the event bus.
//!
//! This module contains the event alphabet the caller observes, the
//! `complete` payload composed at bind time, and the broadcast bus that
//! merges listener lifecycle events with forwarded pipeline events.

pub mod event;
pub mod event_bus;

pub use event::{ReadyInfo, ServerEvent};
pub use event_bus::EventBus;
