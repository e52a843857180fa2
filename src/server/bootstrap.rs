//! Bootstrap orchestration.
//!
//! [`serve`] resolves the options, builds the pipeline, wires event
//! forwarding, starts the listener, and returns the handle — in that
//! order, so no pipeline event emitted after construction is lost and
//! the `complete` event is observable by anyone who subscribes before
//! the socket binds. The call itself never fails: every fault is
//! reported asynchronously as an `error` event.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::Server;
use super::listener::Listener;
use crate::config::{ServeOptions, ServerConfig};
use crate::domain::{EventBus, ServerEvent};
use crate::pipeline::{Pipeline, PipelineEvent, StaticPipeline};

/// Serves the stock static-file pipeline.
///
/// Equivalent to [`serve_with`] using [`StaticPipeline::factory`].
///
/// # Panics
///
/// Must be called from within a Tokio runtime.
pub fn serve(options: ServeOptions) -> Server {
    serve_with(options, StaticPipeline::factory)
}

/// Bootstraps a listener around a caller-supplied pipeline factory.
///
/// The factory receives the resolved configuration, pipeline-specific
/// options included. The returned [`Server`] is already started; attach
/// observers via [`Server::subscribe`].
///
/// # Panics
///
/// Must be called from within a Tokio runtime.
pub fn serve_with<F>(options: ServeOptions, factory: F) -> Server
where
    F: FnOnce(&ServerConfig) -> Arc<dyn Pipeline>,
{
    let config = options.resolve();
    let bus = EventBus::new(config.event_capacity);

    // The bus always has at least this subscriber, so faults are
    // absorbed even when the caller never attaches one.
    spawn_fault_drain(&bus);

    let pipeline = factory(&config);
    spawn_forwarding(pipeline.subscribe(), bus.clone());

    Listener::new(&config, pipeline, bus).start()
}

/// Default no-op subscriber, registered before the listener starts.
fn spawn_fault_drain(bus: &EventBus) {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ServerEvent::Error { error, .. }) => {
                    tracing::debug!(%error, "absorbed server fault");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "default subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Re-publishes pipeline events on the bus, payloads untouched.
fn spawn_forwarding(mut source: broadcast::Receiver<PipelineEvent>, bus: EventBus) {
    tokio::spawn(async move {
        loop {
            match source.recv().await {
                Ok(event) => {
                    bus.publish(ServerEvent::from(event));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "forwarding lagged behind pipeline");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
