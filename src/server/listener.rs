//! Listener state machine and request dispatch.
//!
//! The listener binds a TCP socket, composes the `complete` payload once
//! the socket is up, and drives the accept loop. Transport faults never
//! escape as panics or process exits; they are published as `error`
//! events and reflected in the [`ListenerState`] channel.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::extract::{Request, State};
use axum::response::Response;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{Notify, watch};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::Server;
use crate::address;
use crate::config::ServerConfig;
use crate::domain::{EventBus, ReadyInfo, ServerEvent};
use crate::error::ServeError;
use crate::pipeline::Pipeline;

/// Lifecycle states of a listener.
///
/// Transitions: `Created → Starting → Listening → (Closed | Faulted)`,
/// with `Faulted` reachable from any state on a transport fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Constructed, not yet asked to bind.
    Created,
    /// Bind requested, socket not confirmed yet.
    Starting,
    /// Socket bound; accepting connections.
    Listening,
    /// Gracefully stopped.
    Closed,
    /// Terminated by a transport fault.
    Faulted,
}

/// Binds the request pipeline to a TCP socket.
///
/// Owns the pipeline handle for its lifetime and is the sole dispatcher
/// of incoming connections to it. Constructed by the bootstrap; started
/// exactly once.
#[derive(Debug)]
pub struct Listener {
    port: u16,
    pipeline: Arc<dyn Pipeline>,
    bus: EventBus,
}

impl Listener {
    /// Creates a listener for the resolved configuration.
    #[must_use]
    pub fn new(config: &ServerConfig, pipeline: Arc<dyn Pipeline>, bus: EventBus) -> Self {
        Self {
            port: config.port,
            pipeline,
            bus,
        }
    }

    /// Starts the listener, returning the caller-facing handle.
    ///
    /// Control returns immediately; binding, event emission, and the
    /// accept loop run on a spawned task.
    #[must_use]
    pub fn start(self) -> Server {
        let (state_tx, state_rx) = watch::channel(ListenerState::Created);
        let local_addr = Arc::new(OnceLock::new());
        let shutdown = Arc::new(Notify::new());

        let server = Server::new(
            self.bus.clone(),
            state_rx,
            Arc::clone(&local_addr),
            Arc::clone(&shutdown),
            self.port,
        );

        tokio::spawn(run(self, server.clone(), state_tx, local_addr, shutdown));
        server
    }
}

/// Drives one listener from bind to a terminal state.
async fn run(
    listener: Listener,
    server: Server,
    state_tx: watch::Sender<ListenerState>,
    local_addr: Arc<OnceLock<SocketAddr>>,
    shutdown: Arc<Notify>,
) {
    let Listener {
        port,
        pipeline,
        bus,
    } = listener;

    let _ = state_tx.send(ListenerState::Starting);

    let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let tcp = match TcpListener::bind(bind_addr).await {
        Ok(tcp) => tcp,
        Err(error) => {
            fault(&bus, &state_tx, ServeError::bind(bind_addr, error));
            return;
        }
    };
    let bound = match tcp.local_addr() {
        Ok(addr) => addr,
        Err(error) => {
            fault(&bus, &state_tx, ServeError::transport(error));
            return;
        }
    };

    let _ = local_addr.set(bound);
    let _ = state_tx.send(ListenerState::Listening);

    // Compose the ready payload exactly once, then log before complete.
    let address = address::local_ip();
    tracing::info!(%address, port = bound.port(), "listening");
    bus.publish(ServerEvent::log(vec![
        json!("listening on"),
        json!(format!("{address}:{}", bound.port())),
    ]));
    bus.publish(ServerEvent::Complete(ReadyInfo {
        address,
        port: bound.port(),
        server,
    }));

    let app = router(pipeline, bus.clone());
    let result = axum::serve(tcp, app)
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await;

    match result {
        Ok(()) => {
            let _ = state_tx.send(ListenerState::Closed);
            tracing::info!("listener closed");
        }
        Err(error) => fault(&bus, &state_tx, ServeError::transport(error)),
    }
}

fn fault(bus: &EventBus, state_tx: &watch::Sender<ListenerState>, error: ServeError) {
    tracing::error!(%error, "transport fault");
    bus.publish(ServerEvent::error(error.into_shared()));
    let _ = state_tx.send(ListenerState::Faulted);
}

#[derive(Clone)]
struct DispatchState {
    pipeline: Arc<dyn Pipeline>,
    bus: EventBus,
}

fn router(pipeline: Arc<dyn Pipeline>, bus: EventBus) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(DispatchState { pipeline, bus })
}

/// Hands one request to the pipeline, then reports `[status, path]` on
/// the bus. The hook runs after dispatch completes, so the status is
/// the one actually sent.
async fn dispatch(State(state): State<DispatchState>, request: Request) -> Response {
    let path = request.uri().to_string();
    let response = state.pipeline.handle(request).await;
    state.bus.publish(ServerEvent::log(vec![
        json!(response.status().as_u16()),
        json!(path),
    ]));
    response
}
