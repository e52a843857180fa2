//! End-to-end scenarios over real sockets: bootstrap, ready event,
//! request logging, pipeline forwarding, fault absorption, shutdown.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_test::assert_ok;

use devserve::config::{ServeOptions, ServerConfig};
use devserve::domain::{ReadyInfo, ServerEvent};
use devserve::error::SharedError;
use devserve::pipeline::{Pipeline, PipelineEvent, PipelineEvents};
use devserve::server::{self, ListenerState, Server};

const EVENT_WAIT: Duration = Duration::from_secs(10);

/// Minimal pipeline answering every request with a fixed body; the
/// emitter is shared with the test so events can be injected.
#[derive(Debug, Clone)]
struct TestPipeline {
    events: PipelineEvents,
    body: &'static str,
}

#[async_trait]
impl Pipeline for TestPipeline {
    async fn handle(&self, _request: Request) -> Response {
        (StatusCode::OK, self.body).into_response()
    }

    fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.events.subscribe()
    }
}

fn serve_test_pipeline(options: ServeOptions) -> (Server, PipelineEvents) {
    let events = PipelineEvents::new(64);
    let events_for_factory = events.clone();
    let server = server::serve_with(options, move |_config: &ServerConfig| -> Arc<dyn Pipeline> {
        Arc::new(TestPipeline {
            events: events_for_factory,
            body: "ok",
        })
    });
    (server, events)
}

/// Drains events until `complete` arrives, returning its payload.
async fn wait_ready(events: &mut broadcast::Receiver<ServerEvent>) -> ReadyInfo {
    loop {
        let event = match timeout(EVENT_WAIT, events.recv()).await {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => panic!("event channel failed before complete: {e}"),
            Err(_) => panic!("no complete event within {EVENT_WAIT:?}"),
        };
        if let ServerEvent::Complete(info) = event {
            return info;
        }
    }
}

async fn next_event(events: &mut broadcast::Receiver<ServerEvent>) -> ServerEvent {
    match timeout(EVENT_WAIT, events.recv()).await {
        Ok(Ok(event)) => event,
        Ok(Err(e)) => panic!("event channel failed: {e}"),
        Err(_) => panic!("no event within {EVENT_WAIT:?}"),
    }
}

#[tokio::test]
async fn default_options_complete_on_port_3000() {
    let server = server::serve(ServeOptions::new());
    let mut events = server.subscribe();

    let info = wait_ready(&mut events).await;
    assert_eq!(info.port, 3000);
    assert!(!info.address.is_empty());
    assert_eq!(info.address, devserve::address::local_ip());

    assert_eq!(server.state(), ListenerState::Listening);
    assert_eq!(info.server.local_addr().map(|a| a.port()), Some(3000));

    server.shutdown();
    server.stopped().await;
}

#[tokio::test]
async fn listening_log_precedes_complete() {
    let (server, _events) = serve_test_pipeline(ServeOptions::new().port(47310));
    let mut events = server.subscribe();

    let first = next_event(&mut events).await;
    let ServerEvent::Log { args, .. } = first else {
        panic!("expected the bootstrap log before complete, got {}", first.kind());
    };
    assert_eq!(args.first(), Some(&json!("listening on")));
    let Some(endpoint) = args.get(1).and_then(|v| v.as_str()) else {
        panic!("expected an address:port argument");
    };
    assert!(endpoint.ends_with(":47310"));

    let second = next_event(&mut events).await;
    assert_eq!(second.kind(), "complete");

    server.shutdown();
    server.stopped().await;
}

#[tokio::test]
async fn request_dispatch_emits_status_and_path() {
    let dir = assert_ok!(tempfile::tempdir());
    assert_ok!(std::fs::create_dir(dir.path().join("app")));
    assert_ok!(std::fs::write(
        dir.path().join("app/index.html"),
        "<html>app</html>"
    ));

    let options = ServeOptions::new()
        .port(8080)
        .pipeline_option("root", json!(dir.path().to_string_lossy()));
    let server = server::serve(options);
    let mut events = server.subscribe();
    wait_ready(&mut events).await;

    let response =
        assert_ok!(reqwest::get("http://127.0.0.1:8080/app/index.html").await);
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let event = next_event(&mut events).await;
    let ServerEvent::Log { args, .. } = event else {
        panic!("expected a request log event, got {}", event.kind());
    };
    assert_eq!(args.len(), 2);
    assert_eq!(args.first(), Some(&json!(200)));
    assert_eq!(args.get(1), Some(&json!("/app/index.html")));

    server.shutdown();
    server.stopped().await;
}

#[tokio::test]
async fn pipeline_error_is_forwarded_verbatim() {
    let (server, pipeline_events) = serve_test_pipeline(ServeOptions::new().port(47311));
    let mut events = server.subscribe();
    wait_ready(&mut events).await;

    let payload: SharedError = Arc::new(std::io::Error::other("pipeline exploded"));
    pipeline_events.emit_error(Arc::clone(&payload));

    let event = next_event(&mut events).await;
    let ServerEvent::Error { error, .. } = event else {
        panic!("expected an error event, got {}", event.kind());
    };
    assert!(Arc::ptr_eq(&error, &payload));

    // The fault was an event, not a crash: the server still answers.
    assert_eq!(server.state(), ListenerState::Listening);
    let response = assert_ok!(reqwest::get("http://127.0.0.1:47311/alive").await);
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    server.shutdown();
    server.stopped().await;
}

#[tokio::test]
async fn forwarded_events_preserve_relative_order_and_payloads() {
    let (server, pipeline_events) = serve_test_pipeline(ServeOptions::new().port(47312));
    let mut events = server.subscribe();
    wait_ready(&mut events).await;

    let fault: SharedError = Arc::new(std::io::Error::other("late fault"));
    pipeline_events.emit_log(vec![json!("compiling"), json!("app"), json!(1)]);
    pipeline_events.emit_log(vec![json!("reloading")]);
    pipeline_events.emit_error(Arc::clone(&fault));

    let first = next_event(&mut events).await;
    let ServerEvent::Log { args, .. } = first else {
        panic!("expected first log");
    };
    assert_eq!(args, vec![json!("compiling"), json!("app"), json!(1)]);

    let second = next_event(&mut events).await;
    let ServerEvent::Log { args, .. } = second else {
        panic!("expected second log");
    };
    assert_eq!(args, vec![json!("reloading")]);

    let third = next_event(&mut events).await;
    let ServerEvent::Error { error, .. } = third else {
        panic!("expected trailing error");
    };
    assert!(Arc::ptr_eq(&error, &fault));

    server.shutdown();
    server.stopped().await;
}

#[tokio::test]
async fn complete_fires_exactly_once() {
    let (server, _pipeline_events) = serve_test_pipeline(ServeOptions::new().port(47314));
    let mut events = server.subscribe();
    wait_ready(&mut events).await;

    // No further complete arrives in a generous observation window.
    let mut extra_completes = 0;
    while let Ok(Ok(event)) = timeout(Duration::from_millis(500), events.recv()).await {
        if event.kind() == "complete" {
            extra_completes += 1;
        }
    }
    assert_eq!(extra_completes, 0);

    server.shutdown();
    server.stopped().await;
}

#[tokio::test]
async fn bind_conflict_faults_without_crashing() {
    let occupant = assert_ok!(tokio::net::TcpListener::bind("0.0.0.0:47313").await);

    let (server, _pipeline_events) = serve_test_pipeline(ServeOptions::new().port(47313));
    let mut events = server.subscribe();

    let event = next_event(&mut events).await;
    let ServerEvent::Error { error, .. } = event else {
        panic!("expected a bind error event, got {}", event.kind());
    };
    assert!(error.to_string().contains("failed to bind"));

    server.stopped().await;
    assert_eq!(server.state(), ListenerState::Faulted);

    drop(occupant);
}

#[tokio::test]
async fn shutdown_reaches_closed_state() {
    let (server, _pipeline_events) = serve_test_pipeline(ServeOptions::new().port(47315));
    let mut events = server.subscribe();
    wait_ready(&mut events).await;

    server.shutdown();
    assert_ok!(timeout(EVENT_WAIT, server.stopped()).await);
    assert_eq!(server.state(), ListenerState::Closed);
}

#[tokio::test]
async fn late_subscriber_misses_complete() {
    let (server, _pipeline_events) = serve_test_pipeline(ServeOptions::new().port(47316));

    // This receiver existed before the bind, so it sees complete.
    let mut ready = server.subscribe();
    wait_ready(&mut ready).await;

    let mut late = server.subscribe();
    let observed = timeout(Duration::from_millis(500), late.recv()).await;
    assert!(observed.is_err(), "late subscriber saw a buffered event");

    server.shutdown();
    server.stopped().await;
}
