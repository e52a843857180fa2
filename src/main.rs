//! devserve entry point.
//!
//! Loads options from the environment, starts the server, and mirrors
//! the event stream into tracing until interrupted.

use anyhow::Result;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use devserve::config::ServeOptions;
use devserve::domain::ServerEvent;
use devserve::server;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let options = ServeOptions::from_env();
    let server = server::serve(options);
    let mut events = server.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ServerEvent::Complete(info)) => {
                    tracing::info!(address = %info.address, port = info.port, "server ready");
                }
                Ok(ServerEvent::Log { args, .. }) => {
                    tracing::info!(args = %serde_json::Value::Array(args), "server log");
                }
                Ok(ServerEvent::Error { error, .. }) => {
                    tracing::error!(%error, "server error");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event observer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                server.shutdown();
                server.stopped().await;
                break;
            }
        }
    }

    Ok(())
}

/// Initializes tracing with an env filter; `LOG_FORMAT=json` switches
/// to structured JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
