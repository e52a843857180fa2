//! # devserve
//!
//! Local development server that serves a request-handling pipeline to
//! client devices and unifies lifecycle, log, and error signals from
//! every source on one observable event bus.
//!
//! The bootstrap resolves the options, builds the pipeline, wires event
//! forwarding, binds the socket, and hands back a [`server::Server`]
//! handle. Subscribers attached before the socket binds observe the
//! synthesized `complete` event carrying the resolved local address.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!     │  serve(options)
//!     ├── Bootstrap (server/bootstrap)
//!     │       ├── ServerConfig (config)
//!     │       ├── Pipeline factory (pipeline/)
//!     │       └── forwarding task: PipelineEvent → ServerEvent
//!     │
//!     ├── Listener (server/listener)
//!     │       ├── TCP bind + accept loop (axum/tokio)
//!     │       ├── per-request dispatch → Pipeline
//!     │       └── ReadyInfo composition (address/)
//!     │
//!     └── EventBus (domain/) ── `complete` / `log` / `error`
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use devserve::config::ServeOptions;
//! use devserve::domain::ServerEvent;
//! use devserve::server;
//!
//! # async fn example() {
//! let handle = server::serve(ServeOptions::new().port(3000));
//! let mut events = handle.subscribe();
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         ServerEvent::Complete(info) => println!("ready on {}:{}", info.address, info.port),
//!         ServerEvent::Log { args, .. } => println!("log: {args:?}"),
//!         ServerEvent::Error { error, .. } => eprintln!("error: {error}"),
//!     }
//! }
//! # }
//! ```

pub mod address;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod server;
