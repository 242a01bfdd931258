//! # sluice
//!
//! A minimal HTTP request pipeline for Rust services behind a reverse proxy.
//!
//! ## The contract
//!
//! A request goes through exactly three things: a route lookup, a chain of
//! middleware composed once at startup, and a handler. Every layer gets the
//! same three handles:
//!
//! - [`Context`] — per-request state (trace id, start time, final status)
//! - [`ResponseWriter`] — a write-once response slot
//! - [`Request`] — the parsed request with its body
//!
//! and returns a [`Result`]. Handlers write successes through [`respond`] and
//! return failures as [`Error`]s; the [`middleware::errors`] layer is the one
//! place that turns a failure into a response:
//!
//! - [`Error::Trusted`] — deliberate, its status and message reach the client
//! - [`Error::Opaque`] — anything else, panics included; the client gets a
//!   bare `500`, the logs get the cause
//!
//! What the proxy in front already owns (TLS, rate limits, body-size limits,
//! slow clients) sluice leaves alone.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use http::StatusCode;
//! use sluice::metrics::Counters;
//! use sluice::{Context, Error, Method, Request, ResponseWriter, Result, Router, Server};
//! use sluice::{health, middleware, respond};
//!
//! #[tokio::main]
//! async fn main() {
//!     let counters = Arc::new(Counters::new());
//!
//!     let app = Router::new()
//!         .with(middleware::logger())
//!         .with(middleware::errors())
//!         .with(middleware::metrics(Arc::clone(&counters)))
//!         .with(middleware::panics(counters))
//!         .on(Method::Get, "/status",     health::status)
//!         .on(Method::Get, "/users/{id}", get_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(ctx: Context, w: ResponseWriter, req: Request) -> Result {
//!     let id: u64 = req.param("id")
//!         .and_then(|id| id.parse().ok())
//!         .ok_or_else(|| Error::trusted("id must be a number", StatusCode::BAD_REQUEST))?;
//!     respond(&ctx, &w, &serde_json::json!({ "id": id }), StatusCode::OK)
//! }
//! ```

mod context;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod auth;
pub mod health;
pub mod metrics;
pub mod middleware;

#[cfg(test)]
mod testing;

pub use context::{Context, Values, ZERO_TRACE_ID};
pub use error::{Error, ErrorResponse, Panicked, Result, ServerError, Unanswered};
pub use handler::{BoxFuture, BoxedHandler, Handler};
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{Response, ResponseWriter, respond};
pub use router::Router;
pub use server::Server;
