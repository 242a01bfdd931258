//! Middleware layer.
//!
//! Middleware is a function from handler to handler: it receives the next
//! handler in the chain and returns a new one that runs its own logic
//! before, after, or instead of calling it. The router applies the
//! application-wide list and the per-route list once, at registration time.
//!
//! The built-in layers are meant to be stacked in this order:
//!
//! ```text
//! logger( errors( metrics( panics( [authenticate(]  handler  [)] ))))
//! ```
//!
//! - [`panics`] sits innermost so a panic becomes an ordinary error before
//!   anything else sees it.
//! - [`metrics`] counts that error together with every other failure.
//! - [`errors`] is the only layer that turns errors into responses.
//! - [`logger`] is outermost so its completion record sees the final status.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sluice::{Method, Router, health, metrics::Counters, middleware};
//!
//! let counters = Arc::new(Counters::new());
//! let app = Router::new()
//!     .with(middleware::logger())
//!     .with(middleware::errors())
//!     .with(middleware::metrics(Arc::clone(&counters)))
//!     .with(middleware::panics(counters))
//!     .on(Method::Get, "/status", health::status);
//! ```

mod auth;
mod errors;
mod logger;
mod metrics;
mod panics;

use std::sync::Arc;

use crate::handler::BoxedHandler;

pub use auth::authenticate;
pub use errors::errors;
pub use logger::logger;
pub use metrics::metrics;
pub use panics::panics;

/// Wraps a handler in another handler.
///
/// Implemented for any `Fn(BoxedHandler) -> BoxedHandler`.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

impl<F> Middleware for F
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        (self)(next)
    }
}

pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Applies `mw` around `handler`. The first element ends up outermost.
pub fn wrap_middleware(mw: &[BoxedMiddleware], handler: BoxedHandler) -> BoxedHandler {
    mw.iter().rev().fold(handler, |next, m| m.wrap(next))
}
