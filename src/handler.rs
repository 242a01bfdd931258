//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The router holds handlers of *different* types in a single
//! `HashMap<Method, Tree>`, and middleware wraps handlers it knows nothing
//! about. Both need one uniform type, so every handler is hidden behind a
//! trait object: [`BoxedHandler`] = `Arc<dyn Handler>`.
//!
//! ```text
//! async fn status(ctx, w, req) -> Result { … }   ← user writes this
//!        ↓ router.on(Method::Get, "/status", status)
//! Arc::new(status)                                ← blanket Handler impl
//!        ↓  middleware.wrap(next) at registration time
//! Arc<dyn Handler> (Logger(Errors(…(status))))    ← one composed handler per route
//!        ↓
//! handler.call(ctx, w, req)  at request time      ← one vtable dispatch per layer
//! ```
//!
//! The per-request cost is one virtual call and one boxed future per layer.
//! Nothing is composed on the hot path.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::request::Request;
use crate::response::ResponseWriter;

/// A heap-allocated, type-erased future that resolves to a handler outcome.
///
/// `Send + 'static` let tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result> + Send + 'static>>;

/// Anything that can serve a request.
///
/// Implemented automatically for every function or closure of the shape
///
/// ```text
/// async fn name(ctx: Context, w: ResponseWriter, req: Request) -> Result
/// ```
///
/// Returning `Ok(())` means a response was written through `w`. Returning an
/// error hands the decision of what to write to the layers further out.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

impl<F, Fut> Handler for F
where
    F: Fn(Context, ResponseWriter, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result> + Send + 'static,
{
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture {
        Box::pin((self)(ctx, w, req))
    }
}
