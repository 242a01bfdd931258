//! Panic recovery.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::context::Context;
use crate::error::{Error, Panicked};
use crate::handler::BoxedHandler;
use crate::metrics::Counters;
use crate::request::Request;
use crate::response::ResponseWriter;

use super::BoxedMiddleware;

/// Turns a panic anywhere in the inner chain into an opaque [`Error`] and
/// counts it in `counters`.
///
/// The inner call happens inside the guarded future, so a handler that
/// panics before returning its future is caught too.
pub fn panics(counters: Arc<Counters>) -> BoxedMiddleware {
    Arc::new(move |next: BoxedHandler| -> BoxedHandler {
        let counters = Arc::clone(&counters);
        Arc::new(move |ctx: Context, w: ResponseWriter, req: Request| {
            let (next, counters) = (Arc::clone(&next), Arc::clone(&counters));
            async move {
                let guarded = AssertUnwindSafe(async move { next.call(ctx, w, req).await });
                match guarded.catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => {
                        counters.increment_panics();
                        Err(Error::opaque(Panicked::new(payload)))
                    }
                }
            }
        })
    })
}
