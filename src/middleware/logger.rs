//! Request start/completion logging.

use std::sync::Arc;

use tracing::info;

use crate::context::Context;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::ResponseWriter;

use super::BoxedMiddleware;

/// Logs a `request started` record before the inner chain and a
/// `request completed` record after it, whatever the inner result.
///
/// The completion record reads the status from the request context, so this
/// layer belongs outermost: only there has every inner write already happened.
pub fn logger() -> BoxedMiddleware {
    Arc::new(|next: BoxedHandler| -> BoxedHandler {
        Arc::new(move |ctx: Context, w: ResponseWriter, req: Request| {
            let next = Arc::clone(&next);
            async move {
                let v = ctx.values();
                let method = req.method().clone();
                let path = req.path().to_owned();
                let remote_addr = req.remote_addr();

                info!(
                    trace_id = %v.trace_id(),
                    method = %method,
                    path = %path,
                    remote_addr = %remote_addr,
                    "request started"
                );

                let result = next.call(ctx, w, req).await;

                let elapsed = v.elapsed();
                info!(
                    trace_id = %v.trace_id(),
                    method = %method,
                    path = %path,
                    remote_addr = %remote_addr,
                    status_code = v.status_code(),
                    elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                    "request completed"
                );

                result
            }
        })
    })
}
