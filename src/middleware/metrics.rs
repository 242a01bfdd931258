//! Request, error, and task counting.

use std::sync::Arc;

use crate::context::Context;
use crate::handler::BoxedHandler;
use crate::metrics::Counters;
use crate::request::Request;
use crate::response::ResponseWriter;

use super::BoxedMiddleware;

/// Requests between two samples of the runtime's live task count.
const TASK_SAMPLE_EVERY: u64 = 100;

/// Counts every request and every request whose inner chain failed.
pub fn metrics(counters: Arc<Counters>) -> BoxedMiddleware {
    Arc::new(move |next: BoxedHandler| -> BoxedHandler {
        let counters = Arc::clone(&counters);
        Arc::new(move |ctx: Context, w: ResponseWriter, req: Request| {
            let (next, counters) = (Arc::clone(&next), Arc::clone(&counters));
            async move {
                let result = next.call(ctx, w, req).await;

                let n = counters.increment_requests();
                if n % TASK_SAMPLE_EVERY == 0 {
                    if let Ok(handle) = tokio::runtime::Handle::try_current() {
                        counters.set_active_tasks(handle.metrics().num_alive_tasks() as u64);
                    }
                }

                if result.is_err() {
                    counters.increment_errors();
                }

                result
            }
        })
    })
}
