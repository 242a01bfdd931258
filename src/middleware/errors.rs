//! Error-to-response translation.

use std::sync::Arc;

use tracing::{error, warn};

use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::{ResponseWriter, respond};

use super::BoxedMiddleware;

/// Writes the response for any error the inner chain returns.
///
/// Trusted errors keep their status and message. Anything else becomes a
/// bare `500`; its full cause is logged, never sent. When the inner chain
/// already wrote a response the error is only logged, so a request is never
/// answered twice.
pub fn errors() -> BoxedMiddleware {
    Arc::new(|next: BoxedHandler| -> BoxedHandler {
        Arc::new(move |ctx: Context, w: ResponseWriter, req: Request| {
            let next = Arc::clone(&next);
            async move {
                let Err(err) = next.call(ctx.clone(), w.clone(), req).await else {
                    return Ok(());
                };

                match &err {
                    Error::Trusted { status, message, .. } => {
                        warn!(
                            trace_id = %ctx.trace_id(),
                            status = status.as_u16(),
                            reason = %message,
                            "request rejected"
                        );
                    }
                    Error::Opaque(cause) => {
                        error!(trace_id = %ctx.trace_id(), error = ?cause, "request failed");
                    }
                }

                if w.is_written() {
                    warn!(trace_id = %ctx.trace_id(), "response already written, dropping error response");
                    return Ok(());
                }

                respond(&ctx, &w, &err.to_response(), err.status())
            }
        })
    })
}
