//! Bearer-token authentication for individual routes.

use std::sync::Arc;

use http::StatusCode;
use http::header::AUTHORIZATION;

use crate::auth::Auth;
use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::ResponseWriter;

use super::BoxedMiddleware;

/// Rejects requests without a valid bearer token with a trusted `401`.
///
/// The inner chain only runs for authenticated callers and sees their
/// [`Claims`](crate::auth::Claims) through [`Context::claims`]. Attach it per
/// route with [`Router::on_with`](crate::Router::on_with).
pub fn authenticate(auth: Arc<Auth>) -> BoxedMiddleware {
    Arc::new(move |next: BoxedHandler| -> BoxedHandler {
        let auth = Arc::clone(&auth);
        Arc::new(move |ctx: Context, w: ResponseWriter, req: Request| {
            let (next, auth) = (Arc::clone(&next), Arc::clone(&auth));
            async move {
                let bearer = req.header(AUTHORIZATION.as_str()).unwrap_or_default();
                let claims = auth
                    .authenticate(bearer)
                    .map_err(|e| Error::trusted(format!("authenticate: failed: {e}"), StatusCode::UNAUTHORIZED))?;

                next.call(ctx.with_claims(claims), w, req).await
            }
        })
    })
}
