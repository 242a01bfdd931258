//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Each route stores a
//! single handler that already has all of its middleware composed around it,
//! so a request costs one lookup and one call into the outermost layer.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use matchit::Router as MatchitRouter;
use tracing::{error, warn};

use crate::context::{Context, Values};
use crate::error::Unanswered;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, wrap_middleware};
use crate::request::Request;
use crate::response::{Response, ResponseWriter};

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Application-wide middleware goes in first with [`Router::with`], routes
/// follow with [`Router::on`] / [`Router::on_with`].
#[derive(Default)]
pub struct Router {
    middleware: Vec<BoxedMiddleware>,
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds application-wide middleware. Earlier calls wrap later ones.
    ///
    /// # Panics
    ///
    /// Panics if a route was already registered: routes are composed when
    /// they are registered, so late middleware would silently miss them.
    pub fn with(mut self, mw: BoxedMiddleware) -> Self {
        assert!(
            self.routes.is_empty(),
            "application middleware must be added before any route is registered"
        );
        self.middleware.push(mw);
        self
    }

    /// Registers a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use sluice::{Context, Method, Request, ResponseWriter, Result, Router};
    /// # async fn get_user(_: Context, _: ResponseWriter, _: Request) -> Result { Ok(()) }
    /// # async fn create_user(_: Context, _: ResponseWriter, _: Request) -> Result { Ok(()) }
    /// Router::new()
    ///     .on(Method::Get,  "/users/{id}", get_user)
    ///     .on(Method::Post, "/users",      create_user);
    /// ```
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.on_with(method, path, handler, std::iter::empty())
    }

    /// Like [`Router::on`], with middleware that applies to this route only.
    ///
    /// Route middleware sits inside the application middleware:
    /// `app[0](app[1](… route[0](route[1](handler)))).`
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern or conflicts with a
    /// route already registered for `method`.
    pub fn on_with(
        mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
        route_mw: impl IntoIterator<Item = BoxedMiddleware>,
    ) -> Self {
        let route_mw: Vec<_> = route_mw.into_iter().collect();
        let handler = wrap_middleware(&route_mw, Arc::new(handler));
        let handler = wrap_middleware(&self.middleware, handler);

        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Answer for a path with no route under the requested method: `405` with
    /// an `Allow` header if another method serves it, `404` otherwise.
    fn unrouted(&self, path: &str) -> Response {
        let mut allowed: Vec<&str> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method.as_str())
            .collect();
        if allowed.is_empty() {
            return Response::status(StatusCode::NOT_FOUND);
        }
        allowed.sort_unstable();

        let res = Response::status(StatusCode::METHOD_NOT_ALLOWED);
        match HeaderValue::from_str(&allowed.join(", ")) {
            Ok(allow) => res.header(ALLOW, allow),
            Err(_) => res,
        }
    }

    /// Routes one request through its chain and returns what was written.
    ///
    /// `Err(Unanswered)` means the chain finished without writing a response;
    /// the server answers that by dropping the connection.
    pub async fn dispatch(
        &self,
        req: http::Request<Bytes>,
        remote_addr: SocketAddr,
    ) -> Result<http::Response<Full<Bytes>>, Unanswered> {
        let Ok(method) = Method::try_from(req.method()) else {
            return Ok(Response::status(StatusCode::METHOD_NOT_ALLOWED).into_http());
        };
        let Some((handler, params)) = self.lookup(method, req.uri().path()) else {
            return Ok(self.unrouted(req.uri().path()).into_http());
        };

        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_owned();
        let req = Request::new(parts, body, params, remote_addr);

        let ctx = Context::background().with_values(Values::new());
        let w = ResponseWriter::new();
        let result = handler.call(ctx.clone(), w.clone(), req).await;

        match (result, w.response()) {
            (Ok(()), Some(res)) => Ok(res.into_http()),
            (Err(err), Some(res)) => {
                warn!(trace_id = %ctx.trace_id(), error = %err, "error escaped the chain after the response was written");
                Ok(res.into_http())
            }
            (result, None) => {
                if let Err(err) = result {
                    error!(trace_id = %ctx.trace_id(), error = ?err, "unhandled error, closing connection");
                } else {
                    error!(trace_id = %ctx.trace_id(), "handler returned without writing a response, closing connection");
                }
                Err(Unanswered { method: method.to_string(), path })
            }
        }
    }
}
