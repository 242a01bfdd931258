//! Outgoing responses and the single-write responder.
//!
//! Every handler gets a [`ResponseWriter`]. It is a handle onto a write-once
//! slot: the first [`ResponseWriter::send`] wins, any later attempt fails
//! with an opaque error and leaves the first response in place. Handlers
//! normally go through [`respond`], which serialises a payload to JSON.
//!
//! ```rust
//! use http::StatusCode;
//! use serde::Serialize;
//! use sluice::{Context, Request, ResponseWriter, Result, respond};
//!
//! #[derive(Serialize)]
//! struct User { id: u64, name: &'static str }
//!
//! async fn get_user(ctx: Context, w: ResponseWriter, _req: Request) -> Result {
//!     respond(&ctx, &w, &User { id: 1, name: "alice" }, StatusCode::OK)
//! }
//! ```

use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use serde::Serialize;

use crate::context::Context;
use crate::error::{Error, Result};

// ── Response ──────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// The body is [`Bytes`], so cloning a response is a reference-count bump.
#[derive(Clone, Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    /// Response with no body.
    pub fn status(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// `application/json` body with the given status.
    pub fn json(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::status(status).body(HeaderValue::from_static("application/json"), body)
    }

    /// `text/plain; charset=utf-8` body with the given status.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::status(status).body(HeaderValue::from_static("text/plain; charset=utf-8"), body)
    }

    /// Sets the body together with its content type.
    pub fn body(mut self, content_type: HeaderValue, body: impl Into<Bytes>) -> Self {
        self.headers.insert(CONTENT_TYPE, content_type);
        self.body = body.into();
        self
    }

    /// Adds a header, replacing any previous value of the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn bytes(&self) -> &Bytes { &self.body }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// Write-once response slot shared by every layer of one request.
#[derive(Clone, Debug, Default)]
pub struct ResponseWriter {
    slot: Arc<OnceLock<Response>>,
}

#[derive(Debug, thiserror::Error)]
#[error("response already written with status {0}")]
struct AlreadyWritten(StatusCode);

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `response` and records its status in `ctx`.
    ///
    /// Fails with an opaque error if a response was already written.
    pub fn send(&self, ctx: &Context, response: Response) -> Result {
        let status = response.status;
        if let Err(rejected) = self.slot.set(response) {
            let first = self.slot.get().map_or(rejected.status, |r| r.status);
            return Err(Error::opaque(AlreadyWritten(first)));
        }
        ctx.set_status(status.as_u16());
        Ok(())
    }

    pub fn is_written(&self) -> bool {
        self.slot.get().is_some()
    }

    /// The written response, if any.
    pub fn response(&self) -> Option<Response> {
        self.slot.get().cloned()
    }
}

// ── Responder ─────────────────────────────────────────────────────────────────

/// Serialises `data` as JSON and writes it with `status`.
///
/// `204 No Content` is written without a body. A payload that fails to
/// serialise produces an opaque error and nothing is written.
pub fn respond<T>(ctx: &Context, w: &ResponseWriter, data: &T, status: StatusCode) -> Result
where
    T: Serialize + ?Sized,
{
    if status == StatusCode::NO_CONTENT {
        return w.send(ctx, Response::status(status));
    }

    let body = serde_json::to_vec(data)?;
    w.send(ctx, Response::json(status, body))
}
