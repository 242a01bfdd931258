//! Per-request state shared by every layer of a handler chain.
//!
//! A [`Context`] is a cheap, clonable handle. The router attaches one
//! [`Values`] record per request; every middleware receives the same handle
//! and forwards it inward. Because the record sits behind an `Arc`, a status
//! code written by an inner layer is visible to outer layers once the inner
//! call returns:
//!
//! ```text
//! Logger ── ctx ──▶ Errors ── ctx ──▶ … ── ctx ──▶ handler
//!   ▲                                                  │
//!   └──────── values().status_code() ◀── set_status ───┘
//! ```
//!
//! Reading from a context that never had values attached is not an error.
//! [`Context::values`] hands back a zero-value record instead, so tests and
//! hand-built chains never crash on missing state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::auth::Claims;

/// Trace id reported when no [`Values`] were attached to a context.
pub const ZERO_TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// State for one in-flight request.
#[derive(Debug)]
pub struct Values {
    trace_id: String,
    start_at: Instant,
    status_code: AtomicU16,
}

impl Values {
    /// Fresh values with a random trace id, starting now.
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4().to_string())
    }

    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            start_at: Instant::now(),
            status_code: AtomicU16::new(0),
        }
    }

    pub fn trace_id(&self) -> &str { &self.trace_id }
    pub fn start_at(&self) -> Instant { self.start_at }

    /// Time elapsed since the request started.
    pub fn elapsed(&self) -> Duration { self.start_at.elapsed() }

    /// The status written by the responder, or `0` if nothing was written yet.
    ///
    /// Only [`ResponseWriter::send`](crate::ResponseWriter::send) records it,
    /// so handlers cannot report a status other than the one on the wire:
    ///
    /// ```compile_fail
    /// let ctx = sluice::Context::background().with_values(sluice::Values::new());
    /// ctx.set_status(200);
    /// ```
    pub fn status_code(&self) -> u16 {
        self.status_code.load(Ordering::Acquire)
    }

    fn zero() -> Self {
        Self::with_trace_id(ZERO_TRACE_ID)
    }
}

impl Default for Values {
    fn default() -> Self { Self::new() }
}

/// Read-only handle onto the request's shared state.
#[derive(Clone, Debug, Default)]
pub struct Context {
    values: Option<Arc<Values>>,
    claims: Option<Arc<Claims>>,
}

impl Context {
    /// An empty context: no values, no claims.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a new context carrying `values`. The receiver is left untouched.
    pub fn with_values(&self, values: Values) -> Self {
        Self { values: Some(Arc::new(values)), claims: self.claims.clone() }
    }

    /// Returns a new context carrying the authenticated caller's claims.
    pub fn with_claims(&self, claims: Claims) -> Self {
        Self { values: self.values.clone(), claims: Some(Arc::new(claims)) }
    }

    /// The attached values, or a zero-value record if none were attached.
    pub fn values(&self) -> Arc<Values> {
        match &self.values {
            Some(values) => Arc::clone(values),
            None => Arc::new(Values::zero()),
        }
    }

    pub fn trace_id(&self) -> &str {
        self.values.as_deref().map_or(ZERO_TRACE_ID, Values::trace_id)
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_deref()
    }

    /// Records the status written to the wire. No-op without attached values.
    pub(crate) fn set_status(&self, code: u16) {
        if let Some(values) = &self.values {
            values.status_code.store(code, Ordering::Release);
        }
    }
}
