//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use sluice::auth::{Auth, Claims, KeyStore};
use sluice::metrics::Counters;
use sluice::middleware::{self, BoxedMiddleware};
use sluice::{
    BoxedHandler, Context, Error, Method, Request, ResponseWriter, Result, Router, health, respond,
};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context as LayerContext, Layer};

pub const PRIVATE_PEM: &str = include_str!("../fixtures/signing.pem");
pub const PUBLIC_PEM: &str = include_str!("../fixtures/signing.pub.pem");

/// The service under test plus the probes it reports into.
pub struct TestApp {
    pub router: Arc<Router>,
    pub counters: Arc<Counters>,
    pub auth: Arc<Auth>,
    /// Times the `/auth` handler actually ran.
    pub auth_hits: Arc<AtomicUsize>,
    /// `Context` status read by the outermost layer after each request.
    pub observed_status: Arc<Mutex<Vec<u16>>>,
}

impl TestApp {
    pub fn new() -> Self {
        let counters = Arc::new(Counters::new());

        let mut keys = KeyStore::new();
        keys.insert("signing", PRIVATE_PEM, PUBLIC_PEM);
        let auth = Arc::new(Auth::new("signing", Arc::new(keys)));

        let auth_hits = Arc::new(AtomicUsize::new(0));
        let observed_status = Arc::new(Mutex::new(Vec::new()));

        let hits = Arc::clone(&auth_hits);
        let whoami = move |ctx: Context, w: ResponseWriter, _req: Request| {
            hits.fetch_add(1, Ordering::SeqCst);
            async move {
                let sub = ctx.claims().map(|c| c.sub.clone()).unwrap_or_default();
                respond(&ctx, &w, &serde_json::json!({ "sub": sub }), StatusCode::OK)
            }
        };

        let router = Router::new()
            .with(status_probe(Arc::clone(&observed_status)))
            .with(middleware::logger())
            .with(middleware::errors())
            .with(middleware::metrics(Arc::clone(&counters)))
            .with(middleware::panics(Arc::clone(&counters)))
            .on(Method::Get, "/status", health::status)
            .on_with(
                Method::Get,
                "/auth",
                whoami,
                [middleware::authenticate(Arc::clone(&auth))],
            )
            .on(Method::Get, "/panic", panicking)
            .on(Method::Get, "/trusted", trusted)
            .on(Method::Get, "/opaque", opaque)
            .on(Method::Post, "/created", created)
            .on(Method::Get, "/slow", slow)
            .on(Method::Get, "/silent", silent);

        Self { router: Arc::new(router), counters, auth, auth_hits, observed_status }
    }

    pub async fn get(&self, path: &str) -> Reply {
        self.send(http::Request::get(path).body(Bytes::new()).unwrap()).await
    }

    pub async fn get_with_bearer(&self, path: &str, token: &str) -> Reply {
        let req = http::Request::get(path)
            .header("authorization", format!("Bearer {token}"))
            .body(Bytes::new())
            .unwrap();
        self.send(req).await
    }

    pub async fn send(&self, req: http::Request<Bytes>) -> Reply {
        let res = self
            .router
            .dispatch(req, peer())
            .await
            .expect("request should be answered");
        Reply::read(res).await
    }

    pub fn token(&self, sub: &str) -> String {
        let claims = Claims::new(sub, vec!["USER".into()], Duration::from_secs(3600));
        self.auth.generate_token(&claims).unwrap()
    }
}

pub fn peer() -> SocketAddr {
    "10.1.2.3:55000".parse().unwrap()
}

/// A fully read response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Bytes,
}

impl Reply {
    async fn read(res: http::Response<Full<Bytes>>) -> Self {
        let status = res.status();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        Self { status, body }
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Outermost layer recording the status the context reports once the chain is done.
fn status_probe(seen: Arc<Mutex<Vec<u16>>>) -> BoxedMiddleware {
    Arc::new(move |next: BoxedHandler| -> BoxedHandler {
        let seen = Arc::clone(&seen);
        Arc::new(move |ctx: Context, w: ResponseWriter, req: Request| {
            let (next, seen) = (Arc::clone(&next), Arc::clone(&seen));
            async move {
                let res = next.call(ctx.clone(), w, req).await;
                seen.lock().unwrap().push(ctx.values().status_code());
                res
            }
        })
    })
}

async fn panicking(_ctx: Context, _w: ResponseWriter, req: Request) -> Result {
    let items: Vec<u8> = Vec::new();
    let idx = req.path().len();
    let _ = items[idx];
    Ok(())
}

async fn trusted(_ctx: Context, _w: ResponseWriter, _req: Request) -> Result {
    Err(Error::trusted("product already exists", StatusCode::CONFLICT))
}

async fn opaque(_ctx: Context, _w: ResponseWriter, _req: Request) -> Result {
    Err(anyhow::anyhow!("pq: password authentication failed for user \"sales\"").into())
}

async fn created(ctx: Context, w: ResponseWriter, _req: Request) -> Result {
    respond(&ctx, &w, &serde_json::json!({ "id": 99 }), StatusCode::CREATED)
}

async fn slow(ctx: Context, w: ResponseWriter, _req: Request) -> Result {
    tokio::time::sleep(Duration::from_millis(20)).await;
    respond(&ctx, &w, &serde_json::json!({ "Status": "ok" }), StatusCode::OK)
}

async fn silent(_ctx: Context, _w: ResponseWriter, _req: Request) -> Result {
    Ok(())
}

// ── Log capture ───────────────────────────────────────────────────────────────

/// One captured tracing event: its message and fields, rendered as text.
#[derive(Clone, Debug, Default)]
pub struct Record {
    pub message: String,
    pub fields: HashMap<String, String>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Tracing layer that keeps every event in memory.
#[derive(Clone, Default)]
pub struct Capture {
    records: Arc<Mutex<Vec<Record>>>,
}

impl Capture {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn find(&self, message: &str) -> Vec<Record> {
        self.records().into_iter().filter(|r| r.message == message).collect()
    }
}

impl<S: tracing::Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut record = Record::default();
        event.record(&mut RecordVisitor(&mut record));
        self.records.lock().unwrap().push(record);
    }
}

struct RecordVisitor<'a>(&'a mut Record);

impl Visit for RecordVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_owned());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }
}

impl RecordVisitor<'_> {
    fn store(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.0.message = value;
        } else {
            self.0.fields.insert(field.name().to_owned(), value);
        }
    }
}
