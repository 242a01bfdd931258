//! Demo service: a status route, an authenticated route, and a metrics dump.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example sales_api -- --keys-dir tests/fixtures --active-kid signing
//!
//! Try:
//!   curl http://localhost:3000/status
//!   curl http://localhost:3000/metrics
//!   TOKEN=$(cargo run -q --example sales_api -- --keys-dir tests/fixtures \
//!           --active-kid signing --gen-token alice)
//!   curl -H "authorization: Bearer $TOKEN" http://localhost:3000/auth

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use http::StatusCode;
use sluice::auth::{Auth, Claims, KeyStore};
use sluice::metrics::Counters;
use sluice::{Context, Method, Request, ResponseWriter, Result, Router, Server, health, middleware, respond};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "sluice demo service")]
struct Config {
    /// Address to listen on.
    #[arg(long, env = "SLUICE_ADDR", default_value = "0.0.0.0:3000")]
    addr: String,

    /// Directory holding `<kid>.pem` / `<kid>.pub.pem` key pairs.
    #[arg(long, env = "SLUICE_KEYS_DIR", default_value = "zarf/keys")]
    keys_dir: String,

    /// Key id new tokens are signed with.
    #[arg(long, env = "SLUICE_ACTIVE_KID", default_value = "signing")]
    active_kid: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "SLUICE_LOG_JSON")]
    log_json: bool,

    /// Print a one-hour token for this subject and exit.
    #[arg(long, value_name = "SUBJECT")]
    gen_token: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = Config::parse();
    init_tracing(cfg.log_json);

    match run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("startup: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: Config) -> anyhow::Result<()> {
    let keys = KeyStore::from_dir(&cfg.keys_dir)?;
    let auth = Arc::new(Auth::new(cfg.active_kid.as_str(), Arc::new(keys)));

    if let Some(sub) = cfg.gen_token {
        let claims = Claims::new(sub, vec!["USER".into()], Duration::from_secs(3600));
        println!("{}", auth.generate_token(&claims)?);
        return Ok(());
    }

    let counters = Arc::new(Counters::new());
    let metrics_view = Arc::clone(&counters);

    let app = Router::new()
        .with(middleware::logger())
        .with(middleware::errors())
        .with(middleware::metrics(Arc::clone(&counters)))
        .with(middleware::panics(counters))
        .on(Method::Get, "/status", health::status)
        .on_with(Method::Get, "/auth", whoami, [middleware::authenticate(auth)])
        .on(Method::Get, "/metrics", move |ctx: Context, w: ResponseWriter, _req: Request| {
            let snapshot = metrics_view.snapshot();
            async move { respond(&ctx, &w, &snapshot, StatusCode::OK) }
        });

    info!(addr = %cfg.addr, "starting sales api");
    Server::bind(&cfg.addr).serve(app).await?;
    Ok(())
}

async fn whoami(ctx: Context, w: ResponseWriter, _req: Request) -> Result {
    let claims = ctx.claims().cloned().unwrap_or_default();
    respond(&ctx, &w, &claims, StatusCode::OK)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
