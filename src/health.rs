//! Built-in status handler.
//!
//! ```rust,no_run
//! use sluice::{Method, Router, health};
//!
//! let app = Router::new().on(Method::Get, "/status", health::status);
//! ```

use http::StatusCode;
use serde::Serialize;

use crate::{Context, Request, ResponseWriter, Result, respond};

#[derive(Serialize)]
struct Status {
    #[serde(rename = "Status")]
    status: &'static str,
}

/// Always answers `200 OK` with `{"Status":"ok"}`. If the process can run a
/// handler chain at all, it is up.
pub async fn status(ctx: Context, w: ResponseWriter, _req: Request) -> Result {
    respond(&ctx, &w, &Status { status: "ok" }, StatusCode::OK)
}
