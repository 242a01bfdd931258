//! Helpers for unit tests.

use std::collections::HashMap;

use bytes::Bytes;

use crate::request::Request;

pub(crate) fn request(path: &str) -> Request {
    let (parts, ()) = http::Request::get(path)
        .body(())
        .expect("valid test request")
        .into_parts();
    Request::new(parts, Bytes::new(), HashMap::new(), ([127, 0, 0, 1], 40000).into())
}
