//! HTTP response building module
//!
//! Converts the pipeline's [`Outgoing`] value into a hyper response at
//! the server edge.

use crate::pipeline::context::Outgoing;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Build the wire response for a determined [`Outgoing`] value.
pub fn from_outgoing(out: Outgoing, server_name: &str) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(out.status)
        .header("Server", server_name);

    if !out.content_type.is_empty() {
        builder = builder
            .header("Content-Type", &out.content_type)
            .header("Content-Length", out.body.len());
    }

    if let Some(etag) = &out.etag {
        builder = builder
            .header("ETag", etag)
            .header("Cache-Control", "public, max-age=3600");
    }

    builder.body(Full::new(out.body)).unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to build response: {e}"));
        Response::new(Full::new(Bytes::new()))
    })
}
