//! Per-request context and response model
//!
//! The pipeline operates on [`RequestContext`] and produces an [`Outgoing`]
//! response value; conversion to a hyper response happens only at the
//! server edge. This keeps every stage testable without a live server.

use crate::http::JSON_CONTENT_TYPE;
use crate::views::ViewLocals;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::{Method, Request};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Request body after the parsing stages have run.
#[derive(Debug, Clone, Default)]
pub enum ParsedBody {
    #[default]
    None,
    Json(serde_json::Value),
    Form(HashMap<String, String>),
}

/// Everything a pipeline stage may inspect or annotate for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Request `Content-Type` header, parameters stripped.
    pub content_type: Option<String>,
    pub if_none_match: Option<String>,
    pub body: Bytes,
    pub parsed_body: ParsedBody,
    /// Template variables, populated by the view-locals stage.
    pub locals: Option<ViewLocals>,
    /// Content type a router pre-sets for its responses. The error
    /// renderer branches on this value, not on the request `Accept`
    /// header.
    pub response_content_type: Option<String>,
    pub remote_addr: Option<SocketAddr>,
    pub http_version: String,
}

impl RequestContext {
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: None,
            content_type: None,
            if_none_match: None,
            body: Bytes::new(),
            parsed_body: ParsedBody::None,
            locals: None,
            response_content_type: None,
            remote_addr: None,
            http_version: "1.1".to_string(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.content_type = Some(content_type.to_string());
        self.body = body.into();
        self
    }

    /// True when a router has pre-set a JSON response content type.
    #[must_use]
    pub fn wants_json_response(&self) -> bool {
        self.response_content_type.as_deref() == Some(JSON_CONTENT_TYPE)
    }
}

/// A fully determined response: status, content type, body bytes, and an
/// optional `ETag` for cacheable assets.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
    pub etag: Option<String>,
}

impl Outgoing {
    #[must_use]
    pub fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8".to_string(),
            body: Bytes::from(body),
            etag: None,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: JSON_CONTENT_TYPE.to_string(),
            body: Bytes::from(body),
            etag: None,
        }
    }

    #[must_use]
    pub fn text(status: u16, body: &'static str) -> Self {
        Self {
            status,
            content_type: "text/plain".to_string(),
            body: Bytes::from_static(body.as_bytes()),
            etag: None,
        }
    }

    #[must_use]
    pub fn static_file(content: Vec<u8>, content_type: &str, etag: String) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_string(),
            body: Bytes::from(content),
            etag: Some(etag),
        }
    }

    #[must_use]
    pub fn not_modified(etag: String) -> Self {
        Self {
            status: 304,
            content_type: String::new(),
            body: Bytes::new(),
            etag: Some(etag),
        }
    }
}

/// Build a [`RequestContext`] from an inbound hyper request, collecting
/// the body up front.
///
/// Returns `Err` with a ready response when the declared body size
/// exceeds the limit (413) or the body cannot be read (400).
pub async fn from_hyper(
    req: Request<hyper::body::Incoming>,
    remote_addr: Option<SocketAddr>,
    max_body_size: u64,
) -> Result<RequestContext, Outgoing> {
    let (parts, body) = req.into_parts();

    if let Some(declared) = parts
        .headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        if declared > max_body_size {
            return Err(Outgoing::text(413, "413 Payload Too Large"));
        }
    }

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return Err(Outgoing::text(400, "400 Bad Request")),
    };

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    Ok(RequestContext {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(ToString::to_string),
        content_type: header("content-type").map(|ct| {
            ct.split(';').next().unwrap_or_default().trim().to_string()
        }),
        if_none_match: header("if-none-match"),
        body,
        parsed_body: ParsedBody::None,
        locals: None,
        response_content_type: None,
        remote_addr,
        http_version: match parts.version {
            hyper::Version::HTTP_10 => "1.0".to_string(),
            hyper::Version::HTTP_2 => "2".to_string(),
            _ => "1.1".to_string(),
        },
    })
}
