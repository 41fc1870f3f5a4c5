//! HTTP helpers for the relay Lambda functions.
//!
//! Every handler answers with exactly one JSON object: `{"reply": ...}` on
//! success or `{"error": ..., "details": ...}` on failure. The helpers here
//! build those responses and, for browser-facing variants, attach the
//! permissive CORS headers.

use lambda_http::http::response::Builder;
use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// CORS headers attached to every response of a browser-facing variant.
const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, OPTIONS, POST"),
    ("access-control-allow-headers", "Content-Type, Authorization"),
];

/// Successful chat relay body.
#[derive(Debug, Serialize)]
pub struct ReplyBody {
    pub reply: String,
}

/// Failure body shared by all variants.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn builder(status: u16, cors: bool) -> Builder {
    let mut builder = Response::builder().status(status);
    if cors {
        for (name, value) in CORS_HEADERS {
            builder = builder.header(name, value);
        }
    }
    builder
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    status: u16,
    cors: bool,
    data: &T,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    Ok(builder(status, cors)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .expect("Failed to build response"))
}

/// Create an error response with the given status code, message and detail.
pub fn error_response(
    status: u16,
    cors: bool,
    error: impl Into<String>,
    details: Option<String>,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    json_response(
        status,
        cors,
        &ErrorBody {
            error: error.into(),
            details,
        },
    )
}

/// Render a typed relay failure as the structured JSON error body.
///
/// This is the single boundary where the error taxonomy turns into HTTP:
/// nothing below it writes a response, nothing above it inspects statuses.
pub fn failure_response(
    err: &Error,
    cors: bool,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    match err {
        Error::Validation(message)
        | Error::MethodNotAllowed(message)
        | Error::Config(message) => error_response(err.status_code(), cors, message.clone(), None),
        Error::Upstream(fault) => {
            error_response(500, cors, "Upstream request failed", Some(fault.clone()))
        }
        Error::Serialization(e) => {
            error_response(500, cors, "Internal serialization error", Some(e.to_string()))
        }
    }
}

/// Answer a CORS preflight: 200 with the permissive headers, empty body.
pub fn preflight_response() -> std::result::Result<Response<Body>, lambda_http::Error> {
    Ok(builder(200, true)
        .body(Body::Empty)
        .expect("Failed to build response"))
}

/// Pass an upstream JSON payload through verbatim, optionally with an
/// advisory cache header.
pub fn passthrough_response(
    cors: bool,
    cache_control: Option<&str>,
    payload: String,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let mut response = builder(200, cors).header("content-type", "application/json");
    if let Some(value) = cache_control {
        response = response.header("cache-control", value);
    }
    Ok(response
        .body(Body::from(payload))
        .expect("Failed to build response"))
}

/// Parse a request body as JSON.
///
/// A parse fault is a client error (400), never a 500.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<T> {
    serde_json::from_slice(body.as_ref())
        .map_err(|e| Error::Validation(format!("Request body is not valid JSON: {}", e)))
}
