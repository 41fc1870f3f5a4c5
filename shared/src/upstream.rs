//! Outbound transport seam for the relay handlers.
//!
//! A relay builds one [`UpstreamCall`] per inbound request and hands it to an
//! [`Upstream`]. Production uses [`HttpUpstream`] (reqwest with an explicit
//! timeout); tests swap in a mock that counts and captures calls.

use async_trait::async_trait;
use lambda_http::http::Method;
use std::time::Duration;

use crate::{Error, Result};

/// How a variant's credential is attached to the outbound call.
///
/// The scheme is fixed per upstream endpoint, never negotiated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <credential>`
    Bearer,
    /// A custom header, e.g. `api-subscription-key`
    Header(&'static str),
    /// A query parameter, e.g. `api-key`
    Query(&'static str),
}

impl AuthScheme {
    /// Attach the credential to the call in the slot this scheme dictates.
    pub fn apply(&self, credential: &str, call: &mut UpstreamCall) {
        match self {
            AuthScheme::Bearer => call
                .headers
                .push(("authorization".to_string(), format!("Bearer {}", credential))),
            AuthScheme::Header(name) => call
                .headers
                .push((name.to_string(), credential.to_string())),
            AuthScheme::Query(name) => call
                .query
                .push((name.to_string(), credential.to_string())),
        }
    }
}

/// One outbound HTTP call, fully described before it is sent.
#[derive(Debug)]
pub struct UpstreamCall {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl UpstreamCall {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: Some(body),
        }
    }
}

/// What came back from the upstream, before any interpretation.
///
/// The body is kept as text; error payloads are not always JSON.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The transport. Exactly one `send` happens per inbound request.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Issue the call. `Err` means the call itself failed to complete
    /// (connect fault, timeout); an upstream-reported error status is an
    /// `Ok` reply carrying that status.
    async fn send(&self, call: UpstreamCall) -> Result<UpstreamReply>;
}

#[async_trait]
impl<T: Upstream + ?Sized> Upstream for std::sync::Arc<T> {
    async fn send(&self, call: UpstreamCall) -> Result<UpstreamReply> {
        (**self).send(call).await
    }
}

/// Production transport: reqwest with a per-variant timeout.
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, call: UpstreamCall) -> Result<UpstreamReply> {
        let mut request = if call.method == Method::POST {
            self.client.post(&call.url)
        } else {
            self.client.get(&call.url)
        };

        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        for (name, value) in &call.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to read upstream body: {}", e)))?;

        Ok(UpstreamReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_goes_into_authorization_header() {
        let mut call = UpstreamCall::post_json("https://up.example/v1", serde_json::json!({}));
        AuthScheme::Bearer.apply("sk-123", &mut call);
        assert!(call
            .headers
            .contains(&("authorization".to_string(), "Bearer sk-123".to_string())));
        assert!(call.query.is_empty());
    }

    #[test]
    fn test_custom_header_scheme() {
        let mut call = UpstreamCall::post_json("https://up.example/v1", serde_json::json!({}));
        AuthScheme::Header("api-subscription-key").apply("sub-9", &mut call);
        assert!(call
            .headers
            .contains(&("api-subscription-key".to_string(), "sub-9".to_string())));
    }

    #[test]
    fn test_query_scheme_never_touches_headers() {
        let mut call = UpstreamCall::get("https://data.example/resource");
        AuthScheme::Query("api-key").apply("key-1", &mut call);
        assert!(call
            .query
            .contains(&("api-key".to_string(), "key-1".to_string())));
        assert!(call.headers.is_empty());
    }

    #[test]
    fn test_reply_success_range() {
        assert!(UpstreamReply { status: 200, body: String::new() }.is_success());
        assert!(UpstreamReply { status: 204, body: String::new() }.is_success());
        assert!(!UpstreamReply { status: 429, body: String::new() }.is_success());
        assert!(!UpstreamReply { status: 500, body: String::new() }.is_success());
    }
}
