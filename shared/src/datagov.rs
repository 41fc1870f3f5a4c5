//! GET proxy for api.data.gov.in open-data resources.
//!
//! Same skeleton as the chat relay, but the inbound surface is query
//! parameters and the 2xx upstream payload is passed through verbatim.

use lambda_http::http::Method;
use lambda_http::{Body, Request, RequestExt, Response};
use std::time::Duration;
use tracing::error;

use crate::config::{CredentialSource, EnvCredentials};
use crate::http;
use crate::llm::extract_error_message;
use crate::upstream::{AuthScheme, HttpUpstream, Upstream, UpstreamCall, UpstreamReply};
use crate::{Error, Result};

/// Configuration for one open-data proxy deployment.
#[derive(Debug, Clone)]
pub struct DataTarget {
    /// Upstream resource URL.
    pub url: String,
    /// How the API key is attached (query parameter for data.gov.in).
    pub auth: AuthScheme,
    /// Name of the credential in the process configuration.
    pub credential_var: &'static str,
    /// Record cap applied when the caller does not send `limit`.
    pub default_limit: u32,
    /// State filter applied when the caller does not send `state`.
    pub default_state: String,
    /// Advisory cache header attached to successful responses.
    pub cache_control: Option<&'static str>,
    pub cors: bool,
    pub timeout: Duration,
}

/// One data proxy instance, generic over its transport and credential seams.
pub struct DataRelay<U = HttpUpstream, C = EnvCredentials> {
    target: DataTarget,
    upstream: U,
    credentials: C,
}

impl DataRelay {
    pub fn new(target: DataTarget) -> Result<Self> {
        let upstream = HttpUpstream::new(target.timeout)?;
        Ok(Self {
            target,
            upstream,
            credentials: EnvCredentials,
        })
    }
}

impl<U: Upstream, C: CredentialSource> DataRelay<U, C> {
    pub fn with_parts(target: DataTarget, upstream: U, credentials: C) -> Self {
        Self {
            target,
            upstream,
            credentials,
        }
    }

    /// Handle one inbound request, always producing exactly one response.
    pub async fn handle(
        &self,
        event: Request,
    ) -> std::result::Result<Response<Body>, lambda_http::Error> {
        if self.target.cors && event.method() == Method::OPTIONS {
            return http::preflight_response();
        }

        match self.run(&event).await {
            Ok(reply) => self.render(reply),
            Err(err) => {
                error!(error = %err, "data proxy failed before completion");
                http::failure_response(&err, self.target.cors)
            }
        }
    }

    async fn run(&self, event: &Request) -> Result<UpstreamReply> {
        if event.method() != Method::GET {
            return Err(Error::MethodNotAllowed(format!(
                "{} is not allowed; use GET",
                event.method()
            )));
        }

        let params = event.query_string_parameters();
        // Lenient parsing: a garbage limit falls back to the default.
        let limit = params
            .first("limit")
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(self.target.default_limit);
        let state = params
            .first("state")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(&self.target.default_state)
            .to_string();

        let var = self.target.credential_var;
        let credential = self.credentials.get(var).ok_or_else(|| {
            error!(credential = var, "credential missing from configuration");
            Error::Config(format!("Server misconfiguration: {} is not set", var))
        })?;

        let mut call = UpstreamCall::get(self.target.url.clone());
        call.query.push(("format".to_string(), "json".to_string()));
        call.query.push(("limit".to_string(), limit.to_string()));
        call.query.push(("filters[state]".to_string(), state));
        self.target.auth.apply(&credential, &mut call);

        self.upstream.send(call).await
    }

    fn render(
        &self,
        reply: UpstreamReply,
    ) -> std::result::Result<Response<Body>, lambda_http::Error> {
        if !reply.is_success() {
            let details = extract_error_message(&reply.body).unwrap_or_else(|| reply.body.clone());
            error!(
                status = reply.status,
                body = %reply.body,
                "open-data upstream returned an error status"
            );
            return http::error_response(reply.status, self.target.cors, "Upstream error", Some(details));
        }

        http::passthrough_response(self.target.cors, self.target.cache_control, reply.body)
    }
}
