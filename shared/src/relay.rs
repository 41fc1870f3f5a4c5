//! The parameterized chat relay.
//!
//! Every chat handler is the same linear pipeline (preflight, method gate,
//! body parse, field extraction, credential check, one upstream call,
//! response mapping), differing only in the [`ChatTarget`] it is built with.

use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, warn};

use crate::config::{CredentialSource, EnvCredentials};
use crate::http::{self, ReplyBody};
use crate::llm::{self, ChatCompletionRequest, ChatMessage};
use crate::upstream::{AuthScheme, HttpUpstream, Upstream, UpstreamCall, UpstreamReply};
use crate::{Error, Result};

/// Everything that distinguishes one chat relay deployment from another.
#[derive(Debug, Clone)]
pub struct ChatTarget {
    /// Upstream chat-completion endpoint.
    pub url: String,
    /// How the credential is attached to the outbound call.
    pub auth: AuthScheme,
    /// Name of the credential in the process configuration.
    pub credential_var: &'static str,
    /// Model identifier sent in the payload.
    pub model: String,
    /// Optional system prompt, sent ahead of the user's text.
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Accepted body key names for the user's text; first match wins.
    pub prompt_fields: &'static [&'static str],
    /// Whether this variant answers OPTIONS preflights and sends CORS headers.
    pub cors: bool,
    /// Upstream request timeout.
    pub timeout: Duration,
}

/// One chat relay instance, generic over its transport and credential seams.
pub struct ChatRelay<U = HttpUpstream, C = EnvCredentials> {
    target: ChatTarget,
    upstream: U,
    credentials: C,
}

impl ChatRelay {
    /// Production relay: reqwest transport, environment credentials.
    pub fn new(target: ChatTarget) -> Result<Self> {
        let upstream = HttpUpstream::new(target.timeout)?;
        Ok(Self {
            target,
            upstream,
            credentials: EnvCredentials,
        })
    }
}

impl<U: Upstream, C: CredentialSource> ChatRelay<U, C> {
    /// Assemble a relay from explicit parts. Tests use this to inject a
    /// counting mock transport and a map-backed credential source.
    pub fn with_parts(target: ChatTarget, upstream: U, credentials: C) -> Self {
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
                error!(error = %err, "chat relay failed before completion");
                http::failure_response(&err, self.target.cors)
            }
        }
    }

    /// Validate the request and issue the single upstream call.
    ///
    /// Every failure before the call returns without touching the network.
    async fn run(&self, event: &Request) -> Result<UpstreamReply> {
        if event.method() != Method::POST {
            return Err(Error::MethodNotAllowed(format!(
                "{} is not allowed; use POST",
                event.method()
            )));
        }

        let payload: Value = http::parse_json_body(event.body())?;
        let prompt = self.extract_prompt(&payload)?;

        let var = self.target.credential_var;
        let credential = self.credentials.get(var).ok_or_else(|| {
            error!(credential = var, "credential missing from configuration");
            Error::Config(format!("Server misconfiguration: {} is not set", var))
        })?;

        let call = self.build_call(&credential, prompt)?;
        self.upstream.send(call).await
    }

    /// Pull the user's text from the first accepted field that holds a
    /// non-empty string.
    fn extract_prompt(&self, payload: &Value) -> Result<String> {
        for field in self.target.prompt_fields {
            if let Some(text) = payload.get(*field).and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    return Ok(text.to_string());
                }
            }
        }
        Err(Error::Validation(format!(
            "Missing required field: {}",
            self.target.prompt_fields.join(" or ")
        )))
    }

    fn build_call(&self, credential: &str, prompt: String) -> Result<UpstreamCall> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.target.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatCompletionRequest {
            model: self.target.model.clone(),
            messages,
            temperature: self.target.temperature,
            max_tokens: self.target.max_tokens,
        };

        let mut call = UpstreamCall::post_json(self.target.url.clone(), serde_json::to_value(&request)?);
        self.target.auth.apply(credential, &mut call);
        Ok(call)
    }

    /// Map the upstream reply to the outbound response.
    fn render(
        &self,
        reply: UpstreamReply,
    ) -> std::result::Result<Response<Body>, lambda_http::Error> {
        if !reply.is_success() {
            let details =
                llm::extract_error_message(&reply.body).unwrap_or_else(|| reply.body.clone());
            error!(
                status = reply.status,
                body = %reply.body,
                "upstream returned an error status"
            );
            return http::error_response(reply.status, self.target.cors, "Upstream error", Some(details));
        }

        let text = llm::extract_reply(&reply.body).unwrap_or_else(|| {
            warn!("upstream reply carried no completion text, substituting placeholder");
            llm::EMPTY_REPLY.to_string()
        });
        http::json_response(200, self.target.cors, &ReplyBody { reply: text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticCredentials;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    enum Scripted {
        Reply(UpstreamReply),
        Fault(String),
    }

    struct MockUpstream {
        calls: AtomicUsize,
        captured: Mutex<Vec<UpstreamCall>>,
        scripted: Scripted,
    }

    impl MockUpstream {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                captured: Mutex::new(Vec::new()),
                scripted: Scripted::Reply(UpstreamReply {
                    status,
                    body: body.to_string(),
                }),
            })
        }

        fn failing(fault: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                captured: Mutex::new(Vec::new()),
                scripted: Scripted::Fault(fault.to_string()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Upstream for MockUpstream {
        async fn send(&self, call: UpstreamCall) -> Result<UpstreamReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = match &self.scripted {
                Scripted::Reply(reply) => Ok(reply.clone()),
                Scripted::Fault(fault) => Err(Error::Upstream(fault.clone())),
            };
            self.captured.lock().unwrap().push(call);
            reply
        }
    }

    fn target(cors: bool) -> ChatTarget {
        ChatTarget {
            url: "https://chat.upstream.test/v1/chat/completions".to_string(),
            auth: AuthScheme::Bearer,
            credential_var: "TEST_CHAT_API_KEY",
            model: "test-model".to_string(),
            system_prompt: Some("You are an enrolment analyst.".to_string()),
            temperature: 0.7,
            max_tokens: 1024,
            prompt_fields: &["prompt", "message"],
            cors,
            timeout: Duration::from_secs(30),
        }
    }

    fn credentials() -> StaticCredentials {
        StaticCredentials::new([("TEST_CHAT_API_KEY", "sk-test")])
    }

    fn request(method: &str, body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri("/api/chat")
            .body(Body::from(body))
            .unwrap()
    }

    fn body_json(response: &Response<Body>) -> Value {
        serde_json::from_slice(response.body().as_ref()).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_non_post_without_calling_upstream() {
        let mock = MockUpstream::replying(200, "{}");
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        let response = relay.handle(request("GET", "")).await.unwrap();

        assert_eq!(response.status(), 405);
        assert!(body_json(&response)["error"]
            .as_str()
            .unwrap()
            .contains("use POST"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_options_preflight_answers_locally() {
        let mock = MockUpstream::replying(200, "{}");
        let relay = ChatRelay::with_parts(target(true), Arc::clone(&mock), credentials());

        let response = relay.handle(request("OPTIONS", "")).await.unwrap();

        assert_eq!(response.status(), 200);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET, OPTIONS, POST");
        assert_eq!(
            headers["access-control-allow-headers"],
            "Content-Type, Authorization"
        );
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_options_is_405_when_variant_has_no_preflight() {
        let mock = MockUpstream::replying(200, "{}");
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        let response = relay.handle(request("OPTIONS", "")).await.unwrap();

        assert_eq!(response.status(), 405);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400_not_500() {
        let mock = MockUpstream::replying(200, "{}");
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        let response = relay.handle(request("POST", "{not json")).await.unwrap();

        assert_eq!(response.status(), 400);
        assert!(body_json(&response).get("error").is_some());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_prompt_field_is_400() {
        let mock = MockUpstream::replying(200, "{}");
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        for body in [r#"{}"#, r#"{"question":"hi"}"#, r#"{"prompt":5}"#, r#"{"prompt":"  "}"#] {
            let response = relay.handle(request("POST", body)).await.unwrap();
            assert_eq!(response.status(), 400, "body {} should be rejected", body);
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_first_matching_field_wins() {
        let mock = MockUpstream::replying(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        relay
            .handle(request(
                "POST",
                r#"{"message":"second choice","prompt":"first choice"}"#,
            ))
            .await
            .unwrap();

        let captured = mock.captured.lock().unwrap();
        let body = captured[0].body.as_ref().unwrap();
        assert_eq!(body["messages"][1]["content"], "first choice");
    }

    #[tokio::test]
    async fn test_missing_credential_is_500_and_no_call() {
        let mock = MockUpstream::replying(200, "{}");
        let relay =
            ChatRelay::with_parts(target(false), Arc::clone(&mock), StaticCredentials::default());

        let response = relay
            .handle(request("POST", r#"{"prompt":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        assert!(body_json(&response)["error"]
            .as_str()
            .unwrap()
            .contains("TEST_CHAT_API_KEY"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_relays_upstream_error_status_and_message() {
        let mock = MockUpstream::replying(429, r#"{"error":{"message":"rate limited"}}"#);
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        let response = relay
            .handle(request("POST", r#"{"prompt":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), 429);
        let body = body_json(&response);
        assert_eq!(body["error"], "Upstream error");
        assert_eq!(body["details"], "rate limited");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_relays_raw_payload_when_upstream_error_is_opaque() {
        let mock = MockUpstream::replying(502, "bad gateway");
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        let response = relay
            .handle(request("POST", r#"{"prompt":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), 502);
        assert_eq!(body_json(&response)["details"], "bad gateway");
    }

    #[tokio::test]
    async fn test_success_reply_extracted() {
        let mock = MockUpstream::replying(200, r#"{"choices":[{"message":{"content":"hello"}}]}"#);
        let relay = ChatRelay::with_parts(target(true), Arc::clone(&mock), credentials());

        let response = relay
            .handle(request("POST", r#"{"prompt":"say hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(body_json(&response)["reply"], "hello");
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*",
            "CORS variants carry the headers on real responses too"
        );
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_shape_mismatch_degrades_to_placeholder() {
        let mock = MockUpstream::replying(200, r#"{"object":"chat.completion"}"#);
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        let response = relay
            .handle(request("POST", r#"{"prompt":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(body_json(&response)["reply"], llm::EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_transport_fault_is_500_with_details() {
        let mock = MockUpstream::failing("connection refused");
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        let response = relay
            .handle(request("POST", r#"{"prompt":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let body = body_json(&response);
        assert_eq!(body["error"], "Upstream request failed");
        assert_eq!(body["details"], "connection refused");
    }

    #[tokio::test]
    async fn test_outbound_payload_shape_and_auth() {
        let mock = MockUpstream::replying(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let relay = ChatRelay::with_parts(target(false), Arc::clone(&mock), credentials());

        relay
            .handle(request("POST", r#"{"prompt":"How many enrolments in 2026?"}"#))
            .await
            .unwrap();

        let captured = mock.captured.lock().unwrap();
        let call = &captured[0];
        assert_eq!(call.url, "https://chat.upstream.test/v1/chat/completions");
        assert!(call
            .headers
            .contains(&("authorization".to_string(), "Bearer sk-test".to_string())));

        let body = call.body.as_ref().unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "How many enrolments in 2026?");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["max_tokens"], 1024);
    }

    #[tokio::test]
    async fn test_system_prompt_omitted_when_unset() {
        let mut bare = target(false);
        bare.system_prompt = None;
        let mock = MockUpstream::replying(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let relay = ChatRelay::with_parts(bare, Arc::clone(&mock), credentials());

        relay
            .handle(request("POST", r#"{"prompt":"hi"}"#))
            .await
            .unwrap();

        let captured = mock.captured.lock().unwrap();
        let messages = captured[0].body.as_ref().unwrap()["messages"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }
}
