//! Insight Chat Lambda - Relays insight questions to the Sarvam AI chat API.
//!
//! Sarvam authenticates with an `api-subscription-key` header rather than a
//! bearer token; the payload shape is the common OpenAI-compatible one.

use lambda_http::{run, service_fn, Error};
use shared::{env_duration_secs, env_or, AuthScheme, ChatRelay, ChatTarget};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_UPSTREAM_URL: &str = "https://api.sarvam.ai/v1/chat/completions";
const DEFAULT_MODEL: &str = "sarvam-m";

const SYSTEM_PROMPT: &str = "Explain the selected Aadhaar enrolment insight in plain \
    language for a policy audience. Two or three sentences, no speculation beyond the \
    numbers provided.";

fn target() -> ChatTarget {
    ChatTarget {
        url: env_or("INSIGHT_CHAT_UPSTREAM_URL", DEFAULT_UPSTREAM_URL),
        auth: AuthScheme::Header("api-subscription-key"),
        credential_var: "SARVAM_API_KEY",
        model: env_or("INSIGHT_CHAT_MODEL", DEFAULT_MODEL),
        system_prompt: Some(SYSTEM_PROMPT.to_string()),
        temperature: 0.4,
        max_tokens: 512,
        prompt_fields: &["message"],
        cors: true,
        timeout: env_duration_secs("INSIGHT_CHAT_TIMEOUT_SECS", 30),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let relay = Arc::new(ChatRelay::new(target())?);

    run(service_fn(move |event| {
        let relay = Arc::clone(&relay);
        async move { relay.handle(event).await }
    }))
    .await
}
