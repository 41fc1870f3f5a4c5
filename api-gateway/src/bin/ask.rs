//! Ask Lambda - Relays free-form questions to OpenRouter.
//!
//! Unlike the dashboard chat handler this one sits behind the site's own
//! proxy, so it answers no preflights and sends no CORS headers.

use lambda_http::{run, service_fn, Error};
use shared::{env_duration_secs, env_or, AuthScheme, ChatRelay, ChatTarget};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_UPSTREAM_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

const SYSTEM_PROMPT: &str = "You answer questions about India's Aadhaar enrolment and \
    demographic update statistics. Be factual and concise; say so when the data cannot \
    answer the question.";

fn target() -> ChatTarget {
    ChatTarget {
        url: env_or("ASK_UPSTREAM_URL", DEFAULT_UPSTREAM_URL),
        auth: AuthScheme::Bearer,
        credential_var: "OPENROUTER_API_KEY",
        model: env_or("ASK_MODEL", DEFAULT_MODEL),
        system_prompt: Some(SYSTEM_PROMPT.to_string()),
        temperature: 0.5,
        max_tokens: 800,
        prompt_fields: &["prompt", "message"],
        cors: false,
        timeout: env_duration_secs("ASK_TIMEOUT_SECS", 30),
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
