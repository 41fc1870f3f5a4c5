//! Chat Lambda - Relays dashboard chat prompts to the Groq completion API.

use lambda_http::{run, service_fn, Error};
use shared::{env_duration_secs, env_or, AuthScheme, ChatRelay, ChatTarget};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_UPSTREAM_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

const SYSTEM_PROMPT: &str = "You are an analyst for India's Aadhaar enrolment dashboard. \
    Answer questions about enrolment trends, demographic updates and district-level \
    statistics. Keep answers short and grounded in the data shown on the dashboard.";

fn target() -> ChatTarget {
    ChatTarget {
        url: env_or("CHAT_UPSTREAM_URL", DEFAULT_UPSTREAM_URL),
        auth: AuthScheme::Bearer,
        credential_var: "GROQ_API_KEY",
        model: env_or("CHAT_MODEL", DEFAULT_MODEL),
        system_prompt: Some(SYSTEM_PROMPT.to_string()),
        temperature: 0.7,
        max_tokens: 1024,
        prompt_fields: &["prompt", "message"],
        cors: true,
        timeout: env_duration_secs("CHAT_TIMEOUT_SECS", 30),
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
