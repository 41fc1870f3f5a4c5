//! Keepalive Lambda - Pings the dashboard deployments on a schedule.
//!
//! Free-tier dashboard hosts hibernate after a period without traffic; this
//! Lambda runs via EventBridge and issues one GET per configured URL so the
//! apps stay warm. URLs come from KEEPALIVE_URLS, comma-separated.

use chrono::Utc;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Small delay between pings to be polite to the hosts.
const PAUSE_BETWEEN_PINGS: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct ScheduledEvent {
    #[serde(default)]
    #[allow(dead_code)]
    detail_type: String,
}

#[derive(Debug, Serialize)]
struct KeepaliveReport {
    pinged: usize,
    healthy: usize,
    failed: usize,
    completed_at: String,
}

/// Split the configured URL list, dropping blanks and stray whitespace.
fn parse_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

async fn handler(
    client: &reqwest::Client,
    _event: LambdaEvent<ScheduledEvent>,
) -> Result<KeepaliveReport, Error> {
    let urls = parse_urls(&std::env::var("KEEPALIVE_URLS").unwrap_or_default());
    if urls.is_empty() {
        warn!("KEEPALIVE_URLS is empty, nothing to ping");
    }

    let mut healthy = 0usize;
    let mut failed = 0usize;

    for (index, url) in urls.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(PAUSE_BETWEEN_PINGS).await;
        }
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                info!(url = %url, "ping ok");
                healthy += 1;
            }
            Ok(response) => {
                warn!(
                    url = %url,
                    status = response.status().as_u16(),
                    "ping returned a non-success status"
                );
                failed += 1;
            }
            Err(e) => {
                error!(url = %url, error = %e, "ping failed");
                failed += 1;
            }
        }
    }

    info!(
        pinged = urls.len(),
        healthy, failed, "keepalive cycle finished"
    );

    Ok(KeepaliveReport {
        pinged: urls.len(),
        healthy,
        failed,
        completed_at: Utc::now().to_rfc3339(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    run(service_fn(move |event| {
        let client = client.clone();
        async move { handler(&client, event).await }
    }))
    .await
}
