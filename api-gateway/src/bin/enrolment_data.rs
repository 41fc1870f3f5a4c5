//! Enrolment Data Lambda - Proxies the api.data.gov.in enrolment resource.
//!
//! The resource id is deployment-specific; override the full URL with
//! DATA_GOV_RESOURCE_URL. Successful responses carry an advisory cache
//! header so the CDN can absorb dashboard refreshes.

use lambda_http::{run, service_fn, Error};
use shared::{env_duration_secs, env_or, AuthScheme, DataRelay, DataTarget};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_RESOURCE_URL: &str =
    "https://api.data.gov.in/resource/4e1137b6-8b24-41d1-a99e-0ef2f7b1a232";

fn target() -> DataTarget {
    DataTarget {
        url: env_or("DATA_GOV_RESOURCE_URL", DEFAULT_RESOURCE_URL),
        auth: AuthScheme::Query("api-key"),
        credential_var: "DATA_GOV_API_KEY",
        default_limit: 100,
        default_state: "Maharashtra".to_string(),
        cache_control: Some("s-maxage=60, stale-while-revalidate"),
        cors: true,
        timeout: env_duration_secs("DATA_GOV_TIMEOUT_SECS", 30),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let relay = Arc::new(DataRelay::new(target())?);

    run(service_fn(move |event| {
        let relay = Arc::clone(&relay);
        async move { relay.handle(event).await }
    }))
    .await
}
