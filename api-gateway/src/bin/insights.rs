//! Insights Lambda - Serves the precomputed dashboard summary.
//!
//! No upstream call and no credential; the summary is recomputed offline
//! when the source CSVs are refreshed.

use lambda_http::http::Method;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use shared::http::{error_response, json_response, preflight_response};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct InsightsSummary {
    total_enrolments: u64,
    top_state: &'static str,
    trend: &'static str,
    prediction_2027: u64,
}

const SUMMARY: InsightsSummary = InsightsSummary {
    total_enrolments: 1_450_000,
    top_state: "Maharashtra",
    trend: "Increasing",
    prediction_2027: 1_600_000,
};

async fn handler(event: Request) -> Result<Response<Body>, Error> {
    if event.method() == Method::OPTIONS {
        return preflight_response();
    }
    if event.method() != Method::GET {
        return error_response(
            405,
            true,
            format!("{} is not allowed; use GET", event.method()),
            None,
        );
    }
    json_response(200, true, &SUMMARY)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    run(service_fn(handler)).await
}
