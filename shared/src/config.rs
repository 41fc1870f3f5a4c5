//! Configuration and credential lookup for the relay Lambda functions.
//!
//! Handlers never read ambient environment state mid-request; they are
//! constructed with a [`CredentialSource`] so tests can inject fakes.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Looks up named secrets at request time.
pub trait CredentialSource: Send + Sync {
    /// Returns the credential, or `None` when it is unset or empty.
    fn get(&self, name: &str) -> Option<String>;
}

/// Production credential source backed by process environment variables.
///
/// An empty value is treated the same as an unset one: both mean the
/// deployment is misconfigured and no upstream call may be attempted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok().filter(|value| !value.trim().is_empty())
    }
}

/// Map-backed credential source for tests.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl CredentialSource for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Read an environment variable, falling back to a default.
pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a duration in whole seconds from the environment, falling back to a
/// default. Unparsable values fall back rather than erroring.
pub fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}
