//! Shared library for the Aadhaar insights relay Lambda functions.
//!
//! This crate provides the common relay machinery used across all handler
//! binaries: the error taxonomy, HTTP/CORS response helpers, credential
//! lookup, the outbound transport seam, and the two parameterized relay
//! engines (chat completion and open-data proxy).

pub mod config;
pub mod datagov;
pub mod error;
pub mod http;
pub mod llm;
pub mod relay;
pub mod upstream;

pub use config::{env_duration_secs, env_or, CredentialSource, EnvCredentials};
pub use datagov::{DataRelay, DataTarget};
pub use error::{Error, Result};
pub use http::{ErrorBody, ReplyBody};
pub use llm::EMPTY_REPLY;
pub use relay::{ChatRelay, ChatTarget};
pub use upstream::{AuthScheme, HttpUpstream, Upstream, UpstreamCall, UpstreamReply};
