#![doc = "An RDAP client: bootstrap discovery, SSRF-hardened fetching, response normalization, and PII redaction."]

pub mod bootstrap;
pub mod cache;
pub mod cancel;
pub mod client;
pub mod config;
pub mod fetch;
pub mod normalize;
pub mod redact;
pub mod retry;
pub mod ssrf;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use client::RdapClient;
pub use config::{ClientConfig, QueryOptions};

pub mod prelude {
    pub use crate::client::RdapClient;
    pub use crate::config::{ClientConfig, QueryOptions};
    pub use crate::RdapClientError;
    pub use rdap_client_common::response::{AsnResponse, DomainResponse, IpResponse, RdapObject};
}

/// Every error this crate can surface to a caller, with the wall-clock
/// moment it was raised so a caller logging these can reconstruct a
/// timeline without needing to timestamp at the call site.
#[derive(Error, Debug)]
pub enum RdapClientError {
    #[error("'{input}' is not a valid query value: {reason}")]
    InvalidInput {
        input: String,
        reason: String,
        at: DateTime<Utc>,
    },

    #[error("request blocked by SSRF policy: {reason}")]
    SsrfBlocked { reason: String, at: DateTime<Utc> },

    /// The relevant IANA bootstrap table has never successfully loaded (no
    /// stale copy to fall back on) and the registry could not be reached.
    #[error("bootstrap registry is unavailable")]
    BootstrapUnavailable { at: DateTime<Utc> },

    /// The bootstrap table loaded fine but no entry in it covers this
    /// query value, so there is no authoritative server to ask.
    #[error("no authoritative rdap server is known for this query")]
    NoAuthoritativeServer { at: DateTime<Utc> },

    #[error("object not found")]
    NotFound { at: DateTime<Utc> },

    #[error("server rejected the request with status {status}")]
    ServerRejected { status: u16, at: DateTime<Utc> },

    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32, at: DateTime<Utc> },

    #[error("network error: {message}")]
    NetworkError { message: String, at: DateTime<Utc> },

    #[error("malformed response at '{path}': {reason}")]
    MalformedResponse {
        path: String,
        reason: String,
        at: DateTime<Utc>,
    },

    #[error("request was cancelled")]
    Cancelled { at: DateTime<Utc> },
}

impl RdapClientError {
    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            reason: reason.into(),
            at: Utc::now(),
        }
    }

    pub fn ssrf_blocked(reason: impl Into<String>) -> Self {
        Self::SsrfBlocked {
            reason: reason.into(),
            at: Utc::now(),
        }
    }

    pub fn bootstrap_unavailable() -> Self {
        Self::BootstrapUnavailable { at: Utc::now() }
    }

    pub fn no_authoritative_server() -> Self {
        Self::NoAuthoritativeServer { at: Utc::now() }
    }

    pub fn not_found() -> Self {
        Self::NotFound { at: Utc::now() }
    }

    pub fn server_rejected(status: u16) -> Self {
        Self::ServerRejected {
            status,
            at: Utc::now(),
        }
    }

    pub fn timeout(attempts: u32) -> Self {
        Self::Timeout {
            attempts,
            at: Utc::now(),
        }
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn malformed_response(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            path: path.into(),
            reason: reason.into(),
            at: Utc::now(),
        }
    }

    pub fn cancelled() -> Self {
        Self::Cancelled { at: Utc::now() }
    }

    /// Whether this error represents a condition a retry could plausibly
    /// resolve (network hiccup, timeout, 5xx except 501, 429) as opposed to
    /// one that is terminal for this query (bad input, SSRF block, 4xx
    /// except 429, 451).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError { .. } | Self::Timeout { .. } => true,
            Self::ServerRejected { status, .. } => {
                *status == 429 || (*status >= 500 && *status != 501)
            }
            _ => false,
        }
    }
}
