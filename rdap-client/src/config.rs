//! Client-wide and per-query configuration.

use std::time::Duration;

use crate::cancel::Cancellation;
use crate::redact::RedactionPolicy;
use crate::retry::RetryPolicy;
use crate::ssrf::SsrfPolicy;

/// Configuration fixed for the lifetime of an [`crate::RdapClient`]:
/// network timeouts, retry behavior, SSRF policy, cache sizing, and the
/// default redaction policy applied to every query unless overridden by
/// [`QueryOptions`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub ssrf_policy: SsrfPolicy,
    pub redaction_policy: RedactionPolicy,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    /// Whether the normalizer is permitted to retain a copy of the raw
    /// server JSON on normalized responses at all. When `false`, no raw
    /// blob is ever parsed into a cached entry, regardless of what a
    /// per-call [`RedactionPolicy`] would otherwise allow a caller to see.
    pub capture_raw_response: bool,
}

#[buildstructor::buildstructor]
impl ClientConfig {
    #[builder]
    pub fn new(
        user_agent: Option<String>,
        request_timeout: Option<Duration>,
        retry_policy: Option<RetryPolicy>,
        ssrf_policy: Option<SsrfPolicy>,
        redaction_policy: Option<RedactionPolicy>,
        cache_capacity: Option<usize>,
        cache_ttl: Option<Duration>,
        capture_raw_response: Option<bool>,
    ) -> Self {
        Self {
            user_agent: user_agent.unwrap_or_else(|| "rdap-client".to_string()),
            request_timeout: request_timeout.unwrap_or(Duration::from_secs(30)),
            retry_policy: retry_policy.unwrap_or_default(),
            ssrf_policy: ssrf_policy.unwrap_or_default(),
            redaction_policy: redaction_policy.unwrap_or_default(),
            cache_capacity: cache_capacity.unwrap_or(1000),
            cache_ttl: cache_ttl.unwrap_or(Duration::from_secs(3600)),
            capture_raw_response: capture_raw_response.unwrap_or(true),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Per-call overrides. Everything here defaults to following the client's
/// configuration; set a field to change just that query's behavior.
#[derive(Clone, Debug, Default)]
pub struct QueryOptions {
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
    pub redaction_policy: Option<RedactionPolicy>,
    pub bypass_cache: bool,
    /// Extra headers sent with the outbound RDAP request (not the
    /// bootstrap fetch), e.g. a caller-specific correlation id.
    pub extra_headers: Vec<(String, String)>,
    /// Cooperative cancellation signal observed at every suspension point
    /// of this call. Defaults to a signal that never fires.
    pub cancellation: Cancellation,
}

#[buildstructor::buildstructor]
impl QueryOptions {
    #[builder]
    pub fn new(
        timeout: Option<Duration>,
        max_attempts: Option<u32>,
        redaction_policy: Option<RedactionPolicy>,
        bypass_cache: Option<bool>,
        extra_headers: Option<Vec<(String, String)>>,
        cancellation: Option<Cancellation>,
    ) -> Self {
        Self {
            timeout,
            max_attempts,
            redaction_policy,
            bypass_cache: bypass_cache.unwrap_or(false),
            extra_headers: extra_headers.unwrap_or_default(),
            cancellation: cancellation.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn GIVEN_no_overrides_WHEN_default_config_built_THEN_sane_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.user_agent, "rdap-client");
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.retry_policy.max_attempts, 3);
    }

    #[test]
    fn GIVEN_custom_user_agent_WHEN_build_THEN_applied() {
        let config = ClientConfig::builder().user_agent("my-app/1.0".to_string()).build();
        assert_eq!(config.user_agent, "my-app/1.0");
    }

    #[test]
    fn GIVEN_bypass_cache_WHEN_query_options_built_THEN_true() {
        let options = QueryOptions::builder().bypass_cache(true).build();
        assert!(options.bypass_cache);
    }

    #[test]
    fn GIVEN_no_overrides_WHEN_query_options_built_THEN_bypass_cache_false() {
        let options = QueryOptions::builder().build();
        assert!(!options.bypass_cache);
    }
}
