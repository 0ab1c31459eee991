//! HTTP fetching: RFC 7482 path construction, SSRF-guarded connection
//! (re-validated on every redirect hop), failover across the bootstrap's
//! candidate base URLs, retry/backoff across the whole list, and
//! status-code branching into [`RdapClientError`] variants.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use pct_str::{PctString, URIReserved};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::warn;

use rdap_client_common::media_types::RDAP_ACCEPT_HEADER;

use crate::cancel::Cancellation;
use crate::retry::{retry_after_override, RetryPolicy};
use crate::ssrf::{validate_resolved_addresses, validate_url, SsrfPolicy};
use crate::RdapClientError;

/// Below this much remaining deadline budget, no further attempt starts;
/// the call returns `Timeout` instead (spec's minimum attempt budget).
const MIN_ATTEMPT_BUDGET: Duration = Duration::from_millis(100);

/// Per-call context threaded through a single `domain()`/`ip()`/`asn()`
/// invocation: the wall-clock deadline the whole call must finish by, an
/// optional override of the client's configured retry attempt count,
/// additional headers to send, and the cancellation signal to observe at
/// every suspension point.
pub struct RequestContext {
    pub deadline: Instant,
    pub max_attempts: Option<u32>,
    pub extra_headers: Vec<(String, String)>,
    pub cancellation: Cancellation,
}

impl RequestContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            max_attempts: None,
            extra_headers: Vec::new(),
            cancellation: Cancellation::none(),
        }
    }

    fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Whether a failed attempt should fail over to the next candidate base
/// URL (within the same overall attempt) or is terminal for the whole
/// call.
enum AttemptOutcome {
    Success(Value),
    Failover(RdapClientError),
    Terminal(RdapClientError),
}

pub struct Fetcher {
    user_agent: String,
    ssrf_policy: SsrfPolicy,
    retry_policy: RetryPolicy,
    timeout: Duration,
    max_body_bytes: u64,
}

impl Fetcher {
    pub fn new(
        user_agent: String,
        ssrf_policy: SsrfPolicy,
        retry_policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            user_agent,
            ssrf_policy,
            retry_policy,
            timeout,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }

    pub async fn fetch_domain(
        &self,
        base_urls: &[String],
        ldh_name: &str,
        ctx: &RequestContext,
    ) -> Result<Value, RdapClientError> {
        let path = format!("domain/{}", PctString::encode(ldh_name.chars(), URIReserved));
        self.fetch_with_failover(base_urls, &path, ctx).await
    }

    pub async fn fetch_ip(
        &self,
        base_urls: &[String],
        address: &str,
        ctx: &RequestContext,
    ) -> Result<Value, RdapClientError> {
        let path = format!("ip/{}", PctString::encode(address.chars(), URIReserved));
        self.fetch_with_failover(base_urls, &path, ctx).await
    }

    pub async fn fetch_asn(
        &self,
        base_urls: &[String],
        asn: u32,
        ctx: &RequestContext,
    ) -> Result<Value, RdapClientError> {
        let path = format!("autnum/{asn}");
        self.fetch_with_failover(base_urls, &path, ctx).await
    }

    /// Drives the whole pipeline for one query: each attempt walks the
    /// candidate base URL list in order, failing over to the next entry on
    /// a transient per-URL problem; once every URL in the list has been
    /// tried and none succeeded, the retry policy's backoff is applied and
    /// the whole list is retried, up to the configured attempt count.
    async fn fetch_with_failover(
        &self,
        base_urls: &[String],
        path: &str,
        ctx: &RequestContext,
    ) -> Result<Value, RdapClientError> {
        if base_urls.is_empty() {
            return Err(RdapClientError::no_authoritative_server());
        }
        let max_attempts = ctx.max_attempts.unwrap_or(self.retry_policy.max_attempts).max(1);

        let mut last_error: Option<RdapClientError> = None;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            for base_url in base_urls {
                if ctx.cancellation.is_cancelled() {
                    return Err(RdapClientError::cancelled());
                }
                if ctx.remaining() < MIN_ATTEMPT_BUDGET {
                    return Err(RdapClientError::timeout(attempt));
                }
                let base = base_url.trim_end_matches('/');
                let url = format!("{base}/{path}");
                match self.fetch_following_redirects(&url, ctx).await {
                    AttemptOutcome::Success(value) => return Ok(value),
                    AttemptOutcome::Terminal(e) => return Err(e),
                    AttemptOutcome::Failover(e) => {
                        warn!(%url, error = %e, "failing over to next candidate base url");
                        last_error = Some(e);
                        continue;
                    }
                }
            }

            if attempt >= max_attempts {
                return Err(last_error.unwrap_or_else(|| RdapClientError::timeout(attempt)));
            }
            let delay = self.retry_policy.delay_for(attempt).min(ctx.remaining());
            warn!(attempt, ?delay, "candidate list exhausted, backing off before retry");
            if ctx.cancellation.race(tokio::time::sleep(delay)).await.is_none() {
                return Err(RdapClientError::cancelled());
            }
        }
    }

    /// Follows redirects for a single base URL, re-validating SSRF policy
    /// on every hop, honoring `Retry-After` for 429/503 in place, and
    /// classifying the final outcome per RFC 7482/7483 status handling.
    async fn fetch_following_redirects(&self, url_str: &str, ctx: &RequestContext) -> AttemptOutcome {
        let mut current = url_str.to_string();
        for _ in 0..=self.ssrf_policy.max_redirects {
            if ctx.cancellation.is_cancelled() {
                return AttemptOutcome::Terminal(RdapClientError::cancelled());
            }
            let outcome = match self.single_request(&current, ctx).await {
                Ok(outcome) => outcome,
                Err(e @ RdapClientError::SsrfBlocked { .. }) => return AttemptOutcome::Terminal(e),
                Err(e @ RdapClientError::Cancelled { .. }) => return AttemptOutcome::Terminal(e),
                Err(e) => return AttemptOutcome::Failover(e),
            };

            match outcome.status {
                status if status.is_success() => {
                    return self.parse_body(&outcome.body);
                }
                StatusCode::NOT_FOUND => {
                    return AttemptOutcome::Terminal(RdapClientError::not_found());
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if let Some(delay) = outcome.retry_after.as_deref().and_then(retry_after_override) {
                        if ctx.cancellation.race(tokio::time::sleep(delay)).await.is_none() {
                            return AttemptOutcome::Terminal(RdapClientError::cancelled());
                        }
                        continue;
                    }
                    return AttemptOutcome::Failover(RdapClientError::server_rejected(429));
                }
                StatusCode::SERVICE_UNAVAILABLE => {
                    if let Some(delay) = outcome.retry_after.as_deref().and_then(retry_after_override) {
                        if ctx.cancellation.race(tokio::time::sleep(delay)).await.is_none() {
                            return AttemptOutcome::Terminal(RdapClientError::cancelled());
                        }
                        continue;
                    }
                    return AttemptOutcome::Failover(RdapClientError::server_rejected(503));
                }
                status if status.is_redirection() => {
                    let location = match outcome.location {
                        Some(l) => l,
                        None => {
                            return AttemptOutcome::Failover(RdapClientError::network_error(
                                "redirect response had no Location header",
                            ))
                        }
                    };
                    let base = match reqwest::Url::parse(&current) {
                        Ok(b) => b,
                        Err(e) => return AttemptOutcome::Failover(RdapClientError::network_error(e.to_string())),
                    };
                    let next = match base.join(&location) {
                        Ok(n) => n,
                        Err(e) => return AttemptOutcome::Failover(RdapClientError::network_error(e.to_string())),
                    };
                    if next.scheme() != "https" {
                        return AttemptOutcome::Terminal(RdapClientError::ssrf_blocked(
                            "redirect target is not an absolute https url",
                        ));
                    }
                    current = next.to_string();
                    continue;
                }
                StatusCode::FORBIDDEN | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => {
                    // RFC 7725 (451) and an explicit 403 are registry-policy
                    // dependent: surfaced immediately unless the caller's
                    // retry policy opts into trying the next candidate.
                    let error = RdapClientError::server_rejected(status.as_u16());
                    if self.retry_policy.failover_on_legal_block {
                        return AttemptOutcome::Failover(error);
                    }
                    return AttemptOutcome::Terminal(error);
                }
                StatusCode::NOT_IMPLEMENTED => {
                    return AttemptOutcome::Terminal(RdapClientError::server_rejected(501));
                }
                status if status.is_client_error() => {
                    return AttemptOutcome::Terminal(RdapClientError::server_rejected(status.as_u16()));
                }
                status if status.is_server_error() => {
                    return AttemptOutcome::Failover(RdapClientError::server_rejected(status.as_u16()));
                }
                status => {
                    return AttemptOutcome::Failover(RdapClientError::network_error(format!(
                        "unexpected status {status}"
                    )))
                }
            }
        }
        AttemptOutcome::Failover(RdapClientError::network_error("too many redirects"))
    }

    fn parse_body(&self, body: &str) -> AttemptOutcome {
        if body.len() as u64 > self.max_body_bytes {
            return AttemptOutcome::Terminal(RdapClientError::malformed_response(
                "/",
                format!("response body exceeds {} bytes", self.max_body_bytes),
            ));
        }
        match serde_json::from_str(body) {
            Ok(value) => AttemptOutcome::Success(value),
            Err(e) => AttemptOutcome::Terminal(RdapClientError::malformed_response("/", e.to_string())),
        }
    }

    /// Performs exactly one HTTP request: validates the URL, resolves DNS
    /// and re-validates every resolved address (preventing DNS rebinding
    /// between validation and connection), pins the connection to the
    /// validated addresses, and issues the request with redirects
    /// disabled so the caller can re-validate each hop itself.
    async fn single_request(
        &self,
        url_str: &str,
        ctx: &RequestContext,
    ) -> Result<RequestOutcome, RdapClientError> {
        let url =
            validate_url(url_str, &self.ssrf_policy).map_err(|e| RdapClientError::ssrf_blocked(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| RdapClientError::network_error("url has no host"))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(443);

        let lookup = tokio::net::lookup_host((host.as_str(), port));
        let resolved: Vec<SocketAddr> = match ctx.cancellation.race(lookup).await {
            None => return Err(RdapClientError::cancelled()),
            Some(Err(e)) => return Err(RdapClientError::network_error(e.to_string())),
            Some(Ok(iter)) => iter.collect(),
        };
        validate_resolved_addresses(&resolved, &self.ssrf_policy)
            .map_err(|e| RdapClientError::ssrf_blocked(e.to_string()))?;

        // A fresh client is built per request so the DNS resolution can be
        // pinned to the addresses already validated above; reusing a
        // shared client here would let the connection re-resolve the
        // hostname after the rebinding check, defeating the point of it.
        let remaining = ctx.remaining().min(self.timeout);
        let pinned = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .https_only(url.scheme() == "https")
            .resolve_to_addrs(&host, &resolved)
            .redirect(Policy::none())
            .timeout(remaining)
            .build()
            .map_err(|e| RdapClientError::network_error(e.to_string()))?;

        let mut request = pinned.get(url).header(reqwest::header::ACCEPT, RDAP_ACCEPT_HEADER);
        for (name, value) in &ctx.extra_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let send = request.send();
        let response = match ctx.cancellation.race(send).await {
            None => return Err(RdapClientError::cancelled()),
            Some(Err(e)) => return Err(RdapClientError::network_error(e.to_string())),
            Some(Ok(r)) => r,
        };

        let status = response.status();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let text = response.text();
        let body = match ctx.cancellation.race(text).await {
            None => return Err(RdapClientError::cancelled()),
            Some(Err(e)) => return Err(RdapClientError::network_error(e.to_string())),
            Some(Ok(b)) => b,
        };

        if status.is_success() {
            let media_ok = content_type
                .as_deref()
                .map(|ct| {
                    ct.starts_with(rdap_client_common::media_types::RDAP_MEDIA_TYPE)
                        || ct.starts_with(rdap_client_common::media_types::JSON_MEDIA_TYPE)
                })
                .unwrap_or(true);
            if !media_ok {
                return Err(RdapClientError::malformed_response(
                    "/",
                    format!("unexpected content-type: {}", content_type.unwrap_or_default()),
                ));
            }
        }

        Ok(RequestOutcome {
            status,
            body,
            location,
            retry_after,
        })
    }
}

struct RequestOutcome {
    status: StatusCode,
    body: String,
    location: Option<String>,
    retry_after: Option<String>,
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn GIVEN_domain_WHEN_fetch_path_built_THEN_percent_encoded() {
        let encoded = PctString::encode("exämple.com".chars(), URIReserved);
        assert!(encoded.as_str().contains('%'));
    }

    #[tokio::test]
    async fn GIVEN_blocked_host_WHEN_fetch_domain_THEN_ssrf_blocked() {
        let fetcher = Fetcher::new(
            "rdap-client-test".to_string(),
            SsrfPolicy::default(),
            RetryPolicy::default(),
            Duration::from_secs(5),
        );
        let ctx = RequestContext::new(Duration::from_secs(5));
        let result = fetcher
            .fetch_domain(&["https://127.0.0.1".to_string()], "example.com", &ctx)
            .await;
        assert!(matches!(result, Err(RdapClientError::SsrfBlocked { .. })));
    }

    #[tokio::test]
    async fn GIVEN_empty_base_url_list_WHEN_fetch_THEN_no_authoritative_server() {
        let fetcher = Fetcher::new(
            "rdap-client-test".to_string(),
            SsrfPolicy::default(),
            RetryPolicy::default(),
            Duration::from_secs(5),
        );
        let ctx = RequestContext::new(Duration::from_secs(5));
        let result = fetcher.fetch_domain(&[], "example.com", &ctx).await;
        assert!(matches!(result, Err(RdapClientError::NoAuthoritativeServer { .. })));
    }

    #[tokio::test]
    async fn GIVEN_first_url_blocked_and_second_also_blocked_WHEN_fetch_THEN_failover_attempted() {
        // Every candidate is SSRF-blocked, so failover exhausts the list
        // without any network I/O and surfaces the first terminal error.
        let fetcher = Fetcher::new(
            "rdap-client-test".to_string(),
            SsrfPolicy::default(),
            RetryPolicy::default(),
            Duration::from_secs(5),
        );
        let ctx = RequestContext::new(Duration::from_secs(5));
        let urls = vec!["https://127.0.0.1".to_string(), "https://10.0.0.1".to_string()];
        let result = fetcher.fetch_domain(&urls, "example.com", &ctx).await;
        assert!(matches!(result, Err(RdapClientError::SsrfBlocked { .. })));
    }

    #[tokio::test]
    async fn GIVEN_already_cancelled_WHEN_fetch_THEN_cancelled_error() {
        let fetcher = Fetcher::new(
            "rdap-client-test".to_string(),
            SsrfPolicy::default(),
            RetryPolicy::default(),
            Duration::from_secs(5),
        );
        let (signal, cancellation) = crate::cancel::CancellationSignal::new();
        signal.cancel();
        let mut ctx = RequestContext::new(Duration::from_secs(5));
        ctx.cancellation = cancellation;
        let result = fetcher
            .fetch_domain(&["https://rdap.example.net".to_string()], "example.com", &ctx)
            .await;
        assert!(matches!(result, Err(RdapClientError::Cancelled { .. })));
    }
}
