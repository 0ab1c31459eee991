//! The public client: ties canonicalization, caching, request
//! coalescing, bootstrap discovery, fetching, normalization, and
//! redaction together into `domain()`, `ip()`, and `asn()`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use rdap_client_common::response::{AsnResponse, DomainResponse, IpResponse};
use rdap_client_common::validate::{canonicalize_asn, canonicalize_domain, canonicalize_ip};
use tokio::sync::Mutex;
use tracing::instrument;

use crate::bootstrap::MemoryBootstrapStore;
use crate::cache::Cache;
use crate::config::{ClientConfig, QueryOptions};
use crate::fetch::{Fetcher, RequestContext};
use crate::normalize::asn::normalize_asn;
use crate::normalize::domain::normalize_domain;
use crate::normalize::ip::normalize_ip;
use crate::redact::{redact_asn, redact_domain, redact_ip};
use crate::RdapClientError;

/// Serializes concurrent queries that share a fingerprint so only one
/// ever performs the underlying bootstrap+fetch; the rest wait for it
/// and then read its result out of the cache.
#[derive(Default)]
struct InFlight {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InFlight {
    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

pub struct RdapClient {
    config: ClientConfig,
    bootstrap: MemoryBootstrapStore,
    fetcher: Fetcher,
    domain_cache: Cache<String, DomainResponse>,
    ip_cache: Cache<String, IpResponse>,
    asn_cache: Cache<String, AsnResponse>,
    inflight: InFlight,
}

impl RdapClient {
    pub fn new(config: ClientConfig) -> Result<Self, RdapClientError> {
        let bootstrap_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .https_only(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| RdapClientError::network_error(e.to_string()))?;

        Ok(Self {
            bootstrap: MemoryBootstrapStore::new(bootstrap_client, config.ssrf_policy.clone()),
            fetcher: Fetcher::new(
                config.user_agent.clone(),
                config.ssrf_policy.clone(),
                config.retry_policy.clone(),
                config.request_timeout,
            ),
            domain_cache: Cache::new(config.cache_capacity, config.cache_ttl),
            ip_cache: Cache::new(config.cache_capacity, config.cache_ttl),
            asn_cache: Cache::new(config.cache_capacity, config.cache_ttl),
            inflight: InFlight::default(),
            config,
        })
    }

    /// Builds the per-call request context (deadline, attempt-count
    /// override, extra headers, cancellation) the fetcher needs, applying
    /// [`QueryOptions`] overrides on top of the client-wide configuration.
    fn request_context(&self, options: &QueryOptions) -> RequestContext {
        let timeout = options.timeout.unwrap_or(self.config.request_timeout);
        let mut ctx = RequestContext::new(timeout);
        ctx.max_attempts = options.max_attempts;
        ctx.extra_headers = options.extra_headers.clone();
        ctx.cancellation = options.cancellation.clone();
        ctx
    }

    #[instrument(skip(self, options))]
    pub async fn domain(
        &self,
        input: &str,
        options: &QueryOptions,
    ) -> Result<DomainResponse, RdapClientError> {
        let ldh_name = canonicalize_domain(input)
            .map_err(|e| RdapClientError::invalid_input(input, e.to_string()))?;
        let fingerprint = format!("domain:{ldh_name}");
        let policy = options.redaction_policy.clone().unwrap_or_else(|| self.config.redaction_policy.clone());

        if !options.bypass_cache {
            if let Some(cached) = self.domain_cache.get(&fingerprint).await {
                return Ok(redact_domain(&cached, &policy));
            }
        }

        let lock = self.inflight.lock_for(&fingerprint).await;
        let _permit = lock.lock().await;

        if !options.bypass_cache {
            if let Some(cached) = self.domain_cache.get(&fingerprint).await {
                return Ok(redact_domain(&cached, &policy));
            }
        }

        let urls = self.bootstrap.get_dns_urls(&ldh_name).await?;
        let ctx = self.request_context(options);
        let raw = self.fetcher.fetch_domain(&urls, &ldh_name, &ctx).await?;
        let normalized = normalize_domain(&raw, &ldh_name, self.config.capture_raw_response)?;

        if !options.bypass_cache {
            self.domain_cache.put(fingerprint, normalized.clone()).await;
        }

        Ok(redact_domain(&normalized, &policy))
    }

    #[instrument(skip(self, options))]
    pub async fn ip(&self, input: &str, options: &QueryOptions) -> Result<IpResponse, RdapClientError> {
        let address: IpAddr =
            canonicalize_ip(input).map_err(|e| RdapClientError::invalid_input(input, e.to_string()))?;
        let fingerprint = format!("ip:{address}");
        let policy = options.redaction_policy.clone().unwrap_or_else(|| self.config.redaction_policy.clone());

        if !options.bypass_cache {
            if let Some(cached) = self.ip_cache.get(&fingerprint).await {
                return Ok(redact_ip(&cached, &policy));
            }
        }

        let lock = self.inflight.lock_for(&fingerprint).await;
        let _permit = lock.lock().await;

        if !options.bypass_cache {
            if let Some(cached) = self.ip_cache.get(&fingerprint).await {
                return Ok(redact_ip(&cached, &policy));
            }
        }

        let urls = match address {
            IpAddr::V4(v4) => self.bootstrap.get_ipv4_urls(&v4).await?,
            IpAddr::V6(v6) => self.bootstrap.get_ipv6_urls(&v6).await?,
        };
        let ctx = self.request_context(options);
        let raw = self.fetcher.fetch_ip(&urls, &address.to_string(), &ctx).await?;
        let normalized = normalize_ip(&raw, self.config.capture_raw_response)?;

        if !options.bypass_cache {
            self.ip_cache.put(fingerprint, normalized.clone()).await;
        }

        Ok(redact_ip(&normalized, &policy))
    }

    #[instrument(skip(self, options))]
    pub async fn asn(&self, input: &str, options: &QueryOptions) -> Result<AsnResponse, RdapClientError> {
        let asn =
            canonicalize_asn(input).map_err(|e| RdapClientError::invalid_input(input, e.to_string()))?;
        let fingerprint = format!("asn:{asn}");
        let policy = options.redaction_policy.clone().unwrap_or_else(|| self.config.redaction_policy.clone());

        if !options.bypass_cache {
            if let Some(cached) = self.asn_cache.get(&fingerprint).await {
                return Ok(redact_asn(&cached, &policy));
            }
        }

        let lock = self.inflight.lock_for(&fingerprint).await;
        let _permit = lock.lock().await;

        if !options.bypass_cache {
            if let Some(cached) = self.asn_cache.get(&fingerprint).await {
                return Ok(redact_asn(&cached, &policy));
            }
        }

        let urls = self.bootstrap.get_asn_urls(asn).await?;
        let ctx = self.request_context(options);
        let raw = self.fetcher.fetch_asn(&urls, asn, &ctx).await?;
        let normalized = normalize_asn(&raw, self.config.capture_raw_response)?;

        if !options.bypass_cache {
            self.asn_cache.put(fingerprint, normalized.clone()).await;
        }

        Ok(redact_asn(&normalized, &policy))
    }
}
