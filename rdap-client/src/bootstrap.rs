//! IANA bootstrap table storage and refresh.
//!
//! Adapted from the teacher's `MemoryBootstrapStore`, which holds one
//! `Arc<RwLock<Option<(IanaRegistry, HttpData)>>>` per table kind. The
//! teacher's version re-checks freshness but doesn't serialize concurrent
//! refreshes of the same table, so N simultaneous callers hitting a cold
//! cache each issue their own IANA fetch. Here every table additionally
//! carries a refresh `Mutex` so only one fetch is ever in flight per
//! table: the rest wait for it and then read the result it produced.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use rdap_client_common::iana::{
    get_preferred_url, BootstrapRegistry, IanaRegistryType, RdapBootstrapRegistry,
};
use rdap_client_common::httpdata::HttpData;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::ssrf::{validate_url, SsrfPolicy};
use crate::RdapClientError;

/// A week, the freshness window the teacher's bootstrap store uses for
/// tables that didn't supply their own cache-control/expires metadata.
const DEFAULT_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

struct Table {
    loaded: RwLock<Option<(RdapBootstrapRegistry, HttpData)>>,
    refreshing: Mutex<()>,
}

impl Table {
    fn new() -> Self {
        Self {
            loaded: RwLock::new(None),
            refreshing: Mutex::new(()),
        }
    }

    async fn is_fresh(&self, max_age: i64) -> bool {
        match self.loaded.read().await.as_ref() {
            Some((_, http_data)) => !http_data.is_expired(max_age),
            None => false,
        }
    }

    /// Ensures the table holds fresh data, fetching it at most once even
    /// under concurrent callers. `fetch` is only invoked by whichever
    /// caller wins the refresh lock first; everyone else observes its
    /// result.
    ///
    /// A fetch failure keeps serving a previously-loaded table rather than
    /// failing the call: a registry that's down for a minute shouldn't
    /// break every lookup that was already working against last week's
    /// copy. Only a table that has never loaded surfaces an error.
    async fn ensure_fresh<F, Fut>(&self, max_age: i64, fetch: F) -> Result<(), RdapClientError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(RdapBootstrapRegistry, HttpData), RdapClientError>>,
    {
        if self.is_fresh(max_age).await {
            return Ok(());
        }
        let _permit = self.refreshing.lock().await;
        // Re-check: another caller may have refreshed while we waited.
        if self.is_fresh(max_age).await {
            return Ok(());
        }
        debug!("refreshing iana bootstrap table");
        match fetch().await {
            Ok((registry, mut http_data)) => {
                if !http_data.should_cache() {
                    // `no-store`/`no-cache`: serve this result to whoever is
                    // waiting on this refresh, but don't let it count as
                    // fresh, so the next lookup fetches again rather than
                    // reusing a response the server asked not to be cached.
                    http_data.received = chrono::Utc::now() - chrono::Duration::seconds(max_age + 1);
                }
                *self.loaded.write().await = Some((registry, http_data));
                Ok(())
            }
            Err(e) => {
                if self.loaded.read().await.is_some() {
                    warn!(error = %e, "bootstrap refresh failed, continuing with stale table");
                    Ok(())
                } else {
                    Err(RdapClientError::bootstrap_unavailable())
                }
            }
        }
    }

    async fn with_registry<T>(
        &self,
        f: impl FnOnce(&RdapBootstrapRegistry) -> Result<T, RdapClientError>,
    ) -> Result<T, RdapClientError> {
        let guard = self.loaded.read().await;
        let (registry, _) = guard
            .as_ref()
            .ok_or_else(RdapClientError::bootstrap_unavailable)?;
        f(registry)
    }
}

pub struct MemoryBootstrapStore {
    client: reqwest::Client,
    ssrf_policy: SsrfPolicy,
    max_age: i64,
    dns: Table,
    asn: Table,
    ipv4: Table,
    ipv6: Table,
}

impl MemoryBootstrapStore {
    /// `client` must have redirects disabled: a redirect off the IANA
    /// bootstrap host needs the same SSRF re-validation as any other hop,
    /// and this constructor doesn't re-check one.
    pub fn new(client: reqwest::Client, ssrf_policy: SsrfPolicy) -> Self {
        Self {
            client,
            ssrf_policy,
            max_age: DEFAULT_MAX_AGE_SECONDS,
            dns: Table::new(),
            asn: Table::new(),
            ipv4: Table::new(),
            ipv6: Table::new(),
        }
    }

    async fn iana_request(
        &self,
        registry_type: IanaRegistryType,
    ) -> Result<(RdapBootstrapRegistry, HttpData), RdapClientError> {
        let url = validate_url(registry_type.url(), &self.ssrf_policy)
            .map_err(|e| RdapClientError::ssrf_blocked(e.to_string()))?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RdapClientError::network_error(e.to_string()))?;

        let host = response
            .url()
            .host_str()
            .unwrap_or("data.iana.org")
            .to_string();
        let status_code = response.status().as_u16();
        let content_length = response.content_length();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let expires = response
            .headers()
            .get(reqwest::header::EXPIRES)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let cache_control = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if !response.status().is_success() {
            return Err(RdapClientError::server_rejected(status_code));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RdapClientError::network_error(e.to_string()))?;
        let registry: RdapBootstrapRegistry = serde_json::from_str(&body)
            .map_err(|e| RdapClientError::malformed_response(registry_type.url(), e.to_string()))?;

        let http_data = HttpData::now()
            .content_length(content_length.unwrap_or(body.len() as u64))
            .maybe_content_type(content_type)
            .host(host)
            .maybe_expires(expires)
            .maybe_cache_control(cache_control)
            .status_code(status_code)
            .build();

        Ok((registry, http_data))
    }

    pub async fn get_dns_urls(&self, domain: &str) -> Result<Vec<String>, RdapClientError> {
        self.dns
            .ensure_fresh(self.max_age, || self.iana_request(IanaRegistryType::RdapBootstrapDns))
            .await?;
        self.dns
            .with_registry(|r| {
                r.get_dns_bootstrap_urls(domain)
                    .map_err(|_| RdapClientError::no_authoritative_server())
            })
            .await
    }

    pub async fn get_asn_urls(&self, asn: u32) -> Result<Vec<String>, RdapClientError> {
        self.asn
            .ensure_fresh(self.max_age, || self.iana_request(IanaRegistryType::RdapBootstrapAsn))
            .await?;
        self.asn
            .with_registry(|r| {
                r.get_asn_bootstrap_urls(asn)
                    .map_err(|_| RdapClientError::no_authoritative_server())
            })
            .await
    }

    pub async fn get_ipv4_urls(&self, addr: &Ipv4Addr) -> Result<Vec<String>, RdapClientError> {
        self.ipv4
            .ensure_fresh(self.max_age, || self.iana_request(IanaRegistryType::RdapBootstrapIpv4))
            .await?;
        self.ipv4
            .with_registry(|r| {
                r.get_ipv4_bootstrap_urls(addr)
                    .map_err(|_| RdapClientError::no_authoritative_server())
            })
            .await
    }

    pub async fn get_ipv6_urls(&self, addr: &Ipv6Addr) -> Result<Vec<String>, RdapClientError> {
        self.ipv6
            .ensure_fresh(self.max_age, || self.iana_request(IanaRegistryType::RdapBootstrapIpv6))
            .await?;
        self.ipv6
            .with_registry(|r| {
                r.get_ipv6_bootstrap_urls(addr)
                    .map_err(|_| RdapClientError::no_authoritative_server())
            })
            .await
    }
}

/// Picks a single base URL to attempt first from a bootstrap lookup's
/// candidate list, preferring https.
pub fn preferred_base_url(urls: &[String]) -> Option<String> {
    get_preferred_url(urls).cloned()
}
