//! Guards every outbound connection the fetcher makes, including each
//! redirect hop, against being pointed at an internal or otherwise
//! forbidden address.
//!
//! Grounded on the same checks a generic SSRF guard performs (scheme
//! allowlisting, hostname blocklisting, address-class rejection, DNS
//! rebinding prevention by re-checking every resolved address), adapted
//! to the address classifier already shared with the bootstrap lookup
//! code.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use rdap_client_common::network::{classify_ipv4, classify_ipv6, AddressClass};
use thiserror::Error;
use url::Url;

const LOCAL_SUFFIXES: &[&str] = &[
    ".local",
    ".localhost",
    ".internal",
    ".intranet",
    ".corp",
    ".home",
    ".lan",
    ".localdomain",
];

/// Exact hostnames known to resolve to, or alias, cloud metadata endpoints
/// or other internal services regardless of the suffix rules above. Baked
/// in at compile time; [`SsrfPolicy::blocked_domains`] adds to this, never
/// replaces it.
const BLOCKED_HOSTNAMES: &[&str] = &[
    "localhost",
    "metadata.google.internal",
    "metadata.goog",
    "169.254.169.254.nip.io",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SsrfError {
    #[error("'{0}' could not be parsed as a url")]
    InvalidUrl(String),
    #[error("url has no host")]
    MissingHost,
    #[error("scheme '{0}' is not allowed, only http/https are")]
    BlockedProtocol(String),
    #[error("host '{0}' resolves to a local/internal name")]
    BlockedLocalName(String),
    #[error("domain '{0}' is on the configured blocklist")]
    DomainBlocked(String),
    #[error("domain '{0}' is not on the configured allowlist")]
    DomainNotAllowed(String),
    #[error("address '{0}' is in the forbidden '{1}' range")]
    BlockedAddress(IpAddr, AddressClass),
    #[error("dns resolution for '{0}' failed: {1}")]
    DnsResolutionFailed(String, String),
    #[error("too many redirects ({0})")]
    TooManyRedirects(u32),
}

#[derive(Clone, Debug)]
pub struct SsrfPolicy {
    pub allowed_domains: Option<HashSet<String>>,
    pub blocked_domains: HashSet<String>,
    pub block_ipv6: bool,
    pub max_redirects: u32,
    /// Escape hatch for tests only: permits plain `http://` to a loopback
    /// host. Never set outside test fixtures; production defaults reject
    /// any scheme but `https`.
    pub allow_http_to_loopback: bool,
}

impl Default for SsrfPolicy {
    fn default() -> Self {
        Self {
            allowed_domains: None,
            blocked_domains: HashSet::new(),
            block_ipv6: false,
            max_redirects: 5,
            allow_http_to_loopback: false,
        }
    }
}

/// A resolver abstraction so the guard can be unit tested without doing
/// real DNS lookups. Production code backs this with the operating
/// system resolver (e.g. `tokio::net::lookup_host`).
pub trait DnsResolve {
    fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, String>;
}

/// Validate a URL is safe to connect to: scheme, hostname blocklist,
/// address class. Does not perform DNS resolution; call
/// [`validate_resolved_addresses`] with the resolver's answer afterward so
/// DNS-rebinding can't slip an address through between the two checks.
pub fn validate_url(url_str: &str, policy: &SsrfPolicy) -> Result<Url, SsrfError> {
    let url = Url::parse(url_str).map_err(|_| SsrfError::InvalidUrl(url_str.to_string()))?;

    let host = url.host_str().ok_or(SsrfError::MissingHost)?.to_ascii_lowercase();

    if url.scheme() != "https" {
        let loopback_escape_hatch = policy.allow_http_to_loopback
            && url.scheme() == "http"
            && host.parse::<IpAddr>().map(|addr| addr.is_loopback()).unwrap_or(false);
        if !loopback_escape_hatch {
            return Err(SsrfError::BlockedProtocol(url.scheme().to_string()));
        }
    }

    if let Ok(addr) = host.parse::<IpAddr>() {
        check_address(addr, policy)?;
        return Ok(url);
    }

    if BLOCKED_HOSTNAMES.contains(&host.as_str())
        || LOCAL_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
    {
        return Err(SsrfError::BlockedLocalName(host));
    }
    if policy.blocked_domains.contains(&host) {
        return Err(SsrfError::DomainBlocked(host));
    }
    if let Some(allowed) = &policy.allowed_domains {
        if !allowed.contains(&host) {
            return Err(SsrfError::DomainNotAllowed(host));
        }
    }

    Ok(url)
}

/// Check every address a hostname resolved to. RDAP bootstrap URLs point
/// at third-party registries whose DNS we don't control, so a single
/// forbidden address among several returned by the resolver is enough to
/// reject the whole connection attempt.
pub fn validate_resolved_addresses(
    addresses: &[SocketAddr],
    policy: &SsrfPolicy,
) -> Result<(), SsrfError> {
    for socket_addr in addresses {
        check_address(socket_addr.ip(), policy)?;
    }
    Ok(())
}

fn check_address(addr: IpAddr, policy: &SsrfPolicy) -> Result<(), SsrfError> {
    match addr {
        IpAddr::V4(v4) => {
            let class = classify_ipv4(&v4);
            if class.is_non_global() {
                return Err(SsrfError::BlockedAddress(addr, class));
            }
        }
        IpAddr::V6(v6) => {
            if policy.block_ipv6 {
                return Err(SsrfError::BlockedAddress(addr, AddressClass::Reserved));
            }
            let class = classify_ipv6(&v6);
            if class.is_non_global() {
                return Err(SsrfError::BlockedAddress(addr, class));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn GIVEN_https_url_WHEN_validate_url_THEN_ok() {
        let policy = SsrfPolicy::default();
        assert!(validate_url("https://rdap.example.net/domain/example.com", &policy).is_ok());
    }

    #[rstest]
    #[case("ftp://rdap.example.net/")]
    #[case("file:///etc/passwd")]
    #[case("gopher://rdap.example.net/")]
    #[case("http://rdap.example.net/")]
    fn GIVEN_non_https_scheme_WHEN_validate_url_THEN_blocked_protocol(#[case] url: &str) {
        let policy = SsrfPolicy::default();
        assert_eq!(
            validate_url(url, &policy),
            Err(SsrfError::BlockedProtocol(
                Url::parse(url).unwrap().scheme().to_string()
            ))
        );
    }

    #[rstest]
    fn GIVEN_http_to_loopback_WHEN_escape_hatch_enabled_THEN_allowed() {
        let policy = SsrfPolicy {
            allow_http_to_loopback: true,
            ..SsrfPolicy::default()
        };
        assert!(validate_url("http://127.0.0.1:8080/domain/example.com", &policy).is_ok());
    }

    #[rstest]
    fn GIVEN_http_to_public_host_WHEN_escape_hatch_enabled_THEN_still_blocked() {
        let policy = SsrfPolicy {
            allow_http_to_loopback: true,
            ..SsrfPolicy::default()
        };
        assert!(matches!(
            validate_url("http://rdap.example.net/", &policy),
            Err(SsrfError::BlockedProtocol(_))
        ));
    }

    #[rstest]
    #[case("https://metadata.google.internal/")]
    #[case("https://metadata.goog/")]
    #[case("https://169.254.169.254.nip.io/")]
    fn GIVEN_known_metadata_hostname_WHEN_validate_url_THEN_blocked(#[case] url: &str) {
        let policy = SsrfPolicy::default();
        assert!(matches!(
            validate_url(url, &policy),
            Err(SsrfError::BlockedLocalName(_))
        ));
    }

    #[rstest]
    #[case("https://localhost/")]
    #[case("https://metadata.internal/")]
    #[case("https://printer.lan/")]
    fn GIVEN_local_hostname_WHEN_validate_url_THEN_blocked(#[case] url: &str) {
        let policy = SsrfPolicy::default();
        assert!(matches!(
            validate_url(url, &policy),
            Err(SsrfError::BlockedLocalName(_))
        ));
    }

    #[rstest]
    fn GIVEN_ip_literal_loopback_WHEN_validate_url_THEN_blocked_address() {
        let policy = SsrfPolicy::default();
        assert!(matches!(
            validate_url("https://127.0.0.1/", &policy),
            Err(SsrfError::BlockedAddress(_, AddressClass::Loopback))
        ));
    }

    #[rstest]
    fn GIVEN_ip_literal_link_local_metadata_WHEN_validate_url_THEN_blocked_address() {
        let policy = SsrfPolicy::default();
        assert!(matches!(
            validate_url("https://169.254.169.254/", &policy),
            Err(SsrfError::BlockedAddress(_, AddressClass::LinkLocal))
        ));
    }

    #[rstest]
    fn GIVEN_domain_blocklist_WHEN_validate_url_THEN_blocked() {
        let mut policy = SsrfPolicy::default();
        policy.blocked_domains.insert("evil.example".to_string());
        assert_eq!(
            validate_url("https://evil.example/", &policy),
            Err(SsrfError::DomainBlocked("evil.example".to_string()))
        );
    }

    #[rstest]
    fn GIVEN_misconfigured_allowlist_WHEN_validate_url_THEN_not_allowed() {
        let mut policy = SsrfPolicy::default();
        policy.allowed_domains = Some(HashSet::from(["rdap.good.example".to_string()]));
        assert_eq!(
            validate_url("https://rdap.arin.net/", &policy),
            Err(SsrfError::DomainNotAllowed("rdap.arin.net".to_string()))
        );
    }

    #[rstest]
    fn GIVEN_resolved_addresses_with_one_private_WHEN_validate_resolved_THEN_rejected() {
        let policy = SsrfPolicy::default();
        let addrs: Vec<SocketAddr> = vec!["93.184.216.34:443".parse().unwrap(), "10.0.0.5:443".parse().unwrap()];
        assert!(validate_resolved_addresses(&addrs, &policy).is_err());
    }

    #[rstest]
    fn GIVEN_all_global_resolved_addresses_WHEN_validate_resolved_THEN_ok() {
        let policy = SsrfPolicy::default();
        let addrs: Vec<SocketAddr> = vec!["93.184.216.34:443".parse().unwrap(), "8.8.8.8:443".parse().unwrap()];
        assert!(validate_resolved_addresses(&addrs, &policy).is_ok());
    }
}
