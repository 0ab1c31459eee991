//! IANA RDAP bootstrap registries (RFC 7484).
//!
//! The four registries (dns, asn, ipv4, ipv6) share one wire shape: a
//! `services` array of `[[keys...], [urls...]]` pairs. This module parses
//! that shape and answers "which base URL(s) serve this query" for each
//! registry kind.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use ipnet::{Ipv4Net, Ipv6Net};
use prefix_trie::PrefixMap;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum IanaRegistryType {
    RdapBootstrapDns,
    RdapBootstrapAsn,
    RdapBootstrapIpv4,
    RdapBootstrapIpv6,
}

impl IanaRegistryType {
    /// The well-known IANA URL for this registry table.
    pub fn url(&self) -> &'static str {
        match self {
            Self::RdapBootstrapDns => "https://data.iana.org/rdap/dns.json",
            Self::RdapBootstrapAsn => "https://data.iana.org/rdap/asn.json",
            Self::RdapBootstrapIpv4 => "https://data.iana.org/rdap/ipv4.json",
            Self::RdapBootstrapIpv6 => "https://data.iana.org/rdap/ipv6.json",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::RdapBootstrapDns => "dns.json",
            Self::RdapBootstrapAsn => "asn.json",
            Self::RdapBootstrapIpv4 => "ipv4.json",
            Self::RdapBootstrapIpv6 => "ipv6.json",
        }
    }
}

/// The parsed body of an IANA bootstrap registry document.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RdapBootstrapRegistry {
    pub version: String,
    pub publication: String,
    #[serde(default)]
    pub description: Option<String>,
    pub services: Vec<Vec<Vec<String>>>,
}

#[derive(Error, Debug)]
pub enum BootstrapRegistryError {
    #[error("bootstrap service entry has no keys or no urls")]
    EmptyService,
    #[error("bootstrap service entry has an empty url set")]
    EmptyUrlSet,
    #[error("input given for lookup is not valid for this registry type")]
    InvalidBootstrapInput,
    #[error("no bootstrap urls found for the given input")]
    NoBootstrapUrls,
    #[error("registry json does not look like a valid bootstrap service array")]
    InvalidBootstrapService,
}

/// Behavior common to every bootstrap registry kind: given a key (a domain
/// suffix, an AS number, an IP address) find the candidate base URLs.
pub trait BootstrapRegistry {
    fn get_dns_bootstrap_urls(&self, domain: &str) -> Result<Vec<String>, BootstrapRegistryError>;
    fn get_asn_bootstrap_urls(&self, asn: u32) -> Result<Vec<String>, BootstrapRegistryError>;
    fn get_ipv4_bootstrap_urls(
        &self,
        addr: &Ipv4Addr,
    ) -> Result<Vec<String>, BootstrapRegistryError>;
    fn get_ipv6_bootstrap_urls(
        &self,
        addr: &Ipv6Addr,
    ) -> Result<Vec<String>, BootstrapRegistryError>;
}

impl BootstrapRegistry for RdapBootstrapRegistry {
    fn get_dns_bootstrap_urls(&self, domain: &str) -> Result<Vec<String>, BootstrapRegistryError> {
        let domain = domain.trim_end_matches('.').to_ascii_lowercase();
        let labels: Vec<&str> = domain.split('.').collect();

        let mut best: Option<(usize, &Vec<String>)> = None;
        for service in &self.services {
            let keys = service.first().ok_or(BootstrapRegistryError::EmptyService)?;
            let urls = service.get(1).ok_or(BootstrapRegistryError::EmptyService)?;
            if urls.is_empty() {
                return Err(BootstrapRegistryError::EmptyUrlSet);
            }
            for key in keys {
                let key_lower = key.to_ascii_lowercase();
                let key_labels: Vec<&str> = key_lower.split('.').collect();
                if key_labels.len() > labels.len() {
                    continue;
                }
                if labels[labels.len() - key_labels.len()..] == key_labels[..] {
                    let specificity = key_labels.len();
                    if best.map(|(n, _)| specificity > n).unwrap_or(true) {
                        best = Some((specificity, urls));
                    }
                }
            }
        }
        best.map(|(_, urls)| urls.clone())
            .ok_or(BootstrapRegistryError::NoBootstrapUrls)
    }

    fn get_asn_bootstrap_urls(&self, asn: u32) -> Result<Vec<String>, BootstrapRegistryError> {
        for service in &self.services {
            let keys = service.first().ok_or(BootstrapRegistryError::EmptyService)?;
            let urls = service.get(1).ok_or(BootstrapRegistryError::EmptyService)?;
            if urls.is_empty() {
                return Err(BootstrapRegistryError::EmptyUrlSet);
            }
            for key in keys {
                let (start, end) = match key.split_once('-') {
                    Some((s, e)) => (s, e),
                    None => (key.as_str(), key.as_str()),
                };
                let (start, end) = match (start.parse::<u32>(), end.parse::<u32>()) {
                    (Ok(s), Ok(e)) => (s, e),
                    _ => continue,
                };
                if asn >= start && asn <= end {
                    return Ok(urls.clone());
                }
            }
        }
        Err(BootstrapRegistryError::NoBootstrapUrls)
    }

    fn get_ipv4_bootstrap_urls(
        &self,
        addr: &Ipv4Addr,
    ) -> Result<Vec<String>, BootstrapRegistryError> {
        let mut map: PrefixMap<Ipv4Net, Vec<String>> = PrefixMap::new();
        for service in &self.services {
            let keys = service.first().ok_or(BootstrapRegistryError::EmptyService)?;
            let urls = service.get(1).ok_or(BootstrapRegistryError::EmptyService)?;
            if urls.is_empty() {
                return Err(BootstrapRegistryError::EmptyUrlSet);
            }
            for key in keys {
                if let Ok(net) = Ipv4Net::from_str(key) {
                    map.insert(net, urls.clone());
                }
            }
        }
        let target = Ipv4Net::new(*addr, 32).map_err(|_| BootstrapRegistryError::InvalidBootstrapInput)?;
        map.get_lpm(&target)
            .map(|(_, urls)| urls.clone())
            .ok_or(BootstrapRegistryError::NoBootstrapUrls)
    }

    fn get_ipv6_bootstrap_urls(
        &self,
        addr: &Ipv6Addr,
    ) -> Result<Vec<String>, BootstrapRegistryError> {
        let mut map: PrefixMap<Ipv6Net, Vec<String>> = PrefixMap::new();
        for service in &self.services {
            let keys = service.first().ok_or(BootstrapRegistryError::EmptyService)?;
            let urls = service.get(1).ok_or(BootstrapRegistryError::EmptyService)?;
            if urls.is_empty() {
                return Err(BootstrapRegistryError::EmptyUrlSet);
            }
            for key in keys {
                if let Ok(net) = Ipv6Net::from_str(key) {
                    map.insert(net, urls.clone());
                }
            }
        }
        let target = Ipv6Net::new(*addr, 128).map_err(|_| BootstrapRegistryError::InvalidBootstrapInput)?;
        map.get_lpm(&target)
            .map(|(_, urls)| urls.clone())
            .ok_or(BootstrapRegistryError::NoBootstrapUrls)
    }
}

/// Picks an https:// URL if one is present, falling back to the first URL
/// otherwise. RDAP bootstrap entries commonly list both schemes.
pub fn get_preferred_url(urls: &[String]) -> Option<&String> {
    urls.iter()
        .find(|u| u.starts_with("https://"))
        .or_else(|| urls.first())
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    fn dns_registry() -> RdapBootstrapRegistry {
        serde_json::from_str(
            r#"
            {
              "version": "1.0",
              "publication": "2024-01-01T00:00:00Z",
              "services": [
                [["com", "net"], ["https://rdap.verisign.com/com/"]],
                [["org"], ["https://rdap.publicinterestregistry.org/"]],
                [["co.uk", "uk"], ["https://rdap.nominet.uk/uk/"]]
              ]
            }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn GIVEN_dns_registry_WHEN_lookup_com_THEN_verisign_url() {
        let registry = dns_registry();
        let urls = registry.get_dns_bootstrap_urls("example.com").unwrap();
        assert_eq!(urls, vec!["https://rdap.verisign.com/com/"]);
    }

    #[test]
    fn GIVEN_dns_registry_WHEN_lookup_co_uk_THEN_longest_match_wins() {
        let registry = dns_registry();
        let urls = registry.get_dns_bootstrap_urls("example.co.uk").unwrap();
        assert_eq!(urls, vec!["https://rdap.nominet.uk/uk/"]);
    }

    #[test]
    fn GIVEN_dns_registry_WHEN_lookup_unknown_tld_THEN_error() {
        let registry = dns_registry();
        assert!(registry.get_dns_bootstrap_urls("example.zzz").is_err());
    }

    fn asn_registry() -> RdapBootstrapRegistry {
        serde_json::from_str(
            r#"
            {
              "version": "1.0",
              "publication": "2024-01-01T00:00:00Z",
              "services": [
                [["1-1876"], ["https://rdap.example1.net/"]],
                [["15169-15169"], ["https://rdap.example2.net/"]]
              ]
            }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn GIVEN_asn_registry_WHEN_lookup_in_range_THEN_url_found() {
        let registry = asn_registry();
        let urls = registry.get_asn_bootstrap_urls(15169).unwrap();
        assert_eq!(urls, vec!["https://rdap.example2.net/"]);
    }

    #[test]
    fn GIVEN_asn_registry_WHEN_lookup_out_of_range_THEN_error() {
        let registry = asn_registry();
        assert!(registry.get_asn_bootstrap_urls(99999999).is_err());
    }

    fn ipv4_registry() -> RdapBootstrapRegistry {
        serde_json::from_str(
            r#"
            {
              "version": "1.0",
              "publication": "2024-01-01T00:00:00Z",
              "services": [
                [["8.0.0.0/8"], ["https://rdap.arin.net/registry/"]],
                [["8.8.8.0/24"], ["https://rdap.example.net/"]]
              ]
            }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn GIVEN_ipv4_registry_WHEN_lookup_THEN_longest_prefix_match_wins() {
        let registry = ipv4_registry();
        let addr: Ipv4Addr = "8.8.8.8".parse().unwrap();
        let urls = registry.get_ipv4_bootstrap_urls(&addr).unwrap();
        assert_eq!(urls, vec!["https://rdap.example.net/"]);
    }

    #[test]
    fn GIVEN_ipv6_registry_WHEN_lookup_THEN_match_found() {
        let registry: RdapBootstrapRegistry = serde_json::from_str(
            r#"
            {
              "version": "1.0",
              "publication": "2024-01-01T00:00:00Z",
              "services": [
                [["2001:500::/30"], ["https://rdap.arin.net/registry/"]]
              ]
            }
            "#,
        )
        .unwrap();
        let addr: Ipv6Addr = "2001:500::1".parse().unwrap();
        let urls = registry.get_ipv6_bootstrap_urls(&addr).unwrap();
        assert_eq!(urls, vec!["https://rdap.arin.net/registry/"]);
    }

    #[test]
    fn GIVEN_url_list_WHEN_get_preferred_url_THEN_https_preferred() {
        let urls = vec![
            "http://rdap.example.net/".to_string(),
            "https://rdap.example.net/".to_string(),
        ];
        assert_eq!(
            get_preferred_url(&urls),
            Some(&"https://rdap.example.net/".to_string())
        );
    }
}
