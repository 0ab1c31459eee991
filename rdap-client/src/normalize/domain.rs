//! Normalizes a raw `domain` RDAP object (RFC 9083 §5.3) into a
//! [`DomainResponse`].

use std::net::IpAddr;

use rdap_client_common::response::{DomainResponse, Nameserver};
use serde_json::Value;

use super::{find_entity_with_role, parse_entities, parse_events, parse_notices, parse_statuses};
use crate::RdapClientError;

/// `queried_name` is the already-canonicalized name the caller asked for;
/// it is the fallback for `ldh_name` when a server omits `ldhName` from its
/// response, since the data model guarantees the queried name is always
/// present even though the wire field itself is optional.
pub fn normalize_domain(
    value: &Value,
    queried_name: &str,
    retain_raw: bool,
) -> Result<DomainResponse, RdapClientError> {
    let ldh_name = value
        .get("ldhName")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| queried_name.to_string());
    let unicode_name = value
        .get("unicodeName")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let handle = value.get("handle").and_then(|v| v.as_str()).map(|s| s.to_string());
    let port43 = value.get("port43").and_then(|v| v.as_str()).map(|s| s.to_string());

    let entities = parse_entities(value)?;
    let registrar = find_entity_with_role(&entities, "registrar");
    let nameservers = parse_nameservers(value)?;

    Ok(DomainResponse {
        ldh_name,
        unicode_name,
        handle,
        statuses: parse_statuses(value)?,
        events: parse_events(value)?,
        entities,
        nameservers,
        registrar,
        notices: parse_notices(value)?,
        port43,
        raw: retain_raw.then(|| value.clone()),
    })
}

fn parse_nameservers(value: &Value) -> Result<Vec<Nameserver>, RdapClientError> {
    match value.get("nameservers") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(arr)) => Ok(arr
            .iter()
            .filter_map(|ns| {
                let name = ns.get("ldhName")?.as_str()?.to_string();
                let ip_addresses = ns
                    .get("ipAddresses")
                    .map(|addrs| {
                        let mut all = Vec::new();
                        if let Some(v4) = addrs.get("v4").and_then(|v| v.as_array()) {
                            all.extend(v4.iter().filter_map(|a| a.as_str()).filter_map(|s| s.parse::<IpAddr>().ok()));
                        }
                        if let Some(v6) = addrs.get("v6").and_then(|v| v.as_array()) {
                            all.extend(v6.iter().filter_map(|a| a.as_str()).filter_map(|s| s.parse::<IpAddr>().ok()));
                        }
                        all
                    })
                    .unwrap_or_default();
                Some(Nameserver { name, ip_addresses })
            })
            .collect()),
        Some(_) => Err(RdapClientError::malformed_response(
            "/nameservers",
            "nameservers is present but not an array",
        )),
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_domain() -> Value {
        json!({
            "objectClassName": "domain",
            "handle": "EXAMPLE-DOMAIN",
            "ldhName": "example.com",
            "status": ["active"],
            "entities": [
                {
                    "handle": "REGISTRAR-1",
                    "roles": ["registrar"],
                    "vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar, Inc."]]]
                }
            ],
            "nameservers": [
                {
                    "ldhName": "ns1.example.com",
                    "ipAddresses": {"v4": ["192.0.2.1"], "v6": ["2001:db8::1"]}
                }
            ],
            "events": [{"eventAction": "registration", "eventDate": "1999-08-15T00:00:00Z"}],
            "notices": [{"title": "Terms of Use"}]
        })
    }

    #[test]
    fn GIVEN_domain_response_WHEN_normalize_THEN_fields_mapped() {
        let value = sample_domain();
        let domain = normalize_domain(&value, "example.com", false).unwrap();

        assert_eq!(domain.ldh_name, "example.com");
        assert_eq!(domain.handle.as_deref(), Some("EXAMPLE-DOMAIN"));
        assert_eq!(domain.statuses[0].raw, "active");
        assert_eq!(domain.nameservers[0].name, "ns1.example.com");
        assert_eq!(domain.nameservers[0].ip_addresses.len(), 2);
        assert_eq!(domain.notices, vec!["Terms of Use".to_string()]);

        let registrar = domain.registrar.unwrap();
        assert_eq!(registrar.handle.as_deref(), Some("REGISTRAR-1"));
        assert_eq!(
            registrar.contact.unwrap().full_name.as_deref(),
            Some("Example Registrar, Inc.")
        );
    }

    #[test]
    fn GIVEN_response_missing_ldh_name_WHEN_normalize_THEN_falls_back_to_queried_name() {
        let value = json!({"objectClassName": "domain"});
        let domain = normalize_domain(&value, "example.com", false).unwrap();
        assert_eq!(domain.ldh_name, "example.com");
    }

    #[test]
    fn GIVEN_events_wrong_type_WHEN_normalize_THEN_malformed_response() {
        let value = json!({"objectClassName": "domain", "ldhName": "example.com", "events": 42});
        let err = normalize_domain(&value, "example.com", false).unwrap_err();
        assert!(matches!(err, RdapClientError::MalformedResponse { path, .. } if path == "/events"));
    }

    #[test]
    fn GIVEN_nameservers_wrong_type_WHEN_normalize_THEN_malformed_response() {
        let value = json!({"objectClassName": "domain", "ldhName": "example.com", "nameservers": "ns1.example.com"});
        let err = normalize_domain(&value, "example.com", false).unwrap_err();
        assert!(matches!(err, RdapClientError::MalformedResponse { path, .. } if path == "/nameservers"));
    }
}
