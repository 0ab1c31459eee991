//! Normalizes a raw `autnum` RDAP object (RFC 9083 §5.5) into an
//! [`AsnResponse`].

use rdap_client_common::response::AsnResponse;
use serde_json::Value;

use super::{parse_entities, parse_events, parse_notices, parse_statuses};
use crate::RdapClientError;

pub fn normalize_asn(value: &Value, retain_raw: bool) -> Result<AsnResponse, RdapClientError> {
    let start_autnum = value
        .get("startAutnum")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RdapClientError::malformed_response("/startAutnum", "missing or not a number"))? as u32;
    let end_autnum = value
        .get("endAutnum")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RdapClientError::malformed_response("/endAutnum", "missing or not a number"))? as u32;

    Ok(AsnResponse {
        start_autnum,
        end_autnum,
        name: value.get("name").and_then(|v| v.as_str()).map(|s| s.to_string()),
        autnum_type: value.get("type").and_then(|v| v.as_str()).map(|s| s.to_string()),
        country: value.get("country").and_then(|v| v.as_str()).map(|s| s.to_string()),
        handle: value.get("handle").and_then(|v| v.as_str()).map(|s| s.to_string()),
        parent_handle: value
            .get("parentHandle")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        statuses: parse_statuses(value)?,
        events: parse_events(value)?,
        entities: parse_entities(value)?,
        notices: parse_notices(value)?,
        raw: retain_raw.then(|| value.clone()),
    })
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn GIVEN_asn_response_WHEN_normalize_THEN_fields_mapped() {
        let value = json!({
            "objectClassName": "autnum",
            "handle": "AS15169",
            "startAutnum": 15169,
            "endAutnum": 15169,
            "name": "GOOGLE",
            "type": "DIRECT ALLOCATION",
            "country": "US",
            "status": ["active"]
        });
        let asn = normalize_asn(&value, false).unwrap();

        assert_eq!(asn.start_autnum, 15169);
        assert_eq!(asn.end_autnum, 15169);
        assert_eq!(asn.name.as_deref(), Some("GOOGLE"));
    }

    #[test]
    fn GIVEN_response_missing_autnum_range_WHEN_normalize_THEN_error() {
        let value = json!({"objectClassName": "autnum"});
        assert!(normalize_asn(&value, false).is_err());
    }

    #[test]
    fn GIVEN_entities_wrong_type_WHEN_normalize_THEN_malformed_response() {
        let value = json!({
            "objectClassName": "autnum",
            "startAutnum": 15169,
            "endAutnum": 15169,
            "entities": "not-a-list"
        });
        let err = normalize_asn(&value, false).unwrap_err();
        assert!(matches!(err, crate::RdapClientError::MalformedResponse { path, .. } if path == "/entities"));
    }
}
