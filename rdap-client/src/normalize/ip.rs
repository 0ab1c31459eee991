//! Normalizes a raw `ip network` RDAP object (RFC 9083 §5.4) into an
//! [`IpResponse`].

use std::net::IpAddr;

use rdap_client_common::response::IpResponse;
use serde_json::Value;

use super::{parse_entities, parse_events, parse_notices, parse_statuses};
use crate::RdapClientError;

pub fn normalize_ip(value: &Value, retain_raw: bool) -> Result<IpResponse, RdapClientError> {
    let start_address = value
        .get("startAddress")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<IpAddr>().ok())
        .ok_or_else(|| RdapClientError::malformed_response("/startAddress", "missing or not a valid ip address"))?;
    let end_address = value
        .get("endAddress")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<IpAddr>().ok())
        .ok_or_else(|| RdapClientError::malformed_response("/endAddress", "missing or not a valid ip address"))?;

    let cidr = value
        .get("cidr0_cidrs")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(render_cidr);

    Ok(IpResponse {
        start_address,
        end_address,
        cidr,
        name: value.get("name").and_then(|v| v.as_str()).map(|s| s.to_string()),
        network_type: value.get("type").and_then(|v| v.as_str()).map(|s| s.to_string()),
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

fn render_cidr(cidr_value: &Value) -> Option<String> {
    if let Some(v4) = cidr_value.get("v4prefix") {
        let prefix = v4.as_str()?;
        let length = cidr_value.get("length")?.as_u64()?;
        return Some(format!("{prefix}/{length}"));
    }
    if let Some(v6) = cidr_value.get("v6prefix") {
        let prefix = v6.as_str()?;
        let length = cidr_value.get("length")?.as_u64()?;
        return Some(format!("{prefix}/{length}"));
    }
    None
}
