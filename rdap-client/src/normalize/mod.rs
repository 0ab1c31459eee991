//! Normalizes raw RDAP JSON into the flat response shapes
//! `rdap_client_common::response` defines.
//!
//! Shared across domain/ip/asn normalization: status-token folding,
//! event-array walking, and bounded-depth entity walking (entities can
//! nest other entities, e.g. a registrar's abuse-contact sub-entity; a
//! malicious or buggy server could otherwise hand us unbounded or
//! self-referential nesting).

pub mod asn;
pub mod domain;
pub mod ip;

use chrono::{DateTime, Utc};
use rdap_client_common::contact::Contact;
use rdap_client_common::response::{Entity, Event, Status};
use serde_json::Value;

use crate::RdapClientError;

/// Entities more than this many levels deep are dropped rather than
/// walked further.
const MAX_ENTITY_DEPTH: u32 = 8;

/// Looks up an optional array field, distinguishing "absent" (tolerated,
/// yields `None`) from "present but not an array" (a malformed document).
fn optional_array<'a>(value: &'a Value, field: &str) -> Result<Option<&'a Vec<Value>>, RdapClientError> {
    match value.get(field) {
        None => Ok(None),
        Some(Value::Null) => Ok(None),
        Some(Value::Array(arr)) => Ok(Some(arr)),
        Some(_) => Err(RdapClientError::malformed_response(
            format!("/{field}"),
            format!("{field} is present but not an array"),
        )),
    }
}

pub(crate) fn parse_statuses(value: &Value) -> Result<Vec<Status>, RdapClientError> {
    Ok(optional_array(value, "status")?
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| Status::from_raw(s.trim().to_ascii_lowercase()))
                .collect()
        })
        .unwrap_or_default())
}

pub(crate) fn parse_notices(value: &Value) -> Result<Vec<String>, RdapClientError> {
    Ok(optional_array(value, "notices")?
        .map(|arr| {
            arr.iter()
                .filter_map(|notice| notice.get("title").and_then(|t| t.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default())
}

pub(crate) fn parse_events(value: &Value) -> Result<Vec<Event>, RdapClientError> {
    Ok(optional_array(value, "events")?
        .map(|arr| {
            arr.iter()
                .filter_map(|event| {
                    let action = event.get("eventAction")?.as_str()?.to_string();
                    let date = event
                        .get("eventDate")
                        .and_then(|v| v.as_str())
                        .and_then(parse_rfc3339);
                    let actor = event
                        .get("eventActor")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                    Some(Event { action, date, actor })
                })
                .collect()
        })
        .unwrap_or_default())
}

fn parse_rfc3339(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn parse_entities(value: &Value) -> Result<Vec<Entity>, RdapClientError> {
    parse_entities_bounded(value, 0)
}

fn parse_entities_bounded(value: &Value, depth: u32) -> Result<Vec<Entity>, RdapClientError> {
    if depth >= MAX_ENTITY_DEPTH {
        return Ok(Vec::new());
    }
    let Some(arr) = optional_array(value, "entities")? else {
        return Ok(Vec::new());
    };
    arr.iter()
        .map(|entity_value| {
            let handle = entity_value
                .get("handle")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            let roles = entity_value
                .get("roles")
                .and_then(|v| v.as_array())
                .map(|roles| {
                    roles
                        .iter()
                        .filter_map(|r| r.as_str())
                        .map(|s| s.to_string())
                        .collect()
                })
                .unwrap_or_default();
            let contact = entity_value
                .get("vcardArray")
                .and_then(|v| v.as_array())
                .and_then(|arr| Contact::from_vcard(arr));
            Ok(Entity {
                handle,
                roles,
                contact,
                statuses: parse_statuses(entity_value)?,
                events: parse_events(entity_value)?,
                entities: parse_entities_bounded(entity_value, depth + 1)?,
            })
        })
        .collect()
}

/// The first entity (at the top level) carrying the given role, if any.
/// Used to lift a domain's registrar out of its entity list.
pub(crate) fn find_entity_with_role(entities: &[Entity], role: &str) -> Option<Entity> {
    entities.iter().find(|e| e.roles.iter().any(|r| r == role)).cloned()
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn GIVEN_status_array_WHEN_parse_statuses_THEN_lowercased() {
        let value = json!({"status": ["ACTIVE", " Client Transfer Prohibited "]});
        let statuses = parse_statuses(&value).unwrap();
        assert_eq!(statuses[0].raw, "active");
        assert_eq!(statuses[1].raw, "client transfer prohibited");
    }

    #[test]
    fn GIVEN_no_status_WHEN_parse_statuses_THEN_empty() {
        let value = json!({});
        assert!(parse_statuses(&value).unwrap().is_empty());
    }

    #[test]
    fn GIVEN_status_not_array_WHEN_parse_statuses_THEN_malformed_response() {
        let value = json!({"status": "active"});
        let err = parse_statuses(&value).unwrap_err();
        assert!(matches!(err, RdapClientError::MalformedResponse { path, .. } if path == "/status"));
    }

    #[test]
    fn GIVEN_events_array_WHEN_parse_events_THEN_dates_parsed() {
        let value = json!({
            "events": [
                {"eventAction": "registration", "eventDate": "1999-08-15T00:00:00Z"},
                {"eventAction": "expiration", "eventDate": "not-a-date"}
            ]
        });
        let events = parse_events(&value).unwrap();
        assert_eq!(events[0].action, "registration");
        assert!(events[0].date.is_some());
        assert_eq!(events[1].action, "expiration");
        assert!(events[1].date.is_none());
    }

    #[test]
    fn GIVEN_events_not_array_WHEN_parse_events_THEN_malformed_response() {
        let value = json!({"events": 42});
        let err = parse_events(&value).unwrap_err();
        assert!(matches!(err, RdapClientError::MalformedResponse { path, .. } if path == "/events"));
    }

    #[test]
    fn GIVEN_deeply_nested_entities_WHEN_parse_entities_THEN_bounded() {
        fn nest(depth: u32) -> Value {
            if depth == 0 {
                json!({"handle": "leaf", "roles": ["registrant"]})
            } else {
                json!({"handle": format!("level-{depth}"), "roles": [], "entities": [nest(depth - 1)]})
            }
        }
        let value = nest(MAX_ENTITY_DEPTH + 5);
        let entities = parse_entities(&value).unwrap();
        // one top-level entity is present; descending past the bound
        // truncates rather than panicking or looping forever
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn GIVEN_entities_not_array_WHEN_parse_entities_THEN_malformed_response() {
        let value = json!({"entities": {"handle": "not-a-list"}});
        let err = parse_entities(&value).unwrap_err();
        assert!(matches!(err, RdapClientError::MalformedResponse { path, .. } if path == "/entities"));
    }

    #[test]
    fn GIVEN_entities_WHEN_find_entity_with_role_THEN_first_match_returned() {
        let entities = vec![
            Entity {
                handle: Some("a".to_string()),
                roles: vec!["technical".to_string()],
                contact: None,
                statuses: vec![],
                events: vec![],
                entities: vec![],
            },
            Entity {
                handle: Some("b".to_string()),
                roles: vec!["registrar".to_string()],
                contact: None,
                statuses: vec![],
                events: vec![],
                entities: vec![],
            },
        ];
        let found = find_entity_with_role(&entities, "registrar").unwrap();
        assert_eq!(found.handle.as_deref(), Some("b"));
    }
}
