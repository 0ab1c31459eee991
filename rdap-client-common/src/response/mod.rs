//! Normalized response shapes returned by the client.
//!
//! These are deliberately flatter than RDAP's own object-class hierarchy:
//! one struct per query kind (domain/ip/asn), each carrying the handful of
//! fields every registry actually sends plus an `extension` bag for the
//! rest. Status tokens, events, and entities are shared shapes reused
//! across all three.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};

use crate::contact::Contact;

/// The IANA RDAP status token registry (RFC 9083 §4.6, folded per RFC 7483
/// §10.2.2 rules): every value a server actually sends is one of these, so
/// a recognized token canonicalizes to a fixed enum rather than staying a
/// free-form string callers each have to re-parse.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCode {
    #[strum(serialize = "active")]
    Active,
    #[strum(serialize = "administrative")]
    Administrative,
    #[strum(serialize = "associated")]
    Associated,
    #[strum(serialize = "auto renew period")]
    AutoRenewPeriod,
    #[strum(serialize = "client delete prohibited")]
    ClientDeleteProhibited,
    #[strum(serialize = "client hold")]
    ClientHold,
    #[strum(serialize = "client renew prohibited")]
    ClientRenewProhibited,
    #[strum(serialize = "client transfer prohibited")]
    ClientTransferProhibited,
    #[strum(serialize = "client update prohibited")]
    ClientUpdateProhibited,
    #[strum(serialize = "delete prohibited")]
    DeleteProhibited,
    #[strum(serialize = "inactive")]
    Inactive,
    #[strum(serialize = "locked")]
    Locked,
    #[strum(serialize = "obscured")]
    Obscured,
    #[strum(serialize = "pending create")]
    PendingCreate,
    #[strum(serialize = "pending delete")]
    PendingDelete,
    #[strum(serialize = "pending renew")]
    PendingRenew,
    #[strum(serialize = "pending restore")]
    PendingRestore,
    #[strum(serialize = "pending transfer")]
    PendingTransfer,
    #[strum(serialize = "pending update")]
    PendingUpdate,
    #[strum(serialize = "private")]
    Private,
    #[strum(serialize = "proxy")]
    Proxy,
    #[strum(serialize = "redemption period")]
    RedemptionPeriod,
    #[strum(serialize = "removed")]
    Removed,
    #[strum(serialize = "renew period")]
    RenewPeriod,
    #[strum(serialize = "renew prohibited")]
    RenewProhibited,
    #[strum(serialize = "reserved")]
    Reserved,
    #[strum(serialize = "server delete prohibited")]
    ServerDeleteProhibited,
    #[strum(serialize = "server hold")]
    ServerHold,
    #[strum(serialize = "server renew prohibited")]
    ServerRenewProhibited,
    #[strum(serialize = "server transfer prohibited")]
    ServerTransferProhibited,
    #[strum(serialize = "server update prohibited")]
    ServerUpdateProhibited,
    #[strum(serialize = "transfer period")]
    TransferPeriod,
    #[strum(serialize = "transfer prohibited")]
    TransferProhibited,
    #[strum(serialize = "update prohibited")]
    UpdateProhibited,
    #[strum(serialize = "validated")]
    Validated,
}

/// A status token folded out of RDAP's `status` array (RFC 7483 §10.2.2).
/// `code` is `Some` when the token matches a known value from the IANA
/// registry; `raw` always preserves whatever string the server sent, case
/// and whitespace normalized, so callers can recover tokens this enum
/// doesn't yet know about.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub code: Option<StatusCode>,
    pub raw: String,
}

impl Status {
    /// Folds a raw status string (already lowercased/trimmed by the
    /// caller) into its canonical form if recognized.
    pub fn from_raw(raw: String) -> Self {
        let code = raw.parse::<StatusCode>().ok();
        Self { code, raw }
    }
}

/// A lifecycle event (registration, expiration, last changed, ...).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub action: String,
    pub date: Option<DateTime<Utc>>,
    pub actor: Option<String>,
}

/// A participant entity (registrant, registrar, administrative contact,
/// abuse contact, ...), with its jCard decoded into a [`Contact`] when
/// present.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    pub handle: Option<String>,
    pub roles: Vec<String>,
    pub contact: Option<Contact>,
    pub statuses: Vec<Status>,
    pub events: Vec<Event>,
    /// Nested entities (e.g. a registrar's abuse-contact sub-entity),
    /// bounded in depth by the caller to avoid unbounded recursion on a
    /// pathological or malicious response.
    pub entities: Vec<Entity>,
}

/// A nameserver referenced by a domain object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Nameserver {
    pub name: String,
    pub ip_addresses: Vec<IpAddr>,
}

/// The result of a domain query.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DomainResponse {
    pub ldh_name: String,
    pub unicode_name: Option<String>,
    pub handle: Option<String>,
    pub statuses: Vec<Status>,
    pub events: Vec<Event>,
    pub entities: Vec<Entity>,
    pub nameservers: Vec<Nameserver>,
    /// The entity with a "registrar" role, lifted to the top level since
    /// nearly every caller wants it without walking `entities`.
    pub registrar: Option<Entity>,
    pub notices: Vec<String>,
    pub port43: Option<String>,
    /// The unparsed server response, retained only when the caller's
    /// config allows it; cleared by redaction when the policy forbids raw
    /// retention, since the raw blob bypasses every redaction rule applied
    /// to the normalized fields.
    pub raw: Option<Value>,
}

/// The result of an IP network query.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IpResponse {
    pub start_address: IpAddr,
    pub end_address: IpAddr,
    pub cidr: Option<String>,
    pub name: Option<String>,
    pub network_type: Option<String>,
    pub country: Option<String>,
    pub handle: Option<String>,
    /// Handle of the network this one was allocated out of, when the
    /// server reports one.
    pub parent_handle: Option<String>,
    pub statuses: Vec<Status>,
    pub events: Vec<Event>,
    pub entities: Vec<Entity>,
    pub notices: Vec<String>,
    pub raw: Option<Value>,
}

/// The result of an autonomous system number query.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AsnResponse {
    pub start_autnum: u32,
    pub end_autnum: u32,
    pub name: Option<String>,
    pub autnum_type: Option<String>,
    pub country: Option<String>,
    pub handle: Option<String>,
    pub parent_handle: Option<String>,
    pub statuses: Vec<Status>,
    pub events: Vec<Event>,
    pub entities: Vec<Entity>,
    pub notices: Vec<String>,
    pub raw: Option<Value>,
}

/// The three query outcomes the client can hand back, unified for
/// callers that dispatch on query kind rather than calling `domain()`,
/// `ip()`, or `asn()` directly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "queryType", rename_all = "lowercase")]
pub enum RdapObject {
    Domain(DomainResponse),
    Ip(IpResponse),
    Asn(AsnResponse),
}

/// The subset common to every query response, for callers that want to
/// read a handle or walk statuses/events/notices without matching on
/// which of the three kinds they have.
pub trait RdapResponse {
    fn handle(&self) -> Option<&str>;
    fn statuses(&self) -> &[Status];
    fn events(&self) -> &[Event];
    fn entities(&self) -> &[Entity];
    fn notices(&self) -> &[String];
}

macro_rules! impl_rdap_response {
    ($ty:ty) => {
        impl RdapResponse for $ty {
            fn handle(&self) -> Option<&str> {
                self.handle.as_deref()
            }
            fn statuses(&self) -> &[Status] {
                &self.statuses
            }
            fn events(&self) -> &[Event] {
                &self.events
            }
            fn entities(&self) -> &[Entity] {
                &self.entities
            }
            fn notices(&self) -> &[String] {
                &self.notices
            }
        }
    };
}

impl_rdap_response!(DomainResponse);
impl_rdap_response!(IpResponse);
impl_rdap_response!(AsnResponse);

impl RdapObject {
    fn as_dyn(&self) -> &dyn RdapResponse {
        match self {
            RdapObject::Domain(d) => d,
            RdapObject::Ip(i) => i,
            RdapObject::Asn(a) => a,
        }
    }
}

impl RdapResponse for RdapObject {
    fn handle(&self) -> Option<&str> {
        self.as_dyn().handle()
    }
    fn statuses(&self) -> &[Status] {
        self.as_dyn().statuses()
    }
    fn events(&self) -> &[Event] {
        self.as_dyn().events()
    }
    fn entities(&self) -> &[Entity] {
        self.as_dyn().entities()
    }
    fn notices(&self) -> &[String] {
        self.as_dyn().notices()
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn GIVEN_known_token_WHEN_from_raw_THEN_code_set() {
        let status = Status::from_raw("client transfer prohibited".to_string());
        assert_eq!(status.code, Some(StatusCode::ClientTransferProhibited));
    }

    #[test]
    fn GIVEN_unknown_token_WHEN_from_raw_THEN_code_none_but_raw_preserved() {
        let status = Status::from_raw("some-future-extension".to_string());
        assert_eq!(status.code, None);
        assert_eq!(status.raw, "some-future-extension");
    }

    #[test]
    fn GIVEN_status_code_WHEN_display_THEN_matches_registry_token() {
        assert_eq!(StatusCode::RedemptionPeriod.to_string(), "redemption period");
    }

    #[test]
    fn GIVEN_rdap_object_variants_WHEN_handle_THEN_dispatches_to_inner_response() {
        let domain = DomainResponse {
            ldh_name: "example.com".to_string(),
            unicode_name: None,
            handle: Some("EXAMPLE-DOMAIN".to_string()),
            statuses: vec![],
            events: vec![],
            entities: vec![],
            nameservers: vec![],
            registrar: None,
            notices: vec![],
            port43: None,
            raw: None,
        };
        let object = RdapObject::Domain(domain.clone());
        assert_eq!(object.handle(), domain.handle());
        assert_eq!(object.statuses().len(), 0);
    }
}
