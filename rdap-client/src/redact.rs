//! PII redaction applied to normalized responses on read.
//!
//! Applied after normalization rather than to the raw RDAP JSON, so it
//! only ever has to know about the small set of contact fields, not the
//! full RDAP object model. Idempotent: redacting an already-redacted
//! contact is a no-op, since the placeholder values don't match anything
//! a redaction pass looks for.

use rdap_client_common::contact::Contact;
use rdap_client_common::response::{AsnResponse, DomainResponse, Entity, IpResponse};
use serde::{Deserialize, Serialize};

/// Placeholder for a redacted email address. An email-shaped placeholder,
/// rather than a bare token, so downstream code that validates or displays
/// the field as an email doesn't choke on it.
const REDACTED_EMAIL: &str = "redacted@redacted.invalid";
const REDACTED: &str = "REDACTED";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedactionPolicy {
    pub redact_email: bool,
    pub redact_phone: bool,
    pub redact_name: bool,
    pub redact_address: bool,
    /// When `redact_name` is set, an entity with a populated organization
    /// name keeps `full_name` intact instead of being blanked: the
    /// organization identifies a business, not a natural person.
    pub preserve_organizations: bool,
    /// When `redact_address` is set, the country name/code survive
    /// redaction; everything else in the address is still blanked. Useful
    /// for callers that need jurisdiction without needing street-level PII.
    pub preserve_country: bool,
    /// Whether the raw, unredacted server response may be retained on the
    /// normalized response's `raw` field. Redaction clears it when false,
    /// since the raw blob bypasses every other redaction rule.
    pub retain_raw: bool,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            redact_email: true,
            redact_phone: true,
            redact_name: true,
            redact_address: true,
            preserve_organizations: false,
            preserve_country: false,
            retain_raw: false,
        }
    }
}

impl RedactionPolicy {
    /// No fields redacted; useful for callers entitled to see raw
    /// registrant data (e.g. a registrar's own support tooling).
    pub fn none() -> Self {
        Self {
            redact_email: false,
            redact_phone: false,
            redact_name: false,
            redact_address: false,
            preserve_organizations: false,
            preserve_country: false,
            retain_raw: true,
        }
    }
}

pub fn redact_domain(domain: &DomainResponse, policy: &RedactionPolicy) -> DomainResponse {
    let mut redacted = domain.clone();
    redacted.entities = redact_entities(&domain.entities, policy);
    redacted.registrar = domain.registrar.as_ref().map(|r| redact_entity(r, policy));
    if !policy.retain_raw {
        redacted.raw = None;
    }
    redacted
}

pub fn redact_ip(ip: &IpResponse, policy: &RedactionPolicy) -> IpResponse {
    let mut redacted = ip.clone();
    redacted.entities = redact_entities(&ip.entities, policy);
    if !policy.retain_raw {
        redacted.raw = None;
    }
    redacted
}

pub fn redact_asn(asn: &AsnResponse, policy: &RedactionPolicy) -> AsnResponse {
    let mut redacted = asn.clone();
    redacted.entities = redact_entities(&asn.entities, policy);
    if !policy.retain_raw {
        redacted.raw = None;
    }
    redacted
}

fn redact_entities(entities: &[Entity], policy: &RedactionPolicy) -> Vec<Entity> {
    entities.iter().map(|e| redact_entity(e, policy)).collect()
}

fn redact_entity(entity: &Entity, policy: &RedactionPolicy) -> Entity {
    let mut redacted = entity.clone();
    redacted.contact = entity.contact.as_ref().map(|c| redact_contact(c, policy));
    redacted.entities = redact_entities(&entity.entities, policy);
    redacted
}

fn redact_contact(contact: &Contact, policy: &RedactionPolicy) -> Contact {
    let mut redacted = contact.clone();

    let has_organization = redacted
        .organization_names
        .as_ref()
        .is_some_and(|names| names.iter().any(|n| !n.is_empty()));

    if policy.redact_name && !(policy.preserve_organizations && has_organization) {
        redacted.full_name = redacted.full_name.map(|_| REDACTED.to_string());
        redacted.nick_names = redacted.nick_names.map(|names| names.iter().map(|_| REDACTED.to_string()).collect());
        redacted.name_parts = redacted.name_parts.map(|_| Default::default());
    }
    if policy.redact_email {
        if let Some(emails) = &mut redacted.emails {
            for email in emails.iter_mut() {
                email.email = REDACTED_EMAIL.to_string();
            }
        }
    }
    if policy.redact_phone {
        if let Some(phones) = &mut redacted.phones {
            for phone in phones.iter_mut() {
                phone.phone = REDACTED.to_string();
            }
        }
    }
    if policy.redact_address {
        if let Some(addresses) = &mut redacted.postal_addresses {
            for address in addresses.iter_mut() {
                address.full_address = address.full_address.as_ref().map(|_| REDACTED.to_string());
                address.street_parts = address
                    .street_parts
                    .as_ref()
                    .map(|parts| parts.iter().map(|_| REDACTED.to_string()).collect());
                address.locality = address.locality.as_ref().map(|_| REDACTED.to_string());
                address.region_name = address.region_name.as_ref().map(|_| REDACTED.to_string());
                address.region_code = address.region_code.as_ref().map(|_| REDACTED.to_string());
                address.postal_code = address.postal_code.as_ref().map(|_| REDACTED.to_string());
                if !policy.preserve_country {
                    address.country_name = address.country_name.as_ref().map(|_| REDACTED.to_string());
                    address.country_code = address.country_code.as_ref().map(|_| REDACTED.to_string());
                }
            }
        }
    }

    redacted
}
