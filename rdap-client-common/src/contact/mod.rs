//! A normalized contact ("entity" vCard) parsed out of an RDAP response's
//! `vcardArray`.
//!
//! This is the shape the redactor and the response normalizer both work
//! against; [`from_vcard`] is the only place that understands jCard's wire
//! format (RFC 7095 / RFC 6350).

pub mod from_vcard;

use serde::{Deserialize, Serialize};

pub use from_vcard::Contact;

/// One language preference attached to a contact (RFC 6350 `LANG`
/// property).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Lang {
    pub tag: String,
    pub preference: Option<u32>,
}

/// An email address, with the contexts (home/work/...) it was tagged with.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Email {
    pub email: String,
    pub contexts: Vec<String>,
    pub preference: Option<u32>,
}

/// A phone number, with contexts and feature tags (voice/fax/cell/...).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Phone {
    pub phone: String,
    pub contexts: Vec<String>,
    pub features: Vec<String>,
    pub preference: Option<u32>,
}

/// A postal address, already split into its structural parts. `full_address`
/// holds the free-text rendering when the vCard supplied one via the
/// `label` parameter instead of (or alongside) structured components.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct PostalAddress {
    pub full_address: Option<String>,
    pub street_parts: Option<Vec<String>>,
    pub locality: Option<String>,
    pub region_name: Option<String>,
    pub region_code: Option<String>,
    pub country_name: Option<String>,
    pub country_code: Option<String>,
    pub postal_code: Option<String>,
    pub contexts: Vec<String>,
    pub preference: Option<u32>,
}

/// The decomposed parts of a personal name (RFC 6350 `N` property).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct NameParts {
    pub surnames: Vec<String>,
    pub given_names: Vec<String>,
    pub middle_names: Vec<String>,
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
}
