//! Decoding of RDAP's `vcardArray` (jCard, RFC 7095) into a [`Contact`].
//!
//! jCard represents a vCard as `["vcard", [[name, params, type, value], ...]]`.
//! Everything below is string/array wrangling over that shape; there is no
//! schema validation beyond "does this look like a vcard array".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Email, Lang, NameParts, Phone, PostalAddress};

const CONTEXTS: &[&str] = &["home", "work", "office", "private", "mobile", "cell"];

/// A normalized view of an RDAP entity's vCard.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Contact {
    pub full_name: Option<String>,
    pub kind: Option<String>,
    pub titles: Option<Vec<String>>,
    pub roles: Option<Vec<String>>,
    pub nick_names: Option<Vec<String>>,
    pub organization_names: Option<Vec<String>>,
    pub langs: Option<Vec<Lang>>,
    pub emails: Option<Vec<Email>>,
    pub phones: Option<Vec<Phone>>,
    pub postal_addresses: Option<Vec<PostalAddress>>,
    pub name_parts: Option<NameParts>,
}

#[buildstructor::buildstructor]
impl Contact {
    #[builder]
    #[allow(clippy::too_many_arguments)]
    fn new(
        full_name: Option<String>,
        kind: Option<String>,
        titles: Option<Vec<String>>,
        roles: Option<Vec<String>>,
        nick_names: Option<Vec<String>>,
        organization_names: Option<Vec<String>>,
        langs: Option<Vec<Lang>>,
        emails: Option<Vec<Email>>,
        phones: Option<Vec<Phone>>,
        postal_addresses: Option<Vec<PostalAddress>>,
        name_parts: Option<NameParts>,
    ) -> Self {
        Self {
            full_name,
            kind,
            titles,
            roles,
            nick_names,
            organization_names,
            langs,
            emails,
            phones,
            postal_addresses,
            name_parts,
        }
    }

    /// Parse a `vcardArray` JSON value (the `["vcard", [...]]` pair) into a
    /// [`Contact`]. Returns `None` if the value doesn't start with the
    /// literal `"vcard"` tag.
    pub fn from_vcard(vcard_array: &[Value]) -> Option<Contact> {
        let tag = vcard_array.first()?.as_str()?;
        if tag != "vcard" {
            return None;
        }
        let properties = vcard_array.get(1)?.as_array()?;

        let titles = non_empty(properties.find_texts("title"));
        let roles = non_empty(properties.find_texts("role"));
        let nick_names = non_empty(properties.find_texts("nickname"));
        let organization_names = non_empty(properties.find_texts("org"));
        let langs = non_empty(get_langs(properties));
        let emails = non_empty(get_emails(properties));
        let phones = non_empty(get_phones(properties));
        let postal_addresses = non_empty(get_postal_addresses(properties));

        Some(
            Contact::builder()
                .maybe_full_name(properties.find_text("fn"))
                .maybe_kind(properties.find_text("kind"))
                .maybe_titles(titles)
                .maybe_roles(roles)
                .maybe_nick_names(nick_names)
                .maybe_organization_names(organization_names)
                .maybe_langs(langs)
                .maybe_emails(emails)
                .maybe_phones(phones)
                .maybe_postal_addresses(postal_addresses)
                .maybe_name_parts(get_name_parts(properties))
                .build(),
        )
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

trait FindProperty {
    fn find_property(&self, name: &str) -> Option<&Vec<Value>>;
    fn find_properties(&self, name: &str) -> Vec<&Vec<Value>>;
}

impl FindProperty for Vec<Value> {
    fn find_property(&self, name: &str) -> Option<&Vec<Value>> {
        self.find_properties(name).into_iter().next()
    }

    fn find_properties(&self, name: &str) -> Vec<&Vec<Value>> {
        self.iter()
            .filter_map(|v| v.as_array())
            .filter(|a| a.first().and_then(|n| n.as_str()) == Some(name))
            .collect()
    }
}

trait GetText {
    fn find_text(&self, name: &str) -> Option<String>;
    fn find_texts(&self, name: &str) -> Vec<String>;
}

impl GetText for Vec<Value> {
    fn find_text(&self, name: &str) -> Option<String> {
        self.find_property(name).and_then(|p| p.get_text())
    }

    fn find_texts(&self, name: &str) -> Vec<String> {
        self.find_properties(name)
            .iter()
            .filter_map(|p| p.get_text())
            .collect()
    }
}

trait GetTextValue {
    fn get_text(&self) -> Option<String>;
}

impl GetTextValue for Vec<Value> {
    fn get_text(&self) -> Option<String> {
        self.get(3).and_then(|v| v.as_str()).map(|s| s.to_string())
    }
}

trait GetParams {
    fn get_preference(&self) -> Option<u32>;
    fn get_label(&self) -> Option<String>;
    fn get_contexts(&self) -> Vec<String>;
    fn get_features(&self) -> Vec<String>;
    fn get_param_types(&self) -> Vec<String>;
}

impl GetParams for Vec<Value> {
    fn get_preference(&self) -> Option<u32> {
        self.get(1)
            .and_then(|params| params.get("pref"))
            .and_then(|p| p.as_str().map(|s| s.to_string()).or(p.as_u64().map(|n| n.to_string())))
            .and_then(|s| s.parse::<u32>().ok())
    }

    fn get_label(&self) -> Option<String> {
        self.get(1)
            .and_then(|params| params.get("label"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    fn get_param_types(&self) -> Vec<String> {
        let Some(params) = self.get(1) else {
            return Vec::new();
        };
        let Some(type_value) = params.get("type") else {
            return Vec::new();
        };
        match type_value {
            Value::String(s) => vec![s.to_lowercase()],
            Value::Array(arr) => arr
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_lowercase())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn get_contexts(&self) -> Vec<String> {
        self.get_param_types()
            .into_iter()
            .filter(|t| CONTEXTS.contains(&t.as_str()))
            .collect()
    }

    fn get_features(&self) -> Vec<String> {
        self.get_param_types()
            .into_iter()
            .filter(|t| !CONTEXTS.contains(&t.as_str()))
            .collect()
    }
}

fn get_langs(properties: &Vec<Value>) -> Vec<Lang> {
    properties
        .find_properties("lang")
        .iter()
        .filter_map(|p| {
            let tag = p.get_text()?;
            Some(Lang {
                tag,
                preference: p.get_preference(),
            })
        })
        .collect()
}

fn get_emails(properties: &Vec<Value>) -> Vec<Email> {
    properties
        .find_properties("email")
        .iter()
        .filter_map(|p| {
            let email = p.get_text()?;
            Some(Email {
                email,
                contexts: p.get_contexts(),
                preference: p.get_preference(),
            })
        })
        .collect()
}

fn get_phones(properties: &Vec<Value>) -> Vec<Phone> {
    properties
        .find_properties("tel")
        .iter()
        .filter_map(|p| {
            let phone = p.get_text()?;
            Some(Phone {
                phone,
                contexts: p.get_contexts(),
                features: p.get_features(),
                preference: p.get_preference(),
            })
        })
        .collect()
}

/// `adr` property value is a 7-element array:
/// `[po_box, extended, street, locality, region, postal_code, country]`.
/// We read the country/region slots in reverse, since many real-world
/// vCards put a 2-letter code in one and a display name in the other.
fn get_postal_addresses(properties: &Vec<Value>) -> Vec<PostalAddress> {
    properties
        .find_properties("adr")
        .iter()
        .filter_map(|p| {
            let label = p.get_label();
            let value = p.get(3)?.as_array()?;
            let street_parts: Vec<String> = value
                .get(2)
                .map(|v| value_to_strings(v))
                .unwrap_or_default();
            let locality = value.get(3).and_then(|v| non_empty_string(v));
            let region = value.get(4).and_then(|v| non_empty_string(v));
            let postal_code = value.get(5).and_then(|v| non_empty_string(v));
            let country = value.get(6).and_then(|v| non_empty_string(v));

            let (country_code, country_name) = match &country {
                Some(c) if c.len() == 2 && c.chars().all(|ch| ch.is_ascii_uppercase()) => {
                    (Some(c.clone()), None)
                }
                Some(c) => (None, Some(c.clone())),
                None => (None, None),
            };
            let (region_code, region_name) = match &region {
                Some(r) if r.len() == 2 && r.chars().all(|ch| ch.is_ascii_uppercase()) => {
                    (Some(r.clone()), None)
                }
                Some(r) => (None, Some(r.clone())),
                None => (None, None),
            };

            let full_address = label.or_else(|| {
                join_address_parts(&[
                    street_parts.join(" ").as_str(),
                    locality.as_deref().unwrap_or(""),
                    region.as_deref().unwrap_or(""),
                    postal_code.as_deref().unwrap_or(""),
                    country.as_deref().unwrap_or(""),
                ])
            });

            Some(PostalAddress {
                full_address,
                street_parts: if street_parts.is_empty() {
                    None
                } else {
                    Some(street_parts)
                },
                locality,
                region_name,
                region_code,
                country_name,
                country_code,
                postal_code,
                contexts: p.get_contexts(),
                preference: p.get_preference(),
            })
        })
        .collect()
}

/// Joins structured address components into a single display line when
/// the vCard carried no `label` parameter, skipping empty components.
fn join_address_parts(parts: &[&str]) -> Option<String> {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// `n` property value is a 5-element array:
/// `[surnames, given_names, middle_names, prefixes, suffixes]`.
fn get_name_parts(properties: &Vec<Value>) -> Option<NameParts> {
    let n = properties.find_property("n")?;
    let value = n.get(3)?.as_array()?;
    Some(NameParts {
        surnames: value.first().map(value_to_strings).unwrap_or_default(),
        given_names: value.get(1).map(value_to_strings).unwrap_or_default(),
        middle_names: value.get(2).map(value_to_strings).unwrap_or_default(),
        prefixes: value.get(3).map(value_to_strings).unwrap_or_default(),
        suffixes: value.get(4).map(value_to_strings).unwrap_or_default(),
    })
}

fn value_to_strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn non_empty_string(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(|s| s.to_string())
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_vcard() -> Value {
        json!([
            "vcard",
            [
                ["version", {}, "text", "4.0"],
                ["fn", {}, "text", "Joe User"],
                ["kind", {}, "text", "individual"],
                ["org", {}, "text", "Example Registrar, Inc."],
                ["title", {}, "text", "Research Scientist"],
                ["role", {}, "text", "Project Lead"],
                [
                    "n",
                    {},
                    "text",
                    ["User", "Joe", "", "", ""]
                ],
                [
                    "email",
                    {"type": "work"},
                    "text",
                    "joe.user@example.com"
                ],
                [
                    "tel",
                    {"type": ["work", "voice"], "pref": "1"},
                    "uri",
                    "tel:+1-555-555-0123;ext=101"
                ],
                [
                    "adr",
                    {"type": "work", "label": "123 Example St.\nDulles, VA 20166-6503\nUSA"},
                    "text",
                    ["", "", ["123 Example St."], "Dulles", "VA", "20166-6503", "US"]
                ]
            ]
        ])
    }

    #[test]
    fn GIVEN_vcard_array_WHEN_from_vcard_THEN_all_fields_decoded() {
        let value = sample_vcard();
        let array = value.as_array().unwrap();
        let contact = Contact::from_vcard(array).unwrap();

        assert_eq!(contact.full_name.as_deref(), Some("Joe User"));
        assert_eq!(contact.kind.as_deref(), Some("individual"));
        assert_eq!(
            contact.organization_names,
            Some(vec!["Example Registrar, Inc.".to_string()])
        );
        assert_eq!(contact.titles, Some(vec!["Research Scientist".to_string()]));
        assert_eq!(contact.roles, Some(vec!["Project Lead".to_string()]));

        let name_parts = contact.name_parts.unwrap();
        assert_eq!(name_parts.surnames, vec!["User".to_string()]);
        assert_eq!(name_parts.given_names, vec!["Joe".to_string()]);

        let emails = contact.emails.unwrap();
        assert_eq!(emails[0].email, "joe.user@example.com");
        assert_eq!(emails[0].contexts, vec!["work".to_string()]);

        let phones = contact.phones.unwrap();
        assert_eq!(phones[0].phone, "tel:+1-555-555-0123;ext=101");
        assert_eq!(phones[0].preference, Some(1));
        assert!(phones[0].contexts.contains(&"work".to_string()));
        assert!(phones[0].features.contains(&"voice".to_string()));

        let addresses = contact.postal_addresses.unwrap();
        assert_eq!(addresses[0].locality.as_deref(), Some("Dulles"));
        assert_eq!(addresses[0].country_code.as_deref(), Some("US"));
    }

    #[test]
    fn GIVEN_non_vcard_array_WHEN_from_vcard_THEN_none() {
        let value = json!(["not-vcard", []]);
        let array = value.as_array().unwrap();
        assert!(Contact::from_vcard(array).is_none());
    }

    #[test]
    fn GIVEN_empty_properties_WHEN_from_vcard_THEN_empty_contact() {
        let value = json!(["vcard", [["version", {}, "text", "4.0"]]]);
        let array = value.as_array().unwrap();
        let contact = Contact::from_vcard(array).unwrap();
        assert_eq!(contact, Contact::default());
    }

    #[test]
    fn GIVEN_adr_without_label_WHEN_from_vcard_THEN_full_address_synthesized() {
        let value = json!([
            "vcard",
            [
                ["version", {}, "text", "4.0"],
                [
                    "adr",
                    {"type": "work"},
                    "text",
                    ["", "", ["123 Example St."], "Dulles", "VA", "20166-6503", "US"]
                ]
            ]
        ]);
        let array = value.as_array().unwrap();
        let contact = Contact::from_vcard(array).unwrap();
        let address = &contact.postal_addresses.unwrap()[0];
        assert_eq!(
            address.full_address.as_deref(),
            Some("123 Example St., Dulles, VA, 20166-6503, US")
        );
    }

    #[test]
    fn GIVEN_adr_with_empty_components_WHEN_from_vcard_THEN_empty_components_skipped() {
        let value = json!([
            "vcard",
            [
                ["version", {}, "text", "4.0"],
                [
                    "adr",
                    {},
                    "text",
                    ["", "", [], "Dulles", "", "", "US"]
                ]
            ]
        ]);
        let array = value.as_array().unwrap();
        let contact = Contact::from_vcard(array).unwrap();
        let address = &contact.postal_addresses.unwrap()[0];
        assert_eq!(address.full_address.as_deref(), Some("Dulles, US"));
    }
}
