//! Domain name canonicalization: Unicode folding, trailing-dot removal,
//! and LDH (letter-digit-hyphen) validation of the resulting ASCII form.

use super::ValidationError;

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// Canonicalize a domain name for use as an RDAP query key and as a
/// bootstrap-table lookup key.
///
/// - Trims a single trailing root dot (`"example.com."` -> `"example.com"`).
/// - Lowercases.
/// - Converts any Unicode labels to their ASCII (punycode) form via IDNA,
///   so `"münchen.de"` and `"xn--mnchen-3ya.de"` canonicalize identically.
/// - Rejects empty labels (`"example..com"`), labels over 63 octets, and
///   a total length over 253 octets.
pub fn canonicalize_domain(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidDomain(input.to_string()));
    }
    let without_root_dot = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if without_root_dot.is_empty() {
        return Err(ValidationError::InvalidDomain(input.to_string()));
    }

    let ascii = idna::domain_to_ascii(without_root_dot)
        .map_err(|_| ValidationError::InvalidDomain(input.to_string()))?;

    if ascii.len() > MAX_DOMAIN_LENGTH {
        return Err(ValidationError::InvalidDomain(input.to_string()));
    }

    let labels: Vec<&str> = ascii.split('.').collect();
    if labels.iter().any(|label| label.is_empty() || label.len() > MAX_LABEL_LENGTH) {
        return Err(ValidationError::InvalidDomain(input.to_string()));
    }
    if !labels.iter().all(|label| is_ldh_label(label)) {
        return Err(ValidationError::InvalidDomain(input.to_string()));
    }

    Ok(ascii)
}

fn is_ldh_label(label: &str) -> bool {
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
}
