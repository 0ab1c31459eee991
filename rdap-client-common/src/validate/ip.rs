//! IP address canonicalization.

use std::net::IpAddr;

use super::ValidationError;

/// Parse and canonicalize an IP address string to its standard textual
/// representation.
///
/// Accepts dotted-quad IPv4 and RFC 4291 textual IPv6, including compressed
/// zero runs and an optional `%zone` suffix (e.g. `"fe80::1%eth0"`), which
/// is stripped: the zone identifier names a local interface, meaningless
/// once the address leaves this host as an RDAP query key.
pub fn canonicalize_ip(input: &str) -> Result<IpAddr, ValidationError> {
    let trimmed = input.trim();
    let without_zone = trimmed.split('%').next().unwrap_or(trimmed);
    without_zone
        .parse::<IpAddr>()
        .map_err(|_| ValidationError::InvalidIpAddress(input.to_string()))
}
