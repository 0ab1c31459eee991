//! Classification of IP addresses into the categories the fetch pipeline
//! needs in order to decide whether an address is safe to connect to.
//!
//! The category boundaries (loopback, link-local, private, multicast,
//! documentation, etc.) are the same ranges a generic SSRF guard checks;
//! this module only answers "what is this address", leaving policy
//! ("is this category forbidden") to the caller.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// A bucket an address falls into. Ordered roughly from "definitely not a
/// public, routable address" to "ordinary global unicast".
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum AddressClass {
    Loopback,
    LinkLocal,
    Private,
    UniqueLocal,
    Multicast,
    Unspecified,
    Documentation,
    Broadcast,
    Reserved,
    Global,
}

impl AddressClass {
    /// Every class except [`AddressClass::Global`] describes an address
    /// that should never be treated as an ordinary internet endpoint.
    pub fn is_non_global(&self) -> bool {
        !matches!(self, AddressClass::Global)
    }
}

/// Classify an IPv4 address.
///
/// Range table (see RFC 1918, RFC 5735, RFC 6598, RFC 3927, RFC 2544):
/// - 127.0.0.0/8 -> Loopback
/// - 0.0.0.0/8 -> Unspecified (only 0.0.0.0 itself is truly unspecified, but
///   the whole "this network" block is treated the same way: unsafe to dial)
/// - 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16 -> Private
/// - 100.64.0.0/10 -> Private (carrier-grade NAT, RFC 6598)
/// - 169.254.0.0/16 -> LinkLocal
/// - 192.0.0.0/24, 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24 -> Documentation
/// - 198.18.0.0/15 -> Reserved (benchmarking, RFC 2544)
/// - 224.0.0.0/4 -> Multicast
/// - 240.0.0.0/4 -> Reserved
/// - 255.255.255.255 -> Broadcast
pub fn classify_ipv4(addr: &Ipv4Addr) -> AddressClass {
    let octets = addr.octets();

    if addr.is_loopback() {
        return AddressClass::Loopback;
    }
    if *addr == Ipv4Addr::UNSPECIFIED || octets[0] == 0 {
        return AddressClass::Unspecified;
    }
    if *addr == Ipv4Addr::BROADCAST {
        return AddressClass::Broadcast;
    }
    if octets[0] == 10
        || (octets[0] == 172 && (16..=31).contains(&octets[1]))
        || (octets[0] == 192 && octets[1] == 168)
        || (octets[0] == 100 && (64..=127).contains(&octets[1]))
    {
        return AddressClass::Private;
    }
    if octets[0] == 169 && octets[1] == 254 {
        return AddressClass::LinkLocal;
    }
    if (octets[0] == 192 && octets[1] == 0 && octets[2] == 0)
        || (octets[0] == 192 && octets[1] == 0 && octets[2] == 2)
        || (octets[0] == 198 && octets[1] == 51 && octets[2] == 100)
        || (octets[0] == 203 && octets[1] == 0 && octets[2] == 113)
    {
        return AddressClass::Documentation;
    }
    if octets[0] == 198 && (18..=19).contains(&octets[1]) {
        return AddressClass::Reserved;
    }
    if octets[0] >= 224 && octets[0] < 240 {
        return AddressClass::Multicast;
    }
    if octets[0] >= 240 {
        return AddressClass::Reserved;
    }
    AddressClass::Global
}

/// Classify an IPv6 address.
///
/// Range table (see RFC 4193, RFC 4291, RFC 3849, RFC 3056, RFC 4380):
/// - ::1 -> Loopback
/// - :: -> Unspecified
/// - ::ffff:0:0/96 (IPv4-mapped) -> delegates to [`classify_ipv4`]
/// - fe80::/10 -> LinkLocal
/// - fc00::/7 -> UniqueLocal
/// - ff00::/8 -> Multicast
/// - 2001:db8::/32 -> Documentation
/// - 2002::/16 (6to4) -> classifies the embedded IPv4 address
/// - 2001::/32 (Teredo) -> Reserved
pub fn classify_ipv6(addr: &Ipv6Addr) -> AddressClass {
    if addr.is_loopback() {
        return AddressClass::Loopback;
    }
    if addr.is_unspecified() {
        return AddressClass::Unspecified;
    }
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return classify_ipv4(&mapped);
    }
    let segments = addr.segments();
    if (segments[0] & 0xffc0) == 0xfe80 {
        return AddressClass::LinkLocal;
    }
    if (segments[0] & 0xfe00) == 0xfc00 {
        return AddressClass::UniqueLocal;
    }
    if (segments[0] & 0xff00) == 0xff00 {
        return AddressClass::Multicast;
    }
    if segments[0] == 0x2001 && segments[1] == 0x0db8 {
        return AddressClass::Documentation;
    }
    if segments[0] == 0x2002 {
        let v4 = Ipv4Addr::new(
            (segments[1] >> 8) as u8,
            (segments[1] & 0xff) as u8,
            (segments[2] >> 8) as u8,
            (segments[2] & 0xff) as u8,
        );
        return classify_ipv4(&v4);
    }
    if segments[0] == 0x2001 && segments[1] == 0x0000 {
        return AddressClass::Reserved;
    }
    AddressClass::Global
}
