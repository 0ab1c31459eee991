//! Pure canonicalization and validation of the three query inputs the
//! client accepts: domain names, IP addresses, and autonomous system
//! numbers.
//!
//! Every function here is total over `&str` input: it either returns a
//! canonical form or a [`ValidationError`] describing why the input was
//! rejected. None of this module talks to the network.

pub mod asn;
pub mod domain;
pub mod ip;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{0}' is not a valid domain name")]
    InvalidDomain(String),
    #[error("'{0}' is not a valid IP address")]
    InvalidIpAddress(String),
    #[error("'{0}' is not a valid autonomous system number")]
    InvalidAsn(String),
}

pub use asn::canonicalize_asn;
pub use domain::canonicalize_domain;
pub use ip::canonicalize_ip;
