#![doc = "Common data structures for the RDAP client."]

pub mod contact;
pub mod httpdata;
pub mod iana;
pub mod media_types;
pub mod network;
pub mod response;
pub mod validate;

#[cfg(debug_assertions)]
use const_format::formatcp;

/// Version of this software.
#[cfg(not(debug_assertions))]
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of this software.
#[cfg(debug_assertions)]
pub const VERSION: &str = formatcp!("{}_DEV_BUILD", env!("CARGO_PKG_VERSION"));
