//! RDAP media types (formerly known as mime types).

/// The "application/json" media type value.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// The "application/rdap+json" media type value.
pub const RDAP_MEDIA_TYPE: &str = "application/rdap+json";

/// The `Accept` header value sent with every RDAP request: the RDAP media
/// type preferred, with plain JSON as a fallback per RFC 7480 §5.
pub const RDAP_ACCEPT_HEADER: &str = "application/rdap+json, application/json;q=0.5";
