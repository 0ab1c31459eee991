//! Freshness metadata for HTTP responses that back a cached value.
//!
//! This mirrors the subset of response headers needed to decide whether a
//! previously fetched body (an IANA bootstrap table, most commonly) is still
//! usable, without re-implementing a general HTTP cache.

use buildstructor::Builder;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Builder, PartialEq, Eq)]
pub struct HttpData {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub host: String,
    pub expires: Option<String>,
    pub cache_control: Option<String>,
    pub received: DateTime<Utc>,
    pub status_code: u16,
    pub retry_after: Option<String>,
}

#[buildstructor::buildstructor]
impl HttpData {
    #[builder(entry = "now")]
    #[allow(clippy::too_many_arguments)]
    pub fn new_now(
        content_length: Option<u64>,
        content_type: Option<String>,
        host: String,
        expires: Option<String>,
        cache_control: Option<String>,
        status_code: Option<u16>,
        retry_after: Option<String>,
    ) -> Self {
        Self {
            content_length,
            content_type,
            host,
            expires,
            cache_control,
            received: Utc::now(),
            status_code: status_code.unwrap_or(200),
            retry_after,
        }
    }

    #[builder(entry = "example")]
    #[allow(clippy::too_many_arguments)]
    pub fn new_example(
        content_length: Option<u64>,
        content_type: Option<String>,
        expires: Option<String>,
        cache_control: Option<String>,
        status_code: Option<u16>,
        retry_after: Option<String>,
    ) -> Self {
        Self {
            content_length,
            content_type,
            host: "example.com".to_string(),
            expires,
            cache_control,
            received: Utc::now(),
            status_code: status_code.unwrap_or(200),
            retry_after,
        }
    }

    /// True if, as of now, this data should be considered stale given a
    /// maximum age fallback (used when the response carried neither
    /// `Cache-Control` nor `Expires`).
    pub fn is_expired(&self, max_age: i64) -> bool {
        if let Some(cache_control) = &self.cache_control {
            let cc_max_age = cache_control
                .split(',')
                .map(|s| s.trim())
                .find_map(|s| s.strip_prefix("max-age="));
            if let Some(cc_max_age) = cc_max_age {
                if let Ok(cc_max_age) = cc_max_age.parse::<i64>() {
                    return Utc::now() >= self.received + Duration::seconds(cc_max_age);
                }
            }
        }
        if let Some(expires) = &self.expires {
            if let Ok(expire_time) = DateTime::parse_from_rfc2822(expires) {
                return Utc::now() >= expire_time;
            }
        }
        Utc::now() >= self.received + Duration::seconds(max_age)
    }

    pub fn should_cache(&self) -> bool {
        if let Some(cache_control) = &self.cache_control {
            return !cache_control
                .split(',')
                .map(|s| s.trim())
                .any(|s| s.eq("no-store") || s.eq("no-cache"));
        }
        true
    }
}
