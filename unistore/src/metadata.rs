//! Header-like facts about a stored object, returned by `exists` without
//! transferring the body.
//!
//! The key names are shared by every backend, so code written against one
//! backend reads the same keys from another.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, ETAG, HeaderMap, HeaderName, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

pub const ACCEPT_RANGES_KEY: &str = "Accept-Ranges";
pub const CONTENT_LENGTH_KEY: &str = "Content-Length";
pub const ETAG_KEY: &str = "ETag";
pub const LAST_MODIFIED_KEY: &str = "Last-Modified";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceMetadata {
    #[serde(rename = "Accept-Ranges", skip_serializing_if = "Option::is_none")]
    pub accept_ranges: Option<String>,
    #[serde(rename = "Content-Length", skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "Last-Modified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl ExistenceMetadata {
    /// Picks the four known headers out of an HTTP response header set.
    /// Values that are not valid UTF-8 are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Self {
            accept_ranges: text(ACCEPT_RANGES),
            content_length: text(CONTENT_LENGTH).and_then(|v| v.trim().parse().ok()),
            etag: text(ETAG),
            last_modified: text(LAST_MODIFIED),
        }
    }

    /// Looks a value up by its header name, e.g. `meta.get("ETag")`.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            ACCEPT_RANGES_KEY => self.accept_ranges.clone(),
            CONTENT_LENGTH_KEY => self.content_length.map(|len| len.to_string()),
            ETAG_KEY => self.etag.clone(),
            LAST_MODIFIED_KEY => self.last_modified.clone(),
            _ => None,
        }
    }

    /// Present entries as `(header name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, String)> + '_ {
        [
            ACCEPT_RANGES_KEY,
            CONTENT_LENGTH_KEY,
            ETAG_KEY,
            LAST_MODIFIED_KEY,
        ]
        .into_iter()
        .filter_map(|key| self.get(key).map(|value| (key, value)))
    }
}

/// Formats a timestamp as an HTTP-date (`Wed, 21 Oct 2015 07:28:00 GMT`).
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}
