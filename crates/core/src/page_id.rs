//! Page identifier normalization
//!
//! Agents often paste a browser URL where a page ID is expected. These
//! helpers accept IDs (numeric strings or integers) as well as Confluence
//! page URLs and return the bare page ID.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Modern Cloud URLs: `.../wiki/spaces/TEAM/pages/123456789/Page+Title`
static MODERN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/pages/(\d+)(?:[/?#]|$)").expect("modern page URL pattern"));

/// Legacy URLs: `.../pages/viewpage.action?pageId=987654`
static LEGACY_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]pageId=(\d+)").expect("legacy page URL pattern"));

/// A page identifier as it arrives from a tool call: JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageIdValue {
    Number(u64),
    Text(String),
}

impl From<&str> for PageIdValue {
    fn from(value: &str) -> Self {
        PageIdValue::Text(value.to_string())
    }
}

impl From<u64> for PageIdValue {
    fn from(value: u64) -> Self {
        PageIdValue::Number(value)
    }
}

/// Extract a page ID from an ID or a Confluence page URL.
///
/// - `None` stays `None`
/// - integers and numeric strings are returned in string form
/// - modern (`/pages/<id>/...`) and legacy (`?pageId=<id>`) URLs yield the ID
/// - anything else is returned unchanged; unrecognized URLs log a warning
pub fn parse_page_id_from_url(value: Option<&PageIdValue>) -> Option<String> {
    match value? {
        PageIdValue::Number(id) => Some(id.to_string()),
        PageIdValue::Text(text) => Some(parse_page_id_str(text)),
    }
}

/// String form of [`parse_page_id_from_url`].
pub fn parse_page_id_str(input: &str) -> String {
    let trimmed = input.trim();

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return input.to_string();
    }

    let captured = MODERN_URL
        .captures(trimmed)
        .or_else(|| LEGACY_URL.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string());

    match captured {
        Some(id) => id,
        None => {
            log::warn!("Could not extract a page ID from URL '{input}', using it as-is");
            input.to_string()
        }
    }
}
