//! Conversions between Confluence storage format and markdown
//!
//! Storage format is Confluence's XHTML dialect. Pages are read as storage and
//! optionally rendered to markdown for agents; markdown written by agents is
//! rendered to storage before it is sent to the API.

use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h([1-6])>(.*?)</h[1-6]>").expect("heading pattern"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

/// Render storage format (XHTML) as markdown.
pub fn storage_to_markdown(storage: &str) -> String {
    if storage.trim().is_empty() {
        return String::new();
    }

    html2md::parse_html(storage).trim().to_string()
}

/// Render markdown as storage format.
///
/// With `heading_anchors`, every heading starts with an anchor macro named
/// after the heading text so it can be linked to with `#anchor`.
pub fn markdown_to_storage(markdown: &str, heading_anchors: bool) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut storage = String::new();
    html::push_html(&mut storage, parser);

    if heading_anchors {
        storage = add_heading_anchors(&storage);
    }

    storage.trim_end().to_string()
}

fn add_heading_anchors(storage: &str) -> String {
    HEADING
        .replace_all(storage, |caps: &regex::Captures| {
            let level = &caps[1];
            let inner = &caps[2];
            let slug = anchor_slug(inner);

            if slug.is_empty() {
                return format!("<h{level}>{inner}</h{level}>");
            }

            format!(
                "<h{level}><ac:structured-macro ac:name=\"anchor\"><ac:parameter ac:name=\"\">{slug}</ac:parameter></ac:structured-macro>{inner}</h{level}>"
            )
        })
        .into_owned()
}

/// Anchor name for a heading: lower case words joined by dashes.
pub fn anchor_slug(heading_html: &str) -> String {
    let text = TAG.replace_all(heading_html, "");
    let text = html_escape::decode_html_entities(&text);

    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
