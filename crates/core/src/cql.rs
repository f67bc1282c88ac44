//! Pure helpers for building Confluence Query Language (CQL) strings
//!
//! Agents usually send plain words ("project documentation"), while the
//! Confluence search endpoints only understand CQL. The functions here decide
//! which of the two an input is and rewrite plain text into CQL clauses.

/// Tokens whose presence marks a content query as already being CQL.
pub const CQL_OPERATOR_TOKENS: [&str; 7] = ["=", "~", ">", "<", " AND ", " OR ", "currentUser()"];

/// Tokens whose presence marks a user query as already being CQL.
pub const USER_CQL_TOKENS: [&str; 7] = ["=", "~", ">", "<", " AND ", " OR ", "user."];

/// Field used to expand page bodies when content is requested.
pub const BODY_EXPAND_FIELD: &str = "body.storage";

/// Classification of a raw content search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Already valid CQL, sent to the API unmodified
    Cql(String),
    /// Free text that must be wrapped in a CQL clause
    Text(String),
}

impl SearchQuery {
    /// Classify a raw query string.
    ///
    /// An empty query is treated as CQL so it reaches the API untouched and
    /// fails there, instead of producing `siteSearch ~ ""`.
    pub fn classify(raw: &str) -> Self {
        if raw.is_empty() || contains_any(raw, &CQL_OPERATOR_TOKENS) {
            SearchQuery::Cql(raw.to_string())
        } else {
            SearchQuery::Text(raw.to_string())
        }
    }
}

/// The ordered CQL attempts for a free-text search.
///
/// The first attempt mimics the web UI search; the second is the plain text
/// search supported by older deployments that lack `siteSearch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearchPlan {
    pub primary: String,
    pub fallback: String,
}

impl TextSearchPlan {
    pub fn new(text: &str) -> Self {
        Self {
            primary: site_search_cql(text),
            fallback: text_search_cql(text),
        }
    }
}

/// `siteSearch ~ "<text>"`
pub fn site_search_cql(text: &str) -> String {
    format!("siteSearch ~ \"{text}\"")
}

/// `text ~ "<text>"`
pub fn text_search_cql(text: &str) -> String {
    format!("text ~ \"{text}\"")
}

/// Rewrite a user query into CQL unless it already is.
///
/// Free text becomes a full-name match: `user.fullname ~ "<text>"`.
pub fn user_search_cql(raw: &str) -> String {
    if raw.is_empty() || contains_any(raw, &USER_CQL_TOKENS) {
        raw.to_string()
    } else {
        format!("user.fullname ~ \"{raw}\"")
    }
}

/// Add the body field to an expand list when content was requested.
///
/// The list is left alone when content is not requested or when it already
/// expands some `body` representation.
pub fn expand_with_body(expand: &str, include_content: bool) -> String {
    if !include_content || expand.contains("body") {
        return expand.to_string();
    }

    if expand.is_empty() {
        BODY_EXPAND_FIELD.to_string()
    } else {
        format!("{expand},{BODY_EXPAND_FIELD}")
    }
}

/// Quote a space key for use inside CQL.
///
/// Personal space keys start with `~` and reserved words would otherwise be
/// parsed as operators, so every key is quoted and inner quotes escaped.
pub fn quote_space_key(key: &str) -> String {
    format!("\"{}\"", key.replace('"', "\\\""))
}

/// Split a comma separated spaces filter into trimmed, non-empty keys.
pub fn parse_spaces_filter(filter: &str) -> Vec<String> {
    filter
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Restrict a CQL query to a set of spaces.
///
/// Queries that already mention a `space` clause are returned unchanged, as
/// are queries when the filter holds no keys.
pub fn apply_spaces_filter(cql: &str, spaces: &[String]) -> String {
    if spaces.is_empty() || mentions_space_clause(cql) {
        return cql.to_string();
    }

    let clause = spaces
        .iter()
        .map(|key| format!("space = {}", quote_space_key(key)))
        .collect::<Vec<_>>()
        .join(" OR ");

    format!("({cql}) AND ({clause})")
}

fn mentions_space_clause(cql: &str) -> bool {
    let lowered = cql.to_lowercase();
    lowered.contains("space =") || lowered.contains("space=") || lowered.contains("space in")
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plain_text() {
        assert_eq!(
            SearchQuery::classify("project documentation"),
            SearchQuery::Text("project documentation".to_string())
        );
    }

    #[test]
    fn test_classify_every_operator_token_as_cql() {
        let queries = [
            "type=page",
            "title ~ \"Notes\"",
            "created > 2024-01-01",
            "created < 2024-01-01",
            "foo AND bar",
            "foo OR bar",
            "creator currentUser()",
        ];

        for query in queries {
            assert_eq!(
                SearchQuery::classify(query),
                SearchQuery::Cql(query.to_string()),
                "query {query:?} should be CQL"
            );
        }
    }

    #[test]
    fn test_classify_lowercase_and_is_text() {
        // Only the upper case, space delimited keywords count as operators
        assert_eq!(
            SearchQuery::classify("salt and pepper"),
            SearchQuery::Text("salt and pepper".to_string())
        );
    }

    #[test]
    fn test_text_search_plan() {
        let plan = TextSearchPlan::new("release notes");
        assert_eq!(plan.primary, "siteSearch ~ \"release notes\"");
        assert_eq!(plan.fallback, "text ~ \"release notes\"");
    }

    #[test]
    fn test_user_search_cql_wraps_plain_names() {
        assert_eq!(user_search_cql("Ada Lovelace"), "user.fullname ~ \"Ada Lovelace\"");
    }

    #[test]
    fn test_user_search_cql_keeps_cql() {
        assert_eq!(
            user_search_cql("user.fullname ~ \"Ada\""),
            "user.fullname ~ \"Ada\""
        );
        assert_eq!(user_search_cql("user.email"), "user.email");
    }

    #[test]
    fn test_expand_with_body_appends_field() {
        assert_eq!(expand_with_body("version", true), "version,body.storage");
    }

    #[test]
    fn test_expand_with_body_empty_expand() {
        assert_eq!(expand_with_body("", true), "body.storage");
    }

    #[test]
    fn test_expand_with_body_already_present() {
        assert_eq!(expand_with_body("version,body.view", true), "version,body.view");
    }

    #[test]
    fn test_expand_with_body_content_not_requested() {
        assert_eq!(expand_with_body("version", false), "version");
    }

    #[test]
    fn test_parse_spaces_filter() {
        assert_eq!(
            parse_spaces_filter(" DEV, ~jdoe ,,TEAM "),
            vec!["DEV".to_string(), "~jdoe".to_string(), "TEAM".to_string()]
        );
        assert!(parse_spaces_filter("").is_empty());
    }

    #[test]
    fn test_apply_spaces_filter() {
        let spaces = vec!["DEV".to_string(), "~jdoe".to_string()];
        assert_eq!(
            apply_spaces_filter("siteSearch ~ \"x\"", &spaces),
            "(siteSearch ~ \"x\") AND (space = \"DEV\" OR space = \"~jdoe\")"
        );
    }

    #[test]
    fn test_apply_spaces_filter_respects_existing_space_clause() {
        let spaces = vec!["DEV".to_string()];
        assert_eq!(
            apply_spaces_filter("type=page AND space=OPS", &spaces),
            "type=page AND space=OPS"
        );
    }

    #[test]
    fn test_apply_spaces_filter_without_keys() {
        assert_eq!(apply_spaces_filter("text ~ \"x\"", &[]), "text ~ \"x\"");
    }
}
