//! Pure transformation functions for Confluence API responses
//!
//! This module contains zero I/O operations and is fully testable with fixture data.

use serde::{Deserialize, Serialize};

use crate::convert::storage_to_markdown;

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

/// Content (page, blog post, comment) response from the REST API
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContentResponse {
    pub id: String,
    #[serde(rename = "type", default)]
    pub content_type: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub space: Option<SpaceRef>,
    #[serde(default)]
    pub version: Option<VersionInfo>,
    #[serde(default)]
    pub history: Option<HistoryInfo>,
    #[serde(default)]
    pub body: Option<ContentBody>,
    #[serde(default)]
    pub ancestors: Vec<AncestorRef>,
    #[serde(default)]
    pub extensions: Option<Extensions>,
    #[serde(rename = "_links", default)]
    pub links: ContentLinks,
}

/// Space reference embedded in content
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SpaceRef {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Version block of a content response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VersionInfo {
    pub number: u64,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub by: Option<UserRef>,
    #[serde(default)]
    pub message: Option<String>,
}

/// History block of a content response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryInfo {
    #[serde(rename = "createdDate", default)]
    pub created_date: Option<String>,
    #[serde(rename = "createdBy", default)]
    pub created_by: Option<UserRef>,
}

/// User as embedded in content, versions and search results
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct UserRef {
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "publicName", default)]
    pub public_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "accountType", default)]
    pub account_type: Option<String>,
    #[serde(rename = "profilePicture", default)]
    pub profile_picture: Option<ProfilePicture>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProfilePicture {
    #[serde(default)]
    pub path: Option<String>,
}

/// Body content from a content response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContentBody {
    #[serde(default)]
    pub storage: Option<BodyValue>,
    #[serde(default)]
    pub view: Option<BodyValue>,
}

/// A single body representation
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BodyValue {
    #[serde(default)]
    pub value: Option<String>,
}

/// Ancestor entry, ordered root first by the API
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AncestorRef {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Extensions block; only the sibling position is used
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Extensions {
    /// Either a number or the string `"none"`
    #[serde(default)]
    pub position: Option<serde_json::Value>,
}

/// Links from a content response
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ContentLinks {
    #[serde(default)]
    pub webui: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
}

/// Paged list of content (search, children, comments, space content)
#[derive(Debug, Deserialize, Clone)]
pub struct ContentListResponse {
    pub results: Vec<ContentResponse>,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "totalSize")]
    pub total_size: Option<u64>,
}

/// Label response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LabelResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LabelListResponse {
    pub results: Vec<LabelResponse>,
}

/// Space response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SpaceResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub key: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub space_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: ContentLinks,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpaceListResponse {
    pub results: Vec<SpaceResponse>,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub size: u64,
}

/// One hit of `GET /search/user`
#[derive(Debug, Deserialize, Clone)]
pub struct UserSearchHit {
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserSearchResponse {
    pub results: Vec<UserSearchHit>,
}

/// `GET /analytics/content/{id}/views`
#[derive(Debug, Deserialize, Clone)]
pub struct PageViewsResponse {
    #[serde(default)]
    pub count: u64,
}

/// Direct child from the v2 API, used to list folders
#[derive(Debug, Deserialize, Clone)]
pub struct DirectChildResponse {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub child_type: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectChildrenResponse {
    pub results: Vec<DirectChildResponse>,
}

// ============================================================================
// Output Models (Domain Model)
// ============================================================================

/// Flattened, JSON-safe view of a domain object.
pub trait SimplifiedDict: Serialize {
    fn to_simplified_dict(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Space a page belongs to
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SpaceSummary {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Page body in the representation the caller asked for
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PageContent {
    pub value: String,
    /// `markdown` or `storage`
    pub format: String,
}

/// A page, blog post or folder
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConfluencePage {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<SpaceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<PageContent>,
}

impl ConfluencePage {
    /// Raw body value, empty when the body was not expanded
    pub fn content_value(&self) -> &str {
        self.content
            .as_ref()
            .map(|content| content.value.as_str())
            .unwrap_or_default()
    }
}

impl SimplifiedDict for ConfluencePage {}

/// A page comment
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConfluenceComment {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SimplifiedDict for ConfluenceComment {}

/// A content label
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConfluenceLabel {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SimplifiedDict for ConfluenceLabel {}

/// A space
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConfluenceSpace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub key: String,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub space_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SimplifiedDict for ConfluenceSpace {}

/// One page of the space listing
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SpacesOutput {
    pub results: Vec<ConfluenceSpace>,
    pub start: u64,
    pub limit: u64,
    pub size: u64,
}

impl SimplifiedDict for SpacesOutput {}

/// A user search result
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ConfluenceUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl SimplifiedDict for ConfluenceUser {}

/// View statistics of a page
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PageViews {
    pub page_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    pub total_views: u64,
}

impl SimplifiedDict for PageViews {}

// ============================================================================
// Pure Helper Functions
// ============================================================================

/// Absolute web URL for a `_links.webui` path.
///
/// `base_url` is the site URL, with or without a trailing `/wiki`.
pub fn wiki_url(base_url: &str, webui: &str) -> String {
    if webui.starts_with("http://") || webui.starts_with("https://") {
        return webui.to_string();
    }

    let site = base_url.trim_end_matches('/').trim_end_matches("/wiki");
    let path = webui
        .strip_prefix("/wiki")
        .filter(|rest| rest.starts_with('/'))
        .unwrap_or(webui);
    format!("{site}/wiki{path}")
}

fn user_name(user: &UserRef) -> Option<String> {
    user.display_name
        .clone()
        .or_else(|| user.public_name.clone())
}

fn body_storage(body: Option<&ContentBody>) -> Option<String> {
    let body = body?;
    body.storage
        .as_ref()
        .and_then(|b| b.value.clone())
        .or_else(|| body.view.as_ref().and_then(|b| b.value.clone()))
}

// ============================================================================
// Pure Transformation Functions
// ============================================================================

/// Pure transformation: Convert a content response into a page
///
/// The body, when expanded, is rendered to markdown if `convert_to_markdown`
/// is set and kept as storage format otherwise.
pub fn transform_page(
    page: ContentResponse,
    base_url: &str,
    convert_to_markdown: bool,
) -> ConfluencePage {
    let content = body_storage(page.body.as_ref()).map(|storage| {
        if convert_to_markdown {
            PageContent {
                value: storage_to_markdown(&storage),
                format: "markdown".to_string(),
            }
        } else {
            PageContent {
                value: storage,
                format: "storage".to_string(),
            }
        }
    });

    let author = page
        .history
        .as_ref()
        .and_then(|h| h.created_by.as_ref())
        .and_then(user_name);

    ConfluencePage {
        url: page.links.webui.as_deref().map(|webui| wiki_url(base_url, webui)),
        space: page.space.map(|space| SpaceSummary {
            key: space.key,
            name: space.name,
        }),
        version: page.version.as_ref().map(|v| v.number),
        updated: page.version.as_ref().and_then(|v| v.when.clone()),
        created: page.history.as_ref().and_then(|h| h.created_date.clone()),
        parent_id: page.ancestors.last().map(|a| a.id.clone()),
        id: page.id,
        title: page.title,
        page_type: page.content_type,
        status: page.status,
        author,
        content,
    }
}

/// Pure transformation: Convert a list of content responses into pages
pub fn transform_pages(
    response: ContentListResponse,
    base_url: &str,
    convert_to_markdown: bool,
) -> Vec<ConfluencePage> {
    response
        .results
        .into_iter()
        .map(|page| transform_page(page, base_url, convert_to_markdown))
        .collect()
}

/// Pure transformation: Convert a v2 direct child of type `folder` into a page
pub fn transform_folder(folder: DirectChildResponse) -> ConfluencePage {
    ConfluencePage {
        id: folder.id,
        title: folder.title,
        page_type: folder.child_type,
        status: folder.status,
        space: None,
        url: None,
        version: None,
        author: None,
        created: None,
        updated: None,
        parent_id: None,
        content: None,
    }
}

/// Pure transformation: Child pages of one result page plus the folders
///
/// Folders are not paged by the child page endpoint, so they are only
/// listed with the first page of results (`start == 0`). Folders already
/// present among the pages are not repeated.
pub fn merge_children(
    mut pages: Vec<ConfluencePage>,
    folders: Vec<ConfluencePage>,
    start: u32,
) -> Vec<ConfluencePage> {
    if start > 0 {
        return pages;
    }

    for folder in folders {
        if !pages.iter().any(|page| page.id == folder.id) {
            pages.push(folder);
        }
    }

    pages
}

/// Pure transformation: Ancestors of a page, immediate parent first
pub fn transform_ancestors(page: ContentResponse) -> Vec<ConfluencePage> {
    page.ancestors
        .into_iter()
        .rev()
        .map(|ancestor| ConfluencePage {
            id: ancestor.id,
            title: ancestor.title.unwrap_or_default(),
            page_type: "page".to_string(),
            status: None,
            space: None,
            url: None,
            version: None,
            author: None,
            created: None,
            updated: None,
            parent_id: None,
            content: None,
        })
        .collect()
}

/// Pure transformation: Convert a comment content response
///
/// Comment bodies are always rendered as markdown.
pub fn transform_comment(comment: ContentResponse, base_url: &str) -> ConfluenceComment {
    let author = comment
        .history
        .as_ref()
        .and_then(|h| h.created_by.as_ref())
        .or_else(|| comment.version.as_ref().and_then(|v| v.by.as_ref()))
        .and_then(user_name);

    ConfluenceComment {
        body: body_storage(comment.body.as_ref())
            .map(|storage| storage_to_markdown(&storage))
            .unwrap_or_default(),
        url: comment
            .links
            .webui
            .as_deref()
            .map(|webui| wiki_url(base_url, webui)),
        created: comment.history.as_ref().and_then(|h| h.created_date.clone()),
        version: comment.version.as_ref().map(|v| v.number),
        id: comment.id,
        author,
    }
}

/// Pure transformation: Convert label responses
pub fn transform_labels(response: LabelListResponse) -> Vec<ConfluenceLabel> {
    response
        .results
        .into_iter()
        .map(|label| ConfluenceLabel {
            id: label.id,
            name: label.name,
            prefix: label.prefix,
            label: label.label,
        })
        .collect()
}

/// Pure transformation: Convert a page of the space listing
pub fn transform_spaces(response: SpaceListResponse, base_url: &str) -> SpacesOutput {
    let results = response
        .results
        .into_iter()
        .map(|space| ConfluenceSpace {
            url: space
                .links
                .webui
                .as_deref()
                .map(|webui| wiki_url(base_url, webui)),
            id: space.id,
            key: space.key,
            name: space.name,
            space_type: space.space_type,
            status: space.status,
        })
        .collect();

    SpacesOutput {
        results,
        start: response.start,
        limit: response.limit,
        size: response.size,
    }
}

/// Pure transformation: Convert user search hits, skipping hits without a user
pub fn transform_user_search(response: UserSearchResponse, base_url: &str) -> Vec<ConfluenceUser> {
    response
        .results
        .into_iter()
        .filter_map(|hit| {
            let user = hit.user?;
            let display_name = user_name(&user).or(hit.title).unwrap_or_default();

            Some(ConfluenceUser {
                account_id: user.account_id,
                display_name,
                email: user.email,
                public_name: user.public_name,
                account_type: user.account_type,
                profile_picture: user
                    .profile_picture
                    .and_then(|p| p.path)
                    .map(|path| wiki_url(base_url, &path)),
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
