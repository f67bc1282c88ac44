//! Tool argument records and their validation
//!
//! Every tool receives its arguments as a loosely typed `*Args` record
//! deserialized straight from the JSON-RPC call. Calling `validate()` turns it
//! into a typed `*Params` record: defaults applied, bounds checked, page URLs
//! reduced to IDs and enumerations parsed. Handlers only ever see `*Params`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::page_id::{parse_page_id_from_url, PageIdValue};

/// Errors raised while validating tool arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Either 'page_id' OR both 'title' and 'space_key' must be provided.")]
    MissingPageIdentifier,

    #[error("Invalid content_format: {0}. Must be 'markdown', 'wiki', or 'storage'")]
    InvalidContentFormat(String),

    #[error("Invalid page_width: {0}. Must be 'default', 'full-width', or 'max'")]
    InvalidPageWidth(String),

    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },

    #[error("'{0}' must not be empty")]
    Empty(&'static str),
}

// ============================================================================
// Enumerations
// ============================================================================

/// Representation of the `content` payload on create/update calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    Markdown,
    Wiki,
    Storage,
}

impl ContentFormat {
    /// Representation tag sent to Confluence, `None` when the content must be
    /// converted from markdown first.
    pub fn representation(self) -> Option<&'static str> {
        match self {
            ContentFormat::Markdown => None,
            ContentFormat::Wiki => Some("wiki"),
            ContentFormat::Storage => Some("storage"),
        }
    }

    pub fn is_markdown(self) -> bool {
        self == ContentFormat::Markdown
    }
}

impl FromStr for ContentFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(ContentFormat::Markdown),
            "wiki" => Ok(ContentFormat::Wiki),
            "storage" => Ok(ContentFormat::Storage),
            other => Err(ValidationError::InvalidContentFormat(other.to_string())),
        }
    }
}

/// Page layout width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageWidth {
    /// Narrow, the standard Confluence layout
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "full-width")]
    FullWidth,
    #[serde(rename = "max")]
    Max,
}

impl PageWidth {
    /// Value stored in the `content-appearance-*` page properties.
    pub fn appearance(self) -> &'static str {
        match self {
            PageWidth::Default => "fixed",
            PageWidth::FullWidth => "full-width",
            PageWidth::Max => "max",
        }
    }
}

impl FromStr for PageWidth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(PageWidth::Default),
            "full-width" => Ok(PageWidth::FullWidth),
            "max" => Ok(PageWidth::Max),
            other => Err(ValidationError::InvalidPageWidth(other.to_string())),
        }
    }
}

/// Placement of a moved page relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePosition {
    /// Sibling immediately before the target
    Before,
    /// Sibling immediately after the target
    After,
    /// Last child of the target
    Append,
}

impl MovePosition {
    pub fn as_str(self) -> &'static str {
        match self {
            MovePosition::Before => "before",
            MovePosition::After => "after",
            MovePosition::Append => "append",
        }
    }
}

impl fmt::Display for MovePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(MovePosition::Before),
            "after" => Ok(MovePosition::After),
            "append" => Ok(MovePosition::Append),
            other => Err(format!(
                "Invalid position '{other}'. Must be one of: 'before', 'after', 'append'"
            )),
        }
    }
}

/// How `get_page` locates its page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageIdentifier {
    Id(String),
    Title { title: String, space_key: String },
}

// ============================================================================
// Shared validation helpers
// ============================================================================

fn bounded(
    field: &'static str,
    value: Option<u64>,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, ValidationError> {
    let Some(value) = value else {
        return Ok(default);
    };

    if value < u64::from(min) || value > u64::from(max) {
        return Err(ValidationError::OutOfRange {
            field,
            min: u64::from(min),
            max: u64::from(max),
            value,
        });
    }

    Ok(value as u32)
}

fn start_index(value: Option<u64>) -> u32 {
    value
        .map(|start| u32::try_from(start).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

fn required_page_id(field: &'static str, value: &PageIdValue) -> Result<String, ValidationError> {
    let id = parse_page_id_from_url(Some(value)).unwrap_or_default();
    if id.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(id.trim().to_string())
}

/// An integer `0` counts as absent.
fn optional_page_id(value: Option<&PageIdValue>) -> Option<String> {
    let value = value.filter(|value| **value != PageIdValue::Number(0));
    parse_page_id_from_url(value)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

fn non_empty(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(value)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn content_format(value: Option<String>) -> Result<ContentFormat, ValidationError> {
    value.as_deref().unwrap_or("markdown").parse()
}

fn page_width(value: Option<String>) -> Result<Option<PageWidth>, ValidationError> {
    value.as_deref().map(str::parse).transpose()
}

// ============================================================================
// search
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    pub limit: Option<u64>,
    pub spaces_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub query: String,
    pub limit: u32,
    /// `None` uses the configured default filter, `Some("")` disables it
    pub spaces_filter: Option<String>,
}

impl SearchArgs {
    pub fn validate(self) -> Result<SearchParams, ValidationError> {
        Ok(SearchParams {
            query: self.query,
            limit: bounded("limit", self.limit, 10, 1, 50)?,
            spaces_filter: self.spaces_filter,
        })
    }
}

// ============================================================================
// get_page
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetPageArgs {
    pub page_id: Option<PageIdValue>,
    pub title: Option<String>,
    pub space_key: Option<String>,
    pub include_metadata: Option<bool>,
    pub convert_to_markdown: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetPageParams {
    pub identifier: PageIdentifier,
    /// `title` or `space_key` were supplied alongside a `page_id`
    pub ignored_title_or_space: bool,
    pub include_metadata: bool,
    pub convert_to_markdown: bool,
}

impl GetPageArgs {
    pub fn validate(self) -> Result<GetPageParams, ValidationError> {
        let title = non_blank(self.title);
        let space_key = non_blank(self.space_key);

        let (identifier, ignored_title_or_space) =
            match (optional_page_id(self.page_id.as_ref()), title, space_key) {
                (Some(id), title, space_key) => {
                    (PageIdentifier::Id(id), title.is_some() || space_key.is_some())
                }
                (None, Some(title), Some(space_key)) => {
                    (PageIdentifier::Title { title, space_key }, false)
                }
                _ => return Err(ValidationError::MissingPageIdentifier),
            };

        Ok(GetPageParams {
            identifier,
            ignored_title_or_space,
            include_metadata: self.include_metadata.unwrap_or(true),
            convert_to_markdown: self.convert_to_markdown.unwrap_or(true),
        })
    }
}

// ============================================================================
// get_page_children
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GetPageChildrenArgs {
    pub parent_id: PageIdValue,
    pub expand: Option<String>,
    pub limit: Option<u64>,
    pub include_content: Option<bool>,
    pub convert_to_markdown: Option<bool>,
    pub start: Option<u64>,
    pub include_folders: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetPageChildrenParams {
    pub parent_id: String,
    pub expand: String,
    pub limit: u32,
    pub include_content: bool,
    pub convert_to_markdown: bool,
    pub start: u32,
    pub include_folders: bool,
}

impl GetPageChildrenArgs {
    pub fn validate(self) -> Result<GetPageChildrenParams, ValidationError> {
        Ok(GetPageChildrenParams {
            parent_id: required_page_id("parent_id", &self.parent_id)?,
            expand: self.expand.unwrap_or_else(|| "version".to_string()),
            limit: bounded("limit", self.limit, 25, 1, 50)?,
            include_content: self.include_content.unwrap_or(false),
            convert_to_markdown: self.convert_to_markdown.unwrap_or(true),
            start: start_index(self.start),
            include_folders: self.include_folders.unwrap_or(true),
        })
    }
}

// ============================================================================
// Tools addressing a single page
// ============================================================================

/// Arguments of the tools that only take a page: ancestors, comments,
/// labels and delete.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRefArgs {
    pub page_id: PageIdValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRefParams {
    pub page_id: String,
}

impl PageRefArgs {
    pub fn validate(self) -> Result<PageRefParams, ValidationError> {
        Ok(PageRefParams {
            page_id: required_page_id("page_id", &self.page_id)?,
        })
    }
}

// ============================================================================
// get_space_page_tree / list_spaces
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SpaceTreeArgs {
    pub space_key: String,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpaceTreeParams {
    pub space_key: String,
    pub limit: u32,
}

impl SpaceTreeArgs {
    pub fn validate(self) -> Result<SpaceTreeParams, ValidationError> {
        Ok(SpaceTreeParams {
            space_key: non_empty("space_key", self.space_key)?,
            limit: bounded("limit", self.limit, 100, 1, 1000)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSpacesArgs {
    pub limit: Option<u64>,
    pub start: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListSpacesParams {
    pub limit: u32,
    pub start: u32,
}

impl ListSpacesArgs {
    pub fn validate(self) -> Result<ListSpacesParams, ValidationError> {
        Ok(ListSpacesParams {
            limit: bounded("limit", self.limit, 25, 1, 100)?,
            start: start_index(self.start),
        })
    }
}

// ============================================================================
// move_page_position
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MovePageArgs {
    pub page_id: PageIdValue,
    pub position: String,
    pub target_id: PageIdValue,
}

/// The position stays a raw string: rejecting it is the fetcher's job and is
/// reported in the tool payload rather than as an argument error.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePageParams {
    pub page_id: String,
    pub position: String,
    pub target_id: String,
}

impl MovePageArgs {
    pub fn validate(self) -> Result<MovePageParams, ValidationError> {
        Ok(MovePageParams {
            page_id: required_page_id("page_id", &self.page_id)?,
            position: self.position,
            target_id: required_page_id("target_id", &self.target_id)?,
        })
    }
}

// ============================================================================
// add_label / add_comment
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AddLabelArgs {
    pub page_id: PageIdValue,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddLabelParams {
    pub page_id: String,
    pub name: String,
}

impl AddLabelArgs {
    pub fn validate(self) -> Result<AddLabelParams, ValidationError> {
        Ok(AddLabelParams {
            page_id: required_page_id("page_id", &self.page_id)?,
            name: non_empty("name", self.name)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentArgs {
    pub page_id: PageIdValue,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddCommentParams {
    pub page_id: String,
    /// Markdown
    pub content: String,
}

impl AddCommentArgs {
    pub fn validate(self) -> Result<AddCommentParams, ValidationError> {
        Ok(AddCommentParams {
            page_id: required_page_id("page_id", &self.page_id)?,
            content: non_empty("content", self.content)?,
        })
    }
}

// ============================================================================
// create_page / update_page
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePageArgs {
    pub space_key: String,
    pub title: String,
    pub content: String,
    pub parent_id: Option<PageIdValue>,
    pub content_format: Option<String>,
    pub enable_heading_anchors: Option<bool>,
    pub emoji: Option<String>,
    pub page_width: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePageParams {
    pub space_key: String,
    pub title: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub content_format: ContentFormat,
    /// Always `false` unless the content is markdown
    pub enable_heading_anchors: bool,
    pub emoji: Option<String>,
    pub page_width: Option<PageWidth>,
}

impl CreatePageArgs {
    pub fn validate(self) -> Result<CreatePageParams, ValidationError> {
        let content_format = content_format(self.content_format)?;

        Ok(CreatePageParams {
            space_key: non_empty("space_key", self.space_key)?,
            title: non_empty("title", self.title)?,
            content: self.content,
            parent_id: optional_page_id(self.parent_id.as_ref()),
            enable_heading_anchors: content_format.is_markdown()
                && self.enable_heading_anchors.unwrap_or(false),
            content_format,
            emoji: non_blank(self.emoji),
            page_width: page_width(self.page_width)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePageArgs {
    pub page_id: PageIdValue,
    pub title: String,
    pub content: String,
    pub is_minor_edit: Option<bool>,
    pub version_comment: Option<String>,
    pub parent_id: Option<PageIdValue>,
    pub content_format: Option<String>,
    pub enable_heading_anchors: Option<bool>,
    pub emoji: Option<String>,
    pub page_width: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePageParams {
    pub page_id: String,
    pub title: String,
    pub content: String,
    pub is_minor_edit: bool,
    pub version_comment: Option<String>,
    pub parent_id: Option<String>,
    pub content_format: ContentFormat,
    pub enable_heading_anchors: bool,
    pub emoji: Option<String>,
    pub page_width: Option<PageWidth>,
}

impl UpdatePageArgs {
    pub fn validate(self) -> Result<UpdatePageParams, ValidationError> {
        let content_format = content_format(self.content_format)?;

        Ok(UpdatePageParams {
            page_id: required_page_id("page_id", &self.page_id)?,
            title: non_empty("title", self.title)?,
            content: self.content,
            is_minor_edit: self.is_minor_edit.unwrap_or(false),
            version_comment: non_blank(self.version_comment),
            parent_id: optional_page_id(self.parent_id.as_ref()),
            enable_heading_anchors: content_format.is_markdown()
                && self.enable_heading_anchors.unwrap_or(false),
            content_format,
            emoji: non_blank(self.emoji),
            page_width: page_width(self.page_width)?,
        })
    }
}

// ============================================================================
// search_user / get_page_views
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SearchUserArgs {
    pub query: String,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchUserParams {
    pub query: String,
    pub limit: u32,
}

impl SearchUserArgs {
    pub fn validate(self) -> Result<SearchUserParams, ValidationError> {
        Ok(SearchUserParams {
            query: self.query,
            limit: bounded("limit", self.limit, 10, 1, 50)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageViewsArgs {
    pub page_id: PageIdValue,
    pub include_title: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageViewsParams {
    pub page_id: String,
    pub include_title: bool,
}

impl PageViewsArgs {
    pub fn validate(self) -> Result<PageViewsParams, ValidationError> {
        Ok(PageViewsParams {
            page_id: required_page_id("page_id", &self.page_id)?,
            include_title: self.include_title.unwrap_or(true),
        })
    }
}
