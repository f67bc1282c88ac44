//! The seam between tool handlers and Confluence
//!
//! Handlers only talk to [`ConfluenceFetcher`]. The HTTP implementation lives
//! in `client.rs`; tests use the recording mock in `mock.rs`.

use async_trait::async_trait;

use conftools_core::confluence::{
    ConfluenceComment, ConfluenceLabel, ConfluencePage, ConfluenceUser, PageViews, SpacesOutput,
};
use conftools_core::params::{CreatePageParams, UpdatePageParams};
use conftools_core::tree::SpacePageTree;

/// Failures reported by a fetcher
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// HTTP 401 or 403
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Arguments the fetcher itself rejects
    #[error("{0}")]
    Validation(String),

    #[error("Confluence API error [{status}]: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to send request to Confluence: {0}")]
    Transport(String),

    #[error("Failed to parse Confluence response: {0}")]
    Parse(String),
}

/// Operations the tools need from Confluence.
#[async_trait]
pub trait ConfluenceFetcher: Send + Sync {
    /// Run a CQL query. `spaces_filter`: `None` uses the configured default,
    /// an empty string disables filtering.
    async fn search(
        &self,
        cql: &str,
        limit: u32,
        spaces_filter: Option<&str>,
    ) -> Result<Vec<ConfluencePage>, FetchError>;

    async fn get_page_content(
        &self,
        page_id: &str,
        convert_to_markdown: bool,
    ) -> Result<ConfluencePage, FetchError>;

    async fn get_page_by_title(
        &self,
        space_key: &str,
        title: &str,
        convert_to_markdown: bool,
    ) -> Result<Option<ConfluencePage>, FetchError>;

    async fn get_page_children(
        &self,
        page_id: &str,
        start: u32,
        limit: u32,
        expand: &str,
        convert_to_markdown: bool,
        include_folders: bool,
    ) -> Result<Vec<ConfluencePage>, FetchError>;

    /// Immediate parent first, space root last.
    async fn get_page_ancestors(&self, page_id: &str) -> Result<Vec<ConfluencePage>, FetchError>;

    async fn get_space_page_tree(
        &self,
        space_key: &str,
        limit: u32,
    ) -> Result<SpacePageTree, FetchError>;

    async fn get_spaces(&self, start: u32, limit: u32) -> Result<SpacesOutput, FetchError>;

    /// Fails with [`FetchError::Validation`] for an unknown `position`.
    async fn move_page_position(
        &self,
        page_id: &str,
        position: &str,
        target_id: &str,
    ) -> Result<bool, FetchError>;

    async fn get_page_comments(&self, page_id: &str)
        -> Result<Vec<ConfluenceComment>, FetchError>;

    async fn get_page_labels(&self, page_id: &str) -> Result<Vec<ConfluenceLabel>, FetchError>;

    /// Returns every label of the page after the addition.
    async fn add_page_label(
        &self,
        page_id: &str,
        name: &str,
    ) -> Result<Vec<ConfluenceLabel>, FetchError>;

    async fn create_page(&self, params: &CreatePageParams) -> Result<ConfluencePage, FetchError>;

    async fn update_page(&self, params: &UpdatePageParams) -> Result<ConfluencePage, FetchError>;

    /// `false` when the request succeeded but the page was not deleted.
    async fn delete_page(&self, page_id: &str) -> Result<bool, FetchError>;

    /// `content` is markdown. `None` when the comment was not created.
    async fn add_comment(
        &self,
        page_id: &str,
        content: &str,
    ) -> Result<Option<ConfluenceComment>, FetchError>;

    async fn search_user(&self, cql: &str, limit: u32) -> Result<Vec<ConfluenceUser>, FetchError>;

    async fn get_page_views(
        &self,
        page_id: &str,
        include_title: bool,
    ) -> Result<PageViews, FetchError>;
}
