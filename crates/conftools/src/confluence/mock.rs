//! Recording [`ConfluenceFetcher`] for tests
//!
//! Every call is recorded with its arguments. Failures are scripted per
//! operation and consumed in order; without one, each operation returns
//! canned data.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use conftools_core::confluence::{
    ConfluenceComment, ConfluenceLabel, ConfluencePage, ConfluenceSpace, ConfluenceUser,
    PageContent, PageViews, SpaceSummary, SpacesOutput,
};
use conftools_core::params::{CreatePageParams, MovePosition, UpdatePageParams};
use conftools_core::tree::{SpacePageTree, TreeNode};

use super::fetcher::{ConfluenceFetcher, FetchError};

/// One recorded fetcher call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: &'static str,
    pub args: Vec<String>,
}

pub struct MockFetcher {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<&'static str, VecDeque<FetchError>>>,
    title_page: Option<ConfluencePage>,
    delete_result: bool,
    comment_created: bool,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            title_page: None,
            delete_result: true,
            comment_created: true,
        }
    }
}

pub fn sample_page(id: &str, title: &str) -> ConfluencePage {
    ConfluencePage {
        id: id.to_string(),
        title: title.to_string(),
        page_type: "page".to_string(),
        status: Some("current".to_string()),
        space: Some(SpaceSummary {
            key: "DEV".to_string(),
            name: Some("Development".to_string()),
        }),
        url: Some(format!(
            "https://example.atlassian.net/wiki/spaces/DEV/pages/{id}"
        )),
        version: Some(1),
        author: Some("Ada Lovelace".to_string()),
        created: None,
        updated: None,
        parent_id: None,
        content: Some(PageContent {
            value: format!("Body of {id}"),
            format: "markdown".to_string(),
        }),
    }
}

fn sample_comment(id: &str, body: &str) -> ConfluenceComment {
    ConfluenceComment {
        id: id.to_string(),
        author: Some("Grace Hopper".to_string()),
        created: None,
        version: Some(1),
        body: body.to_string(),
        url: None,
    }
}

fn sample_label(id: &str, name: &str) -> ConfluenceLabel {
    ConfluenceLabel {
        id: id.to_string(),
        name: name.to_string(),
        prefix: Some("global".to_string()),
        label: Some(name.to_string()),
    }
}

impl MockFetcher {
    /// Page returned by `get_page_by_title` when the title matches.
    pub fn with_title_page(mut self, page: ConfluencePage) -> Self {
        self.title_page = Some(page);
        self
    }

    pub fn with_delete_result(mut self, deleted: bool) -> Self {
        self.delete_result = deleted;
        self
    }

    pub fn with_comment_created(mut self, created: bool) -> Self {
        self.comment_created = created;
        self
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: FetchError) {
        self.failures
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    pub fn fail_search_once(&self, error: FetchError) {
        self.fail_next("search", error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    /// CQL of every `search` call, in order.
    pub fn search_queries(&self) -> Vec<String> {
        self.calls_to("search")
            .into_iter()
            .map(|call| call.args[0].clone())
            .collect()
    }

    fn record(&self, operation: &'static str, args: &[&str]) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(Call {
            operation,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        });

        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConfluenceFetcher for MockFetcher {
    async fn search(
        &self,
        cql: &str,
        limit: u32,
        spaces_filter: Option<&str>,
    ) -> Result<Vec<ConfluencePage>, FetchError> {
        self.record(
            "search",
            &[cql, &limit.to_string(), spaces_filter.unwrap_or("<default>")],
        )?;
        Ok(vec![sample_page("1", "Search Result")])
    }

    async fn get_page_content(
        &self,
        page_id: &str,
        convert_to_markdown: bool,
    ) -> Result<ConfluencePage, FetchError> {
        self.record(
            "get_page_content",
            &[page_id, &convert_to_markdown.to_string()],
        )?;
        Ok(sample_page(page_id, &format!("Page {page_id}")))
    }

    async fn get_page_by_title(
        &self,
        space_key: &str,
        title: &str,
        convert_to_markdown: bool,
    ) -> Result<Option<ConfluencePage>, FetchError> {
        self.record(
            "get_page_by_title",
            &[space_key, title, &convert_to_markdown.to_string()],
        )?;
        Ok(self
            .title_page
            .clone()
            .filter(|page| page.title == title))
    }

    async fn get_page_children(
        &self,
        page_id: &str,
        start: u32,
        limit: u32,
        expand: &str,
        convert_to_markdown: bool,
        include_folders: bool,
    ) -> Result<Vec<ConfluencePage>, FetchError> {
        self.record(
            "get_page_children",
            &[
                page_id,
                &start.to_string(),
                &limit.to_string(),
                expand,
                &convert_to_markdown.to_string(),
                &include_folders.to_string(),
            ],
        )?;
        Ok(vec![sample_page("2", "Child A"), sample_page("3", "Child B")])
    }

    async fn get_page_ancestors(&self, page_id: &str) -> Result<Vec<ConfluencePage>, FetchError> {
        self.record("get_page_ancestors", &[page_id])?;
        Ok(vec![sample_page("10", "Parent"), sample_page("1", "Home")])
    }

    async fn get_space_page_tree(
        &self,
        space_key: &str,
        limit: u32,
    ) -> Result<SpacePageTree, FetchError> {
        self.record("get_space_page_tree", &[space_key, &limit.to_string()])?;
        Ok(SpacePageTree {
            space_key: space_key.to_string(),
            total_pages: 1,
            pages: vec![TreeNode {
                id: "1".to_string(),
                title: "Home".to_string(),
                parent_id: None,
                position: Some(0),
                depth: 0,
            }],
        })
    }

    async fn get_spaces(&self, start: u32, limit: u32) -> Result<SpacesOutput, FetchError> {
        self.record("get_spaces", &[&start.to_string(), &limit.to_string()])?;
        Ok(SpacesOutput {
            results: vec![ConfluenceSpace {
                id: Some(1),
                key: "DEV".to_string(),
                name: "Development".to_string(),
                space_type: Some("global".to_string()),
                status: Some("current".to_string()),
                url: None,
            }],
            start: u64::from(start),
            limit: u64::from(limit),
            size: 1,
        })
    }

    async fn move_page_position(
        &self,
        page_id: &str,
        position: &str,
        target_id: &str,
    ) -> Result<bool, FetchError> {
        self.record("move_page_position", &[page_id, position, target_id])?;
        position
            .parse::<MovePosition>()
            .map_err(FetchError::Validation)?;
        Ok(true)
    }

    async fn get_page_comments(
        &self,
        page_id: &str,
    ) -> Result<Vec<ConfluenceComment>, FetchError> {
        self.record("get_page_comments", &[page_id])?;
        Ok(vec![sample_comment("c1", "First!")])
    }

    async fn get_page_labels(&self, page_id: &str) -> Result<Vec<ConfluenceLabel>, FetchError> {
        self.record("get_page_labels", &[page_id])?;
        Ok(vec![sample_label("100", "docs")])
    }

    async fn add_page_label(
        &self,
        page_id: &str,
        name: &str,
    ) -> Result<Vec<ConfluenceLabel>, FetchError> {
        self.record("add_page_label", &[page_id, name])?;
        Ok(vec![sample_label("100", "docs"), sample_label("101", name)])
    }

    async fn create_page(&self, params: &CreatePageParams) -> Result<ConfluencePage, FetchError> {
        self.record(
            "create_page",
            &[
                &params.space_key,
                &params.title,
                params.content_format.representation().unwrap_or("markdown"),
                &params.enable_heading_anchors.to_string(),
                params.parent_id.as_deref().unwrap_or("<none>"),
            ],
        )?;
        Ok(sample_page("500", &params.title))
    }

    async fn update_page(&self, params: &UpdatePageParams) -> Result<ConfluencePage, FetchError> {
        self.record(
            "update_page",
            &[
                &params.page_id,
                &params.title,
                params.content_format.representation().unwrap_or("markdown"),
                &params.is_minor_edit.to_string(),
            ],
        )?;
        Ok(sample_page(&params.page_id, &params.title))
    }

    async fn delete_page(&self, page_id: &str) -> Result<bool, FetchError> {
        self.record("delete_page", &[page_id])?;
        Ok(self.delete_result)
    }

    async fn add_comment(
        &self,
        page_id: &str,
        content: &str,
    ) -> Result<Option<ConfluenceComment>, FetchError> {
        self.record("add_comment", &[page_id, content])?;
        Ok(self
            .comment_created
            .then(|| sample_comment("c2", content)))
    }

    async fn search_user(&self, cql: &str, limit: u32) -> Result<Vec<ConfluenceUser>, FetchError> {
        self.record("search_user", &[cql, &limit.to_string()])?;
        Ok(vec![ConfluenceUser {
            account_id: Some("abc".to_string()),
            display_name: "Ada Lovelace".to_string(),
            email: None,
            public_name: None,
            account_type: Some("atlassian".to_string()),
            profile_picture: None,
        }])
    }

    async fn get_page_views(
        &self,
        page_id: &str,
        include_title: bool,
    ) -> Result<PageViews, FetchError> {
        self.record("get_page_views", &[page_id, &include_title.to_string()])?;
        Ok(PageViews {
            page_id: page_id.to_string(),
            page_title: include_title.then(|| format!("Page {page_id}")),
            total_views: 42,
        })
    }
}
