use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use conftools_core::confluence::{
    merge_children, transform_ancestors, transform_comment, transform_folder, transform_labels,
    transform_page, transform_pages, transform_spaces, transform_user_search, ConfluenceComment,
    ConfluenceLabel, ConfluencePage, ConfluenceUser, ContentListResponse, ContentResponse,
    DirectChildrenResponse, LabelListResponse, PageViews, PageViewsResponse, SpaceListResponse,
    SpacesOutput, UserSearchResponse,
};
use conftools_core::convert::markdown_to_storage;
use conftools_core::cql::{apply_spaces_filter, parse_spaces_filter};
use conftools_core::params::{
    ContentFormat, CreatePageParams, MovePosition, PageWidth, UpdatePageParams,
};
use conftools_core::tree::{build_page_tree, SpacePageTree};

use super::fetcher::{ConfluenceFetcher, FetchError};
use super::{create_authenticated_client, ConfluenceConfig};
use crate::prelude::Error;

/// Expansions needed to build a full page.
const PAGE_EXPAND: &str = "body.storage,version,space,history,ancestors";

/// Page size used while walking a whole space.
const TREE_PAGE_SIZE: u32 = 100;

/// [`ConfluenceFetcher`] backed by the Confluence Cloud REST API
pub struct HttpConfluenceFetcher {
    client: reqwest::Client,
    config: ConfluenceConfig,
}

impl HttpConfluenceFetcher {
    pub fn new(config: ConfluenceConfig) -> Result<Self, Error> {
        let client = create_authenticated_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ConfluenceConfig {
        &self.config
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/wiki/rest/api/{path}", self.config.site_url())
    }

    /// `content/<id>` followed by `suffix`, with the ID percent-encoded.
    fn content_url(&self, page_id: &str, suffix: &str) -> String {
        self.api_url(&format!("content/{}{suffix}", urlencoding::encode(page_id)))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), body))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FetchError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn get_content(&self, page_id: &str, expand: &str) -> Result<ContentResponse, FetchError> {
        let url = self.content_url(page_id, "");
        self.fetch_json(self.client.get(&url).query(&[("expand", expand)]))
            .await
    }

    async fn get_folders(&self, page_id: &str, limit: u32) -> Result<Vec<ConfluencePage>, FetchError> {
        let url = format!(
            "{}/wiki/api/v2/pages/{}/direct-children",
            self.config.site_url(),
            urlencoding::encode(page_id)
        );
        let response: DirectChildrenResponse = self
            .fetch_json(self.client.get(&url).query(&[("limit", limit.to_string())]))
            .await?;

        Ok(response
            .results
            .into_iter()
            .filter(|child| child.child_type == "folder")
            .map(transform_folder)
            .collect())
    }
}

/// Map a non-2xx status to a [`FetchError`].
pub fn status_error(status: u16, body: String) -> FetchError {
    match status {
        401 | 403 => FetchError::Authentication(format!("[{status}] {body}")),
        404 => FetchError::NotFound(body),
        _ => FetchError::Api { status, body },
    }
}

/// `body` member of a create or update payload.
fn page_body(content: &str, format: ContentFormat, heading_anchors: bool) -> Value {
    let (value, representation) = match format.representation() {
        Some(representation) => (content.to_string(), representation),
        None => (markdown_to_storage(content, heading_anchors), "storage"),
    };

    json!({ representation: { "value": value, "representation": representation } })
}

/// Page properties carrying the title emoji and the layout width.
fn page_properties(emoji: Option<&str>, width: Option<PageWidth>) -> Option<Value> {
    let mut properties = serde_json::Map::new();

    if let Some(emoji) = emoji {
        properties.insert("emoji-title-published".into(), json!({ "value": emoji }));
    }
    if let Some(width) = width {
        for key in ["content-appearance-published", "content-appearance-draft"] {
            properties.insert(key.into(), json!({ "value": width.appearance() }));
        }
    }

    (!properties.is_empty()).then(|| json!({ "properties": properties }))
}

fn create_payload(params: &CreatePageParams) -> Value {
    let mut payload = json!({
        "type": "page",
        "title": params.title,
        "space": { "key": params.space_key },
        "body": page_body(&params.content, params.content_format, params.enable_heading_anchors),
    });

    if let Some(parent_id) = &params.parent_id {
        payload["ancestors"] = json!([{ "id": parent_id }]);
    }
    if let Some(metadata) = page_properties(params.emoji.as_deref(), params.page_width) {
        payload["metadata"] = metadata;
    }

    payload
}

fn update_payload(params: &UpdatePageParams, current: &ContentResponse) -> Value {
    let current_version = current.version.as_ref().map(|v| v.number).unwrap_or(0);

    let mut version = json!({
        "number": current_version + 1,
        "minorEdit": params.is_minor_edit,
    });
    if let Some(comment) = &params.version_comment {
        version["message"] = json!(comment);
    }

    let mut payload = json!({
        "id": params.page_id,
        "type": "page",
        "title": params.title,
        "body": page_body(&params.content, params.content_format, params.enable_heading_anchors),
        "version": version,
    });

    if let Some(space) = &current.space {
        payload["space"] = json!({ "key": space.key });
    }
    if let Some(parent_id) = &params.parent_id {
        payload["ancestors"] = json!([{ "id": parent_id }]);
    }
    if let Some(metadata) = page_properties(params.emoji.as_deref(), params.page_width) {
        payload["metadata"] = metadata;
    }

    payload
}

fn comment_payload(page_id: &str, markdown: &str) -> Value {
    json!({
        "type": "comment",
        "container": { "id": page_id, "type": "page", "status": "current" },
        "body": {
            "storage": {
                "value": markdown_to_storage(markdown, false),
                "representation": "storage"
            }
        }
    })
}

#[async_trait]
impl ConfluenceFetcher for HttpConfluenceFetcher {
    async fn search(
        &self,
        cql: &str,
        limit: u32,
        spaces_filter: Option<&str>,
    ) -> Result<Vec<ConfluencePage>, FetchError> {
        let spaces = match spaces_filter {
            Some(filter) => parse_spaces_filter(filter),
            None => parse_spaces_filter(self.config.spaces_filter.as_deref().unwrap_or_default()),
        };
        let cql = apply_spaces_filter(cql, &spaces);
        log::debug!("Confluence search CQL: {cql}");

        let url = self.api_url("content/search");
        let response: ContentListResponse = self
            .fetch_json(self.client.get(&url).query(&[
                ("cql", cql),
                ("limit", limit.to_string()),
                ("expand", "space,version".to_string()),
            ]))
            .await?;

        Ok(transform_pages(response, &self.config.base_url, true))
    }

    async fn get_page_content(
        &self,
        page_id: &str,
        convert_to_markdown: bool,
    ) -> Result<ConfluencePage, FetchError> {
        let response = self.get_content(page_id, PAGE_EXPAND).await?;
        Ok(transform_page(
            response,
            &self.config.base_url,
            convert_to_markdown,
        ))
    }

    async fn get_page_by_title(
        &self,
        space_key: &str,
        title: &str,
        convert_to_markdown: bool,
    ) -> Result<Option<ConfluencePage>, FetchError> {
        let url = self.api_url("content");
        let response: ContentListResponse = self
            .fetch_json(self.client.get(&url).query(&[
                ("spaceKey", space_key),
                ("title", title),
                ("type", "page"),
                ("expand", PAGE_EXPAND),
            ]))
            .await?;

        Ok(response
            .results
            .into_iter()
            .next()
            .map(|page| transform_page(page, &self.config.base_url, convert_to_markdown)))
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
        let url = self.content_url(page_id, "/child/page");
        let response: ContentListResponse = self
            .fetch_json(self.client.get(&url).query(&[
                ("start", start.to_string()),
                ("limit", limit.to_string()),
                ("expand", expand.to_string()),
            ]))
            .await?;

        let children = transform_pages(response, &self.config.base_url, convert_to_markdown);

        let folders = if include_folders && start == 0 {
            self.get_folders(page_id, limit).await.unwrap_or_else(|e| {
                log::warn!("Could not list folders under page {page_id}: {e}");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        Ok(merge_children(children, folders, start))
    }

    async fn get_page_ancestors(&self, page_id: &str) -> Result<Vec<ConfluencePage>, FetchError> {
        let response = self.get_content(page_id, "ancestors").await?;
        Ok(transform_ancestors(response))
    }

    async fn get_space_page_tree(
        &self,
        space_key: &str,
        limit: u32,
    ) -> Result<SpacePageTree, FetchError> {
        let url = self.api_url("content");
        let mut pages: Vec<ContentResponse> = Vec::new();
        let mut start = 0u32;

        while (pages.len() as u32) < limit {
            let batch = TREE_PAGE_SIZE.min(limit - pages.len() as u32);
            let response: ContentListResponse = self
                .fetch_json(self.client.get(&url).query(&[
                    ("spaceKey", space_key.to_string()),
                    ("type", "page".to_string()),
                    ("status", "current".to_string()),
                    ("start", start.to_string()),
                    ("limit", batch.to_string()),
                    ("expand", "ancestors,extensions.position".to_string()),
                ]))
                .await?;

            let received = response.results.len() as u32;
            pages.extend(response.results);

            if received < batch {
                break;
            }
            start += received;
        }

        Ok(build_page_tree(space_key, pages))
    }

    async fn get_spaces(&self, start: u32, limit: u32) -> Result<SpacesOutput, FetchError> {
        let url = self.api_url("space");
        let response: SpaceListResponse = self
            .fetch_json(self.client.get(&url).query(&[
                ("start", start.to_string()),
                ("limit", limit.to_string()),
            ]))
            .await?;

        Ok(transform_spaces(response, &self.config.base_url))
    }

    async fn move_page_position(
        &self,
        page_id: &str,
        position: &str,
        target_id: &str,
    ) -> Result<bool, FetchError> {
        let position: MovePosition = position.parse().map_err(FetchError::Validation)?;

        let url = self.content_url(
            page_id,
            &format!("/move/{position}/{}", urlencoding::encode(target_id)),
        );
        self.send(self.client.put(&url)).await?;

        Ok(true)
    }

    async fn get_page_comments(
        &self,
        page_id: &str,
    ) -> Result<Vec<ConfluenceComment>, FetchError> {
        let url = self.content_url(page_id, "/child/comment");
        let response: ContentListResponse = self
            .fetch_json(self.client.get(&url).query(&[
                ("expand", "body.storage,version,history"),
                ("depth", "all"),
            ]))
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|comment| transform_comment(comment, &self.config.base_url))
            .collect())
    }

    async fn get_page_labels(&self, page_id: &str) -> Result<Vec<ConfluenceLabel>, FetchError> {
        let url = self.content_url(page_id, "/label");
        let response: LabelListResponse = self.fetch_json(self.client.get(&url)).await?;
        Ok(transform_labels(response))
    }

    async fn add_page_label(
        &self,
        page_id: &str,
        name: &str,
    ) -> Result<Vec<ConfluenceLabel>, FetchError> {
        let url = self.content_url(page_id, "/label");
        let response: LabelListResponse = self
            .fetch_json(
                self.client
                    .post(&url)
                    .json(&json!([{ "prefix": "global", "name": name }])),
            )
            .await?;

        Ok(transform_labels(response))
    }

    async fn create_page(&self, params: &CreatePageParams) -> Result<ConfluencePage, FetchError> {
        let url = self.api_url("content");
        let response: ContentResponse = self
            .fetch_json(self.client.post(&url).json(&create_payload(params)))
            .await?;

        log::info!("Created page {} in space {}", response.id, params.space_key);
        Ok(transform_page(response, &self.config.base_url, true))
    }

    async fn update_page(&self, params: &UpdatePageParams) -> Result<ConfluencePage, FetchError> {
        let current = self.get_content(&params.page_id, "version,space").await?;

        let url = self.content_url(&params.page_id, "");
        let response: ContentResponse = self
            .fetch_json(self.client.put(&url).json(&update_payload(params, &current)))
            .await?;

        log::info!("Updated page {}", params.page_id);
        Ok(transform_page(response, &self.config.base_url, true))
    }

    async fn delete_page(&self, page_id: &str) -> Result<bool, FetchError> {
        let url = self.content_url(page_id, "");
        let response = self.send(self.client.delete(&url)).await?;

        Ok(matches!(response.status().as_u16(), 200 | 204))
    }

    async fn add_comment(
        &self,
        page_id: &str,
        content: &str,
    ) -> Result<Option<ConfluenceComment>, FetchError> {
        let url = self.api_url("content");
        let response: Value = self
            .fetch_json(self.client.post(&url).json(&comment_payload(page_id, content)))
            .await?;

        if response.get("id").is_none() {
            return Ok(None);
        }

        let comment: ContentResponse =
            serde_json::from_value(response).map_err(|e| FetchError::Parse(e.to_string()))?;
        Ok(Some(transform_comment(comment, &self.config.base_url)))
    }

    async fn search_user(&self, cql: &str, limit: u32) -> Result<Vec<ConfluenceUser>, FetchError> {
        let url = self.api_url("search/user");
        let response: UserSearchResponse = self
            .fetch_json(
                self.client
                    .get(&url)
                    .query(&[("cql", cql.to_string()), ("limit", limit.to_string())]),
            )
            .await?;

        Ok(transform_user_search(response, &self.config.base_url))
    }

    async fn get_page_views(
        &self,
        page_id: &str,
        include_title: bool,
    ) -> Result<PageViews, FetchError> {
        if !self.config.is_cloud() {
            return Err(FetchError::Validation(
                "Page views are only available for Confluence Cloud. Server/Data Center instances do not support the Analytics API.".to_string(),
            ));
        }

        let url = self.api_url(&format!(
            "analytics/content/{}/views",
            urlencoding::encode(page_id)
        ));
        let views: PageViewsResponse = self.fetch_json(self.client.get(&url)).await?;

        let page_title = if include_title {
            match self.get_content(page_id, "").await {
                Ok(page) => Some(page.title),
                Err(e) => {
                    log::warn!("Could not fetch title of page {page_id}: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(PageViews {
            page_id: page_id.to_string(),
            page_title,
            total_views: views.count,
        })
    }
}
