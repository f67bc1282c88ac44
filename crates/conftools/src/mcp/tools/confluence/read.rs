//! Read-only Confluence tools

use serde_json::{json, Value};

use conftools_core::confluence::SimplifiedDict;
use conftools_core::cql::{expand_with_body, user_search_cql};
use conftools_core::params::{
    GetPageArgs, GetPageChildrenArgs, ListSpacesArgs, PageIdentifier, PageRefArgs, PageViewsArgs,
    SearchArgs, SearchUserArgs, SpaceTreeArgs,
};

use super::{parse_arguments, simplified, to_json};
use crate::confluence::{search_pages, FetchError};
use crate::mcp::{ToolContext, ToolError};

/// `confluence_search`: plain words or CQL, with the `siteSearch` to `text`
/// fallback for plain words.
pub async fn search(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    let params = parse_arguments::<SearchArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let pages = search_pages(fetcher.as_ref(), &params).await?;

    to_json(&simplified(&pages))
}

/// `confluence_get_page`: by ID, or by title within a space.
pub async fn get_page(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    let params = parse_arguments::<GetPageArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let page = match &params.identifier {
        PageIdentifier::Id(page_id) => {
            if params.ignored_title_or_space {
                log::warn!(
                    "page_id '{page_id}' was provided; 'title' and 'space_key' are ignored"
                );
            }

            match fetcher
                .get_page_content(page_id, params.convert_to_markdown)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    log::error!("Error fetching page by ID '{page_id}': {e}");
                    return to_json(&json!({
                        "error": format!("Failed to retrieve page by ID '{page_id}': {e}")
                    }));
                }
            }
        }
        PageIdentifier::Title { title, space_key } => {
            match fetcher
                .get_page_by_title(space_key, title, params.convert_to_markdown)
                .await?
            {
                Some(page) => page,
                None => {
                    return to_json(&json!({
                        "error": format!("Page with title '{title}' not found in space '{space_key}'.")
                    }));
                }
            }
        }
    };

    if params.include_metadata {
        to_json(&json!({ "metadata": page.to_simplified_dict() }))
    } else {
        to_json(&json!({ "content": { "value": page.content_value() } }))
    }
}

/// `confluence_get_page_children`: direct children, folders included on request.
pub async fn get_page_children(
    ctx: &ToolContext,
    arguments: Option<Value>,
) -> Result<String, ToolError> {
    let params = parse_arguments::<GetPageChildrenArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let expand = expand_with_body(&params.expand, params.include_content);

    let result = match fetcher
        .get_page_children(
            &params.parent_id,
            params.start,
            params.limit,
            &expand,
            params.convert_to_markdown,
            params.include_folders,
        )
        .await
    {
        Ok(pages) => json!({
            "parent_id": params.parent_id,
            "count": pages.len(),
            "limit_requested": params.limit,
            "start_requested": params.start,
            "results": simplified(&pages),
        }),
        Err(e) => {
            log::error!(
                "Error getting/processing children for page ID {}: {e}",
                params.parent_id
            );
            json!({ "error": format!("Failed to get child pages: {e}") })
        }
    };

    to_json(&result)
}

/// `confluence_get_page_ancestors`: immediate parent first.
pub async fn get_page_ancestors(
    ctx: &ToolContext,
    arguments: Option<Value>,
) -> Result<String, ToolError> {
    let params = parse_arguments::<PageRefArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let ancestors = fetcher.get_page_ancestors(&params.page_id).await?;

    to_json(&simplified(&ancestors))
}

pub async fn get_space_page_tree(
    ctx: &ToolContext,
    arguments: Option<Value>,
) -> Result<String, ToolError> {
    let params = parse_arguments::<SpaceTreeArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let tree = fetcher
        .get_space_page_tree(&params.space_key, params.limit)
        .await?;

    to_json(&tree.to_simplified_dict())
}

pub async fn list_spaces(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    let params = parse_arguments::<ListSpacesArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let spaces = fetcher.get_spaces(params.start, params.limit).await?;

    to_json(&spaces.to_simplified_dict())
}

pub async fn get_comments(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    let params = parse_arguments::<PageRefArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let comments = fetcher.get_page_comments(&params.page_id).await?;

    to_json(&simplified(&comments))
}

pub async fn get_labels(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    let params = parse_arguments::<PageRefArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let labels = fetcher.get_page_labels(&params.page_id).await?;

    to_json(&simplified(&labels))
}

/// `confluence_search_user`: never fails once the arguments are valid.
pub async fn search_user(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    let params = parse_arguments::<SearchUserArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let cql = user_search_cql(&params.query);
    if cql != params.query {
        log::info!("Converting simple search term to user CQL: {cql}");
    }

    let result = match fetcher.search_user(&cql, params.limit).await {
        Ok(users) => json!(simplified(&users)),
        Err(e @ FetchError::Authentication(_)) => {
            log::error!("Authentication error during user search: {e}");
            json!({
                "error": "Authentication failed. Please check your credentials.",
                "details": e.to_string(),
            })
        }
        Err(e) => {
            log::error!("Error searching users: {e}");
            json!({
                "error": format!("An unexpected error occurred while searching for users: {e}")
            })
        }
    };

    to_json(&result)
}

/// `confluence_get_page_views`: never fails once the arguments are valid.
pub async fn get_page_views(
    ctx: &ToolContext,
    arguments: Option<Value>,
) -> Result<String, ToolError> {
    let params = parse_arguments::<PageViewsArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;
    let page_id = &params.page_id;

    let result = match fetcher.get_page_views(page_id, params.include_title).await {
        Ok(views) => views.to_simplified_dict(),
        Err(e @ FetchError::Authentication(_)) => {
            log::error!("Authentication error getting page views: {e}");
            json!({
                "error": "Authentication failed. Please check your credentials.",
                "details": e.to_string(),
            })
        }
        Err(FetchError::Validation(message)) => {
            log::error!("Error getting page views for {page_id}: {message}");
            json!({ "error": message, "page_id": page_id })
        }
        Err(e) => {
            log::error!("Unexpected error getting page views for {page_id}: {e}");
            json!({ "error": format!("Failed to get page views: {e}"), "page_id": page_id })
        }
    };

    to_json(&result)
}
