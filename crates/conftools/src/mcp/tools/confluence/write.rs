//! Confluence tools that modify content
//!
//! Each handler checks write access before parsing its arguments, so a
//! read-only server rejects the call without touching Confluence.

use serde_json::{json, Value};

use conftools_core::confluence::SimplifiedDict;
use conftools_core::params::{
    AddCommentArgs, AddLabelArgs, CreatePageArgs, MovePageArgs, PageRefArgs, UpdatePageArgs,
};

use super::{parse_arguments, simplified, to_json};
use crate::confluence::FetchError;
use crate::mcp::{ToolContext, ToolError};

pub async fn create_page(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    ctx.check_write_access("confluence_create_page")?;
    let params = parse_arguments::<CreatePageArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let result = match fetcher.create_page(&params).await {
        Ok(page) => json!({
            "message": "Page created successfully",
            "page": page.to_simplified_dict(),
        }),
        Err(e) => {
            log::error!("Error creating page '{}': {e}", params.title);
            json!({ "success": false, "error": format!("Failed to create page: {e}") })
        }
    };

    to_json(&result)
}

pub async fn update_page(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    ctx.check_write_access("confluence_update_page")?;
    let params = parse_arguments::<UpdatePageArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let result = match fetcher.update_page(&params).await {
        Ok(page) => json!({
            "message": "Page updated successfully",
            "page": page.to_simplified_dict(),
        }),
        Err(e) => {
            log::error!("Error updating page {}: {e}", params.page_id);
            json!({ "success": false, "error": format!("Failed to update page: {e}") })
        }
    };

    to_json(&result)
}

/// `confluence_move_page_position`: an unknown position is reported in the
/// payload, not raised.
pub async fn move_page_position(
    ctx: &ToolContext,
    arguments: Option<Value>,
) -> Result<String, ToolError> {
    ctx.check_write_access("confluence_move_page_position")?;
    let params = parse_arguments::<MovePageArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let result = match fetcher
        .move_page_position(&params.page_id, &params.position, &params.target_id)
        .await
    {
        Ok(moved) => json!({
            "success": moved,
            "message": format!(
                "Successfully moved page {} to position '{}' relative to {}",
                params.page_id, params.position, params.target_id
            ),
        }),
        Err(FetchError::Validation(message)) => {
            json!({ "success": false, "error": message })
        }
        Err(e) => {
            log::error!("Error moving page {}: {e}", params.page_id);
            json!({ "success": false, "error": format!("Failed to move page: {e}") })
        }
    };

    to_json(&result)
}

pub async fn delete_page(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    ctx.check_write_access("confluence_delete_page")?;
    let params = parse_arguments::<PageRefArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;
    let page_id = &params.page_id;

    let result = match fetcher.delete_page(page_id).await {
        Ok(true) => json!({
            "success": true,
            "message": format!("Page {page_id} deleted successfully"),
        }),
        Ok(false) => json!({
            "success": false,
            "message": format!("Unable to delete page {page_id}. API request completed but deletion unsuccessful."),
        }),
        Err(e) => {
            log::error!("Error deleting page {page_id}: {e}");
            json!({
                "success": false,
                "message": format!("Error deleting page {page_id}"),
                "error": e.to_string(),
            })
        }
    };

    to_json(&result)
}

/// `confluence_add_comment`: the content is markdown.
pub async fn add_comment(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    ctx.check_write_access("confluence_add_comment")?;
    let params = parse_arguments::<AddCommentArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let result = match fetcher.add_comment(&params.page_id, &params.content).await {
        Ok(Some(comment)) => json!({
            "success": true,
            "message": "Comment added successfully",
            "comment": comment.to_simplified_dict(),
        }),
        Ok(None) => json!({
            "success": false,
            "message": format!("Unable to add comment to page {}. API request completed but comment creation unsuccessful.", params.page_id),
        }),
        Err(e) => {
            log::error!("Error adding comment to page {}: {e}", params.page_id);
            json!({
                "success": false,
                "message": format!("Error adding comment to page {}", params.page_id),
                "error": e.to_string(),
            })
        }
    };

    to_json(&result)
}

pub async fn add_label(ctx: &ToolContext, arguments: Option<Value>) -> Result<String, ToolError> {
    ctx.check_write_access("confluence_add_label")?;
    let params = parse_arguments::<AddLabelArgs>(arguments)?.validate()?;
    let fetcher = ctx.fetcher()?;

    let result = match fetcher.add_page_label(&params.page_id, &params.name).await {
        Ok(labels) => json!(simplified(&labels)),
        Err(e) => {
            log::error!("Error adding label '{}' to page {}: {e}", params.name, params.page_id);
            json!({ "success": false, "error": format!("Failed to add label: {e}") })
        }
    };

    to_json(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confluence::mock::MockFetcher;
    use std::sync::Arc;

    fn context(fetcher: MockFetcher, read_only: bool) -> (ToolContext, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        (ToolContext::new(fetcher.clone(), read_only), fetcher)
    }

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).unwrap()
    }

    // ------------------------------------------------------------------
    // Read-only gate
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_read_only_rejects_every_write_tool() {
        // Arrange
        let (ctx, fetcher) = context(MockFetcher::default(), true);

        // Act
        let results = vec![
            create_page(&ctx, Some(json!({"space_key": "DEV", "title": "T", "content": "x"}))).await,
            update_page(&ctx, Some(json!({"page_id": "1", "title": "T", "content": "x"}))).await,
            move_page_position(
                &ctx,
                Some(json!({"page_id": "1", "position": "append", "target_id": "2"})),
            )
            .await,
            delete_page(&ctx, Some(json!({"page_id": "1"}))).await,
            add_comment(&ctx, Some(json!({"page_id": "1", "content": "hi"}))).await,
            add_label(&ctx, Some(json!({"page_id": "1", "name": "docs"}))).await,
        ];

        // Assert
        for result in results {
            assert!(matches!(result, Err(ToolError::ReadOnly(_))));
        }
        assert!(fetcher.calls().is_empty());
    }

    // ------------------------------------------------------------------
    // create_page / update_page
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_page_defaults_to_markdown() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);

        let output = create_page(
            &ctx,
            Some(json!({
                "space_key": "DEV",
                "title": "Runbook",
                "content": "# Hello",
                "parent_id": "https://x.atlassian.net/wiki/spaces/DEV/pages/42/Parent",
                "enable_heading_anchors": true
            })),
        )
        .await
        .unwrap();

        assert_eq!(
            fetcher.calls_to("create_page")[0].args,
            vec!["DEV", "Runbook", "markdown", "true", "42"]
        );
        let value = parse(&output);
        assert_eq!(value["message"], "Page created successfully");
        assert_eq!(value["page"]["title"], "Runbook");
    }

    #[tokio::test]
    async fn test_create_page_storage_ignores_heading_anchors() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);

        create_page(
            &ctx,
            Some(json!({
                "space_key": "DEV",
                "title": "Raw",
                "content": "<p>x</p>",
                "content_format": "storage",
                "enable_heading_anchors": true
            })),
        )
        .await
        .unwrap();

        assert_eq!(
            fetcher.calls_to("create_page")[0].args,
            vec!["DEV", "Raw", "storage", "false", "<none>"]
        );
    }

    #[tokio::test]
    async fn test_create_page_invalid_format_never_reaches_confluence() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);

        let err = create_page(
            &ctx,
            Some(json!({
                "space_key": "DEV",
                "title": "T",
                "content": "x",
                "content_format": "bogus"
            })),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid content_format: bogus. Must be 'markdown', 'wiki', or 'storage'"
        );
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_page_invalid_width_never_reaches_confluence() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);

        let err = update_page(
            &ctx,
            Some(json!({"page_id": "1", "title": "T", "content": "x", "page_width": "huge"})),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ToolError::Validation(_)));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_page_failure_is_reported() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);
        fetcher.fail_next(
            "create_page",
            FetchError::Api {
                status: 400,
                body: "A page with this title already exists".to_string(),
            },
        );

        let output = create_page(
            &ctx,
            Some(json!({"space_key": "DEV", "title": "T", "content": "x"})),
        )
        .await
        .unwrap();

        assert_eq!(
            parse(&output),
            json!({
                "success": false,
                "error": "Failed to create page: Confluence API error [400]: A page with this title already exists"
            })
        );
    }

    #[tokio::test]
    async fn test_update_page() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);

        let output = update_page(
            &ctx,
            Some(json!({
                "page_id": 77,
                "title": "Renamed",
                "content": "body",
                "is_minor_edit": true,
                "content_format": "wiki"
            })),
        )
        .await
        .unwrap();

        assert_eq!(
            fetcher.calls_to("update_page")[0].args,
            vec!["77", "Renamed", "wiki", "true"]
        );
        let value = parse(&output);
        assert_eq!(value["message"], "Page updated successfully");
        assert_eq!(value["page"]["id"], "77");
    }

    #[tokio::test]
    async fn test_update_page_failure_is_reported() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);
        fetcher.fail_next("update_page", FetchError::NotFound("page 77".to_string()));

        let output = update_page(
            &ctx,
            Some(json!({"page_id": "77", "title": "T", "content": "x"})),
        )
        .await
        .unwrap();

        assert_eq!(
            parse(&output)["error"],
            "Failed to update page: Not found: page 77"
        );
    }

    // ------------------------------------------------------------------
    // move_page_position
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_move_page_position() {
        let (ctx, _fetcher) = context(MockFetcher::default(), false);

        let output = move_page_position(
            &ctx,
            Some(json!({"page_id": "1", "position": "before", "target_id": "2"})),
        )
        .await
        .unwrap();

        assert_eq!(
            parse(&output),
            json!({
                "success": true,
                "message": "Successfully moved page 1 to position 'before' relative to 2"
            })
        );
    }

    #[tokio::test]
    async fn test_move_page_position_invalid_position() {
        let (ctx, _fetcher) = context(MockFetcher::default(), false);

        let output = move_page_position(
            &ctx,
            Some(json!({"page_id": "1", "position": "sideways", "target_id": "2"})),
        )
        .await
        .unwrap();

        assert_eq!(
            parse(&output),
            json!({
                "success": false,
                "error": "Invalid position 'sideways'. Must be one of: 'before', 'after', 'append'"
            })
        );
    }

    #[tokio::test]
    async fn test_move_page_position_failure() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);
        fetcher.fail_next(
            "move_page_position",
            FetchError::Transport("timeout".to_string()),
        );

        let output = move_page_position(
            &ctx,
            Some(json!({"page_id": "1", "position": "after", "target_id": "2"})),
        )
        .await
        .unwrap();

        assert_eq!(
            parse(&output)["error"],
            "Failed to move page: Failed to send request to Confluence: timeout"
        );
    }

    // ------------------------------------------------------------------
    // delete_page
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_delete_page() {
        let (ctx, _fetcher) = context(MockFetcher::default(), false);

        let output = delete_page(&ctx, Some(json!({"page_id": "9"}))).await.unwrap();

        assert_eq!(
            parse(&output),
            json!({"success": true, "message": "Page 9 deleted successfully"})
        );
    }

    #[tokio::test]
    async fn test_delete_page_not_deleted() {
        let (ctx, _fetcher) = context(MockFetcher::default().with_delete_result(false), false);

        let output = delete_page(&ctx, Some(json!({"page_id": "9"}))).await.unwrap();

        assert_eq!(
            parse(&output),
            json!({
                "success": false,
                "message": "Unable to delete page 9. API request completed but deletion unsuccessful."
            })
        );
    }

    #[tokio::test]
    async fn test_delete_page_failure() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);
        fetcher.fail_next(
            "delete_page",
            FetchError::Authentication("[403] forbidden".to_string()),
        );

        let output = delete_page(&ctx, Some(json!({"page_id": "9"}))).await.unwrap();

        assert_eq!(
            parse(&output),
            json!({
                "success": false,
                "message": "Error deleting page 9",
                "error": "Authentication failed: [403] forbidden"
            })
        );
    }

    // ------------------------------------------------------------------
    // add_comment / add_label
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_comment() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);

        let output = add_comment(&ctx, Some(json!({"page_id": "5", "content": "**Nice**"})))
            .await
            .unwrap();

        assert_eq!(fetcher.calls_to("add_comment")[0].args, vec!["5", "**Nice**"]);
        let value = parse(&output);
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Comment added successfully");
        assert_eq!(value["comment"]["id"], "c2");
    }

    #[tokio::test]
    async fn test_add_comment_not_created() {
        let (ctx, _fetcher) = context(MockFetcher::default().with_comment_created(false), false);

        let output = add_comment(&ctx, Some(json!({"page_id": "5", "content": "hi"})))
            .await
            .unwrap();

        assert_eq!(
            parse(&output),
            json!({
                "success": false,
                "message": "Unable to add comment to page 5. API request completed but comment creation unsuccessful."
            })
        );
    }

    #[tokio::test]
    async fn test_add_comment_failure() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);
        fetcher.fail_next("add_comment", FetchError::NotFound("page 5".to_string()));

        let output = add_comment(&ctx, Some(json!({"page_id": "5", "content": "hi"})))
            .await
            .unwrap();

        assert_eq!(
            parse(&output),
            json!({
                "success": false,
                "message": "Error adding comment to page 5",
                "error": "Not found: page 5"
            })
        );
    }

    #[tokio::test]
    async fn test_add_label_returns_all_labels() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);

        let output = add_label(&ctx, Some(json!({"page_id": "5", "name": "draft"})))
            .await
            .unwrap();

        assert_eq!(fetcher.calls_to("add_page_label")[0].args, vec!["5", "draft"]);
        let value = parse(&output);
        assert_eq!(value[0]["name"], "docs");
        assert_eq!(value[1]["name"], "draft");
    }

    #[tokio::test]
    async fn test_add_label_empty_name() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);

        let err = add_label(&ctx, Some(json!({"page_id": "5", "name": "  "})))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::Validation(_)));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_label_failure() {
        let (ctx, fetcher) = context(MockFetcher::default(), false);
        fetcher.fail_next(
            "add_page_label",
            FetchError::Api {
                status: 400,
                body: "bad label".to_string(),
            },
        );

        let output = add_label(&ctx, Some(json!({"page_id": "5", "name": "x y"})))
            .await
            .unwrap();

        assert_eq!(
            parse(&output),
            json!({
                "success": false,
                "error": "Failed to add label: Confluence API error [400]: bad label"
            })
        );
    }
}
