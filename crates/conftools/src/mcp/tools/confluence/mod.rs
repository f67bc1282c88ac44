//! Confluence tool registry and dispatch
//!
//! Every tool parses its arguments into a `*Args` record, validates it into
//! `*Params` and returns the pretty-printed JSON payload handed back to the
//! client as text content.

mod read;
mod write;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use conftools_core::confluence::SimplifiedDict;

use super::{Tool, ToolAnnotations, ToolContext, ToolError};

/// How a tool touches Confluence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    /// Modifies content without removing anything
    Write,
    Destructive,
}

impl Access {
    fn is_write(self) -> bool {
        !matches!(self, Access::Read)
    }

    fn annotations(self, title: &str) -> ToolAnnotations {
        let (read_only_hint, destructive_hint) = match self {
            Access::Read => (Some(true), None),
            Access::Write => (Some(false), None),
            Access::Destructive => (None, Some(true)),
        };

        ToolAnnotations {
            title: title.to_string(),
            read_only_hint,
            destructive_hint,
        }
    }
}

fn tool(name: &str, title: &str, access: Access, description: &str, schema: Value) -> (Access, Tool) {
    (
        access,
        Tool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: schema,
            annotations: Some(access.annotations(title)),
        },
    )
}

fn page_id_property(description: &str) -> Value {
    json!({
        "type": ["string", "integer"],
        "description": description
    })
}

/// Schema fields shared by create and update.
fn content_properties() -> serde_json::Map<String, Value> {
    let properties = json!({
        "content_format": {
            "type": "string",
            "enum": ["markdown", "wiki", "storage"],
            "default": "markdown",
            "description": "Format of 'content': 'markdown' is converted to storage format, 'wiki' and 'storage' are sent as is"
        },
        "enable_heading_anchors": {
            "type": "boolean",
            "default": false,
            "description": "Add anchor ids to headings (markdown only)"
        },
        "emoji": {
            "type": "string",
            "description": "Page title emoji, e.g. '📝'"
        },
        "page_width": {
            "type": "string",
            "enum": ["default", "full-width", "max"],
            "description": "Page layout width"
        }
    });

    match properties {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

fn definitions() -> Vec<(Access, Tool)> {
    let mut create_properties = serde_json::Map::new();
    create_properties.insert(
        "space_key".to_string(),
        json!({"type": "string", "description": "Key of the space to create the page in, e.g. 'DEV'"}),
    );
    create_properties.insert(
        "title".to_string(),
        json!({"type": "string", "description": "Title of the new page"}),
    );
    create_properties.insert(
        "content".to_string(),
        json!({"type": "string", "description": "Body of the new page, in 'content_format'"}),
    );
    create_properties.insert(
        "parent_id".to_string(),
        page_id_property("Optional parent page ID or URL"),
    );
    create_properties.extend(content_properties());

    let mut update_properties = serde_json::Map::new();
    update_properties.insert(
        "page_id".to_string(),
        page_id_property("ID or URL of the page to update"),
    );
    update_properties.insert(
        "title".to_string(),
        json!({"type": "string", "description": "New title of the page"}),
    );
    update_properties.insert(
        "content".to_string(),
        json!({"type": "string", "description": "New body of the page, in 'content_format'"}),
    );
    update_properties.insert(
        "is_minor_edit".to_string(),
        json!({"type": "boolean", "default": false, "description": "Mark the change as a minor edit"}),
    );
    update_properties.insert(
        "version_comment".to_string(),
        json!({"type": "string", "description": "Comment stored with the new version"}),
    );
    update_properties.insert(
        "parent_id".to_string(),
        page_id_property("Optional new parent page ID or URL"),
    );
    update_properties.extend(content_properties());

    vec![
        tool(
            "confluence_search",
            "Search Content",
            Access::Read,
            "Search Confluence content. Accepts plain words, which run a site search (falling back to a text search), or CQL such as 'type=page AND space=DEV'.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Plain search words or a CQL query"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "default": 10,
                        "description": "Maximum number of results"
                    },
                    "spaces_filter": {
                        "type": "string",
                        "description": "Comma separated space keys to search in. Overrides the configured default; an empty string searches every space"
                    }
                },
                "required": ["query"]
            }),
        ),
        tool(
            "confluence_get_page",
            "Get Page",
            Access::Read,
            "Get a Confluence page by ID or URL, or by title within a space.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("Page ID or page URL. Takes precedence over 'title' and 'space_key'"),
                    "title": {
                        "type": "string",
                        "description": "Exact page title, used with 'space_key' when 'page_id' is absent"
                    },
                    "space_key": {
                        "type": "string",
                        "description": "Space key, used with 'title' when 'page_id' is absent"
                    },
                    "include_metadata": {
                        "type": "boolean",
                        "default": true,
                        "description": "Return the page metadata along with its content"
                    },
                    "convert_to_markdown": {
                        "type": "boolean",
                        "default": true,
                        "description": "Convert the body to markdown instead of storage format"
                    }
                }
            }),
        ),
        tool(
            "confluence_get_page_children",
            "Get Page Children",
            Access::Read,
            "List the direct children of a Confluence page, folders included.",
            json!({
                "type": "object",
                "properties": {
                    "parent_id": page_id_property("ID or URL of the parent page"),
                    "expand": {
                        "type": "string",
                        "default": "version",
                        "description": "Comma separated fields to expand"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "default": 25,
                        "description": "Maximum number of children"
                    },
                    "include_content": {
                        "type": "boolean",
                        "default": false,
                        "description": "Include each child's body"
                    },
                    "convert_to_markdown": {
                        "type": "boolean",
                        "default": true,
                        "description": "Convert bodies to markdown"
                    },
                    "start": {
                        "type": "integer",
                        "minimum": 0,
                        "default": 0,
                        "description": "Index of the first child to return"
                    },
                    "include_folders": {
                        "type": "boolean",
                        "default": true,
                        "description": "Include child folders"
                    }
                },
                "required": ["parent_id"]
            }),
        ),
        tool(
            "confluence_get_page_ancestors",
            "Get Page Ancestors",
            Access::Read,
            "Get the ancestors of a Confluence page, immediate parent first.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("Page ID or URL")
                },
                "required": ["page_id"]
            }),
        ),
        tool(
            "confluence_get_space_page_tree",
            "Get Space Page Tree",
            Access::Read,
            "Get the page hierarchy of a space as a depth-first list of pages with their parent and depth.",
            json!({
                "type": "object",
                "properties": {
                    "space_key": {
                        "type": "string",
                        "description": "Space key, e.g. 'DEV'"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 1000,
                        "default": 100,
                        "description": "Maximum number of pages"
                    }
                },
                "required": ["space_key"]
            }),
        ),
        tool(
            "confluence_list_spaces",
            "List Spaces",
            Access::Read,
            "List the Confluence spaces visible to the configured user.",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 100,
                        "default": 25,
                        "description": "Maximum number of spaces"
                    },
                    "start": {
                        "type": "integer",
                        "minimum": 0,
                        "default": 0,
                        "description": "Index of the first space to return"
                    }
                }
            }),
        ),
        tool(
            "confluence_get_comments",
            "Get Comments",
            Access::Read,
            "Get the comments of a Confluence page, bodies in markdown.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("Page ID or URL")
                },
                "required": ["page_id"]
            }),
        ),
        tool(
            "confluence_get_labels",
            "Get Labels",
            Access::Read,
            "Get the labels of a Confluence page.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("Page ID or URL")
                },
                "required": ["page_id"]
            }),
        ),
        tool(
            "confluence_add_label",
            "Add Label",
            Access::Destructive,
            "Add a label to a Confluence page. Returns every label of the page.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("Page ID or URL"),
                    "name": {
                        "type": "string",
                        "description": "Label to add, e.g. 'draft'"
                    }
                },
                "required": ["page_id", "name"]
            }),
        ),
        tool(
            "confluence_create_page",
            "Create Page",
            Access::Destructive,
            "Create a Confluence page, optionally under a parent page.",
            json!({
                "type": "object",
                "properties": create_properties,
                "required": ["space_key", "title", "content"]
            }),
        ),
        tool(
            "confluence_update_page",
            "Update Page",
            Access::Destructive,
            "Replace the title and body of a Confluence page with a new version.",
            json!({
                "type": "object",
                "properties": update_properties,
                "required": ["page_id", "title", "content"]
            }),
        ),
        tool(
            "confluence_move_page_position",
            "Move Page Position",
            Access::Write,
            "Move a page before or after a sibling, or append it as the last child of a target page.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("ID or URL of the page to move"),
                    "position": {
                        "type": "string",
                        "enum": ["before", "after", "append"],
                        "description": "'before'/'after' place the page next to the target, 'append' makes it the target's last child"
                    },
                    "target_id": page_id_property("ID or URL of the target page")
                },
                "required": ["page_id", "position", "target_id"]
            }),
        ),
        tool(
            "confluence_delete_page",
            "Delete Page",
            Access::Destructive,
            "Delete a Confluence page.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("ID or URL of the page to delete")
                },
                "required": ["page_id"]
            }),
        ),
        tool(
            "confluence_add_comment",
            "Add Comment",
            Access::Destructive,
            "Add a comment to a Confluence page.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("Page ID or URL"),
                    "content": {
                        "type": "string",
                        "description": "Comment body in markdown"
                    }
                },
                "required": ["page_id", "content"]
            }),
        ),
        tool(
            "confluence_search_user",
            "Search User",
            Access::Read,
            "Search Confluence users by name, or with a user CQL query such as 'user.fullname ~ \"Ada\"'.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Name to look for, or a user CQL query"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 50,
                        "default": 10,
                        "description": "Maximum number of users"
                    }
                },
                "required": ["query"]
            }),
        ),
        tool(
            "confluence_get_page_views",
            "Get Page Views",
            Access::Read,
            "Get the total view count of a page. Confluence Cloud only.",
            json!({
                "type": "object",
                "properties": {
                    "page_id": page_id_property("Page ID or URL"),
                    "include_title": {
                        "type": "boolean",
                        "default": true,
                        "description": "Look up and include the page title"
                    }
                },
                "required": ["page_id"]
            }),
        ),
    ]
}

/// Tools advertised by `tools/list`. Write tools are left out in read-only
/// mode.
pub fn tools(read_only: bool) -> Vec<Tool> {
    definitions()
        .into_iter()
        .filter(|(access, _)| !(read_only && access.is_write()))
        .map(|(_, tool)| tool)
        .collect()
}

/// Run the tool `name` and return its JSON payload.
pub async fn call(
    ctx: &ToolContext,
    name: &str,
    arguments: Option<Value>,
) -> Result<String, ToolError> {
    match name {
        "confluence_search" => read::search(ctx, arguments).await,
        "confluence_get_page" => read::get_page(ctx, arguments).await,
        "confluence_get_page_children" => read::get_page_children(ctx, arguments).await,
        "confluence_get_page_ancestors" => read::get_page_ancestors(ctx, arguments).await,
        "confluence_get_space_page_tree" => read::get_space_page_tree(ctx, arguments).await,
        "confluence_list_spaces" => read::list_spaces(ctx, arguments).await,
        "confluence_get_comments" => read::get_comments(ctx, arguments).await,
        "confluence_get_labels" => read::get_labels(ctx, arguments).await,
        "confluence_search_user" => read::search_user(ctx, arguments).await,
        "confluence_get_page_views" => read::get_page_views(ctx, arguments).await,
        "confluence_create_page" => write::create_page(ctx, arguments).await,
        "confluence_update_page" => write::update_page(ctx, arguments).await,
        "confluence_move_page_position" => write::move_page_position(ctx, arguments).await,
        "confluence_delete_page" => write::delete_page(ctx, arguments).await,
        "confluence_add_comment" => write::add_comment(ctx, arguments).await,
        "confluence_add_label" => write::add_label(ctx, arguments).await,
        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}

fn parse_arguments<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T, ToolError> {
    serde_json::from_value(arguments.unwrap_or_else(|| json!({}))).map_err(ToolError::Arguments)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ToolError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn simplified<T: SimplifiedDict>(items: &[T]) -> Vec<Value> {
    items.iter().map(SimplifiedDict::to_simplified_dict).collect()
}
