mod confluence;

use serde::{Deserialize, Serialize};

use crate::prelude::eprintln;

// Re-export types needed by tool handlers
pub use super::{JsonRpcError, ServerState, Tool, ToolAnnotations, ToolContext, ToolError};

// MCP Protocol types for tools
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    pub instructions: String,
}

#[derive(Debug, Serialize)]
pub struct ToolsList {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

impl From<ToolError> for JsonRpcError {
    fn from(error: ToolError) -> Self {
        let (code, message) = match &error {
            ToolError::Arguments(_) | ToolError::Validation(_) => {
                (-32602, format!("Invalid arguments: {error}"))
            }
            ToolError::UnknownTool(_) => (-32602, error.to_string()),
            _ => (-32603, format!("Tool execution error: {error}")),
        };

        JsonRpcError {
            code,
            message,
            data: None,
        }
    }
}

fn internal_error(e: serde_json::Error) -> JsonRpcError {
    JsonRpcError {
        code: -32603,
        message: format!("Internal error: {e}"),
        data: None,
    }
}

pub fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    let result = InitializeResult {
        protocol_version: "2024-11-05".to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "conftools".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        instructions: "Provides tools for interacting with Atlassian Confluence.".to_string(),
    };

    serde_json::to_value(result).map_err(internal_error)
}

pub fn handle_tools_list(context: &ToolContext) -> Result<serde_json::Value, JsonRpcError> {
    let result = ToolsList {
        tools: confluence::tools(context.is_read_only()),
    };

    serde_json::to_value(result).map_err(internal_error)
}

pub async fn handle_tools_call(
    params: Option<serde_json::Value>,
    state: &ServerState,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| JsonRpcError {
            code: -32602,
            message: format!("Invalid params: {e}"),
            data: None,
        })?;

    if state.global.verbose {
        eprintln!(
            "Calling {}: {}",
            params.name,
            params.arguments.clone().unwrap_or_default()
        );
    }

    let text = confluence::call(&state.context, &params.name, params.arguments)
        .await
        .map_err(|e| {
            log::error!("Tool {} failed: {e}", params.name);
            JsonRpcError::from(e)
        })?;

    let result = CallToolResult {
        content: vec![Content::Text { text }],
    };

    serde_json::to_value(result).map_err(internal_error)
}
