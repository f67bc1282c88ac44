use std::sync::Arc;

use conftools_core::params::ValidationError;

use crate::confluence::{ConfluenceConfig, ConfluenceFetcher, FetchError, HttpConfluenceFetcher};

/// Failures of a tool call
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments that do not deserialize into the tool's argument record
    #[error("{0}")]
    Arguments(serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{0}' is not available in read-only mode")]
    ReadOnly(String),

    #[error("Confluence is not configured: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// State shared by every tool call: the fetcher and the read-only switch.
///
/// Both are fixed at startup.
#[derive(Clone)]
pub struct ToolContext {
    fetcher: Result<Arc<dyn ConfluenceFetcher>, String>,
    read_only: bool,
}

impl ToolContext {
    pub fn new(fetcher: Arc<dyn ConfluenceFetcher>, read_only: bool) -> Self {
        Self {
            fetcher: Ok(fetcher),
            read_only,
        }
    }

    /// A context whose tool calls fail with [`ToolError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>, read_only: bool) -> Self {
        Self {
            fetcher: Err(reason.into()),
            read_only,
        }
    }

    /// Build the HTTP fetcher from the environment. Missing configuration
    /// keeps the server up with every tool unavailable.
    pub fn from_env(read_only: bool) -> Self {
        match ConfluenceConfig::from_env().and_then(HttpConfluenceFetcher::new) {
            Ok(fetcher) => {
                log::info!(
                    "Confluence tools enabled for {}",
                    fetcher.config().site_url()
                );
                Self::new(Arc::new(fetcher), read_only)
            }
            Err(e) => {
                log::warn!("Confluence tools are unavailable: {e}");
                Self::unavailable(e.to_string(), read_only)
            }
        }
    }

    pub fn fetcher(&self) -> Result<Arc<dyn ConfluenceFetcher>, ToolError> {
        self.fetcher
            .clone()
            .map_err(ToolError::Unavailable)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Fails for every mutating tool while in read-only mode.
    pub fn check_write_access(&self, tool: &str) -> Result<(), ToolError> {
        if self.read_only {
            log::warn!("Refusing '{tool}' in read-only mode");
            return Err(ToolError::ReadOnly(tool.to_string()));
        }
        Ok(())
    }
}
