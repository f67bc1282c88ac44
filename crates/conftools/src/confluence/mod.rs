use crate::prelude::{println, *};
use serde::{Deserialize, Serialize};

use conftools_core::confluence::ConfluencePage;
use conftools_core::cql::{SearchQuery, TextSearchPlan};
use conftools_core::params::SearchParams;

mod client;
mod commands;
mod fetcher;
#[cfg(test)]
pub mod mock;

pub use client::HttpConfluenceFetcher;
pub use fetcher::{ConfluenceFetcher, FetchError};

/// Confluence commands
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Search Confluence content using plain words or CQL
    #[clap(name = "search")]
    Search(commands::SearchOptions),

    /// Show a page by ID or URL
    #[clap(name = "page")]
    Page(commands::PageOptions),

    /// List spaces
    #[clap(name = "spaces")]
    Spaces(commands::SpacesOptions),
}

/// Confluence configuration from environment variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfluenceConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    /// Default comma separated space keys for searches
    pub spaces_filter: Option<String>,
}

impl ConfluenceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(Error::MissingEnv(key))
        };

        Ok(Self {
            base_url: required("ATLASSIAN_BASE_URL")?,
            email: required("ATLASSIAN_EMAIL")?,
            api_token: required("ATLASSIAN_API_TOKEN")?,
            spaces_filter: lookup("CONFLUENCE_SPACES_FILTER").filter(|v| !v.trim().is_empty()),
        })
    }

    /// Site root without a trailing slash or `/wiki` suffix.
    pub fn site_url(&self) -> &str {
        self.base_url.trim_end_matches('/').trim_end_matches("/wiki")
    }

    /// Cloud sites are hosted under `atlassian.net`.
    pub fn is_cloud(&self) -> bool {
        self.site_url().contains(".atlassian.net")
    }
}

/// Create an authenticated HTTP client with Basic Auth headers
pub fn create_authenticated_client(config: &ConfluenceConfig) -> Result<reqwest::Client, Error> {
    use base64::Engine;
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

    let auth_string = format!("{}:{}", config.email, config.api_token);
    let auth_encoded = base64::engine::general_purpose::STANDARD.encode(&auth_string);

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Basic {auth_encoded}"))
            .map_err(|e| Error::InvalidHeader(e.to_string()))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| Error::ClientBuild(e.to_string()))
}

/// Public data function - used by both CLI and MCP
///
/// CQL input is sent as is, once. Plain words are searched with
/// `siteSearch` first and, only if that call fails, once more with `text`.
/// The second failure is returned to the caller.
pub async fn search_pages(
    fetcher: &dyn ConfluenceFetcher,
    params: &SearchParams,
) -> Result<Vec<ConfluencePage>, FetchError> {
    let spaces_filter = params.spaces_filter.as_deref();

    match SearchQuery::classify(&params.query) {
        SearchQuery::Cql(cql) => fetcher.search(&cql, params.limit, spaces_filter).await,
        SearchQuery::Text(text) => {
            let plan = TextSearchPlan::new(&text);
            log::info!("Converting simple search term to CQL: {}", plan.primary);

            match fetcher.search(&plan.primary, params.limit, spaces_filter).await {
                Ok(pages) => Ok(pages),
                Err(e) => {
                    log::warn!("siteSearch failed ('{e}'), falling back to text search");
                    log::info!("Falling back to text search with CQL: {}", plan.fallback);
                    fetcher.search(&plan.fallback, params.limit, spaces_filter).await
                }
            }
        }
    }
}

/// Run Confluence commands
pub async fn run(cmd: Commands, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Running Confluence command...");
    }

    let config = ConfluenceConfig::from_env()?;
    let fetcher = HttpConfluenceFetcher::new(config)?;

    match cmd {
        Commands::Search(options) => commands::search_handler(&fetcher, options).await,
        Commands::Page(options) => commands::page_handler(&fetcher, options).await,
        Commands::Spaces(options) => commands::spaces_handler(&fetcher, options).await,
    }
}
