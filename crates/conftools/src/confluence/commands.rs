use crate::prelude::{println, *};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use conftools_core::confluence::SimplifiedDict;
use conftools_core::page_id::parse_page_id_str;
use conftools_core::params::{ListSpacesArgs, SearchArgs};

use super::{search_pages, ConfluenceFetcher};

/// Options for searching Confluence content
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct SearchOptions {
    /// Plain words or a CQL query (e.g., "type = page AND space = DEV")
    #[clap(env = "CONFLUENCE_QUERY")]
    pub query: String,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: u64,

    /// Comma separated space keys; an empty string disables the configured filter
    #[arg(long)]
    pub spaces: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Options for showing a page
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct PageOptions {
    /// Page ID or page URL
    pub page: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the storage format instead of markdown
    #[arg(long)]
    pub raw: bool,
}

/// Options for listing spaces
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct SpacesOptions {
    /// Maximum number of spaces to return
    #[arg(short, long, default_value = "25")]
    pub limit: u64,

    /// Index of the first space
    #[arg(long, default_value = "0")]
    pub start: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Handle the search command
pub async fn search_handler(fetcher: &dyn ConfluenceFetcher, options: SearchOptions) -> Result<()> {
    let params = SearchArgs {
        query: options.query,
        limit: Some(options.limit),
        spaces_filter: options.spaces,
    }
    .validate()?;

    let pages = search_pages(fetcher, &params).await?;

    if options.json {
        let pages: Vec<_> = pages.iter().map(|p| p.to_simplified_dict()).collect();
        return print_json(&pages);
    }

    println!("Found {} page(s):\n", pages.len());

    if pages.is_empty() {
        println!("No pages found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row!["ID", "Title", "Space", "URL"]);

    for page in pages {
        let space = page.space.map(|s| s.key).unwrap_or_default();
        let url = page.url.unwrap_or_else(|| "N/A".to_string());
        table.add_row(prettytable::row![page.id, page.title.bold(), space, url]);
    }

    table.printstd();

    Ok(())
}

/// Handle the page command
pub async fn page_handler(fetcher: &dyn ConfluenceFetcher, options: PageOptions) -> Result<()> {
    let page_id = parse_page_id_str(&options.page);
    let page = fetcher.get_page_content(&page_id, !options.raw).await?;

    if options.json {
        return print_json(&page.to_simplified_dict());
    }

    println!("{}", page.title.bold().cyan());

    let mut details = Vec::new();
    if let Some(space) = &page.space {
        details.push(f!("space {}", space.key));
    }
    if let Some(version) = page.version {
        details.push(f!("version {version}"));
    }
    if let Some(author) = &page.author {
        details.push(f!("by {author}"));
    }
    if !details.is_empty() {
        println!("{}", details.join(" · ").dimmed());
    }
    if let Some(url) = &page.url {
        println!("{}", url.blue().underline());
    }

    println!();
    println!("{}", page.content_value());

    Ok(())
}

/// Handle the spaces command
pub async fn spaces_handler(fetcher: &dyn ConfluenceFetcher, options: SpacesOptions) -> Result<()> {
    let params = ListSpacesArgs {
        limit: Some(options.limit),
        start: Some(options.start),
    }
    .validate()?;

    let spaces = fetcher.get_spaces(params.start, params.limit).await?;

    if options.json {
        return print_json(&spaces.to_simplified_dict());
    }

    if spaces.results.is_empty() {
        println!("No spaces found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row!["Key", "Name", "Type"]);

    for space in spaces.results {
        table.add_row(prettytable::row![
            space.key.bold(),
            space.name,
            space.space_type.unwrap_or_default()
        ]);
    }

    table.printstd();
    println!(
        "\nShowing {} space(s) starting at {}",
        spaces.size, spaces.start
    );

    Ok(())
}
