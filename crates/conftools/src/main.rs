use crate::prelude::*;
use clap::Parser;

mod confluence;
mod error;
mod mcp;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Read and edit Confluence from the command line or through an MCP server"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "CONFTOOLS_VERBOSE", global = true, default_value = "false")]
    verbose: bool,

    /// Hide and refuse every tool that modifies Confluence.
    #[clap(
        long,
        env = "READ_ONLY_MODE",
        global = true,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    read_only: bool,
}

/// Accepts `true`, `1` and `yes` (any case) as enabled.
fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    Ok(matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes"
    ))
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Confluence operations
    #[clap(subcommand)]
    Confluence(crate::confluence::Commands),

    /// Model Context Protocol server
    MCP(crate::mcp::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Confluence(cmd) => crate::confluence::run(cmd, app.global).await,
        SubCommands::MCP(sub_app) => crate::mcp::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
