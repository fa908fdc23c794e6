//! hs - Command line tool for the hsstats client core.
//!
//! Commands:
//! - `hs query` - Fetch a query through the request cache, polling while it is processed
//! - `hs key` - Print the cache key and URL of a request
//! - `hs fragment` - Encode or decode URL fragment state against a schema
//! - `hs config` - Show or validate configuration

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use hs_observability::{filter_for_verbosity, init_tracing, LogFormat};

use commands::{ConfigArgs, FragmentArgs, KeyArgs, QueryArgs};

/// hs - Query analytics endpoints and inspect fragment state
#[derive(Parser)]
#[command(name = "hs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a query through the cache
    Query(QueryArgs),

    /// Print the cache key for a request
    Key(KeyArgs),

    /// Encode or decode fragment state
    Fragment(FragmentArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json { LogFormat::Json } else { LogFormat::Human };
    init_tracing(filter_for_verbosity(cli.verbose), format);

    let output = output::Output::new(cli.verbose > 0, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let result = match cli.command {
        Commands::Query(args) => commands::query::run(args, &ctx).await,
        Commands::Key(args) => commands::key::run(args, &ctx),
        Commands::Fragment(args) => commands::fragment::run(args, &ctx),
        Commands::Config(args) => commands::config::run(args, &ctx),
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
