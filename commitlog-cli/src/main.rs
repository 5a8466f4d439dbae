use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use commitlog_core::Selector;
use std::path::PathBuf;

mod commands;
mod display;

use commands::{info, list, search, track, Context, OutputFormat};

#[derive(Parser)]
#[command(name = "commitlog")]
#[command(version, about = "Track git commits into an append-only log", long_about = None)]
struct Cli {
    /// Repository to inspect (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Record log path, overrides the configuration
    #[arg(short, long, global = true)]
    log: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Diagnostic log level (written to stderr)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the commit HEAD points at
    Latest,

    /// Track a specific commit by its full hash
    Hash {
        /// 40-character commit hash
        commit_hash: String,
    },

    /// Track every commit in a date range, oldest first
    Range {
        /// Start date, inclusive (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = commands::parse_since)]
        since: Option<DateTime<Utc>>,

        /// End date, inclusive (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = commands::parse_until)]
        until: Option<DateTime<Utc>>,
    },

    /// Show repository information
    Info,

    /// List the most recently tracked commits
    List {
        /// Number of records to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Count tracked commits
    Count,

    /// Search tracked commits
    Search {
        /// Author email substring (case-insensitive)
        #[arg(long)]
        author: Option<String>,

        /// Commit message substring (case-insensitive)
        #[arg(long)]
        message: Option<String>,

        /// Tracked on or after (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = commands::parse_since)]
        since: Option<DateTime<Utc>>,

        /// Tracked on or before (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_parser = commands::parse_until)]
        until: Option<DateTime<Utc>>,

        /// Glob matched against changed files
        #[arg(long)]
        files: Option<String>,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::new(cli.repo, cli.config, cli.log, cli.format)?;

    match cli.command {
        Commands::Latest => {
            track::run(&ctx, Selector::Latest)?;
        }
        Commands::Hash { commit_hash } => {
            track::run(&ctx, Selector::Hash(commit_hash))?;
        }
        Commands::Range { since, until } => {
            track::run(&ctx, Selector::range(since, until))?;
        }
        Commands::Info => {
            info::run(&ctx)?;
        }
        Commands::List { limit } => {
            list::run(&ctx, limit)?;
        }
        Commands::Count => {
            list::count(&ctx)?;
        }
        Commands::Search {
            author,
            message,
            since,
            until,
            files,
            limit,
        } => {
            let mut criteria = commitlog_core::SearchCriteria::new().limit(limit);
            criteria.author = author;
            criteria.message = message;
            criteria.since = since;
            criteria.until = until;
            criteria.file_pattern = files;
            search::run(&ctx, &criteria)?;
        }
    }

    Ok(())
}
