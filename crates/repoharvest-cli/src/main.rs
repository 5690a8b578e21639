#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! repoharvest - harvest GitHub repository, user and organization metadata to CSV
//!
//! # Examples
//!
//! ```bash
//! # Two tokens, read from the environment or a .env file
//! export GITHUB_TOKEN_1=ghp_...
//! export GITHUB_TOKEN_2=ghp_...
//!
//! # One query, default 10 pages
//! repoharvest --query "language:rust stars:>1000"
//!
//! # Queries from a file, written to ./out
//! repoharvest --queries-file queries.txt --output-dir out
//!
//! # Debug logging
//! repoharvest -v --query "topic:cli"
//! ```

mod config;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use repoharvest_core::{
    CredentialProvider, DEFAULT_CONCURRENCY, DEFAULT_MAX_PAGES, DEFAULT_SPLIT_THRESHOLD,
    HarvestError, Harvester, ORGANIZATIONS_FILE, REPOSITORIES_FILE, USERS_FILE,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// ============================================================================
// CLI Definition
// ============================================================================

/// Harvest GitHub repository, user and organization metadata.
#[derive(Parser)]
#[command(name = "repoharvest")]
#[command(version)]
#[command(about = "Harvest GitHub repository, user and organization metadata to CSV")]
#[command(after_long_help = r#"ENVIRONMENT VARIABLES
    GITHUB_TOKEN_1        Token used for search and the first share of detail lookups
    GITHUB_TOKEN_2        Token used for the remaining detail lookups
    REPOHARVEST_*         Fallback for most flags, e.g. REPOHARVEST_PAGES=5
    RUST_LOG              Overrides the log filter

A .env file in the current directory is loaded first."#)]
pub struct Cli {
    /// Search query; repeat for several, run in order.
    #[arg(long, short = 'Q')]
    pub query: Vec<String>,

    /// File with one search query per line (`#` starts a comment).
    #[arg(long, env = "REPOHARVEST_QUERIES_FILE")]
    pub queries_file: Option<PathBuf>,

    /// Pages requested per query.
    #[arg(long, env = "REPOHARVEST_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub pages: u32,

    /// Maximum concurrent detail lookups.
    #[arg(long, short = 'c', env = "REPOHARVEST_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Directory the CSV files are written to.
    #[arg(long, short = 'o', env = "REPOHARVEST_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Repositories output file name.
    #[arg(long, default_value = REPOSITORIES_FILE)]
    pub repos_out: String,

    /// Users output file name.
    #[arg(long, default_value = USERS_FILE)]
    pub users_out: String,

    /// Organizations output file name.
    #[arg(long, default_value = ORGANIZATIONS_FILE)]
    pub orgs_out: String,

    /// API base URL.
    #[arg(long, env = "REPOHARVEST_BASE_URL", default_value = repoharvest_core::url::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "REPOHARVEST_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Retries for timeouts, connection errors and 5xx responses.
    #[arg(long, env = "REPOHARVEST_MAX_RETRIES", default_value_t = 0)]
    pub max_retries: u32,

    /// Detail lookups handled by the first token before the second takes over.
    #[arg(long, env = "REPOHARVEST_SPLIT_THRESHOLD", default_value_t = DEFAULT_SPLIT_THRESHOLD)]
    pub split_threshold: usize,

    /// Alternate tokens per lookup instead of splitting at a threshold
    /// (overrides --split-threshold).
    #[arg(long)]
    pub round_robin: bool,

    /// End a query at its first empty page.
    #[arg(long, env = "REPOHARVEST_STOP_ON_EMPTY_PAGE")]
    pub stop_on_empty_page: bool,

    /// Verbose output (debug logging).
    #[arg(long, short, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(long, short)]
    pub quiet: bool,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// A token is missing.
    MissingCredential = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "repoharvest=debug,repoharvest_core=debug,info"
    } else if quiet {
        "error"
    } else {
        "repoharvest=info,repoharvest_core=info,warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let code = match run(&cli, &CredentialProvider::from_env()).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            error!("{e:#}");
            exit_code(&e)
        }
    };

    process::exit(code as i32);
}

fn exit_code(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<HarvestError>() {
        Some(HarvestError::MissingCredential(_)) => ExitCode::MissingCredential,
        _ => ExitCode::Error,
    }
}

async fn run<F>(cli: &Cli, credentials: &CredentialProvider<F>) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    // Credentials first: nothing is fetched without both tokens
    let (primary, secondary) = credentials.get_credentials()?;

    let config = cli.harvest_config()?;
    let harvester = Harvester::with_config(cli.client_config())?;

    let summary = harvester.run(&config, primary, secondary).await?;

    info!(
        repositories = summary.repositories,
        users = summary.users.succeeded,
        users_failed = summary.users.failed,
        organizations = summary.organizations.succeeded,
        organizations_failed = summary.organizations.failed,
        files = summary.files_written.len(),
        "Harvest complete"
    );

    Ok(())
}
