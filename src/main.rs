//! Commit Chrono - finds commits dated before their own ancestors
//!
//! Walks the full history of a repository and reports every commit whose
//! timestamp is older than the newest of its parents, together with the
//! timestamp that restores the order (one second after that parent).
//!
//! # Usage
//! ```bash
//! commit-chrono /path/to/repository                  # Short report, author time
//! commit-chrono --repo . --type committer            # Check committer time
//! commit-chrono . --output long                      # Identities and causing parents
//! commit-chrono . --output errors --json             # Unreadable commits as JSON
//! ```

mod error;
mod git;
mod models;
mod report;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use error::{AppError, Result};
use git::{GitRepository, Resolver};
use models::TimeSource;
use report::{OutputMode, ReportOptions};

/// Detect commits whose timestamp predates their ancestry
#[derive(Parser, Debug)]
#[command(name = "commit-chrono", version)]
#[command(
    about = "Find commits dated before their parents and compute corrected times",
    long_about = None
)]
struct Cli {
    /// Path to the git repository to check
    #[arg(value_name = "REPO_PATH")]
    repo_path: Option<String>,

    /// Path to the git repository (alternative to the positional argument)
    #[arg(long = "repo", value_name = "PATH", conflicts_with = "repo_path")]
    repo: Option<String>,

    /// Timestamp to check: "author" or "committer"
    #[arg(short = 't', long = "type", default_value = "author")]
    time_type: String,

    /// Report to print: "short", "long" or "errors"
    #[arg(short, long, default_value = "short")]
    output: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn run(cli: Cli) -> Result<()> {
    // Configuration is checked before the repository is touched.
    let time_source: TimeSource = cli.time_type.parse()?;
    let mode: OutputMode = cli.output.parse()?;
    let repo_path = cli
        .repo
        .or(cli.repo_path)
        .ok_or_else(|| AppError::Config("a repository path is required".to_string()))?;

    let repo = GitRepository::open(&repo_path)?;
    tracing::info!("Checking {} using {:?} time", repo.path, time_source);

    let resolution = Resolver::run(&repo, time_source)?;

    let options = ReportOptions {
        mode,
        time_source,
        json: cli.json,
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report::render(&mut out, &options, &resolution, &repo)
        .map_err(|e| AppError::Internal(format!("Failed to write report: {:#}", e)))?;
    out.flush()
        .map_err(|e| AppError::Internal(format!("Failed to write report: {}", e)))?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if matches!(e, AppError::Config(_)) {
                eprintln!(
                    "Usage: commit-chrono <REPO_PATH> [--type <author|committer>] \
                     [--output <short|long|errors>] [--json]"
                );
            }
            ExitCode::from(e.exit_code())
        }
    }
}
