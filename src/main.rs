use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use thread_curation_grader::config::{Config, LogFormat};
use thread_curation_grader::curation::{http_client, AuthorTally, Curator};
use thread_curation_grader::report;
use thread_curation_grader::submission::{parse_submissions, Submission};
use thread_curation_grader::twitter::{distinct_handles, lookup_users, XClient};

#[derive(Parser)]
#[command(
    name = "thread-curation-grader",
    about = "Audit curated auction threads and archive the results"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process every submission in <DATA_DIR>/entries/<NAME>.csv
    Batch {
        /// Entry file name without extension; a trailing `!` disables caching
        name: String,
        /// Ignore and overwrite cached responses
        #[arg(long)]
        no_cache: bool,
    },
    /// Audit explicit thread URLs without caching or writing run outputs
    Force {
        /// Thread URLs, space or comma separated
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Refresh profiles for a list of handles
    Users {
        /// One handle per line; defaults to <DATA_DIR>/handles.txt
        #[arg(long)]
        handles: Option<PathBuf>,
        /// Output file; defaults to <DATA_DIR>/users.json
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging is configured from the environment too; fall back to pretty
    // output so a configuration error is still reported
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty)?;
            return Err(e).context("Failed to load configuration");
        }
    };
    init_tracing(config.log_format)?;
    config.validate().context("Invalid configuration")?;

    info!(data_dir = %config.data_dir.display(), "Configuration loaded");

    match cli.command {
        Command::Batch { name, no_cache } => {
            let (name, forced_off) = match name.strip_suffix('!') {
                Some(stripped) => (stripped.to_string(), true),
                None => (name, false),
            };
            run_batch(&config, &name, !(no_cache || forced_off)).await
        }
        Command::Force { urls } => run_force(&config, &urls).await,
        Command::Users { handles, output } => {
            let handles = handles.unwrap_or_else(|| config.data_dir.join("handles.txt"));
            let output = output.unwrap_or_else(|| config.data_dir.join("users.json"));
            run_users(&config, &handles, &output).await
        }
    }
}

async fn run_batch(config: &Config, name: &str, use_cache: bool) -> Result<()> {
    let path = config.entries_dir().join(format!("{name}.csv"));
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read entries: {}", path.display()))?;

    let submissions = parse_submissions(&text);
    info!(
        path = %path.display(),
        submissions = submissions.len(),
        use_cache,
        "Starting batch"
    );

    let curator = Curator::from_config(config)?;
    let mut tally = AuthorTally::new();
    let mut rows = Vec::with_capacity(submissions.len());

    for submission in &submissions {
        rows.push(curator.process(submission, use_cache, &mut tally).await?);
    }

    let stamp = report::run_stamp(chrono::Local::now());
    report::write_run_outputs(&config.data_dir, &stamp, &rows, &tally).await?;

    info!(rows = rows.len(), "Batch complete");
    Ok(())
}

async fn run_force(config: &Config, args: &[String]) -> Result<()> {
    let urls: Vec<&str> = args
        .iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .collect();

    let submission = Submission::from_thread_urls(&urls)
        .context("No username and thread id could be extracted from the given URLs")?;

    let curator = Curator::from_config(config)?;
    let mut tally = AuthorTally::new();
    let row = curator.process(&submission, false, &mut tally).await?;

    info!(
        username = %submission.username,
        status = %row.status,
        eth_total = row.eth_total,
        tez_total = row.tez_total,
        errors = row.error_count,
        result = %row.archive_url,
        "Forced curation complete"
    );
    Ok(())
}

async fn run_users(config: &Config, handles_path: &Path, output: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(handles_path)
        .await
        .with_context(|| format!("Failed to read handles: {}", handles_path.display()))?;

    let handles = distinct_handles(text.lines());
    if handles.is_empty() {
        warn!(path = %handles_path.display(), "No handles to look up");
        return Ok(());
    }
    info!(handles = handles.len(), "Looking up users");

    let client = XClient::new(
        http_client(config)?,
        config.x_api_base_url.clone(),
        config.bearer_token.clone(),
    );
    let users = lookup_users(&client, &handles)
        .await
        .context("User lookup aborted")?;

    report::write_users(output, &users).await
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,thread_curation_grader=debug"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?,
    }

    Ok(())
}
