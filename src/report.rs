//! Run artifacts written after a successful batch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::info;

use crate::curation::{AuthorTally, OutputRow};
use crate::twitter::UserProfile;

/// Paths of the artifacts written by [`write_run_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutputs {
    pub rows_json: PathBuf,
    pub totals_csv: PathBuf,
    pub artists_csv: PathBuf,
}

/// Minute-resolution stamp used in artifact names, e.g. `202401291405`.
#[must_use]
pub fn run_stamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d%H%M").to_string()
}

/// `ethTotal,tezTotal,archiveUrl` per row, CRLF-terminated.
#[must_use]
pub fn totals_csv(rows: &[OutputRow]) -> String {
    let mut out = String::new();
    for r in rows {
        out.push_str(&format!("{},{},{}\r\n", r.eth_total, r.tez_total, r.archive_url));
    }
    out
}

/// `username,count` per mentioned account, CRLF-terminated.
#[must_use]
pub fn artists_csv(tally: &AuthorTally) -> String {
    let mut out = String::new();
    for (name, count) in tally.iter() {
        out.push_str(&format!("{name},{count}\r\n"));
    }
    out
}

/// Write the output rows and tallies of a finished run into `dir`.
///
/// # Errors
///
/// Returns an error if any artifact cannot be written.
pub async fn write_run_outputs(
    dir: &Path,
    stamp: &str,
    rows: &[OutputRow],
    tally: &AuthorTally,
) -> Result<RunOutputs> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let outputs = RunOutputs {
        rows_json: dir.join(format!("output-{stamp}.json")),
        totals_csv: dir.join(format!("output-{stamp}.csv")),
        artists_csv: dir.join(format!("artists-{stamp}.csv")),
    };

    let json = serde_json::to_string_pretty(rows).context("Failed to serialize output rows")?;
    write(&outputs.rows_json, json).await?;
    write(&outputs.totals_csv, totals_csv(rows)).await?;
    write(&outputs.artists_csv, artists_csv(tally)).await?;

    info!(
        rows = rows.len(),
        json = %outputs.rows_json.display(),
        "Run outputs written"
    );
    Ok(outputs)
}

/// Write looked-up profiles as a pretty JSON array.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn write_users(path: &Path, users: &[UserProfile]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(users).context("Failed to serialize users")?;
    write(path, json).await?;
    info!(users = users.len(), path = %path.display(), "User profiles written");
    Ok(())
}

async fn write(path: &Path, contents: String) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
