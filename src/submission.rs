//! Submission rows: who submitted which threads.
//!
//! Input is the raw CSV export of the submission form. Data rows start with
//! the form's timestamp (a year beginning with `1` or `2`); column 2 holds the
//! first thread URL and column 3 an optional second one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static STATUS_ID_PATTERN: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"/status(?:es)?/(\d+)").unwrap());

const FIRST_THREAD_COLUMN: usize = 2;
const SECOND_THREAD_COLUMN: usize = 3;

/// One curator's submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// 1-based line number in the input file, counting dropped and header
    /// lines (0 for forced runs).
    pub row: usize,
    pub username: String,
    pub thread_ids: Vec<String>,
    pub source_url: String,
}

impl Submission {
    /// Build a submission from explicit thread URLs.
    ///
    /// The username comes from the last URL that names one. Returns `None`
    /// if no URL yields a username or a thread id.
    #[must_use]
    pub fn from_thread_urls<S: AsRef<str>>(urls: &[S]) -> Option<Self> {
        let mut username = String::new();
        let mut thread_ids = Vec::new();

        for url in urls {
            let url = url.as_ref().trim();
            let name = extract_username(url);
            if !name.is_empty() {
                username = name;
            }
            if let Some(id) = extract_conversation_id(url) {
                thread_ids.push(id);
            }
        }

        if username.is_empty() || thread_ids.is_empty() {
            return None;
        }

        Some(Self {
            row: 0,
            username,
            thread_ids,
            source_url: urls.first()?.as_ref().trim().to_string(),
        })
    }
}

/// Account name from a post URL such as `https://x.com/<name>/status/<id>`.
#[must_use]
pub fn extract_username(url: &str) -> String {
    url.split('/')
        .nth(3)
        .map(|segment| segment.replace('@', "").trim().to_string())
        .unwrap_or_default()
}

/// Conversation id from a post URL, if it is numeric.
///
/// Prefers the `/status/<id>` segment; otherwise uses the last path segment
/// with any query string removed.
#[must_use]
pub fn extract_conversation_id(url: &str) -> Option<String> {
    if let Some(caps) = STATUS_ID_PATTERN.captures(url) {
        return Some(caps[1].to_string());
    }

    let last = url.trim_end_matches('/').rsplit('/').next()?;
    let id = last.split('?').next().unwrap_or(last);
    (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then(|| id.to_string())
}

/// Parse the submission CSV export.
///
/// Rows without a username or without any valid thread id are dropped.
#[must_use]
pub fn parse_submissions(text: &str) -> Vec<Submission> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| line.starts_with(['1', '2']))
        .filter_map(|(i, line)| {
            let row = i + 1;
            let cols: Vec<&str> = line.split(',').map(clean_cell).collect();
            let first = cols.get(FIRST_THREAD_COLUMN).copied().unwrap_or_default();
            let second = cols.get(SECOND_THREAD_COLUMN).copied().unwrap_or_default();

            let username = extract_username(first);
            let thread_ids: Vec<String> = [first, second]
                .into_iter()
                .filter_map(extract_conversation_id)
                .collect();

            if username.is_empty() || thread_ids.is_empty() {
                debug!(row, "Dropping submission row without username or thread id");
                return None;
            }

            Some(Submission {
                row,
                username,
                thread_ids,
                source_url: first.to_string(),
            })
        })
        .collect()
}

fn clean_cell(cell: &str) -> &str {
    cell.trim().trim_matches('"')
}
