//! Curation records and the per-submission aggregation state.
//!
//! A [`Curation`] starts empty, collects parsed links one at a time and is
//! consumed by [`Curation::finalize`] into an immutable [`CurationRecord`].

mod curator;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

pub use curator::{http_client, Curator};

use crate::constants::{ETH_BAND, TEZ_BAND};
use crate::marketplace::{Marketplace, NftData};
use crate::parser::ParsedLink;
use crate::submission::Submission;

/// Final verdict for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurationStatus {
    Complete,
    Incomplete,
}

impl CurationStatus {
    /// Classify totals against the acceptance bands; both must hold.
    #[must_use]
    pub fn classify(eth_total: f64, tez_total: f64) -> Self {
        let within = |value: f64, (low, high): (f64, f64)| (low..=high).contains(&value);
        if within(eth_total, ETH_BAND) && within(tez_total, TEZ_BAND) {
            Self::Complete
        } else {
            Self::Incomplete
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "COMPLETE",
            Self::Incomplete => "INCOMPLETE",
        }
    }
}

impl std::fmt::Display for CurationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The archived result of auditing one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurationRecord {
    pub status: CurationStatus,
    pub eth_total: f64,
    pub tez_total: f64,
    pub errors: Vec<String>,
    pub items: Vec<ParsedLink>,
    pub post_ids: Vec<String>,
    pub username: String,
}

/// Durable one-line summary of a processed submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRow {
    pub row: usize,
    pub status: CurationStatus,
    pub eth_total: f64,
    pub tez_total: f64,
    pub error_count: usize,
    pub archive_url: String,
}

impl OutputRow {
    #[must_use]
    pub fn new(row: usize, record: &CurationRecord, archive_url: String) -> Self {
        Self {
            row,
            status: record.status,
            eth_total: record.eth_total,
            tez_total: record.tez_total,
            error_count: record.errors.len(),
            archive_url,
        }
    }
}

/// Posts seen per mentioned account across a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorTally {
    counts: BTreeMap<String, u32>,
}

impl AuthorTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, username: &str) {
        *self.counts.entry(username.to_string()).or_default() += 1;
    }

    #[must_use]
    pub fn get(&self, username: &str) -> u32 {
        self.counts.get(username).copied().unwrap_or_default()
    }

    /// Counts ordered by username.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// What [`Curation::record`] did with a parsed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Counted towards a currency total.
    Priced(Marketplace),
    /// Kept as an item, with its error appended.
    Failed,
    /// Link already seen in this submission.
    Duplicate,
}

/// Aggregation state for one submission.
#[derive(Debug)]
pub struct Curation {
    username: String,
    post_ids: Vec<String>,
    eth_total: f64,
    tez_total: f64,
    errors: Vec<String>,
    items: Vec<ParsedLink>,
    seen: HashSet<String>,
}

impl Curation {
    #[must_use]
    pub fn new(submission: &Submission) -> Self {
        Self {
            username: submission.username.clone(),
            post_ids: submission.thread_ids.clone(),
            eth_total: 0.0,
            tez_total: 0.0,
            errors: Vec::new(),
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Fold one parsed link into the totals.
    ///
    /// The first occurrence of an `nft_url` is kept; later ones are ignored.
    pub fn record(&mut self, parsed: ParsedLink) -> RecordOutcome {
        if !self.seen.insert(parsed.nft_url.clone()) {
            return RecordOutcome::Duplicate;
        }

        let outcome = match &parsed.nft_data {
            NftData::Resolved(listing) => {
                match listing.marketplace {
                    Marketplace::Objkt => self.tez_total += listing.price,
                    Marketplace::Foundation => self.eth_total += listing.price,
                }
                RecordOutcome::Priced(listing.marketplace)
            }
            NftData::Failed(e) => {
                self.errors.push(e.error.clone());
                RecordOutcome::Failed
            }
        };

        self.items.push(parsed);
        outcome
    }

    /// Record a failure that has no link attached (e.g. an unreachable thread).
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    #[must_use]
    pub fn eth_total(&self) -> f64 {
        self.eth_total
    }

    #[must_use]
    pub fn tez_total(&self) -> f64 {
        self.tez_total
    }

    /// Decide the status and freeze the record.
    #[must_use]
    pub fn finalize(self) -> CurationRecord {
        CurationRecord {
            status: CurationStatus::classify(self.eth_total, self.tez_total),
            eth_total: self.eth_total,
            tez_total: self.tez_total,
            errors: self.errors,
            items: self.items,
            post_ids: self.post_ids,
            username: self.username,
        }
    }
}
