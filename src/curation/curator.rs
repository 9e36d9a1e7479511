use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::{AuthorTally, Curation, CurationRecord, OutputRow, RecordOutcome};
use crate::cache::FileCache;
use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::ipfs::{ArchivalSink, IpfsClient};
use crate::parser::PostParser;
use crate::submission::Submission;
use crate::twitter::{ThreadError, ThreadRetriever, XClient};

/// Drives submissions through retrieval, parsing, aggregation and archival.
pub struct Curator {
    threads: ThreadRetriever,
    parser: PostParser,
    sink: Box<dyn ArchivalSink>,
    post_delay: Duration,
}

impl Curator {
    #[must_use]
    pub fn new(
        threads: ThreadRetriever,
        parser: PostParser,
        sink: Box<dyn ArchivalSink>,
        post_delay: Duration,
    ) -> Self {
        Self {
            threads,
            parser,
            sink,
            post_delay,
        }
    }

    /// Wire up the production collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = http_client(config)?;
        let cache = FileCache::new(&config.data_dir);
        let x_client = XClient::new(
            http.clone(),
            config.x_api_base_url.clone(),
            config.bearer_token.clone(),
        );

        Ok(Self::new(
            ThreadRetriever::new(x_client, cache.clone()),
            PostParser::from_config(config, &http, cache),
            Box::new(IpfsClient::new(config, http)),
            config.post_delay,
        ))
    }

    /// Audit one submission and build its record, without archiving it.
    ///
    /// Threads are fetched in order and their posts parsed in order. Failed
    /// thread fetches are recorded as errors; only quota exhaustion stops.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::QuotaExhausted`] as soon as the API reports it.
    pub async fn curate(
        &self,
        submission: &Submission,
        use_cache: bool,
        tally: &mut AuthorTally,
    ) -> Result<CurationRecord, ThreadError> {
        let mut curation = Curation::new(submission);
        info!(
            row = submission.row,
            username = %submission.username,
            threads = submission.thread_ids.len(),
            "Curating submission"
        );

        for thread_id in &submission.thread_ids {
            let thread = match self
                .threads
                .fetch_thread(thread_id, &submission.username, use_cache)
                .await
            {
                Ok(thread) => thread,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(thread_id = %thread_id, error = %e, "Failed to fetch thread");
                    curation.record_error(format!("thread {thread_id}: {e}"));
                    continue;
                }
            };
            debug!(thread_id = %thread_id, posts = thread.data.len(), "Fetched thread");

            for (index, post) in thread.data.iter().enumerate() {
                match self.parser.parse(post, index, use_cache).await {
                    Ok(parsed) => {
                        tally.increment(&parsed.username);
                        let url = parsed.nft_url.clone();
                        if curation.record(parsed) == RecordOutcome::Duplicate {
                            debug!(url = %url, "Skipping duplicate link");
                        }
                    }
                    Err(e) => debug!(thread_id = %thread_id, "{e}"),
                }
                tokio::time::sleep(self.post_delay).await;
            }
        }

        let record = curation.finalize();
        info!(
            username = %record.username,
            status = %record.status,
            eth_total = record.eth_total,
            tez_total = record.tez_total,
            errors = record.errors.len(),
            items = record.items.len(),
            "Curation finalized"
        );
        Ok(record)
    }

    /// Store a finalized record and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or stored.
    pub async fn archive(&self, record: &CurationRecord, row: usize) -> Result<String> {
        let body = serde_json::to_vec_pretty(record).context("Failed to serialize curation")?;
        let filename = format!("curation-{}-{row}.json", record.username);
        let cid = self
            .sink
            .store(body, &filename)
            .await
            .with_context(|| format!("Failed to archive curation for {}", record.username))?;
        Ok(self.sink.public_url(&cid))
    }

    /// Curate, archive and summarize one submission.
    ///
    /// # Errors
    ///
    /// Returns an error on quota exhaustion or if archival fails; both end the run.
    pub async fn process(
        &self,
        submission: &Submission,
        use_cache: bool,
        tally: &mut AuthorTally,
    ) -> Result<OutputRow> {
        let record = self
            .curate(submission, use_cache, tally)
            .await
            .with_context(|| format!("Curation of row {} aborted", submission.row))?;
        let archive_url = self.archive(&record, submission.row).await?;

        let row = OutputRow::new(submission.row, &record, archive_url);
        info!(
            row = row.row,
            status = %row.status,
            eth_total = row.eth_total,
            tez_total = row.tez_total,
            errors = row.error_count,
            result = %row.archive_url,
            "Submission processed"
        );
        Ok(row)
    }
}

impl std::fmt::Debug for Curator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Curator")
            .field("threads", &self.threads)
            .field("parser", &self.parser)
            .field("post_delay", &self.post_delay)
            .finish_non_exhaustive()
    }
}

/// Shared HTTP client for every outbound request.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}
