use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{ThreadError, ThreadResponse, XClient};
use crate::cache::FileCache;
use crate::constants::THREAD_MAX_RESULTS;

const SEARCH_PATH: &str = "/2/tweets/search/recent";
const TWEET_FIELDS: &str = "in_reply_to_user_id,author_id,created_at,conversation_id,entities";

/// Retrieves the self-reply posts of a conversation, cached per conversation id.
#[derive(Debug, Clone)]
pub struct ThreadRetriever {
    client: XClient,
    cache: FileCache,
}

impl ThreadRetriever {
    #[must_use]
    pub fn new(client: XClient, cache: FileCache) -> Self {
        Self { client, cache }
    }

    /// Fetch every post `username` wrote in reply to themselves in `thread_id`.
    ///
    /// With `use_cache`, a previously stored non-empty response is returned
    /// without touching the network. Every fresh response is stored, empty
    /// ones included.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::QuotaExhausted`] when the API reports no quota
    /// left, and request or decoding errors otherwise.
    pub async fn fetch_thread(
        &self,
        thread_id: &str,
        username: &str,
        use_cache: bool,
    ) -> Result<ThreadResponse, ThreadError> {
        if use_cache {
            if let Some(cached) = self.cache.read_thread(thread_id).await {
                if !cached.data.is_empty() {
                    debug!(thread_id = %thread_id, posts = cached.data.len(), "Using cached thread");
                    return Ok(cached);
                }
            }
        }

        info!(thread_id = %thread_id, username = %username, "Searching conversation");

        let query = format!("conversation_id:{thread_id} from:{username} to:{username}");
        let max_results = THREAD_MAX_RESULTS.to_string();
        let body = self
            .client
            .get_json(
                SEARCH_PATH,
                &[
                    ("max_results", max_results.as_str()),
                    ("query", query.as_str()),
                    ("tweet.fields", TWEET_FIELDS),
                ],
            )
            .await?;

        let body = if body.get("data").is_some_and(Value::is_array) {
            body
        } else {
            debug!(thread_id = %thread_id, "Conversation search returned no posts");
            json!({ "data": [] })
        };

        if let Err(e) = self.cache.write_thread(thread_id, &body).await {
            warn!(thread_id = %thread_id, "Failed to cache thread: {e:#}");
        }

        Ok(serde_json::from_value(body)?)
    }
}
