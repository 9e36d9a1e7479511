use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{info, warn};

use super::{ThreadError, UserProfile, XClient};
use crate::constants::USER_LOOKUP_BATCH_SIZE;

const LOOKUP_PATH: &str = "/2/users/by";
const USER_FIELDS: &str = "name,username,location,pinned_tweet_id,profile_image_url,public_metrics,url";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    data: Option<Vec<UserProfile>>,
}

/// Reduce a handle list to a sorted set.
///
/// Handles are compared case-insensitively and a leading `@` is ignored;
/// the first spelling seen is kept. Blank lines and `#` comments are skipped.
#[must_use]
pub fn distinct_handles<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut set = BTreeMap::new();
    for line in lines {
        let handle = line.trim().trim_start_matches('@');
        if handle.is_empty() || handle.starts_with('#') {
            continue;
        }
        set.entry(handle.to_lowercase())
            .or_insert_with(|| handle.to_string());
    }
    set.into_values().collect()
}

/// Look up profiles for `handles` in bounded batches.
///
/// Batches whose response carries no `data` are logged and skipped.
///
/// # Errors
///
/// Returns [`ThreadError::QuotaExhausted`] when the quota runs out, and
/// request or decoding errors otherwise.
pub async fn lookup_users(
    client: &XClient,
    handles: &[String],
) -> Result<Vec<UserProfile>, ThreadError> {
    let mut profiles = Vec::with_capacity(handles.len());

    for (batch_no, batch) in handles.chunks(USER_LOOKUP_BATCH_SIZE).enumerate() {
        let usernames = batch.join(",");
        let body = client
            .get_json(
                LOOKUP_PATH,
                &[("usernames", usernames.as_str()), ("user.fields", USER_FIELDS)],
            )
            .await?;

        let response: LookupResponse = serde_json::from_value(body.clone())?;
        match response.data {
            Some(data) => {
                info!(batch = batch_no, requested = batch.len(), found = data.len(), "Looked up users");
                profiles.extend(data);
            }
            None => warn!(batch = batch_no, body = %body, "User lookup returned no data"),
        }
    }

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_handles() {
        let handles = distinct_handles([
            "zaryart",
            "TheKairePius",
            "",
            "  @Artago_ ",
            "artago_",
            "TheKairePius",
            "# seeds from the second round",
            "0xjpegz_eth",
        ]);
        assert_eq!(handles, vec!["0xjpegz_eth", "Artago_", "TheKairePius", "zaryart"]);
    }

    #[test]
    fn test_lookup_response_decodes() {
        let body = serde_json::json!({
            "data": [{
                "id": "1",
                "name": "Zary",
                "username": "zaryart",
                "public_metrics": {"followers_count": 10, "following_count": 2, "tweet_count": 30, "listed_count": 0}
            }]
        });
        let response: LookupResponse = serde_json::from_value(body).unwrap();
        let data = response.data.unwrap();
        assert_eq!(data[0].username, "zaryart");
        assert_eq!(data[0].public_metrics.as_ref().unwrap().followers_count, 10);

        let empty: LookupResponse =
            serde_json::from_value(serde_json::json!({"errors": []})).unwrap();
        assert!(empty.data.is_none());
    }
}
