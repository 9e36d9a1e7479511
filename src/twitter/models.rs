use serde::{Deserialize, Serialize};

/// A reply post returned by the conversation search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    pub author_id: Option<String>,
    pub conversation_id: Option<String>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub text: String,
    pub entities: Option<Entities>,
}

impl Post {
    /// First embedded link, if the post has any.
    #[must_use]
    pub fn first_url(&self) -> Option<&UrlEntity> {
        self.entities.as_ref()?.urls.first()
    }

    /// Username of the first mentioned account, if any.
    #[must_use]
    pub fn first_mention(&self) -> Option<&str> {
        self.entities
            .as_ref()?
            .mentions
            .first()
            .map(|m| m.username.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

/// A link embedded in a post, with the targets the platform resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlEntity {
    #[serde(default)]
    pub url: String,
    pub expanded_url: Option<String>,
    /// Final target after following redirects.
    pub unwound_url: Option<String>,
    pub display_url: Option<String>,
    pub title: Option<String>,
}

impl UrlEntity {
    /// The unwound target when present, otherwise the expanded one.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.unwound_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.expanded_url.as_deref().filter(|u| !u.is_empty()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mention {
    #[serde(default)]
    pub username: String,
    pub id: Option<String>,
}

/// Body of a conversation search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadResponse {
    #[serde(default)]
    pub data: Vec<Post>,
}

/// A profile returned by the user lookup endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_tweet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub tweet_count: u64,
    #[serde(default)]
    pub listed_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "data": [
            {
                "id": "1751717459281748028",
                "author_id": "99",
                "conversation_id": "1751705669785317413",
                "in_reply_to_user_id": "99",
                "text": "Piece by @artist https://t.co/abc",
                "entities": {
                    "mentions": [{"start": 9, "end": 16, "username": "artist", "id": "7"}],
                    "urls": [{
                        "start": 17, "end": 40,
                        "url": "https://t.co/abc",
                        "expanded_url": "https://objkt.com/tokens/KT1abc/5/listings",
                        "display_url": "objkt.com/tokens/KT1abc/…",
                        "unwound_url": "https://objkt.com/tokens/KT1abc/5",
                        "title": "Piece"
                    }]
                }
            },
            { "id": "2", "text": "no entities here" }
        ],
        "meta": {"result_count": 2}
    }"#;

    #[test]
    fn test_decode_thread_response() {
        let response: ThreadResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(response.data.len(), 2);

        let post = &response.data[0];
        assert_eq!(post.first_mention(), Some("artist"));
        let link = post.first_url().unwrap();
        assert_eq!(link.target(), Some("https://objkt.com/tokens/KT1abc/5"));
        assert_eq!(link.title.as_deref(), Some("Piece"));

        assert!(response.data[1].first_url().is_none());
        assert!(response.data[1].first_mention().is_none());
    }

    #[test]
    fn test_target_falls_back_to_expanded() {
        let link = UrlEntity {
            expanded_url: Some("https://foundation.app/@a/b/1".to_string()),
            ..UrlEntity::default()
        };
        assert_eq!(link.target(), Some("https://foundation.app/@a/b/1"));

        // An empty unwound target is treated as absent
        let link = UrlEntity {
            unwound_url: Some(String::new()),
            expanded_url: Some("https://objkt.com/tokens/KT1/1".to_string()),
            ..UrlEntity::default()
        };
        assert_eq!(link.target(), Some("https://objkt.com/tokens/KT1/1"));

        let link = UrlEntity {
            unwound_url: Some(String::new()),
            expanded_url: Some(String::new()),
            ..UrlEntity::default()
        };
        assert_eq!(link.target(), None);
        assert_eq!(UrlEntity::default().target(), None);
    }

    #[test]
    fn test_missing_data_is_empty() {
        let response: ThreadResponse =
            serde_json::from_str(r#"{"meta":{"result_count":0}}"#).unwrap();
        assert!(response.data.is_empty());
    }
}
