//! Turns a retrieved post into a resolved marketplace link.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::FileCache;
use crate::config::Config;
use crate::marketplace::{
    self, ErrorResult, FoundationResolver, NftData, ObjktResolver, ResolverRegistry,
};
use crate::twitter::Post;

/// One post's embedded link and what it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLink {
    /// First account mentioned in the post, usually the artist. Empty if none.
    pub username: String,
    pub text: String,
    pub nft_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub nft_data: NftData,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("post {index} has no embedded link ({text})")]
    NoLink { index: usize, text: String },
}

/// Extracts the first link of a post and resolves it against its marketplace.
#[derive(Debug)]
pub struct PostParser {
    registry: ResolverRegistry,
    cache: FileCache,
}

impl PostParser {
    #[must_use]
    pub fn new(registry: ResolverRegistry, cache: FileCache) -> Self {
        Self { registry, cache }
    }

    /// Parser with the objkt and Foundation resolvers registered.
    #[must_use]
    pub fn from_config(config: &Config, http: &reqwest::Client, cache: FileCache) -> Self {
        let mut registry = ResolverRegistry::new();
        registry.register(Box::new(ObjktResolver::new(
            http.clone(),
            config.objkt_graphql_url.clone(),
            config.ipfs_gateway_url.clone(),
        )));
        registry.register(Box::new(FoundationResolver::new(http.clone())));
        Self::new(registry, cache)
    }

    /// Parse `post` (the `index`-th of its thread).
    ///
    /// Only the first embedded link is considered. Resolution failures and
    /// unknown marketplaces are returned inside [`ParsedLink::nft_data`];
    /// resolution failures carry the post text after the link.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoLink`] if the post embeds no link.
    pub async fn parse(
        &self,
        post: &Post,
        index: usize,
        use_cache: bool,
    ) -> Result<ParsedLink, ParseError> {
        let link = post.first_url();
        let Some(target) = link.and_then(|l| l.target()) else {
            return Err(ParseError::NoLink {
                index,
                text: post.text.clone(),
            });
        };

        let (nft_url, nft_data) = match self.registry.find_resolver(target) {
            Some(resolver) => {
                let canonical = resolver.canonicalize(target);
                info!(index, marketplace = %resolver.marketplace(), url = %canonical, "Resolving link");
                let data = match marketplace::resolve(resolver, &self.cache, &canonical, use_cache)
                    .await
                {
                    NftData::Failed(e) => NftData::Failed(ErrorResult::new(format!(
                        "{} ({})",
                        e.error, post.text
                    ))),
                    resolved @ NftData::Resolved(_) => resolved,
                };
                (canonical, data)
            }
            None => {
                debug!(index, url = %target, "Marketplace not processed");
                (
                    target.to_string(),
                    NftData::Failed(ErrorResult::new(format!(
                        "Marketplace not processed {target}"
                    ))),
                )
            }
        };

        Ok(ParsedLink {
            username: post.first_mention().unwrap_or_default().to_string(),
            text: post.text.clone(),
            nft_url,
            title: link.and_then(|l| l.title.clone()),
            nft_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::{Entities, Mention, UrlEntity};
    use tempfile::TempDir;

    fn post(url: Option<&str>) -> Post {
        Post {
            id: "1".to_string(),
            text: "New drop by @artist".to_string(),
            entities: Some(Entities {
                urls: url
                    .map(|u| {
                        vec![UrlEntity {
                            url: "https://t.co/x".to_string(),
                            expanded_url: Some(u.to_string()),
                            title: Some("Title".to_string()),
                            ..UrlEntity::default()
                        }]
                    })
                    .unwrap_or_default(),
                mentions: vec![Mention {
                    username: "artist".to_string(),
                    id: None,
                }],
            }),
            ..Post::default()
        }
    }

    fn parser(dir: &TempDir) -> PostParser {
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::for_testing()
        };
        PostParser::from_config(
            &config,
            &reqwest::Client::new(),
            FileCache::new(dir.path()),
        )
    }

    #[tokio::test]
    async fn test_post_without_link_is_a_parse_failure() {
        let dir = TempDir::new().unwrap();
        let err = parser(&dir).parse(&post(None), 3, true).await.unwrap_err();
        let ParseError::NoLink { index, text } = err;
        assert_eq!(index, 3);
        assert_eq!(text, "New drop by @artist");

        let bare = Post {
            text: "gm".to_string(),
            ..Post::default()
        };
        assert!(parser(&dir).parse(&bare, 0, true).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_marketplace_needs_no_network() {
        let dir = TempDir::new().unwrap();
        let parsed = parser(&dir)
            .parse(&post(Some("https://opensea.io/assets/1")), 0, true)
            .await
            .unwrap();

        assert_eq!(parsed.username, "artist");
        assert_eq!(parsed.nft_url, "https://opensea.io/assets/1");
        assert_eq!(parsed.title.as_deref(), Some("Title"));
        assert_eq!(
            parsed.nft_data.error(),
            Some("Marketplace not processed https://opensea.io/assets/1")
        );
    }

    #[tokio::test]
    async fn test_resolver_failure_is_data() {
        // Nothing listens on the test GraphQL port, so the request fails
        let dir = TempDir::new().unwrap();
        let parsed = parser(&dir)
            .parse(
                &post(Some("https://objkt.com/tokens/KT1abc/5/owners")),
                0,
                false,
            )
            .await
            .unwrap();

        assert_eq!(parsed.nft_url, "https://objkt.com/tokens/KT1abc/5");
        let error = parsed.nft_data.error().unwrap();
        assert!(error.starts_with("request failed"));
        assert!(error.ends_with(": https://objkt.com/tokens/KT1abc/5 (New drop by @artist)"));
    }

    #[test]
    fn test_serialized_shape() {
        let parsed = ParsedLink {
            username: "artist".to_string(),
            text: "t".to_string(),
            nft_url: "https://objkt.com/tokens/KT1abc/5".to_string(),
            title: None,
            nft_data: NftData::Failed(ErrorResult::new("boom")),
        };
        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["nftUrl"], "https://objkt.com/tokens/KT1abc/5");
        assert_eq!(value["nftData"]["error"], "boom");
        assert!(value.get("title").is_none());
    }
}
