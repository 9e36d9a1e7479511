//! Marketplace resolvers: turn a listing URL into a normalized price and thumbnail.

mod foundation;
mod objkt;
mod registry;
mod traits;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use foundation::FoundationResolver;
pub use objkt::{token_from_url, ObjktResolver};
pub use registry::ResolverRegistry;
pub use traits::MarketplaceResolver;

use crate::cache::FileCache;

/// Supported marketplace families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    /// Tezos token marketplace, priced in XTZ.
    Objkt,
    /// Curated drops, priced in ETH.
    Foundation,
}

impl Marketplace {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Objkt => "objkt",
            Self::Foundation => "foundation",
        }
    }
}

impl std::fmt::Display for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A listing resolved against its marketplace of origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedListing {
    pub marketplace: Marketplace,
    pub price: f64,
    #[serde(rename = "thumbUrl")]
    pub thumbnail_url: String,
}

/// A failed resolution or parse, kept as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
}

impl ErrorResult {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Outcome of resolving one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NftData {
    Resolved(ResolvedListing),
    Failed(ErrorResult),
}

impl NftData {
    #[must_use]
    pub fn listing(&self) -> Option<&ResolvedListing> {
        match self {
            Self::Resolved(listing) => Some(listing),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Resolved(_) => None,
            Self::Failed(e) => Some(&e.error),
        }
    }
}

/// Why a marketplace lookup failed.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot derive contract and token from URL")]
    InvalidUrl,
    #[error("token not found")]
    TokenNotFound,
    #[error("no active listings")]
    NoActiveListings,
    #[error("embedded page data not found")]
    MarkerNotFound,
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Resolve `url` through `resolver`, honouring the file cache.
///
/// A cache hit returns without network access when `use_cache` is set.
/// Successful lookups are always written back; failures never are, so a
/// later run retries them.
pub async fn resolve(
    resolver: &dyn MarketplaceResolver,
    cache: &FileCache,
    url: &str,
    use_cache: bool,
) -> NftData {
    let marketplace = resolver.marketplace();

    if use_cache {
        if let Some(listing) = cache.read_listing(marketplace, url).await {
            debug!(%marketplace, url = %url, price = listing.price, "Using cached listing");
            return NftData::Resolved(listing);
        }
    }

    match resolver.fetch(url).await {
        Ok(listing) => {
            debug!(%marketplace, url = %url, price = listing.price, "Resolved listing");
            if let Err(e) = cache.write_listing(marketplace, url, &listing).await {
                warn!(url = %url, "Failed to cache listing: {e:#}");
            }
            NftData::Resolved(listing)
        }
        Err(e) => {
            warn!(%marketplace, url = %url, error = %e, "Failed to resolve listing");
            NftData::Failed(ErrorResult::new(format!("{e}: {url}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nft_data_serializes_untagged() {
        let ok = NftData::Resolved(ResolvedListing {
            marketplace: Marketplace::Foundation,
            price: 0.25,
            thumbnail_url: "https://f8n.example/a.png".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"marketplace": "foundation", "price": 0.25, "thumbUrl": "https://f8n.example/a.png"})
        );

        let failed = NftData::Failed(ErrorResult::new("no active listings: https://objkt.com/x/1"));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({"error": "no active listings: https://objkt.com/x/1"})
        );
    }

    #[test]
    fn test_nft_data_deserializes_both_shapes() {
        let ok: NftData =
            serde_json::from_str(r#"{"marketplace":"objkt","price":3.0,"thumbUrl":"t"}"#).unwrap();
        assert_eq!(ok.listing().map(|l| l.price), Some(3.0));
        assert!(ok.error().is_none());

        let failed: NftData = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(failed.error(), Some("boom"));
        assert!(failed.listing().is_none());
    }
}
