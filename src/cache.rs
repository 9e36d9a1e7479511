//! On-disk JSON cache for resolved listings and raw thread responses.
//!
//! Layout under the data directory:
//!
//! - `objkt/<cyrb53>.json`, `foundation/<cyrb53>.json`: one resolved listing per URL
//! - `posts/<conversation id>.json`: raw thread search response

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::hash::url_cache_key;
use crate::marketplace::{Marketplace, ResolvedListing};
use crate::twitter::ThreadResponse;

const POSTS_DIR: &str = "posts";

/// File-backed cache rooted at the data directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the cache file for a listing URL.
    #[must_use]
    pub fn listing_path(&self, marketplace: Marketplace, url: &str) -> PathBuf {
        self.root
            .join(marketplace.as_str())
            .join(format!("{}.json", url_cache_key(url)))
    }

    /// Path of the cache file for a conversation.
    #[must_use]
    pub fn thread_path(&self, thread_id: &str) -> PathBuf {
        self.root.join(POSTS_DIR).join(format!("{thread_id}.json"))
    }

    /// Read a cached listing, if one exists and decodes.
    pub async fn read_listing(&self, marketplace: Marketplace, url: &str) -> Option<ResolvedListing> {
        read_json(&self.listing_path(marketplace, url)).await
    }

    /// Persist a successfully resolved listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_listing(
        &self,
        marketplace: Marketplace,
        url: &str,
        listing: &ResolvedListing,
    ) -> Result<()> {
        write_json(&self.listing_path(marketplace, url), listing).await
    }

    /// Read a cached thread response, if one exists and decodes.
    pub async fn read_thread(&self, thread_id: &str) -> Option<ThreadResponse> {
        read_json(&self.thread_path(thread_id)).await
    }

    /// Persist a raw thread response.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_thread(&self, thread_id: &str, body: &serde_json::Value) -> Result<()> {
        write_json(&self.thread_path(thread_id), body).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read cache file");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => {
            debug!(path = %path.display(), "Cache hit");
            Some(value)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring undecodable cache file");
            None
        }
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
    }

    let body = serde_json::to_vec_pretty(value).context("Failed to serialize cache entry")?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("Failed to write cache file: {}", path.display()))?;

    debug!(path = %path.display(), "Cache entry written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing() -> ResolvedListing {
        ResolvedListing {
            marketplace: Marketplace::Objkt,
            price: 12.5,
            thumbnail_url: "https://nftstorage.link/ipfs/QmThumb".to_string(),
        }
    }

    #[test]
    fn test_paths() {
        let cache = FileCache::new("/data");
        assert_eq!(
            cache.listing_path(Marketplace::Objkt, "https://objkt.com/tokens/KT1abc/5"),
            PathBuf::from("/data/objkt/3178215377189840.json")
        );
        assert_eq!(
            cache.thread_path("1751705669785317413"),
            PathBuf::from("/data/posts/1751705669785317413.json")
        );
    }

    #[tokio::test]
    async fn test_listing_roundtrip_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path());

        assert!(cache
            .read_listing(Marketplace::Objkt, "https://objkt.com/tokens/KT1abc/5")
            .await
            .is_none());

        cache
            .write_listing(Marketplace::Objkt, "https://objkt.com/tokens/KT1abc/5", &listing())
            .await
            .unwrap();

        let cached = cache
            .read_listing(Marketplace::Objkt, "https://OBJKT.com/tokens/kt1ABC/5")
            .await;
        assert_eq!(cached, Some(listing()));

        // Namespaces are separate
        assert!(cache
            .read_listing(Marketplace::Foundation, "https://objkt.com/tokens/KT1abc/5")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_listing_file_format() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path());
        let url = "https://objkt.com/tokens/KT1abc/5";

        cache
            .write_listing(Marketplace::Objkt, url, &listing())
            .await
            .unwrap();

        let raw = std::fs::read_to_string(cache.listing_path(Marketplace::Objkt, url)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["marketplace"], "objkt");
        assert_eq!(value["price"], 12.5);
        assert_eq!(value["thumbUrl"], "https://nftstorage.link/ipfs/QmThumb");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path());
        let path = cache.thread_path("42");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        assert!(cache.read_thread("42").await.is_none());
    }
}
