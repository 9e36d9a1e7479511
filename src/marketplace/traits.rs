use async_trait::async_trait;

use super::{Marketplace, ResolveError, ResolvedListing};

/// Trait for marketplace-specific listing resolvers.
#[async_trait]
pub trait MarketplaceResolver: Send + Sync {
    /// Marketplace family this resolver handles.
    fn marketplace(&self) -> Marketplace;

    /// Substrings that identify this marketplace in a link.
    fn markers(&self) -> &[&'static str];

    /// Check if this resolver can handle the given URL.
    fn can_resolve(&self, url: &str) -> bool {
        self.markers().iter().any(|m| url.contains(m))
    }

    /// Collapse URL variants onto the canonical item page.
    fn canonicalize(&self, url: &str) -> String {
        url.to_string()
    }

    /// Look the listing up on the marketplace, bypassing any cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the marketplace cannot be reached or its response
    /// lacks the expected price or thumbnail data.
    async fn fetch(&self, url: &str) -> Result<ResolvedListing, ResolveError>;
}
