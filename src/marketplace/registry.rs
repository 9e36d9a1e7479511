use super::traits::MarketplaceResolver;

/// Registry of marketplace resolvers, consulted in registration order.
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn MarketplaceResolver>>,
}

impl ResolverRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Register a resolver.
    pub fn register(&mut self, resolver: Box<dyn MarketplaceResolver>) {
        self.resolvers.push(resolver);
    }

    /// Find the first resolver whose markers occur in the URL.
    #[must_use]
    pub fn find_resolver(&self, url: &str) -> Option<&dyn MarketplaceResolver> {
        self.resolvers
            .iter()
            .find(|r| r.can_resolve(url))
            .map(AsRef::as_ref)
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.resolvers.iter().map(|r| r.marketplace()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{FoundationResolver, Marketplace, ObjktResolver};
    use super::*;

    fn registry() -> ResolverRegistry {
        let http = reqwest::Client::new();
        let mut registry = ResolverRegistry::new();
        registry.register(Box::new(ObjktResolver::new(
            http.clone(),
            "http://127.0.0.1:9/v3/graphql",
            "https://nftstorage.link/ipfs/",
        )));
        registry.register(Box::new(FoundationResolver::new(http)));
        registry
    }

    #[test]
    fn test_classification() {
        let registry = registry();

        let objkt = registry.find_resolver("https://objkt.com/tokens/KT1abc/5");
        assert_eq!(objkt.map(|r| r.marketplace()), Some(Marketplace::Objkt));

        let foundation = registry.find_resolver("https://foundation.app/@artist/piece/12");
        assert_eq!(
            foundation.map(|r| r.marketplace()),
            Some(Marketplace::Foundation)
        );

        assert!(registry
            .find_resolver("https://opensea.io/assets/ethereum/0xabc/1")
            .is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        // A link mentioning both markers goes to objkt, as it is registered first
        let registry = registry();
        let resolver = registry.find_resolver("https://objkt.com/tokens/foundation/1");
        assert_eq!(resolver.map(|r| r.marketplace()), Some(Marketplace::Objkt));
    }
}
