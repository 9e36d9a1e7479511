use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::traits::MarketplaceResolver;
use super::{Marketplace, ResolveError, ResolvedListing};
use crate::constants::MUTEZ_PER_TEZ;

const MARKERS: &[&str] = &["objkt"];

/// Path suffixes that point at sub-pages of the same token.
const VARIANT_SUFFIXES: &[&str] = &["/listings", "/owners"];

const TOKEN_QUERY: &str = r"query Token($contract: String!, $tokenId: String!) {
  fa(where: {contract: {_eq: $contract}}) {
    tokens(where: {token_id: {_eq: $tokenId}}) {
      supply
      listings_active {
        price_xtz
      }
      thumbnail_uri
    }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<TokenData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    #[serde(default)]
    fa: Vec<Collection>,
}

#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(default)]
    tokens: Vec<Token>,
}

#[derive(Debug, Deserialize)]
struct Token {
    #[serde(default)]
    listings_active: Vec<Listing>,
    thumbnail_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    price_xtz: u64,
}

/// Split an objkt token URL into `(contract, token_id)`.
///
/// Uses the last two `/` segments; anything from the first `?` in the final
/// segment is dropped.
#[must_use]
pub fn token_from_url(url: &str) -> Option<(&str, &str)> {
    let mut segments = url.rsplit('/');
    let last = segments.next()?;
    let contract = segments.next()?;
    let token = last.split('?').next().unwrap_or(last);

    if contract.is_empty() || token.is_empty() {
        return None;
    }
    Some((contract, token))
}

/// Resolver for objkt token pages backed by the objkt GraphQL API.
pub struct ObjktResolver {
    http: reqwest::Client,
    graphql_url: String,
    ipfs_gateway: String,
}

impl ObjktResolver {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        graphql_url: impl Into<String>,
        ipfs_gateway: impl Into<String>,
    ) -> Self {
        Self {
            http,
            graphql_url: graphql_url.into(),
            ipfs_gateway: ipfs_gateway.into(),
        }
    }

    fn gateway_url(&self, uri: &str) -> String {
        uri.replacen("ipfs://", &self.ipfs_gateway, 1)
    }
}

#[async_trait]
impl MarketplaceResolver for ObjktResolver {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Objkt
    }

    fn markers(&self) -> &[&'static str] {
        MARKERS
    }

    fn canonicalize(&self, url: &str) -> String {
        VARIANT_SUFFIXES
            .iter()
            .fold(url.to_string(), |acc, suffix| acc.replacen(suffix, "", 1))
    }

    async fn fetch(&self, url: &str) -> Result<ResolvedListing, ResolveError> {
        let (contract, token_id) = token_from_url(url).ok_or(ResolveError::InvalidUrl)?;
        debug!(url = %url, contract = %contract, token_id = %token_id, "Querying objkt");

        let response = self
            .http
            .post(&self.graphql_url)
            .json(&json!({
                "query": TOKEN_QUERY,
                "variables": { "contract": contract, "tokenId": token_id },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }

        let body: GraphQlResponse = serde_json::from_slice(&response.bytes().await?)?;
        if let Some(first) = body.errors.first() {
            return Err(ResolveError::Malformed(first.message.clone()));
        }

        let token = body
            .data
            .and_then(|d| d.fa.into_iter().next())
            .and_then(|c| c.tokens.into_iter().next())
            .ok_or(ResolveError::TokenNotFound)?;

        let min_price = token
            .listings_active
            .iter()
            .map(|l| l.price_xtz)
            .min()
            .ok_or(ResolveError::NoActiveListings)?;

        let thumbnail = token
            .thumbnail_uri
            .as_deref()
            .ok_or(ResolveError::MissingField("thumbnail_uri"))?;

        Ok(ResolvedListing {
            marketplace: Marketplace::Objkt,
            price: min_price as f64 / MUTEZ_PER_TEZ,
            thumbnail_url: self.gateway_url(thumbnail),
        })
    }
}
