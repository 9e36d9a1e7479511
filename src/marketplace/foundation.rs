use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::traits::MarketplaceResolver;
use super::{Marketplace, ResolveError, ResolvedListing};

const MARKERS: &[&str] = &["foundation"];

/// Script block the page framework embeds its server-side props in.
static NEXT_DATA_SELECTOR: std::sync::LazyLock<Selector> = std::sync::LazyLock::new(|| {
    Selector::parse(r#"script#__NEXT_DATA__[type="application/json"]"#).unwrap()
});

/// Resolver for Foundation pages, read from the page's embedded JSON.
pub struct FoundationResolver {
    http: reqwest::Client,
}

impl FoundationResolver {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MarketplaceResolver for FoundationResolver {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Foundation
    }

    fn markers(&self) -> &[&'static str] {
        MARKERS
    }

    async fn fetch(&self, url: &str) -> Result<ResolvedListing, ResolveError> {
        debug!(url = %url, "Fetching Foundation page");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }

        let html = response.text().await?;
        let page_props = extract_page_props(&html)?;
        listing_from_page_props(&page_props)
    }
}

/// Pull `props.pageProps` out of the embedded `__NEXT_DATA__` block.
///
/// # Errors
///
/// Returns an error if the block is missing, is not valid JSON, or has no page props.
pub fn extract_page_props(html: &str) -> Result<Value, ResolveError> {
    let document = Html::parse_document(html);
    let script = document
        .select(&NEXT_DATA_SELECTOR)
        .next()
        .ok_or(ResolveError::MarkerNotFound)?;

    let raw: String = script.text().collect();
    let mut data: Value = serde_json::from_str(&raw)?;

    data.get_mut("props")
        .and_then(|p| p.get_mut("pageProps"))
        .map(Value::take)
        .ok_or(ResolveError::MissingField("props.pageProps"))
}

/// Build a listing from Foundation page props.
///
/// Editions and drops carry a mint price on the collection; single artworks
/// carry an active sale price and a split asset URL. When no usable price is
/// present the first buy-now offer is used instead.
///
/// # Errors
///
/// Returns an error if neither a price nor a thumbnail can be found.
pub fn listing_from_page_props(props: &Value) -> Result<ResolvedListing, ResolveError> {
    let kind = props.get("type").and_then(Value::as_str).unwrap_or_default();
    let collection = props.get("collection");
    let artwork = props.get("artwork");

    let (price, thumbnail) = match kind {
        "EDITION" => (
            collection.and_then(|c| price_field(c, "mintPrice")),
            collection
                .and_then(|c| string_field(c, "assetUrl"))
                .ok_or(ResolveError::MissingField("collection.assetUrl"))?
                .to_string(),
        ),
        "DROP" => (
            collection.and_then(|c| price_field(c, "mintPrice")),
            collection
                .and_then(|c| string_field(c, "collectionImageUrl"))
                .ok_or(ResolveError::MissingField("collection.collectionImageUrl"))?
                .to_string(),
        ),
        _ => {
            let artwork = artwork.ok_or(ResolveError::MissingField("artwork"))?;
            (
                price_field(artwork, "activeSalePriceInETH"),
                composed_asset_url(artwork)?,
            )
        }
    };

    let price = match price {
        Some(p) if p > 0.0 => p,
        other => first_buy_now(artwork)
            .or(other)
            .ok_or(ResolveError::MissingField("price"))?,
    };

    Ok(ResolvedListing {
        marketplace: Marketplace::Foundation,
        price,
        thumbnail_url: thumbnail,
    })
}

fn composed_asset_url(artwork: &Value) -> Result<String, ResolveError> {
    let scheme = string_field(artwork, "assetScheme")
        .ok_or(ResolveError::MissingField("artwork.assetScheme"))?;
    let host = string_field(artwork, "assetHost")
        .ok_or(ResolveError::MissingField("artwork.assetHost"))?;
    let path = string_field(artwork, "assetPath")
        .ok_or(ResolveError::MissingField("artwork.assetPath"))?;
    Ok(format!("{scheme}{host}{path}"))
}

fn first_buy_now(artwork: Option<&Value>) -> Option<f64> {
    artwork?
        .get("buyNows")?
        .as_array()?
        .first()
        .and_then(|offer| price_field(offer, "amountInETH"))
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Prices arrive as JSON numbers or as decimal strings.
fn price_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
