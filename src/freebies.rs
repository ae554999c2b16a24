//! Zero-price promotional feed (Epic free-games rotation).
//!
//! Unlike the storefront scrape this is a single structured-JSON endpoint:
//! deserialize the catalog, keep the offers currently discounted to zero and
//! normalize them into a small display record.

use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

pub const FREE_GAMES_URL: &str = "https://store-site-backend-static-ipv4.ak.epicgames.com/freeGamesPromotions?locale=en-US&country=US&allowCountries=US";

const PRODUCT_PAGE_PREFIX: &str = "https://store.epicgames.com/en-US/p/";

#[derive(Debug, Deserialize)]
struct FreeGamesResponse {
    data: CatalogData,
}

#[derive(Debug, Deserialize)]
struct CatalogData {
    #[serde(rename = "Catalog")]
    catalog: Catalog,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(rename = "searchStore")]
    search_store: SearchStore,
}

#[derive(Debug, Deserialize)]
struct SearchStore {
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Element {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    effective_date: Option<String>,
    #[serde(default)]
    expiry_date: Option<String>,
    price: Price,
    #[serde(default)]
    offer_mappings: Vec<OfferMapping>,
    #[serde(default)]
    product_slug: Option<String>,
    #[serde(default)]
    key_images: Vec<KeyImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Price {
    total_price: TotalPrice,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalPrice {
    discount_price: i64,
    original_price: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferMapping {
    #[serde(default)]
    page_slug: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyImage {
    #[serde(rename = "type")]
    kind: String,
    url: String,
}

/// A currently-free offer, normalized for display.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FreeGame {
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// What the offer normally costs (feed prices are in cents).
    pub original_price: BigDecimal,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// Fetch and normalize the current free-game offers.
pub async fn fetch_free_games(client: &Client) -> Result<Vec<FreeGame>> {
    let resp: FreeGamesResponse = client
        .get(FREE_GAMES_URL)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .context("free games feed payload did not deserialize")?;
    let games = free_games_from(resp);
    info!(count = games.len(), "free game offers fetched");
    Ok(games)
}

fn free_games_from(resp: FreeGamesResponse) -> Vec<FreeGame> {
    resp.data
        .catalog
        .search_store
        .elements
        .into_iter()
        .filter(|el| el.price.total_price.discount_price == 0)
        .map(|el| {
            let url = el
                .offer_mappings
                .iter()
                .find_map(|m| m.page_slug.as_deref())
                .or(el.product_slug.as_deref())
                .map(|slug| format!("{PRODUCT_PAGE_PREFIX}{slug}"));

            // Wide offer art preferred; mystery-game offers only carry the
            // closed-vault image.
            let mut image_url = None;
            for image in &el.key_images {
                if image.kind == "OfferImageWide" {
                    image_url = Some(image.url.clone());
                } else if image.kind == "VaultClosed"
                    && el.title.contains("Mystery Game")
                    && image_url.is_none()
                {
                    image_url = Some(image.url.clone());
                }
            }

            FreeGame {
                original_price: BigDecimal::from(el.price.total_price.original_price)
                    / BigDecimal::from(100),
                start_date: el.effective_date.as_deref().and_then(feed_date),
                end_date: el.expiry_date.as_deref().and_then(feed_date),
                title: el.title,
                description: el.description,
                url,
                image_url,
            }
        })
        .collect()
}

/// Feed timestamps look like `2024-06-13T15:00:00.000Z`; only the date part
/// matters for the rotation window.
fn feed_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split('T').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
