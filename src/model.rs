//! Domain value objects shared across the scrape and persistence layers.
//!
//! Everything here is constructed once with all fields provided (or explicitly
//! `None`) and never mutated in place; reconciliation replaces whole values.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry of the storefront's current specials rotation.
/// Ephemeral: produced by the identifier extractor, consumed by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedItem {
    pub id: String,
    pub is_bundle: bool,
}

/// Raw field-parser output: scraped strings exactly as they appear on the
/// detail page. Only `id`, `title` and `url` are guaranteed present.
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    pub id: String,
    pub is_bundle: bool,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Tooltip text like "84% of the 1,234 user reviews ...".
    pub monthly_ratings: Option<String>,
    pub all_ratings: Option<String>,
    /// "$19.99" from the sale banner, or a bare "19.99" from the price meta.
    pub original_price: Option<String>,
    /// "NN%" as printed in the sale banner.
    pub discount_percent: Option<String>,
    pub discount_price: Option<String>,
    pub image_url: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
}

/// Normalized listing ready for reconciliation and display.
///
/// Ratings are fractions in `[0, 1]`. `discount_price` is only present when
/// `is_on_sale`; callers wanting the price to show should use
/// [`Listing::effective_price`].
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub id: String,
    pub is_bundle: bool,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub monthly_rating: Option<f64>,
    pub all_rating: Option<f64>,
    pub original_price: Option<BigDecimal>,
    pub discount_percent: Option<String>,
    pub discount_price: Option<BigDecimal>,
    pub is_on_sale: bool,
    pub sale_end_date: Option<NaiveDate>,
    pub image_url: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
}

impl Listing {
    /// The price a consumer should display: discounted when on sale, else the
    /// original. `None` for pages exposing no price at all.
    pub fn effective_price(&self) -> Option<&BigDecimal> {
        self.discount_price.as_ref().or(self.original_price.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Playing,
    Completed,
    Dropped,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Playing => write!(f, "playing"),
            ActivityType::Completed => write!(f, "completed"),
            ActivityType::Dropped => write!(f, "dropped"),
        }
    }
}

impl FromStr for ActivityType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playing" => Ok(ActivityType::Playing),
            "completed" => Ok(ActivityType::Completed),
            "dropped" => Ok(ActivityType::Dropped),
            other => Err(anyhow!(
                "unknown activity type `{other}` (expected playing/completed/dropped)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Playstyle {
    Casual,
    Competitive,
    Mix,
}

impl fmt::Display for Playstyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Playstyle::Casual => write!(f, "casual"),
            Playstyle::Competitive => write!(f, "competitive"),
            Playstyle::Mix => write!(f, "mix"),
        }
    }
}

impl FromStr for Playstyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "casual" => Ok(Playstyle::Casual),
            "competitive" => Ok(Playstyle::Competitive),
            "mix" => Ok(Playstyle::Mix),
            other => Err(anyhow!(
                "unknown playstyle `{other}` (expected casual/competitive/mix)"
            )),
        }
    }
}

/// One user's rating of one game. Unique per `(discord_id, game_id)`: a second
/// submission updates the existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActivity {
    pub discord_id: i64,
    pub game_id: String,
    pub activity: ActivityType,
    pub rating: u8,
    pub recorded_on: NaiveDate,
}

impl UserActivity {
    /// Validates the rating range up front so out-of-range values never reach
    /// the store.
    pub fn new(
        discord_id: i64,
        game_id: impl Into<String>,
        activity: ActivityType,
        rating: u8,
        recorded_on: NaiveDate,
    ) -> Result<Self> {
        if !(1..=10).contains(&rating) {
            return Err(anyhow!("rating {rating} out of range (expected 1..=10)"));
        }
        Ok(Self {
            discord_id,
            game_id: game_id.into(),
            activity,
            rating,
            recorded_on,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub discord_id: i64,
    pub first_seen: NaiveDate,
    pub last_online: NaiveDate,
    pub playstyle: Playstyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        assert!(UserActivity::new(1, "440", ActivityType::Playing, 0, date()).is_err());
        assert!(UserActivity::new(1, "440", ActivityType::Playing, 11, date()).is_err());
        assert!(UserActivity::new(1, "440", ActivityType::Playing, 10, date()).is_ok());
        assert!(UserActivity::new(1, "440", ActivityType::Playing, 1, date()).is_ok());
    }

    #[test]
    fn rejects_unknown_activity_type() {
        assert!("abandoned".parse::<ActivityType>().is_err());
        assert_eq!(
            "Completed".parse::<ActivityType>().unwrap(),
            ActivityType::Completed
        );
    }

    #[test]
    fn playstyle_round_trips() {
        for p in [Playstyle::Casual, Playstyle::Competitive, Playstyle::Mix] {
            assert_eq!(p.to_string().parse::<Playstyle>().unwrap(), p);
        }
    }

    #[test]
    fn effective_price_prefers_discount() {
        let listing = Listing {
            id: "10".into(),
            is_bundle: false,
            title: "Test".into(),
            url: "https://store.steampowered.com/app/10/Test/".into(),
            description: None,
            tags: vec![],
            monthly_rating: None,
            all_rating: None,
            original_price: Some("19.99".parse().unwrap()),
            discount_percent: Some("50%".into()),
            discount_price: Some("9.99".parse().unwrap()),
            is_on_sale: true,
            sale_end_date: None,
            image_url: None,
            developer: None,
            publisher: None,
        };
        assert_eq!(
            listing.effective_price(),
            Some(&"9.99".parse::<BigDecimal>().unwrap())
        );
    }
}
