//! Pure transforms from scraped strings to canonical field values.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use regex::Regex;

use crate::model::{Listing, RawListing};

/// Extract the leading integer percentage from a raw rating/tooltip string and
/// return it as a fraction in `[0, 1]`.
///
/// `"84% of the 1,234 user reviews..."` -> `Some(0.84)`. No percent token in
/// the input means "no rating data", not an error.
pub fn percent_fraction(raw: &str) -> Option<f64> {
    let re = Regex::new(r"(\d+)%").ok()?;
    let caps = re.captures(raw)?;
    let pct: f64 = caps[1].parse().ok()?;
    Some(pct / 100.0)
}

/// Parse a currency amount such as `"$19.99"` (or a bare `"19.99"` from the
/// price meta field) into a decimal.
pub fn currency_amount(raw: &str) -> Option<BigDecimal> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    BigDecimal::from_str(&cleaned).ok()
}

/// Convert a parsed raw listing into its canonical stored representation.
///
/// `is_on_sale` is true iff the full discount triple (percent, original,
/// discounted) was found on the page; a lone meta price is a regular price.
/// The specials banner exposes no machine-readable end date, so
/// `sale_end_date` stays `None` here.
pub fn normalize(raw: RawListing) -> Listing {
    let discount_price = raw.discount_price.as_deref().and_then(currency_amount);
    let is_on_sale = raw.discount_percent.is_some() && discount_price.is_some();

    Listing {
        id: raw.id,
        is_bundle: raw.is_bundle,
        title: raw.title,
        url: raw.url,
        description: raw.description,
        tags: raw.tags,
        monthly_rating: raw.monthly_ratings.as_deref().and_then(percent_fraction),
        all_rating: raw.all_ratings.as_deref().and_then(percent_fraction),
        original_price: raw.original_price.as_deref().and_then(currency_amount),
        discount_percent: raw.discount_percent,
        discount_price: if is_on_sale { discount_price } else { None },
        is_on_sale,
        sale_end_date: None,
        image_url: raw.image_url,
        developer: raw.developer,
        publisher: raw.publisher,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_fraction_reads_leading_percent() {
        assert_eq!(
            percent_fraction("84% of the 1,234 user reviews for this game are positive."),
            Some(0.84)
        );
        assert_eq!(percent_fraction("100%"), Some(1.0));
        assert_eq!(percent_fraction("Need more user reviews"), None);
        assert_eq!(percent_fraction(""), None);
    }

    #[test]
    fn currency_amount_handles_dollar_prefix_and_commas() {
        assert_eq!(currency_amount("$19.99"), "19.99".parse().ok());
        assert_eq!(currency_amount("19.99"), "19.99".parse().ok());
        assert_eq!(currency_amount("$1,299.00"), "1299.00".parse().ok());
        assert_eq!(currency_amount("Free To Play"), None);
        assert_eq!(currency_amount(""), None);
    }

    fn raw() -> RawListing {
        RawListing {
            id: "620".into(),
            title: "Portal 2".into(),
            url: "https://store.steampowered.com/app/620/Portal_2/".into(),
            ..Default::default()
        }
    }

    #[test]
    fn meta_price_without_banner_is_not_a_sale() {
        let mut r = raw();
        r.original_price = Some("19.99".into());
        let listing = normalize(r);
        assert_eq!(listing.original_price, "19.99".parse().ok());
        assert!(!listing.is_on_sale);
        assert!(listing.discount_price.is_none());
        assert_eq!(
            listing.effective_price(),
            Some(&"19.99".parse().unwrap())
        );
    }

    #[test]
    fn full_discount_triple_marks_sale() {
        let mut r = raw();
        r.original_price = Some("$19.99".into());
        r.discount_percent = Some("50%".into());
        r.discount_price = Some("$9.99".into());
        let listing = normalize(r);
        assert!(listing.is_on_sale);
        assert_eq!(listing.discount_price, "9.99".parse().ok());
        assert_eq!(listing.effective_price(), Some(&"9.99".parse().unwrap()));
        assert!(listing.sale_end_date.is_none());
    }

    #[test]
    fn ratings_normalize_to_fractions() {
        let mut r = raw();
        r.monthly_ratings =
            Some("84% of the 1,234 user reviews in the last 30 days are positive.".into());
        r.all_ratings = Some("91% of the 54,321 user reviews are positive.".into());
        let listing = normalize(r);
        assert_eq!(listing.monthly_rating, Some(0.84));
        assert_eq!(listing.all_rating, Some(0.91));
    }
}
