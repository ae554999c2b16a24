//! Per-field extraction from a fetched detail page.
//!
//! Every field is read independently and tolerates absence; only `title` and
//! the canonical URL are required for a usable record. Single-element fields
//! are driven by a declarative rule table so a storefront markup change means
//! editing data, not control flow. Composite fields (tags, ratings, the sale
//! banner triple, publisher) keep dedicated extractors.

use regex::Regex;
use scraper::{Html, Selector};

use crate::errors::ScrapeError;
use crate::model::RawListing;

#[derive(Debug, Clone, Copy)]
enum Source {
    Text,
    Attr(&'static str),
}

/// A selector paired with where its value lives. Fallbacks carry their own
/// source so a rule never reads an attribute its selector did not ask for.
#[derive(Debug, Clone, Copy)]
struct FieldRule {
    selector: &'static str,
    source: Source,
    fallback: Option<(&'static str, Source)>,
}

const CANONICAL_URL: FieldRule = FieldRule {
    selector: r#"meta[property="og:url"]"#,
    source: Source::Attr("content"),
    fallback: None,
};

const DESCRIPTION: FieldRule = FieldRule {
    selector: r#"meta[property="og:description"]"#,
    source: Source::Attr("content"),
    fallback: Some((r#"meta[name="Description"]"#, Source::Attr("content"))),
};

const IMAGE: FieldRule = FieldRule {
    selector: r#"link[rel="image_src"]"#,
    source: Source::Attr("href"),
    fallback: Some((r#"meta[property="og:image"]"#, Source::Attr("content"))),
};

const PRICE_META: FieldRule = FieldRule {
    selector: r#"meta[itemprop="price"]"#,
    source: Source::Attr("content"),
    fallback: None,
};

const SALE_BANNER: FieldRule = FieldRule {
    selector: "div.discount_block.game_purchase_discount",
    source: Source::Attr("aria-label"),
    fallback: None,
};

const DEVELOPER: FieldRule = FieldRule {
    selector: "#developers_list a",
    source: Source::Text,
    fallback: None,
};

const BUNDLE_TITLE: FieldRule = FieldRule {
    selector: "h2.pageheader",
    source: Source::Text,
    fallback: None,
};

fn extract_rule(doc: &Html, rule: &FieldRule) -> Option<String> {
    let candidates = std::iter::once((rule.selector, rule.source)).chain(rule.fallback);
    for (sel_str, source) in candidates {
        let Ok(selector) = Selector::parse(sel_str) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            let value = match source {
                Source::Text => el.text().collect::<String>(),
                Source::Attr(attr) => el.value().attr(attr).unwrap_or_default().to_string(),
            };
            let value = value.trim().to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Parse all semantic fields out of a detail page.
///
/// `url` is the address the page was fetched from; for bundles it doubles as
/// the canonical URL (query stripped) because bundle pages carry no og:url.
pub fn parse_listing(
    html: &str,
    url: &str,
    is_bundle: bool,
    id: &str,
) -> Result<RawListing, ScrapeError> {
    let doc = Html::parse_document(html);

    let canonical_url = if is_bundle {
        url.split('?').next().unwrap_or(url).to_string()
    } else {
        extract_rule(&doc, &CANONICAL_URL).ok_or_else(|| ScrapeError::Parse {
            field: "canonical_url",
            url: url.to_string(),
        })?
    };

    let title = if is_bundle {
        extract_rule(&doc, &BUNDLE_TITLE)
    } else {
        title_from_slug(&canonical_url)
    }
    .ok_or_else(|| ScrapeError::Parse {
        field: "title",
        url: canonical_url.clone(),
    })?;

    let (discount_percent, original_price, discount_price) = extract_price(&doc);
    let (monthly_ratings, all_ratings) = if is_bundle {
        (None, None)
    } else {
        extract_ratings(&doc)
    };

    Ok(RawListing {
        id: id.to_string(),
        is_bundle,
        title,
        url: canonical_url,
        description: extract_rule(&doc, &DESCRIPTION),
        tags: extract_tags(&doc),
        monthly_ratings,
        all_ratings,
        original_price,
        discount_percent,
        discount_price,
        image_url: extract_rule(&doc, &IMAGE),
        developer: extract_rule(&doc, &DEVELOPER),
        publisher: extract_publisher(&doc),
    })
}

/// Derive a product title from its canonical URL slug: `/app/620/Portal_2/`
/// becomes "Portal 2".
fn title_from_slug(url: &str) -> Option<String> {
    let re = Regex::new(r"/\d+/(\w+)/?").ok()?;
    let caps = re.captures(url)?;
    let words: Vec<String> = caps[1]
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Anchored tag list; blank entries are stripped. An empty list is valid
/// (bundles typically have none).
fn extract_tags(doc: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(".glance_tags a.app_tag, .popular_tags a.app_tag") else {
        return Vec::new();
    };
    doc.select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// The two review summary rows inside the user-reviews block: monthly first,
/// all-time second, each carrying its raw tooltip text.
fn extract_ratings(doc: &Html) -> (Option<String>, Option<String>) {
    let Ok(selector) = Selector::parse("#userReviews a.user_reviews_summary_row") else {
        return (None, None);
    };
    let mut rows = doc.select(&selector);
    let read = |el: Option<scraper::ElementRef>| {
        el.and_then(|e| e.value().attr("data-tooltip-html"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let monthly = read(rows.next());
    let all = read(rows.next());
    (monthly, all)
}

/// Prefer the sale banner's `(percent, original, discounted)` triple; fall
/// back to the canonical price meta as the original price alone.
fn extract_price(doc: &Html) -> (Option<String>, Option<String>, Option<String>) {
    if let Some(banner) = extract_rule(doc, &SALE_BANNER) {
        if let Ok(re) =
            Regex::new(r"(\d+%) off\. (\$\d+(?:,\d{3})*\.\d+) normally, discounted to (\$\d+(?:,\d{3})*\.\d+)")
        {
            if let Some(caps) = re.captures(&banner) {
                return (
                    Some(caps[1].to_string()),
                    Some(caps[2].to_string()),
                    Some(caps[3].to_string()),
                );
            }
        }
    }
    (None, extract_rule(doc, &PRICE_META), None)
}

/// The dev_row block whose subtitle reads "Publisher:" holds the publisher
/// link; developers have their own anchored list.
fn extract_publisher(doc: &Html) -> Option<String> {
    let row_sel = Selector::parse("div.dev_row").ok()?;
    let subtitle_sel = Selector::parse("div.subtitle.column").ok()?;
    let link_sel = Selector::parse("a").ok()?;
    for row in doc.select(&row_sel) {
        let is_publisher_row = row
            .select(&subtitle_sel)
            .next()
            .map(|s| s.text().collect::<String>().contains("Publisher:"))
            .unwrap_or(false);
        if !is_publisher_row {
            continue;
        }
        if let Some(link) = row.select(&link_sel).next() {
            let name = link.text().collect::<String>().trim().to_string();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_URL: &str = "https://store.steampowered.com/app/620/Portal_2/";

    fn app_page(extra: &str) -> String {
        format!(
            r##"<html><head>
            <meta property="og:url" content="{APP_URL}">
            <meta property="og:description" content="The sequel to the award-winning Portal.">
            <link rel="image_src" href="https://cdn.example/620/header.jpg">
            </head><body>
            <div class="glance_tags popular_tags">
              <a class="app_tag" href="#"> Puzzle </a>
              <a class="app_tag" href="#">Co-op</a>
              <a class="app_tag" href="#">   </a>
            </div>
            <div id="userReviews">
              <a class="user_reviews_summary_row" data-tooltip-html="84% of the 1,234 user reviews in the last 30 days are positive."></a>
              <a class="user_reviews_summary_row" data-tooltip-html="96% of the 250,000 user reviews for this game are positive."></a>
            </div>
            <div id="developers_list"><a href="#">Valve</a></div>
            <div class="dev_row"><div class="subtitle column">Developer:</div><a href="#">Valve</a></div>
            <div class="dev_row"><div class="subtitle column">Publisher:</div><a href="#">Valve Publishing</a></div>
            {extra}
            </body></html>"##
        )
    }

    #[test]
    fn parses_full_product_page_with_sale_banner() {
        let html = app_page(
            r#"<div class="discount_block game_purchase_discount"
                    aria-label="50% off. $19.99 normally, discounted to $9.99"></div>"#,
        );
        let raw = parse_listing(&html, APP_URL, false, "620").unwrap();
        assert_eq!(raw.title, "Portal 2");
        assert_eq!(raw.url, APP_URL);
        assert_eq!(
            raw.description.as_deref(),
            Some("The sequel to the award-winning Portal.")
        );
        assert_eq!(raw.tags, vec!["Puzzle", "Co-op"]);
        assert!(raw.monthly_ratings.as_deref().unwrap().starts_with("84%"));
        assert!(raw.all_ratings.as_deref().unwrap().starts_with("96%"));
        assert_eq!(raw.discount_percent.as_deref(), Some("50%"));
        assert_eq!(raw.original_price.as_deref(), Some("$19.99"));
        assert_eq!(raw.discount_price.as_deref(), Some("$9.99"));
        assert_eq!(raw.developer.as_deref(), Some("Valve"));
        assert_eq!(raw.publisher.as_deref(), Some("Valve Publishing"));
        assert_eq!(
            raw.image_url.as_deref(),
            Some("https://cdn.example/620/header.jpg")
        );
    }

    #[test]
    fn falls_back_to_price_meta_without_banner() {
        let html = app_page(r#"<meta itemprop="price" content="19.99">"#);
        let raw = parse_listing(&html, APP_URL, false, "620").unwrap();
        assert_eq!(raw.original_price.as_deref(), Some("19.99"));
        assert!(raw.discount_percent.is_none());
        assert!(raw.discount_price.is_none());
    }

    #[test]
    fn bundle_pages_use_heading_title_and_skip_ratings() {
        let html = r#"<html><body>
            <h2 class="pageheader">Valve Complete Pack</h2>
            <div id="userReviews">
              <a class="user_reviews_summary_row" data-tooltip-html="should not be read"></a>
            </div>
            </body></html>"#;
        let url = "https://store.steampowered.com/sub/354231/Valve_Complete_Pack/?snr=1_4_4";
        let raw = parse_listing(html, url, true, "354231").unwrap();
        assert_eq!(raw.title, "Valve Complete Pack");
        assert_eq!(
            raw.url,
            "https://store.steampowered.com/sub/354231/Valve_Complete_Pack/"
        );
        assert!(raw.monthly_ratings.is_none());
        assert!(raw.all_ratings.is_none());
        assert!(raw.tags.is_empty());
    }

    #[test]
    fn missing_required_title_fails_the_item() {
        let html = "<html><body><p>bundle page without a heading</p></body></html>";
        let err =
            parse_listing(html, "https://store.steampowered.com/sub/1/X/", true, "1").unwrap_err();
        assert!(matches!(err, ScrapeError::Parse { field: "title", .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn missing_canonical_url_fails_a_product() {
        let html = "<html><head></head><body></body></html>";
        let err = parse_listing(html, APP_URL, false, "620").unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Parse {
                field: "canonical_url",
                ..
            }
        ));
    }

    #[test]
    fn optional_fields_degrade_to_none() {
        let html = format!(
            r#"<html><head><meta property="og:url" content="{APP_URL}"></head><body></body></html>"#
        );
        let raw = parse_listing(&html, APP_URL, false, "620").unwrap();
        assert_eq!(raw.title, "Portal 2");
        assert!(raw.description.is_none());
        assert!(raw.tags.is_empty());
        assert!(raw.original_price.is_none());
        assert!(raw.developer.is_none());
        assert!(raw.publisher.is_none());
        assert!(raw.image_url.is_none());
    }

    #[test]
    fn image_falls_back_to_og_meta_content() {
        let html = format!(
            r#"<html><head>
            <meta property="og:url" content="{APP_URL}">
            <meta property="og:image" content="https://cdn.example/620/og.jpg">
            </head><body></body></html>"#
        );
        let raw = parse_listing(&html, APP_URL, false, "620").unwrap();
        assert_eq!(raw.image_url.as_deref(), Some("https://cdn.example/620/og.jpg"));
    }

    #[test]
    fn attr_rules_never_read_a_different_attribute() {
        // A link carrying `content` instead of `href` must not satisfy the
        // primary image rule; the og:image fallback wins.
        let html = format!(
            r#"<html><head>
            <meta property="og:url" content="{APP_URL}">
            <link rel="image_src" content="https://cdn.example/620/wrong.jpg">
            <meta property="og:image" content="https://cdn.example/620/og.jpg">
            </head><body></body></html>"#
        );
        let raw = parse_listing(&html, APP_URL, false, "620").unwrap();
        assert_eq!(raw.image_url.as_deref(), Some("https://cdn.example/620/og.jpg"));
    }

    #[test]
    fn slug_titles_are_prettified() {
        assert_eq!(
            title_from_slug("https://store.steampowered.com/app/620/Portal_2/").as_deref(),
            Some("Portal 2")
        );
        assert_eq!(
            title_from_slug("https://store.steampowered.com/app/1091500/Cyberpunk_2077/")
                .as_deref(),
            Some("Cyberpunk 2077")
        );
        assert!(title_from_slug("https://store.steampowered.com/").is_none());
    }
}
