//! Resolves a promoted identifier to its canonical detail-page URL.

use regex::Regex;

use crate::errors::ScrapeError;
use crate::model::PromotedItem;
use crate::scrape::{app_url, sub_url};

/// Search the landing page content for a literal detail hyperlink for `item`
/// and rebuild the full URL from the canonical prefix plus the found slug.
///
/// Products link as `/app/<id>/<slug>`, bundles as `/sub/<id>/<slug>`. The
/// returned flag is true for bundles. Neither pattern matching is an isolated
/// failure: the batch continues without this identifier.
pub fn resolve_detail_url(
    html: &str,
    item: &PromotedItem,
) -> Result<(String, bool), ScrapeError> {
    let id = regex::escape(&item.id);

    let app_re = Regex::new(&format!(
        r#"https://store\.steampowered\.com/app/{id}/([^"]+)"#
    ))
    .map_err(|_| ScrapeError::Resolution {
        id: item.id.clone(),
    })?;
    if let Some(caps) = app_re.captures(html) {
        return Ok((app_url(&item.id, &caps[1]), false));
    }

    let sub_re = Regex::new(&format!(
        r#"https://store\.steampowered\.com/sub/{id}/([^"]+)"#
    ))
    .map_err(|_| ScrapeError::Resolution {
        id: item.id.clone(),
    })?;
    if let Some(caps) = sub_re.captures(html) {
        return Ok((sub_url(&item.id, &caps[1]), true));
    }

    Err(ScrapeError::Resolution {
        id: item.id.clone(),
    })
}
