//! Promoted-identifier extraction from the storefront landing page.
//!
//! The landing page embeds its merchandising rotations as a JSON blob inside a
//! script block; the `"specials"` array lists the currently promoted items as
//! `{"appid": N}` (single product) or `{"packageid": N}` (bundle) entries.

use regex::Regex;
use tracing::debug;

use crate::errors::ScrapeError;
use crate::model::PromotedItem;

/// Extract up to `limit` promoted items, most-promoted first.
///
/// A payload with fewer than `limit` distinct identifiers yields exactly that
/// many. A missing specials fragment is fatal (`ScrapeError::Extraction`) and
/// never degrades to an empty `Ok`.
pub fn extract_promoted(html: &str, limit: usize) -> Result<Vec<PromotedItem>, ScrapeError> {
    let fragment_re = Regex::new(r#"(?s)"specials":(\[.*?\])"#)
        .map_err(|e| ScrapeError::Extraction(e.to_string()))?;
    let caps = fragment_re.captures(html).ok_or_else(|| {
        ScrapeError::Extraction("specials fragment not found in landing page script".into())
    })?;
    let specials = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

    // Matches are (appid, packageid) pairs with exactly one side present;
    // flattening keeps the non-null side in document order.
    let id_re = Regex::new(r#""appid":(\d+)|"packageid":(\d+)"#)
        .map_err(|e| ScrapeError::Extraction(e.to_string()))?;

    let mut seen = std::collections::HashSet::new();
    let mut items = Vec::new();
    for caps in id_re.captures_iter(specials) {
        let (id, is_bundle) = match (caps.get(1), caps.get(2)) {
            (Some(app), _) => (app.as_str().to_string(), false),
            (None, Some(pkg)) => (pkg.as_str().to_string(), true),
            (None, None) => continue,
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        items.push(PromotedItem { id, is_bundle });
        if items.len() == limit {
            break;
        }
    }
    debug!(count = items.len(), limit, "extracted promoted identifiers");
    Ok(items)
}
