//! Storefront scraping: promoted-id extraction, detail resolution, field
//! parsing and the concurrent fetch orchestrator.

pub mod fields;
pub mod orchestrator;
pub mod resolver;
pub mod specials;

use anyhow::Result;
use reqwest::Client;

use crate::util::env::env_parse;

/// Canonical storefront prefix; detail slugs are concatenated back onto it.
pub const STORE_BASE: &str = "https://store.steampowered.com";

/// Landing page carrying the specials rotation in an embedded script payload.
pub const LANDING_URL: &str = "https://store.steampowered.com/?snr=1_4_4__global-responsive-menu";

/// Default number of promoted items taken from the rotation.
pub const DEFAULT_SPECIALS_LIMIT: usize = 5;

pub fn app_url(id: &str, slug: &str) -> String {
    format!("{STORE_BASE}/app/{id}/{slug}")
}

pub fn sub_url(id: &str, slug: &str) -> String {
    format!("{STORE_BASE}/sub/{id}/{slug}")
}

/// Shared HTTP client with an explicit timeout so a dead endpoint can never
/// hang a fetch forever. `STORE_HTTP_TIMEOUT_SECS` overrides the default.
pub fn http_client() -> Result<Client> {
    let timeout_secs: u64 = env_parse("STORE_HTTP_TIMEOUT_SECS", 15);
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36")
        .build()?;
    Ok(client)
}
