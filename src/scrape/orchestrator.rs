//! Concurrent fan-out over the promoted items.
//!
//! One task per identifier, bounded by a semaphore, each wrapped in its own
//! deadline. A task failure is isolated: the batch returns every successfully
//! parsed listing plus the skip reasons, and only an extraction failure (or a
//! landing-page fetch failure) aborts the whole run.

use std::future::Future;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::errors::ScrapeError;
use crate::model::{Listing, PromotedItem};
use crate::normalize;
use crate::scrape::{fields, resolver, specials, LANDING_URL};
use crate::util::env::env_parse;

/// Result of one batch run: successes in completion order plus the skipped
/// identifiers with their reasons.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub listings: Vec<Listing>,
    pub skipped: Vec<(String, ScrapeError)>,
}

impl BatchOutcome {
    /// Re-sort successes into promotion-rank order (the extractor's id order).
    /// Completion order is meaningless; rank is what display callers want.
    pub fn sort_by_rank(&mut self, ranked_ids: &[String]) {
        let rank = |id: &str| {
            ranked_ids
                .iter()
                .position(|r| r == id)
                .unwrap_or(usize::MAX)
        };
        self.listings.sort_by_key(|l| rank(&l.id));
    }
}

/// Fetch the current promoted snapshot: extract ids from the landing page,
/// then resolve+fetch+parse+normalize each one concurrently.
pub async fn fetch_specials(client: &Client, limit: usize) -> Result<BatchOutcome, ScrapeError> {
    let landing = client
        .get(LANDING_URL)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let items = specials::extract_promoted(&landing, limit)?;
    info!(count = items.len(), "promoted identifiers extracted");

    let concurrency: usize = env_parse("SPECIALS_CONCURRENCY", 5);
    let task_timeout_secs: u64 = env_parse("SPECIALS_TASK_TIMEOUT_SECS", 20);
    let mut outcome = run_batch(
        &items,
        concurrency,
        Duration::from_secs(task_timeout_secs),
        |item| fetch_one(client, &landing, item),
    )
    .await;

    let ranked: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    outcome.sort_by_rank(&ranked);
    info!(
        ok = outcome.listings.len(),
        skipped = outcome.skipped.len(),
        "specials batch complete"
    );
    Ok(outcome)
}

/// Run the per-item step over every promoted item, at most `concurrency` at a
/// time, each under `task_timeout`. A step failure (or deadline overrun) is
/// recorded as a skip for that identifier; siblings keep running.
async fn run_batch<F, Fut>(
    items: &[PromotedItem],
    concurrency: usize,
    task_timeout: Duration,
    fetch: F,
) -> BatchOutcome
where
    F: Fn(PromotedItem) -> Fut,
    Fut: Future<Output = Result<Listing, ScrapeError>>,
{
    let sem = Semaphore::new(concurrency.max(1));

    let mut tasks = FuturesUnordered::new();
    for item in items {
        let sem = &sem;
        let id = item.id.clone();
        let fut = fetch(item.clone());
        tasks.push(async move {
            let _permit = sem.acquire().await.ok();
            let result = timeout(task_timeout, fut).await.unwrap_or_else(|_| {
                Err(ScrapeError::Timeout {
                    id: id.clone(),
                    secs: task_timeout.as_secs(),
                })
            });
            (id, result)
        });
    }

    // Each task appends only its own result; failures never cancel siblings.
    let mut outcome = BatchOutcome::default();
    while let Some((id, result)) = tasks.next().await {
        match result {
            Ok(listing) => outcome.listings.push(listing),
            Err(err) => {
                warn!(id = %id, error = %err, "skipping promoted item");
                outcome.skipped.push((id, err));
            }
        }
    }
    outcome
}

async fn fetch_one(
    client: &Client,
    landing: &str,
    item: PromotedItem,
) -> Result<Listing, ScrapeError> {
    let (detail_url, is_bundle) = resolver::resolve_detail_url(landing, &item)?;
    let html = client
        .get(&detail_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let raw = fields::parse_listing(&html, &detail_url, is_bundle, &item.id)?;
    Ok(normalize::normalize(raw))
}

/// Look up a single listing by its canonical detail URL (single products
/// only; bundles are reached through the specials batch).
pub async fn lookup(client: &Client, url: &str) -> Result<Listing, ScrapeError> {
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let id = id_from_url(url).unwrap_or_default();
    let raw = fields::parse_listing(&html, url, false, &id)?;
    Ok(normalize::normalize(raw))
}

fn id_from_url(url: &str) -> Option<String> {
    let re = regex::Regex::new(r"/(?:app|sub)/(\d+)").ok()?;
    Some(re.captures(url)?[1].to_string())
}
