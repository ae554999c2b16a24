use thiserror::Error;

/// Pipeline error taxonomy.
///
/// `Extraction` is fatal to a whole batch (the storefront landing markup is no
/// longer recognized). Everything else is isolated to one promoted item: the
/// orchestrator logs it, skips the item and keeps going.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The specials fragment could not be located in the landing page payload.
    /// Signals a storefront markup change; must never degrade to an empty set.
    #[error("storefront specials payload not recognized: {0}")]
    Extraction(String),

    /// No `/app/<id>/` or `/sub/<id>/` detail link for this identifier.
    #[error("no detail link found for id {id}")]
    Resolution { id: String },

    /// A required field (title, canonical url) is missing from an otherwise
    /// fetched detail page.
    #[error("required field `{field}` missing on {url}")]
    Parse { field: &'static str, url: String },

    /// The per-item resolve+fetch+parse task exceeded its deadline.
    #[error("detail fetch for id {id} timed out after {secs}s")]
    Timeout { id: String, secs: u64 },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ScrapeError {
    /// True when the error invalidates the whole batch rather than one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrapeError::Extraction(_))
    }
}
