use thiserror::Error;

/// Store-level failures. `DuplicateDate` is the race-loser signal for the
/// per-date uniqueness constraint and is recoverable; everything else means
/// the storage layer itself misbehaved.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a quote already exists for {0}")]
    DuplicateDate(String),

    #[error("quote storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Provider-call failures. All of these are swallowed by the retry loop and
/// only ever surface as attempt-log rows.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider is not configured (missing API key)")]
    NotConfigured,

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("provider returned an empty completion")]
    EmptyCompletion,
}
