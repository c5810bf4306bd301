//! Generation pipeline: idempotency check, bounded retry with exponential
//! backoff, extraction, persistence, attempt logging and degrade-to-fallback.
//!
//! Provider failures never escape the retry loop; they become attempt-log
//! rows. The only hard failure a caller sees is a storage error, including
//! the one unrecoverable path where persisting the fallback itself fails.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::error::{ProviderError, StoreError};
use super::extract;
use super::fallback;
use super::provider::{PromptPool, QuoteProvider, SYSTEM_PROMPT};
use super::store::{NewQuote, Quote, QuoteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    AlreadyExisted,
    Generated,
    UsedFallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub status: GenerationStatus,
    pub message: String,
    pub quote: Quote,
}

pub struct GenerationPipeline {
    store: QuoteStore,
    provider: Option<Arc<dyn QuoteProvider>>,
    prompts: PromptPool,
    max_retries: u32,
    backoff_unit: Duration,
    shutdown: CancellationToken,
}

impl GenerationPipeline {
    pub fn new(
        store: QuoteStore,
        provider: Option<Arc<dyn QuoteProvider>>,
        prompts: PromptPool,
        max_retries: u32,
        backoff_unit: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            provider,
            prompts,
            max_retries: max_retries.max(1),
            backoff_unit,
            shutdown,
        }
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    pub fn provider_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Produce the quote for `date`, generating at most once per date.
    ///
    /// The date string is treated opaquely; callers validate its format.
    pub async fn generate_daily_quote(
        &self,
        date: &str,
    ) -> Result<GenerationOutcome, StoreError> {
        if let Some(existing) = self.store.get_by_date(date).await? {
            info!("quote for {date} already exists");
            return Ok(GenerationOutcome {
                status: GenerationStatus::AlreadyExisted,
                message: "语录已存在".to_string(),
                quote: existing,
            });
        }

        for attempt in 1..=self.max_retries {
            if self.shutdown.is_cancelled() {
                warn!("shutdown signaled, skipping remaining attempts for {date}");
                break;
            }

            info!("generation attempt {attempt} for {date}");
            match self.attempt_once().await {
                Ok((content, author)) => {
                    let insert = self
                        .store
                        .insert(&NewQuote {
                            date,
                            content: &content,
                            author: &author,
                            is_generated: true,
                            is_fallback: false,
                            attempt_count: attempt,
                        })
                        .await;
                    match insert {
                        Ok(quote) => {
                            self.store
                                .append_attempt_log(date, attempt, true, None, Some(&content))
                                .await?;
                            info!("generated quote for {date} on attempt {attempt}");
                            return Ok(GenerationOutcome {
                                status: GenerationStatus::Generated,
                                message: format!("第 {attempt} 次尝试成功"),
                                quote,
                            });
                        }
                        Err(StoreError::DuplicateDate(_)) => {
                            // Race loser: a concurrent caller persisted first.
                            return self.race_lost(date).await;
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            error!("attempt {attempt} for {date} failed to persist: {msg}");
                            self.store
                                .append_attempt_log(date, attempt, false, Some(&msg), None)
                                .await?;
                        }
                    }
                }
                Err(e) => {
                    let msg = e.to_string();
                    error!("attempt {attempt} for {date} failed: {msg}");
                    self.store
                        .append_attempt_log(date, attempt, false, Some(&msg), None)
                        .await?;
                }
            }

            if attempt < self.max_retries {
                let wait = backoff_delay(self.backoff_unit, attempt);
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = self.shutdown.cancelled() => {
                        warn!("shutdown signaled during backoff for {date}");
                        break;
                    }
                }
            }
        }

        warn!("generation exhausted for {date}, degrading to fallback");
        self.use_fallback(date).await
    }

    /// Today's quote, generating it on a cache miss. Generation always
    /// produces a row (fallback included), so a quote is always returned.
    pub async fn get_today_quote(&self) -> Result<Quote, StoreError> {
        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        if let Some(quote) = self.store.get_by_date(&today).await? {
            return Ok(quote);
        }
        let outcome = self.generate_daily_quote(&today).await?;
        Ok(outcome.quote)
    }

    /// One provider invocation plus extraction and cleaning.
    async fn attempt_once(&self) -> Result<(String, String), ProviderError> {
        let provider = self.provider.as_ref().ok_or(ProviderError::NotConfigured)?;
        let raw = provider.complete(SYSTEM_PROMPT, self.prompts.pick()).await?;
        if raw.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        let (content, author) = extract::split_quote(&raw);
        if content.is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok((content, author))
    }

    async fn use_fallback(&self, date: &str) -> Result<GenerationOutcome, StoreError> {
        let (content, author) = fallback::select_fallback(&self.store, date).await?;
        let insert = self
            .store
            .insert(&NewQuote {
                date,
                content: &content,
                author: &author,
                is_generated: false,
                is_fallback: true,
                attempt_count: self.max_retries,
            })
            .await;
        match insert {
            Ok(quote) => {
                info!("fallback quote persisted for {date}");
                Ok(GenerationOutcome {
                    status: GenerationStatus::UsedFallback,
                    message: "使用兜底语录".to_string(),
                    quote,
                })
            }
            Err(StoreError::DuplicateDate(_)) => self.race_lost(date).await,
            Err(e) => {
                // No fallback-of-fallback: this is the one unrecoverable path.
                error!("failed to persist fallback quote for {date}: {e}");
                Err(e)
            }
        }
    }

    async fn race_lost(&self, date: &str) -> Result<GenerationOutcome, StoreError> {
        info!("lost insert race for {date}, returning the existing quote");
        // Quotes are never deleted, so the winner's row must be present.
        let quote = self
            .store
            .get_by_date(date)
            .await?
            .ok_or(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        Ok(GenerationOutcome {
            status: GenerationStatus::AlreadyExisted,
            message: "语录已存在".to_string(),
            quote,
        })
    }
}

/// Wait before attempt `n + 1`: `2^n` backoff units.
fn backoff_delay(unit: Duration, attempt: u32) -> Duration {
    unit * 2u32.saturating_pow(attempt)
}
