//! Refresh and tracking use cases
//!
//! Wraps the extraction engine with the caller-side policy: retry incomplete
//! update batches with a growing launch delay, persist only complete batches,
//! and report items on sale.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::notifier::Notifier;
use crate::crawling::ExtractionOrchestrator;
use crate::domain::product::ProductRecord;
use crate::domain::repositories::RecordStore;
use crate::infrastructure::config::RefreshConfig;
use crate::infrastructure::http_client::PageFetcher;

/// Why a product could not be tracked
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("url must not be empty")]
    EmptyUrl,

    #[error("already tracking {url}")]
    AlreadyTracked { url: String },

    #[error("could not fetch {url}")]
    LookupFailed { url: String },

    #[error("record store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Outcome of one refresh run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    /// Stored records after the run, most discounted first
    pub records: Vec<ProductRecord>,
    /// True when an update batch completed and was persisted
    pub succeeded: bool,
    /// Update batches actually run
    pub attempts: u32,
    /// Completion time of the persisted batch
    pub refreshed_at: Option<DateTime<Utc>>,
    pub on_sale: Vec<ProductRecord>,
}

pub struct RefreshService<F, S, N> {
    engine: ExtractionOrchestrator<F>,
    store: S,
    notifier: N,
    policy: RefreshConfig,
}

impl<F, S, N> RefreshService<F, S, N>
where
    F: PageFetcher + 'static,
    S: RecordStore,
    N: Notifier,
{
    pub fn new(engine: ExtractionOrchestrator<F>, store: S, notifier: N, policy: RefreshConfig) -> Self {
        Self {
            engine,
            store,
            notifier,
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Update every stored record, retrying incomplete batches.
    ///
    /// Attempt `n` runs with a jitter ceiling of `base_delay_ms * n`. The first
    /// complete batch is persisted; if none completes, stored records stay as
    /// they were. Items on sale are reported either way.
    pub async fn refresh(&self) -> anyhow::Result<RefreshReport> {
        let known = self.store.get_all().await?;
        let mut attempts = 0;
        let mut refreshed_at = None;

        while attempts < self.policy.max_attempts {
            let max_delay_ms = self.policy.base_delay_ms * u64::from(attempts);
            attempts += 1;

            let report = self.engine.update(&known, Some(max_delay_ms)).await;
            let completed_at = report.completed_at;

            match report.into_complete_records() {
                Some(records) => {
                    self.store.update_all(&records, completed_at).await?;
                    refreshed_at = Some(completed_at);
                    break;
                }
                None => warn!(
                    "Refresh attempt {}/{} had failed fetches",
                    attempts, self.policy.max_attempts
                ),
            }
        }

        let succeeded = refreshed_at.is_some();
        if succeeded {
            info!("✅ Refreshed {} record(s) in {} attempt(s)", known.len(), attempts);
        } else {
            warn!("❌ Refresh gave up after {} attempt(s); records left unchanged", attempts);
        }

        let records = self.store.get_all().await?;
        let on_sale: Vec<ProductRecord> = records.iter().filter(|r| r.is_on_sale()).cloned().collect();
        if !on_sale.is_empty() {
            self.notifier.notify_items_on_sale(&on_sale).await;
        }

        Ok(RefreshReport {
            records,
            succeeded,
            attempts,
            refreshed_at,
            on_sale,
        })
    }

    /// Look up a new product page and start tracking it.
    ///
    /// A non-blank `title_override` replaces the title found on the page.
    pub async fn track(&self, url: &str, title_override: Option<&str>) -> Result<ProductRecord, TrackError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TrackError::EmptyUrl);
        }
        if self.store.contains_url(url).await? {
            return Err(TrackError::AlreadyTracked { url: url.to_string() });
        }

        let report = self.engine.lookup(&[url.to_string()]).await;
        let mut record = report
            .records
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| TrackError::LookupFailed { url: url.to_string() })?;

        if let Some(title) = title_override.map(str::trim).filter(|t| !t.is_empty()) {
            record.title = Some(title.to_string());
        }

        if !self.store.insert(&record).await? {
            return Err(TrackError::AlreadyTracked { url: url.to_string() });
        }

        info!("➕ Tracking {} ({:?})", record.url, record.title);
        Ok(record)
    }

    /// Stop tracking a url; returns `false` if it was not tracked
    pub async fn untrack(&self, url: &str) -> anyhow::Result<bool> {
        let removed = self.store.delete_by_url(url).await?;
        if removed {
            info!("➖ Stopped tracking {}", url);
        }
        Ok(removed)
    }

    /// Stored records whose price dropped at the last refresh
    pub async fn items_on_sale(&self) -> anyhow::Result<Vec<ProductRecord>> {
        Ok(self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(ProductRecord::is_on_sale)
            .collect())
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.store.clear_all().await?;
        info!("🧹 Cleared all tracked records");
        Ok(())
    }
}
