//! # Extraction Orchestrator
//!
//! Composes the page fetcher, the field extractor and the batch runner into
//! the two engine operations:
//! - `lookup`: URLs to brand new records
//! - `update`: known records to refreshed records with their price shifted
//!
//! No retry happens here; callers decide what an incomplete batch means.

use std::sync::Arc;

use tracing::{debug, info};

use super::batch_runner::{BatchRunner, Jitter};
use crate::domain::product::{BatchReport, ProductRecord};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::{HttpPageFetcher, PageFetcher};
use crate::infrastructure::parsing::{ExtractionOutcome, FieldExtractor};
use crate::infrastructure::parsing_error::EngineResult;

pub struct ExtractionOrchestrator<F: ?Sized> {
    runner: BatchRunner,
    extractor: Arc<FieldExtractor>,
    fetcher: Arc<F>,
}

impl ExtractionOrchestrator<HttpPageFetcher> {
    /// Build the HTTP-backed engine from application settings
    pub fn from_config(config: &AppConfig) -> EngineResult<Self> {
        config.validate()?;
        let fetcher = HttpPageFetcher::new(config.http.clone())?;
        let extractor = FieldExtractor::with_config(&config.selectors)?;
        Ok(Self::new(fetcher, extractor, BatchRunner::new(config.batch.max_workers)))
    }
}

impl<F> ExtractionOrchestrator<F>
where
    F: PageFetcher + 'static,
{
    pub fn new(fetcher: F, extractor: FieldExtractor, runner: BatchRunner) -> Self {
        Self {
            runner,
            extractor: Arc::new(extractor),
            fetcher: Arc::new(fetcher),
        }
    }

    /// Fetch and extract every URL into a fresh record.
    ///
    /// A failed fetch leaves its slot `None`. A fetched page with no title or
    /// price still yields a record with those fields absent.
    pub async fn lookup(&self, urls: &[String]) -> BatchReport {
        info!("🔍 Looking up {} product page(s)", urls.len());

        let docs = self.runner.run_fetches(Arc::clone(&self.fetcher), urls, None).await;
        debug_assert_eq!(docs.len(), urls.len());

        let price_extractor = Arc::clone(&self.extractor);
        let title_extractor = Arc::clone(&self.extractor);
        let outcomes: Vec<Option<ExtractionOutcome>> = self
            .runner
            .run_extraction_pair(
                docs,
                move |html| price_extractor.extract_price(Some(html)),
                move |html| title_extractor.extract_title(Some(html)),
            )
            .await
            .into_iter()
            .map(|slot| slot.map(|(price, title)| ExtractionOutcome { title, price }))
            .collect();
        debug_assert_eq!(outcomes.len(), urls.len());

        let records = urls
            .iter()
            .zip(outcomes)
            .map(|(url, slot)| slot.map(|outcome| outcome.into_record(url.as_str())))
            .collect();

        let report = BatchReport::new(records);
        info!(
            "✅ Lookup finished: {}/{} page(s) fetched",
            report.len() - report.failed_count(),
            report.len()
        );
        report
    }

    /// Re-fetch every record's page and shift in the newly extracted price.
    ///
    /// Launches are spread by a jitter drawn from `[max_delay_ms / 2,
    /// max_delay_ms]`. Titles and urls are carried over unchanged; a failed
    /// fetch leaves its slot `None`.
    pub async fn update(&self, records: &[ProductRecord], max_delay_ms: Option<u64>) -> BatchReport {
        let jitter = Jitter::from_max_delay(max_delay_ms);
        info!("🔄 Updating {} record(s) (jitter: {:?})", records.len(), jitter);

        let urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
        let docs = self.runner.run_fetches(Arc::clone(&self.fetcher), &urls, jitter).await;
        debug_assert_eq!(docs.len(), records.len());

        let extractor = Arc::clone(&self.extractor);
        let prices = self
            .runner
            .run_extractions(docs, move |html| extractor.extract_price(Some(html)))
            .await;
        debug_assert_eq!(prices.len(), records.len());

        let refreshed = records
            .iter()
            .zip(prices)
            .map(|(record, slot)| {
                slot.map(|price| {
                    debug!("{}: {:?} -> {:?}", record.url, record.current_price, price);
                    record.clone().shift_price(price)
                })
            })
            .collect();

        let report = BatchReport::new(refreshed);
        if report.is_complete() {
            info!("✅ Update finished: all {} record(s) refreshed", report.len());
        } else {
            info!(
                "⚠️ Update finished with {}/{} failed fetch(es)",
                report.failed_count(),
                report.len()
            );
        }
        report
    }
}
