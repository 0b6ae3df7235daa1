//! # Batch Runner
//!
//! Runs one batch of fetches or extractions under a bounded worker pool and
//! returns results index-aligned with the input.
//!
//! - Fetch phase: tokio tasks gated by a per-batch semaphore, with optional
//!   randomized delay between launches.
//! - Parse phase: a per-batch rayon pool on a blocking thread.
//!
//! Neither phase shares mutable state between tasks. Every task owns one input
//! and one output slot; the batch returns after all of them have finished.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rayon::prelude::*;
use scraper::Html;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::infrastructure::config::defaults;
use crate::infrastructure::http_client::{Document, FetchOutcome, PageFetcher};

/// Randomized delay inserted before each fetch launch after the first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl Jitter {
    pub fn new(min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            min_delay_ms: min_delay_ms.min(max_delay_ms),
            max_delay_ms,
        }
    }

    /// Delays drawn from `[max / 2, max]`. No ceiling, or a zero one, means no jitter.
    pub fn from_max_delay(max_delay_ms: Option<u64>) -> Option<Self> {
        match max_delay_ms {
            Some(max) if max > 0 => Some(Self::new(max / 2, max)),
            _ => None,
        }
    }

    pub const fn min_delay_ms(&self) -> u64 {
        self.min_delay_ms
    }

    pub const fn max_delay_ms(&self) -> u64 {
        self.max_delay_ms
    }

    /// One uniformly drawn launch delay
    pub fn sample(&self) -> Duration {
        Duration::from_millis(fastrand::u64(self.min_delay_ms..=self.max_delay_ms))
    }
}

/// Bounded-parallelism executor for one batch at a time
#[derive(Debug, Clone)]
pub struct BatchRunner {
    max_workers: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(defaults::MAX_WORKERS)
    }
}

impl BatchRunner {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Fetch every URL with at most `max_workers` requests in flight.
    ///
    /// Slot `i` of the result holds the outcome for `urls[i]`. A failed or
    /// panicked fetch leaves its slot `None` and never affects the others.
    pub async fn run_fetches<F>(&self, fetcher: Arc<F>, urls: &[String], jitter: Option<Jitter>) -> Vec<FetchOutcome>
    where
        F: PageFetcher + ?Sized + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::with_capacity(urls.len());

        for (slot, url) in urls.iter().enumerate() {
            if slot > 0 {
                if let Some(jitter) = jitter {
                    let delay = jitter.sample();
                    debug!("Waiting {:?} before launching slot {}", delay, slot);
                    sleep(delay).await;
                }
            }

            let semaphore = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&fetcher);
            let url = url.clone();
            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return None;
                };
                debug!(slot, "Fetching {}", url);
                fetcher.fetch(&url).await
            }));
        }

        let mut outcomes: Vec<FetchOutcome> = vec![None; urls.len()];
        for (slot, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(outcome) => outcomes[slot] = outcome,
                Err(e) => error!("Fetch task for slot {} ({}) failed: {}", slot, urls[slot], e),
            }
        }

        debug_assert_eq!(outcomes.len(), urls.len());
        outcomes
    }

    /// Apply `extract` to every fetched document on a per-batch thread pool.
    ///
    /// Slot `i` is `None` when `docs[i]` is absent or its extraction panicked.
    pub async fn run_extractions<T, E>(&self, docs: Vec<FetchOutcome>, extract: E) -> Vec<Option<T>>
    where
        T: Send + 'static,
        E: Fn(&Html) -> T + Send + Sync + 'static,
    {
        let len = docs.len();
        let max_workers = self.max_workers;

        let outcomes = tokio::task::spawn_blocking(move || {
            with_parse_pool(max_workers, || extract_slots(&docs, &extract))
        })
        .await;

        match outcomes {
            Ok(outcomes) => {
                debug_assert_eq!(outcomes.len(), len);
                outcomes
            }
            Err(e) => {
                error!("Extraction batch failed: {}", e);
                (0..len).map(|_| None).collect()
            }
        }
    }

    /// Run two independent extractions over the same documents side by side.
    ///
    /// Slot `i` is `Some((a, b))` only when both extractions produced a value.
    pub async fn run_extraction_pair<A, B, FA, FB>(
        &self,
        docs: Vec<FetchOutcome>,
        first: FA,
        second: FB,
    ) -> Vec<Option<(A, B)>>
    where
        A: Send + 'static,
        B: Send + 'static,
        FA: Fn(&Html) -> A + Send + Sync + 'static,
        FB: Fn(&Html) -> B + Send + Sync + 'static,
    {
        let len = docs.len();
        let max_workers = self.max_workers;

        let outcomes = tokio::task::spawn_blocking(move || {
            let (firsts, seconds) = with_parse_pool(max_workers, || {
                rayon::join(|| extract_slots(&docs, &first), || extract_slots(&docs, &second))
            });
            firsts
                .into_iter()
                .zip(seconds)
                .map(|(a, b)| a.zip(b))
                .collect::<Vec<_>>()
        })
        .await;

        match outcomes {
            Ok(outcomes) => {
                debug_assert_eq!(outcomes.len(), len);
                outcomes
            }
            Err(e) => {
                error!("Extraction batch failed: {}", e);
                (0..len).map(|_| None).collect()
            }
        }
    }
}

/// Run `work` on a rayon pool that lives for this call only
fn with_parse_pool<R, W>(max_workers: usize, work: W) -> R
where
    R: Send,
    W: FnOnce() -> R + Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .thread_name(|i| format!("parse-worker-{i}"))
        .build()
    {
        Ok(pool) => pool.install(work),
        Err(e) => {
            warn!("Failed to build parse pool, extracting on the blocking thread: {}", e);
            work()
        }
    }
}

fn extract_slots<T, E>(docs: &[FetchOutcome], extract: &E) -> Vec<Option<T>>
where
    T: Send,
    E: Fn(&Html) -> T + Sync,
{
    docs.par_iter()
        .map(|outcome| outcome.as_ref().and_then(|doc| extract_one(doc, extract)))
        .collect()
}

fn extract_one<T, E>(doc: &Document, extract: &E) -> Option<T>
where
    E: Fn(&Html) -> T,
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let html = Html::parse_document(&doc.html);
        extract(&html)
    }));

    match result {
        Ok(value) => Some(value),
        Err(_) => {
            error!("Extraction panicked for {}", doc.url);
            None
        }
    }
}
