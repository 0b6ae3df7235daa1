//! Repository interfaces for tracked product records
//!
//! The extraction engine never persists anything itself; callers read records
//! from a store before an update and write the refreshed batch back afterwards.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::product::ProductRecord;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, most discounted first
    async fn get_all(&self) -> Result<Vec<ProductRecord>>;

    async fn contains_url(&self, url: &str) -> Result<bool>;

    /// Inserts a new record; returns `false` if its url is already stored
    async fn insert(&self, record: &ProductRecord) -> Result<bool>;

    /// Overwrites records that are still stored, matched by url, and stamps the
    /// refresh time. Urls removed in the meantime are not brought back.
    async fn update_all(&self, records: &[ProductRecord], refreshed_at: DateTime<Utc>) -> Result<()>;

    /// Returns `true` if a record was removed
    async fn delete_by_url(&self, url: &str) -> Result<bool>;

    /// Removes every record and stamps the refresh time
    async fn clear_all(&self) -> Result<()>;

    async fn last_refreshed_at(&self) -> Result<Option<DateTime<Utc>>>;
}
