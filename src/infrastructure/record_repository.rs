//! Record store implementations
//!
//! `SqliteRecordStore` persists tracked products with sqlx; `MemoryRecordStore`
//! keeps them in process for tests and one-shot runs. Both order `get_all` by
//! discount and own the last-refresh timestamp.

use std::cmp::Ordering;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;

use crate::domain::product::ProductRecord;
use crate::domain::repositories::RecordStore;
use crate::infrastructure::database_connection::DatabaseConnection;

const LAST_REFRESHED_KEY: &str = "last_refreshed_at";

/// Stable sort: largest price drop first, records missing a price last
fn order_by_discount(records: &mut [ProductRecord]) {
    let change = |record: &ProductRecord| -> Option<Decimal> {
        Some(record.current_price? - record.previous_price?)
    };
    records.sort_by(|a, b| match (change(a), change(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[derive(Default)]
struct MemoryState {
    records: Vec<ProductRecord>,
    last_refreshed_at: Option<DateTime<Utc>>,
}

/// In-process record store
#[derive(Default)]
pub struct MemoryRecordStore {
    state: RwLock<MemoryState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ProductRecord>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                records,
                last_refreshed_at: None,
            }),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_all(&self) -> Result<Vec<ProductRecord>> {
        let mut records = self.state.read().await.records.clone();
        order_by_discount(&mut records);
        Ok(records)
    }

    async fn contains_url(&self, url: &str) -> Result<bool> {
        Ok(self.state.read().await.records.iter().any(|r| r.url == url))
    }

    async fn insert(&self, record: &ProductRecord) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.records.iter().any(|r| r.url == record.url) {
            return Ok(false);
        }
        state.records.push(record.clone());
        Ok(true)
    }

    async fn update_all(&self, records: &[ProductRecord], refreshed_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.write().await;
        for record in records {
            if let Some(existing) = state.records.iter_mut().find(|r| r.url == record.url) {
                *existing = record.clone();
            }
        }
        state.last_refreshed_at = Some(refreshed_at);
        Ok(())
    }

    async fn delete_by_url(&self, url: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.records.len();
        state.records.retain(|r| r.url != url);
        Ok(state.records.len() != before)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.records.clear();
        state.last_refreshed_at = Some(Utc::now());
        Ok(())
    }

    async fn last_refreshed_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.state.read().await.last_refreshed_at)
    }
}

/// SQLite implementation of RecordStore
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database and create the schema if needed
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = DatabaseConnection::new(database_url).await?;
        db.migrate().await?;
        Ok(Self::new(db.pool().clone()))
    }

    fn parse_price(raw: Option<String>, column: &str) -> Result<Option<Decimal>> {
        raw.map(|text| {
            text.parse::<Decimal>()
                .map_err(|e| anyhow!("Failed to parse {} '{}': {}", column, text, e))
        })
        .transpose()
    }

    /// Helper method to convert database row to ProductRecord
    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ProductRecord> {
        Ok(ProductRecord::with_history(
            row.try_get("title")?,
            Self::parse_price(row.try_get("current_price")?, "current_price")?,
            Self::parse_price(row.try_get("previous_price")?, "previous_price")?,
            row.try_get::<String, _>("url")?,
        ))
    }

    async fn stamp_refresh<'e, E>(executor: E, at: DateTime<Utc>) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r"
            INSERT INTO store_meta (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(LAST_REFRESHED_KEY)
        .bind(at.to_rfc3339())
        .execute(executor)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get_all(&self) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r"
            SELECT url, title, current_price, previous_price
            FROM tracked_products
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = rows.iter().map(Self::row_to_record).collect::<Result<Vec<_>>>()?;
        order_by_discount(&mut records);
        Ok(records)
    }

    async fn contains_url(&self, url: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracked_products WHERE url = ?")
            .bind(url)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, record: &ProductRecord) -> Result<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO tracked_products (url, title, current_price, previous_price)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            ",
        )
        .bind(&record.url)
        .bind(&record.title)
        .bind(record.current_price.map(|p| p.to_string()))
        .bind(record.previous_price.map(|p| p.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_all(&self, records: &[ProductRecord], refreshed_at: DateTime<Utc>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r"
                UPDATE tracked_products
                SET title = ?, current_price = ?, previous_price = ?
                WHERE url = ?
                ",
            )
            .bind(&record.title)
            .bind(record.current_price.map(|p| p.to_string()))
            .bind(record.previous_price.map(|p| p.to_string()))
            .bind(&record.url)
            .execute(&mut *tx)
            .await?;
        }

        Self::stamp_refresh(&mut *tx, refreshed_at).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_by_url(&self, url: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tracked_products WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tracked_products").execute(&mut *tx).await?;
        Self::stamp_refresh(&mut *tx, Utc::now()).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn last_refreshed_at(&self) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?")
            .bind(LAST_REFRESHED_KEY)
            .fetch_optional(&self.pool)
            .await?;

        value
            .map(|text| {
                DateTime::parse_from_rfc3339(&text)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|e| anyhow!("Failed to parse {}: {}", LAST_REFRESHED_KEY, e))
            })
            .transpose()
    }
}
