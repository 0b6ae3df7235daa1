//! Product records and batch results exchanged with the extraction engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tracked product page and the last two prices observed on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub title: Option<String>,
    pub current_price: Option<Decimal>,
    pub previous_price: Option<Decimal>,
    /// Unique key of the record
    pub url: String,
}

impl ProductRecord {
    /// Creates a freshly looked-up record with no price history
    pub fn new(title: Option<String>, current_price: Option<Decimal>, url: impl Into<String>) -> Self {
        Self {
            title,
            current_price,
            previous_price: None,
            url: url.into(),
        }
    }

    /// Restores a record with its full price history (e.g. from a store)
    pub fn with_history(
        title: Option<String>,
        current_price: Option<Decimal>,
        previous_price: Option<Decimal>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title,
            current_price,
            previous_price,
            url: url.into(),
        }
    }

    /// Shifts the current price into `previous_price` and records `new_price`.
    ///
    /// `new_price` may be absent; the record then keeps an unrelated previous
    /// price and no current one. Title and url are never touched.
    #[must_use]
    pub fn shift_price(mut self, new_price: Option<Decimal>) -> Self {
        self.previous_price = self.current_price;
        self.current_price = new_price;
        self
    }

    /// True when both prices are known and the current one is lower
    pub fn is_on_sale(&self) -> bool {
        matches!(
            (self.current_price, self.previous_price),
            (Some(current), Some(previous)) if current < previous
        )
    }

    /// Amount the price dropped since the previous observation (negative if it rose)
    pub fn discount(&self) -> Option<Decimal> {
        Some(self.previous_price? - self.current_price?)
    }
}

/// Result of one lookup or update batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Index-aligned with the batch input; `None` marks a failed fetch
    pub records: Vec<Option<ProductRecord>>,
    /// When the batch finished
    pub completed_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn new(records: Vec<Option<ProductRecord>>) -> Self {
        Self {
            records,
            completed_at: Utc::now(),
        }
    }

    /// A batch is complete when no slot is absent
    pub fn is_complete(&self) -> bool {
        self.records.iter().all(Option::is_some)
    }

    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|slot| slot.is_none()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unwraps every slot, or returns `None` if any slot failed
    pub fn into_complete_records(self) -> Option<Vec<ProductRecord>> {
        self.records.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn price(units: i64) -> Decimal {
        Decimal::new(units * 100, 2)
    }

    #[test]
    fn shift_price_moves_current_into_previous() {
        let record = ProductRecord::new(
            Some("Item example title".to_string()),
            Some(price(100)),
            "https://example.com/itemexample",
        );

        let updated = record.shift_price(Some(price(50)));

        assert_eq!(updated.current_price, Some(price(50)));
        assert_eq!(updated.previous_price, Some(price(100)));
        assert_eq!(updated.title.as_deref(), Some("Item example title"));
        assert_eq!(updated.url, "https://example.com/itemexample");
    }

    #[test]
    fn shift_to_absent_price_keeps_previous() {
        let record = ProductRecord::new(None, Some(price(20)), "u");
        let updated = record.shift_price(None);
        assert_eq!(updated.current_price, None);
        assert_eq!(updated.previous_price, Some(price(20)));
        assert!(!updated.is_on_sale());
    }

    #[test]
    fn on_sale_requires_both_prices_and_a_drop() {
        let fresh = ProductRecord::new(None, Some(price(10)), "u");
        assert!(!fresh.is_on_sale());

        let dropped = ProductRecord::with_history(None, Some(price(8)), Some(price(10)), "u");
        assert!(dropped.is_on_sale());
        assert_eq!(dropped.discount(), Some(price(2)));

        let raised = ProductRecord::with_history(None, Some(price(12)), Some(price(10)), "u");
        assert!(!raised.is_on_sale());
        assert_eq!(raised.discount(), Some(price(-2)));
    }

    #[test]
    fn batch_report_completeness() {
        let report = BatchReport::new(vec![Some(ProductRecord::new(None, None, "a")), None]);
        assert!(!report.is_complete());
        assert_eq!(report.failed_count(), 1);
        assert!(report.into_complete_records().is_none());

        let report = BatchReport::new(vec![Some(ProductRecord::new(None, None, "a"))]);
        assert!(report.is_complete());
        assert_eq!(report.into_complete_records().map(|r| r.len()), Some(1));
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = ProductRecord::with_history(
            Some("Lamp".into()),
            Some(Decimal::new(1999, 2)),
            None,
            "https://shop.example/lamp",
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["currentPrice"], "19.99");
        assert!(json["previousPrice"].is_null());
        assert_eq!(json["url"], "https://shop.example/lamp");
    }
}
