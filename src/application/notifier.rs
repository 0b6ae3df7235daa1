//! Notification seam for refresh results

use async_trait::async_trait;
use tracing::info;

use crate::domain::product::ProductRecord;

/// Receives the items on sale after a refresh
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_items_on_sale(&self, items: &[ProductRecord]);
}

/// Writes the sale summary to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_items_on_sale(&self, items: &[ProductRecord]) {
        info!("🏷️ {} item(s) on sale", items.len());
        for item in items {
            info!(
                url = %item.url,
                "  {} : {} -> {}",
                item.title.as_deref().unwrap_or("(untitled)"),
                display_price(item.previous_price),
                display_price(item.current_price),
            );
        }
    }
}

fn display_price(price: Option<rust_decimal::Decimal>) -> String {
    price.map_or_else(|| "-".to_string(), |p| p.to_string())
}
