//! Parsing configuration for product page extraction
//!
//! Centralized CSS selectors, tuned to a single product page family. Within
//! each list the first element in document order matching any selector wins.

use serde::{Deserialize, Serialize};

/// CSS selectors for product pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectorConfig {
    /// Price shown while a deal or sale is running; checked first
    pub deal_price: Vec<String>,

    /// Regular/current price; used when no deal price is present
    pub regular_price: Vec<String>,

    /// Product title
    pub title: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            deal_price: vec![
                "span[id*=dealprice]".to_string(),
                "span[id=priceblock_saleprice].a-size-medium.a-color-price".to_string(),
                "td.a-color-price.a-size-medium.a-align-bottom".to_string(),
            ],
            regular_price: vec![
                "span[id*=ourprice]".to_string(),
                "span[id*=saleprice]".to_string(),
                "span.a-size-large.a-color-result.guild_priceblock_ourprice".to_string(),
                "span.a-size-medium.a-color-price.offer-price.a-text-normal".to_string(),
            ],
            title: vec![
                "span[id=ebooksProductTitle]".to_string(),
                "span[id=productTitle]".to_string(),
            ],
        }
    }
}
