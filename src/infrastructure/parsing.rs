//! HTML parsing for product pages
//!
//! Selector configuration, numeric price parsing and the field extractor used
//! by the batch runner's parse phase.

pub mod config;
pub mod price_parser;
pub mod product_page_parser;

pub use config::SelectorConfig;
pub use price_parser::parse_price;
pub use product_page_parser::{ExtractionOutcome, FieldExtractor};
