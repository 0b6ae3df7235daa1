//! Field extraction for product pages
//!
//! Price and title are located through ordered selector groups: the deal price
//! group is tried before the regular price group, and the first group with a
//! matching element decides. Both extractions are pure functions of the page.

#![allow(clippy::uninlined_format_args)]

use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::SelectorConfig;
use super::price_parser::parse_price;
use crate::domain::product::ProductRecord;
use crate::infrastructure::parsing_error::{EngineError, EngineResult};

/// Title and price pulled from one fetched page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub title: Option<String>,
    pub price: Option<Decimal>,
}

impl ExtractionOutcome {
    /// First observation of the page at `url`; there is no previous price yet
    pub fn into_record(self, url: impl Into<String>) -> ProductRecord {
        ProductRecord::new(self.title, self.price, url)
    }
}

/// Extracts product fields with compiled, prioritized selector groups
pub struct FieldExtractor {
    /// Tried in order; the first group that matches an element wins
    price_rules: Vec<Selector>,
    title_rule: Selector,
}

impl FieldExtractor {
    /// Create an extractor with the default product page selectors
    pub fn new() -> EngineResult<Self> {
        Self::with_config(&SelectorConfig::default())
    }

    /// Create an extractor with custom selector configuration
    pub fn with_config(selectors: &SelectorConfig) -> EngineResult<Self> {
        Ok(Self {
            price_rules: vec![
                Self::compile_group("deal_price", &selectors.deal_price)?,
                Self::compile_group("regular_price", &selectors.regular_price)?,
            ],
            title_rule: Self::compile_group("title", &selectors.title)?,
        })
    }

    /// Compile selector strings into one selector group, skipping invalid entries
    fn compile_group(field: &str, selector_strings: &[String]) -> EngineResult<Selector> {
        let valid: Vec<&str> = selector_strings
            .iter()
            .map(String::as_str)
            .filter(|candidate| match Selector::parse(candidate) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Failed to compile {} selector '{}': {}", field, candidate, e);
                    false
                }
            })
            .collect();

        if valid.is_empty() {
            return Err(EngineError::invalid_selector(field, selector_strings));
        }

        Selector::parse(&valid.join(", "))
            .map_err(|_| EngineError::invalid_selector(field, selector_strings))
    }

    /// Price from the first matching group, or `None` when no group matches
    /// or the matched text holds no parseable amount.
    pub fn extract_price(&self, document: Option<&Html>) -> Option<Decimal> {
        let document = document?;
        let (rule_index, element) = self
            .price_rules
            .iter()
            .enumerate()
            .find_map(|(i, rule)| document.select(rule).next().map(|el| (i, el)))?;

        let text = rendered_text(element);
        let price = parse_price(&text);
        debug!("Price rule {} matched '{}' -> {:?}", rule_index, text, price);
        price
    }

    /// Rendered text of the first title element; a blank title is absent
    pub fn extract_title(&self, document: Option<&Html>) -> Option<String> {
        let element = document?.select(&self.title_rule).next()?;
        Some(rendered_text(element)).filter(|title| !title.is_empty())
    }
}

/// Element text with whitespace runs collapsed, as a browser renders it.
///
/// Text nodes are joined as-is first, so adjacent inline elements do not gain
/// a separating space.
fn rendered_text(element: ElementRef<'_>) -> String {
    let joined: String = element.text().collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Html {
        Html::parse_document(&format!("<!DOCTYPE html><html><body>{}</body></html>", body))
    }

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    #[test]
    fn test_extractor_creation() {
        assert!(FieldExtractor::new().is_ok());
    }

    #[test]
    fn regular_price_used_when_no_deal() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(r#"<span id="priceblock_ourprice">EUR 24,90</span>"#);
        assert_eq!(extractor.extract_price(Some(&doc)), Some(dec("24.90")));
    }

    #[test]
    fn deal_price_wins_over_regular_price() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(
            r#"<span id="priceblock_ourprice">EUR 24,90</span>
               <span id="priceblock_dealprice">EUR 19,99</span>"#,
        );
        assert_eq!(extractor.extract_price(Some(&doc)), Some(dec("19.99")));
    }

    #[test]
    fn first_element_in_document_order_wins_within_group() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(
            r#"<span class="a-size-large a-color-result guild_priceblock_ourprice">$ 5.00</span>
               <span id="priceblock_ourprice">$ 9.00</span>"#,
        );
        assert_eq!(extractor.extract_price(Some(&doc)), Some(dec("5.00")));
    }

    #[test]
    fn sale_price_block_needs_its_classes_for_deal_group() {
        let extractor = FieldExtractor::new().unwrap();
        // Without the classes it still matches the regular `saleprice` rule.
        let doc = page(r#"<span id="priceblock_saleprice">12.30</span>"#);
        assert_eq!(extractor.extract_price(Some(&doc)), Some(dec("12.30")));
    }

    #[test]
    fn matched_element_without_amount_is_absent() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(
            r#"<span id="priceblock_dealprice">Currently unavailable</span>
               <span id="priceblock_ourprice">EUR 24,90</span>"#,
        );
        // The deal group matched, so the regular price is not consulted.
        assert_eq!(extractor.extract_price(Some(&doc)), None);
    }

    #[test]
    fn no_selector_match_is_absent() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(r#"<div class="price">EUR 24,90</div>"#);
        assert_eq!(extractor.extract_price(Some(&doc)), None);
        assert_eq!(extractor.extract_title(Some(&doc)), None);
    }

    #[test]
    fn absent_document_yields_absent_fields() {
        let extractor = FieldExtractor::new().unwrap();
        assert_eq!(extractor.extract_price(None), None);
        assert_eq!(extractor.extract_title(None), None);
    }

    #[test]
    fn title_text_is_collapsed() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(
            r#"<span id="productTitle">
                    Samsung   UE55NU7370
                    Smart TV
               </span>"#,
        );
        assert_eq!(
            extractor.extract_title(Some(&doc)).as_deref(),
            Some("Samsung UE55NU7370 Smart TV")
        );
    }

    #[test]
    fn ebook_title_selector() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(r#"<span id="ebooksProductTitle">Death <b>Song</b></span>"#);
        assert_eq!(extractor.extract_title(Some(&doc)).as_deref(), Some("Death Song"));
    }

    #[test]
    fn price_split_across_inline_elements() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(r#"<span id="priceblock_ourprice">$<span>19</span>.<span>99</span></span>"#);
        assert_eq!(extractor.extract_price(Some(&doc)), Some(dec("19.99")));
    }

    #[test]
    fn adjacent_inline_title_parts_stay_joined() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(r#"<span id="productTitle">Death<b>Song</b></span>"#);
        assert_eq!(extractor.extract_title(Some(&doc)).as_deref(), Some("DeathSong"));
    }

    #[test]
    fn blank_title_is_absent() {
        let extractor = FieldExtractor::new().unwrap();
        let doc = page(r#"<span id="productTitle">   </span>"#);
        assert_eq!(extractor.extract_title(Some(&doc)), None);
    }

    #[test]
    fn outcome_becomes_first_observation() {
        let outcome = ExtractionOutcome {
            title: Some("Lamp".to_string()),
            price: Some(dec("42.00")),
        };
        let record = outcome.into_record("https://shop/lamp");
        assert_eq!(record.title.as_deref(), Some("Lamp"));
        assert_eq!(record.current_price, Some(dec("42.00")));
        assert_eq!(record.previous_price, None);
        assert_eq!(record.url, "https://shop/lamp");
    }

    #[test]
    fn invalid_selectors_are_skipped() {
        let config = SelectorConfig {
            title: vec!["[[broken".to_string(), "h1".to_string()],
            ..SelectorConfig::default()
        };
        let extractor = FieldExtractor::with_config(&config).unwrap();
        let doc = page("<h1>Plain title</h1>");
        assert_eq!(extractor.extract_title(Some(&doc)).as_deref(), Some("Plain title"));
    }

    #[test]
    fn all_invalid_selectors_are_rejected() {
        let config = SelectorConfig {
            regular_price: vec!["[[broken".to_string()],
            ..SelectorConfig::default()
        };
        assert!(matches!(
            FieldExtractor::with_config(&config),
            Err(EngineError::InvalidSelector { .. })
        ));
    }
}
