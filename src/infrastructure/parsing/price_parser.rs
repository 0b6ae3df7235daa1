//! Numeric price parsing
//!
//! Accepted shapes are `XY Z`, `XY.Z` and `XY,Z`, where X is any currency
//! marker, Y the integer part and Z the fractional part. The first
//! `digits separator digits` group is taken as the price in minor units.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

lazy_static! {
    static ref PRICE_PATTERN: Regex =
        Regex::new(r"[0-9]+[.,\s][0-9]+").expect("price pattern is a valid regex");
    static ref SEPARATORS: Regex = Regex::new(r"[.,\s]").expect("separator pattern is a valid regex");
}

/// Minor units per currency unit
const MINOR_UNIT_SCALE: u32 = 2;

/// Parses the first `digits separator digits` group in `text` as a price.
///
/// Separators are stripped and the digits read as hundredths, so `"42.00"` is
/// 42.00. Only one separator is consumed: `"1.234,56"` matches `"1.234"` and
/// reads as 12.34. Text with no separator group, or a digit run that overflows
/// `i64`, yields `None`.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let matched = PRICE_PATTERN.find(text)?;
    let digits = SEPARATORS.replace_all(matched.as_str(), "");
    let minor_units: i64 = digits.parse().ok()?;
    Some(Decimal::new(minor_units, MINOR_UNIT_SCALE))
}
