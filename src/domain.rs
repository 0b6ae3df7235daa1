//! Domain module - product records and repository contracts
//!
//! Each module is its own file in the domain/ directory; public exports are
//! defined here for convenience.

pub mod product;
pub mod repositories;

pub use product::{BatchReport, ProductRecord};
pub use repositories::RecordStore;
