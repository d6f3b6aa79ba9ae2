//! Trip listing extraction: table location, row and cabin parsing,
//! normalization, dedup, and the page sources that supply the HTML.

pub mod catalog;
pub mod client;
pub mod models;
pub mod parser;
pub mod selectors;
pub mod text;

pub use catalog::{dedup_and_sort, TripCatalog};
pub use client::{HttpPageSource, PageSource};
pub use models::{AvailabilityReport, Cabin, DateWindow, Trip};
pub use parser::{locate_results_table, Parser};
pub use text::AvailabilityPolicy;
