//! CSS selectors and header markers for availability tables.
//!
//! Only `TABLE` is matched with a selector across the whole document. Rows and
//! cells are walked as direct children so that a nested cabin table never
//! leaks its rows or headers into the trip table that owns it.
//!
//! **Update process**: When parsing fails, capture an HTML sample,
//! adjust the markers below, and add a test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Any table in the document, nested ones included.
pub static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());

/// Elements that group rows directly under a table.
pub const ROW_GROUPS: [&str; 3] = ["thead", "tbody", "tfoot"];

/// Header markers the results table must carry (lowercase substrings).
pub mod results {
    pub const REQUIRED: [&str; 2] = ["depart", "return"];

    /// Markers of the preferred candidate when several tables qualify.
    pub const PREFERRED: [&str; 2] = ["price", "avail"];
}

/// Header marker of a nested cabin breakdown table.
pub mod cabins {
    pub const MARKER: &str = "cabin type";

    /// Minimum cells for a cabin row.
    pub const MIN_CELLS: usize = 2;
}

/// Header synonyms used to map trip columns by name.
pub mod columns {
    pub const EXPEDITION: [&str; 4] = ["expedition", "trip", "itinerary", "voyage"];
    pub const DEPARTS: [&str; 1] = ["depart"];
    pub const RETURNS: [&str; 1] = ["return"];
    pub const PRICE: [&str; 3] = ["price", "cost", "fare"];
    pub const AVAILABILITY: [&str; 3] = ["avail", "status", "spaces"];

    /// Minimum cells for a trip row.
    pub const MIN_CELLS: usize = 4;
}
