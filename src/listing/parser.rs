//! HTML parser for availability result tables.

use crate::listing::catalog::TripCatalog;
use crate::listing::models::{Cabin, DateWindow, Trip};
use crate::listing::selectors::{self, cabins, columns, results};
use crate::listing::text::{self, AvailabilityPolicy};
use scraper::{ElementRef, Html};
use tracing::{debug, trace};

/// Parser for trip listing tables.
pub struct Parser {
    window: DateWindow,
    availability: AvailabilityPolicy,
}

impl Parser {
    /// Creates a parser keeping trips that depart within `window`.
    pub fn new(window: DateWindow) -> Self {
        Self { window, availability: AvailabilityPolicy::default() }
    }

    /// Sets how availability labels are normalized.
    pub fn with_availability(mut self, policy: AvailabilityPolicy) -> Self {
        self.availability = policy;
        self
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Parses a document or fragment into deduplicated trips sorted by
    /// departure. A page without a results table yields no trips.
    pub fn parse_trips(&self, html: &str) -> Vec<Trip> {
        let document = Html::parse_document(html);

        let Some(table) = locate_results_table(&document) else {
            debug!("No results table found");
            return Vec::new();
        };

        self.parse_table(table)
    }

    /// Parses the rows of an already located results table.
    pub fn parse_table(&self, table: ElementRef) -> Vec<Trip> {
        let map = ColumnMap::from_headers(&header_row(table));
        trace!("Column map: {:?}", map);

        let mut catalog = TripCatalog::new();
        let mut rows = 0;

        for row in own_rows(table) {
            if !has_data_cells(row) {
                continue;
            }
            rows += 1;

            if let Some(trip) = self.parse_row(row, &map) {
                trace!("Parsed trip: {:?} departing {:?}", trip.expedition, trip.departs);
                catalog.insert(trip);
            }
        }

        debug!("Parsed {} trips from {} rows (window {})", catalog.len(), rows, self.window);

        catalog.into_sorted()
    }

    /// Parses a single trip row. Returns None for rows that do not describe a
    /// bookable departure inside the window.
    fn parse_row(&self, row: ElementRef, map: &ColumnMap) -> Option<Trip> {
        // The detail block belongs to the row above it
        if cabin_table(row).is_some() {
            return None;
        }

        let row_text = element_text(row);
        if text::is_sold_out(&row_text) {
            trace!("Skipping sold out row: {}", row_text);
            return None;
        }

        let cells: Vec<String> = cells(row).map(element_text).collect();
        if cells.len() < columns::MIN_CELLS {
            trace!("Skipping row with {} cells: {}", cells.len(), row_text);
            return None;
        }

        let Some(departs) = text::parse_date(map.departs(&cells), self.window.start()) else {
            trace!("Skipping row without departure date: {}", row_text);
            return None;
        };

        if !self.window.contains(departs) {
            trace!("Skipping departure {} outside window", departs);
            return None;
        }

        let expedition = Some(map.expedition(&cells))
            .filter(|name| !name.is_empty())
            .map(String::from);

        let cabins = next_row(row).and_then(cabin_table).map(parse_cabins).unwrap_or_default();

        Some(Trip {
            expedition,
            departs: Some(departs),
            returns: text::parse_date(map.returns(&cells), departs),
            price_from_aud: text::parse_money(map.price(&cells)),
            availability: map.availability(&cells).and_then(|a| self.availability.apply(a)),
            cabins,
        })
    }
}

/// Finds the results table: the first whose own header cells mention both
/// "depart" and "return", preferring one that also mentions "price" and
/// "avail".
pub fn locate_results_table(document: &Html) -> Option<ElementRef<'_>> {
    let mut fallback = None;

    for table in document.select(&selectors::TABLE) {
        let headers = header_text(table);

        if !results::REQUIRED.iter().all(|marker| headers.contains(marker)) {
            continue;
        }

        if results::PREFERRED.iter().all(|marker| headers.contains(marker)) {
            return Some(table);
        }

        fallback.get_or_insert(table);
    }

    fallback
}

/// Maps trip fields to cell indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    expedition: usize,
    departs: usize,
    returns: usize,
    price: usize,
    availability: usize,
}

impl ColumnMap {
    const POSITIONAL: ColumnMap =
        ColumnMap { expedition: 0, departs: 1, returns: 2, price: 3, availability: 4 };

    /// Builds the map from header labels by synonym. Fields no header names
    /// take their positional column if it is still free, otherwise the first
    /// free column.
    fn from_headers(headers: &[String]) -> Self {
        if headers.is_empty() {
            return Self::POSITIONAL;
        }

        let headers: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let mut claimed = vec![false; headers.len()];

        // Most specific markers claim their column first
        let synonyms: [&[&str]; 5] = [
            &columns::DEPARTS,
            &columns::RETURNS,
            &columns::PRICE,
            &columns::AVAILABILITY,
            &columns::EXPEDITION,
        ];
        let positional = [
            Self::POSITIONAL.departs,
            Self::POSITIONAL.returns,
            Self::POSITIONAL.price,
            Self::POSITIONAL.availability,
            Self::POSITIONAL.expedition,
        ];

        let mut named = [None; 5];
        for (slot, synonyms) in named.iter_mut().zip(synonyms) {
            *slot = headers
                .iter()
                .enumerate()
                .position(|(i, header)| !claimed[i] && synonyms.iter().any(|s| header.contains(s)));

            if let Some(i) = *slot {
                claimed[i] = true;
            }
        }

        let mut resolved = positional;
        for (slot, found) in resolved.iter_mut().zip(named) {
            let index = match found {
                Some(i) => i,
                None => match claimed.get(*slot) {
                    Some(&true) => claimed.iter().position(|c| !c).unwrap_or(*slot),
                    _ => *slot,
                },
            };

            if let Some(c) = claimed.get_mut(index) {
                *c = true;
            }
            *slot = index;
        }

        let [departs, returns, price, availability, expedition] = resolved;
        Self { expedition, departs, returns, price, availability }
    }

    fn expedition<'c>(&self, cells: &'c [String]) -> &'c str {
        cell(cells, self.expedition)
    }

    fn departs<'c>(&self, cells: &'c [String]) -> &'c str {
        cell(cells, self.departs)
    }

    fn returns<'c>(&self, cells: &'c [String]) -> &'c str {
        cell(cells, self.returns)
    }

    fn price<'c>(&self, cells: &'c [String]) -> &'c str {
        cell(cells, self.price)
    }

    fn availability<'c>(&self, cells: &'c [String]) -> Option<&'c str> {
        cells.get(self.availability).map(String::as_str)
    }
}

fn cell(cells: &[String], index: usize) -> &str {
    cells.get(index).map(String::as_str).unwrap_or("")
}

/// Parses the body rows of a nested cabin table.
fn parse_cabins(table: ElementRef) -> Vec<Cabin> {
    let cabins: Vec<Cabin> = own_rows(table).into_iter().filter_map(parse_cabin_row).collect();
    trace!("Parsed {} cabins", cabins.len());
    cabins
}

fn parse_cabin_row(row: ElementRef) -> Option<Cabin> {
    if !has_data_cells(row) {
        return None;
    }

    let cells: Vec<String> = cells(row).map(element_text).collect();
    if cells.len() < cabins::MIN_CELLS || cells.iter().any(|c| text::is_sold_out(c)) {
        return None;
    }

    let (cabin_type, rest) = cells.split_first()?;
    if cabin_type.is_empty() {
        return None;
    }

    let berths = rest.iter().enumerate().find_map(|(i, c)| text::parse_berths(c).map(|b| (i, b)));
    let berths_cell = berths.map(|(i, _)| i);

    // The berth count would otherwise read as a price
    let price_aud = rest
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != berths_cell)
        .find_map(|(_, c)| text::parse_money(c));

    Some(Cabin { cabin_type: cabin_type.clone(), berths_left: berths.map(|(_, b)| b), price_aud })
}

/// Rows that belong to this table, skipping those of nested tables.
fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();

    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            name if selectors::ROW_GROUPS.contains(&name) => rows.extend(
                child.children().filter_map(ElementRef::wrap).filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }

    rows
}

/// Direct `td`/`th` cells of a row.
fn cells<'a>(row: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    row.children().filter_map(ElementRef::wrap).filter(|e| matches!(e.value().name(), "td" | "th"))
}

fn has_data_cells(row: ElementRef) -> bool {
    cells(row).any(|c| c.value().name() == "td")
}

/// Labels of the first header-only row.
fn header_row(table: ElementRef) -> Vec<String> {
    own_rows(table)
        .into_iter()
        .find(|row| !has_data_cells(*row) && cells(*row).next().is_some())
        .map(|row| cells(row).map(element_text).collect())
        .unwrap_or_default()
}

/// Lowercased text of every header cell the table owns.
fn header_text(table: ElementRef) -> String {
    own_rows(table)
        .into_iter()
        .flat_map(cells)
        .filter(|c| c.value().name() == "th")
        .map(element_text)
        .collect::<Vec<_>>()
        .join(" | ")
        .to_lowercase()
}

/// The nested cabin table held by a detail row, if any.
fn cabin_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.select(&selectors::TABLE).find(|table| header_text(*table).contains(cabins::MARKER))
}

/// The immediately following sibling row.
fn next_row(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.next_siblings().filter_map(ElementRef::wrap).next().filter(|e| e.value().name() == "tr")
}

fn element_text(element: ElementRef) -> String {
    text::clean(&element.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "<tr><th>Expedition</th><th>Departs</th><th>Returns</th>\
                          <th>Price From (AUD)</th><th>Availability</th></tr>";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window_2025() -> DateWindow {
        DateWindow::new(date(2025, 1, 1), date(2025, 12, 31)).unwrap()
    }

    fn row(cells: &[&str]) -> String {
        let cells: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
        format!("<tr>{}</tr>", cells)
    }

    fn cabin_block(rows: &[&[&str]]) -> String {
        let body: String = rows.iter().map(|r| row(r)).collect();
        format!(
            "<tr class=\"detail\"><td colspan=\"5\"><table>\
             <tr><th>Cabin Type</th><th>Berths Left</th><th>Price</th></tr>{}\
             </table></td></tr>",
            body
        )
    }

    fn table(rows: &[String]) -> String {
        format!("<html><body><table>{}{}</table></body></html>", HEADER, rows.concat())
    }

    fn coral_sea() -> String {
        row(&[
            "7 Night Coral Sea Exploratory",
            "12 September 2025",
            "19 September 2025",
            "$5,367",
            "6 available",
        ])
    }

    #[test]
    fn test_parse_single_trip() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[coral_sea()]));

        assert_eq!(trips.len(), 1);
        let trip = &trips[0];
        assert_eq!(trip.expedition.as_deref(), Some("7 Night Coral Sea Exploratory"));
        assert_eq!(trip.departs, Some(date(2025, 9, 12)));
        assert_eq!(trip.returns, Some(date(2025, 9, 19)));
        assert_eq!(trip.price_from_aud, Some(5367));
        assert_eq!(trip.availability.as_deref(), Some("6 available"));
        assert!(trip.cabins.is_empty());
    }

    #[test]
    fn test_sold_out_row_excluded() {
        let parser = Parser::new(window_2025());
        let sold_out = row(&[
            "7 Night Coral Sea Exploratory",
            "12 September 2025",
            "19 September 2025",
            "$5,367",
            "SOLD OUT",
        ]);
        let trips = parser.parse_trips(&table(&[sold_out, cabin_block(&[&[
            "Premium",
            "2 berths left",
            "$6,999",
        ]])]));

        assert!(trips.is_empty());
    }

    #[test]
    fn test_sold_out_marker_anywhere_in_row() {
        let parser = Parser::new(window_2025());
        let html = table(&[
            "<tr><td>Osprey Reef <span>Sold</span> <b>Out</b></td><td>1 Oct 2025</td>\
             <td>5 Oct 2025</td><td>$2,385</td></tr>"
                .to_string(),
        ]);

        assert!(parser.parse_trips(&html).is_empty());
    }

    #[test]
    fn test_window_filtering() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[
            row(&["Before", "31 December 2024", "7 January 2025", "$1,000", "Available"]),
            row(&["First day", "1 January 2025", "8 January 2025", "$1,000", "Available"]),
            row(&["Last day", "31 December 2025", "7 January 2026", "$1,000", "Available"]),
            row(&["After", "1 January 2026", "8 January 2026", "$1,000", "Available"]),
        ]));

        let names: Vec<_> = trips.iter().map(|t| t.expedition.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["First day", "Last day"]);
    }

    #[test]
    fn test_unparseable_departure_dropped() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[
            row(&["Mystery", "TBA", "TBA", "$1,000", "Available"]),
            coral_sea(),
        ]));

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].departs, Some(date(2025, 9, 12)));
    }

    #[test]
    fn test_short_rows_dropped() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[
            row(&["Coral Sea", "12 September 2025", "19 September 2025"]),
            "<tr><td colspan=\"5\">&nbsp;</td></tr>".to_string(),
        ]));

        assert!(trips.is_empty());
    }

    #[test]
    fn test_four_cells_without_availability() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[row(&[
            "Ribbon Reefs",
            "3 March 2025",
            "7 March 2025",
            "POA",
        ])]));

        assert_eq!(trips.len(), 1);
        assert!(trips[0].price_from_aud.is_none());
        assert!(trips[0].availability.is_none());
    }

    #[test]
    fn test_empty_fields_become_none() {
        let parser = Parser::new(window_2025());
        let trips =
            parser.parse_trips(&table(&[row(&["", "3 March 2025", "", "", "  "])]));

        assert_eq!(trips.len(), 1);
        let trip = &trips[0];
        assert!(trip.expedition.is_none());
        assert!(trip.returns.is_none());
        assert!(trip.price_from_aud.is_none());
        assert!(trip.availability.is_none());
    }

    #[test]
    fn test_cabin_sub_table() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[
            coral_sea(),
            cabin_block(&[
                &["Premium", "2 berths left", "$6,999"],
                &["Standard", "$5,367", "4 left"],
                &["Twin", "Call us"],
            ]),
        ]));

        assert_eq!(trips.len(), 1);
        let cabins = &trips[0].cabins;
        assert_eq!(cabins.len(), 3);

        assert_eq!(cabins[0], Cabin {
            cabin_type: "Premium".to_string(),
            berths_left: Some(2),
            price_aud: Some(6999),
        });
        assert_eq!(cabins[1], Cabin {
            cabin_type: "Standard".to_string(),
            berths_left: Some(4),
            price_aud: Some(5367),
        });
        assert_eq!(cabins[2], Cabin {
            cabin_type: "Twin".to_string(),
            berths_left: None,
            price_aud: None,
        });
    }

    #[test]
    fn test_cabin_rows_skipped() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[
            coral_sea(),
            cabin_block(&[
                &["", "2 berths left", "$6,999"],
                &["Solo"],
                &["Deluxe", "Sold out", "$7,500"],
                &["Standard", "1 berth", "$5,367"],
            ]),
        ]));

        let cabins = &trips[0].cabins;
        assert_eq!(cabins.len(), 1);
        assert_eq!(cabins[0].cabin_type, "Standard");
        assert_eq!(cabins[0].berths_left, Some(1));
    }

    #[test]
    fn test_detail_row_only_attaches_to_previous_trip() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[
            row(&["Osprey Reef", "1 October 2025", "5 October 2025", "$2,385", "Hurry"]),
            coral_sea(),
            cabin_block(&[&["Premium", "2 berths left", "$6,999"]]),
        ]));

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].expedition.as_deref(), Some("7 Night Coral Sea Exploratory"));
        assert_eq!(trips[0].cabins.len(), 1);
        assert_eq!(trips[1].expedition.as_deref(), Some("Osprey Reef"));
        assert!(trips[1].cabins.is_empty());
    }

    #[test]
    fn test_duplicates_keep_cabins() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[
            coral_sea(),
            coral_sea(),
            cabin_block(&[&["Premium", "2 berths left", "$6,999"]]),
        ]));

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].cabins.len(), 1);
    }

    #[test]
    fn test_output_sorted_by_departure() {
        let parser = Parser::new(window_2025());
        let trips = parser.parse_trips(&table(&[
            row(&["C", "1 December 2025", "8 December 2025", "$1", "Available"]),
            row(&["A", "1 February 2025", "8 February 2025", "$1", "Available"]),
            row(&["B", "1 June 2025", "8 June 2025", "$1", "Available"]),
        ]));

        let departs: Vec<_> = trips.iter().map(|t| t.departs.unwrap()).collect();
        let mut sorted = departs.clone();
        sorted.sort();
        assert_eq!(departs, sorted);
    }

    #[test]
    fn test_reordered_headers_map_by_name() {
        let parser = Parser::new(window_2025());
        let html = "<table>\
            <tr><th>Departs</th><th>Returns</th><th>Expedition</th><th>Availability</th>\
            <th>Price From (AUD)</th></tr>\
            <tr><td>12 September 2025</td><td>19 September 2025</td>\
            <td>Coral Sea</td><td>Hurry</td><td>$5,367</td></tr>\
            </table>";

        let trips = parser.parse_trips(html);
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].expedition.as_deref(), Some("Coral Sea"));
        assert_eq!(trips[0].price_from_aud, Some(5367));
        assert_eq!(trips[0].availability.as_deref(), Some("Hurry"));
    }

    #[test]
    fn test_normalized_availability() {
        let parser = Parser::new(window_2025()).with_availability(AvailabilityPolicy::Normalized);
        let trips = parser.parse_trips(&table(&[
            row(&["A", "1 February 2025", "8 February 2025", "$1", "Only 3 left"]),
            row(&["B", "1 June 2025", "8 June 2025", "$1", "Hurry"]),
        ]));

        assert_eq!(trips[0].availability.as_deref(), Some("3 available"));
        assert_eq!(trips[1].availability.as_deref(), Some("Few left"));
    }

    #[test]
    fn test_no_table_yields_empty() {
        let parser = Parser::new(window_2025());
        assert!(parser.parse_trips("<html><body><p>Loading...</p></body></html>").is_empty());
        assert!(parser.parse_trips("").is_empty());
    }

    #[test]
    fn test_locator_requires_departs_and_returns() {
        let html = "<table><tr><th>Name</th><th>Departs</th></tr></table>";
        let document = Html::parse_document(html);
        assert!(locate_results_table(&document).is_none());
    }

    #[test]
    fn test_locator_prefers_price_and_availability() {
        let html = "<table id=\"calendar\"><tr><th>Departs</th><th>Returns</th></tr></table>\
                    <table id=\"results\"><tr><th>Departs</th><th>Returns</th>\
                    <th>Price</th><th>Availability</th></tr></table>";
        let document = Html::parse_document(html);
        let table = locate_results_table(&document).unwrap();
        assert_eq!(table.value().attr("id"), Some("results"));
    }

    #[test]
    fn test_locator_falls_back_to_first_match() {
        let html = "<table id=\"first\"><tr><th>Departs</th><th>Returns</th></tr></table>\
                    <table id=\"second\"><tr><th>Depart Date</th><th>Return Date</th></tr></table>";
        let document = Html::parse_document(html);
        let table = locate_results_table(&document).unwrap();
        assert_eq!(table.value().attr("id"), Some("first"));
    }

    #[test]
    fn test_locator_ignores_nested_headers() {
        // Only the nested table mentions the markers
        let html = "<table id=\"outer\"><tr><th>Layout</th></tr><tr><td>\
                    <table id=\"inner\"><tr><th>Departs</th><th>Returns</th></tr></table>\
                    </td></tr></table>";
        let document = Html::parse_document(html);
        let table = locate_results_table(&document).unwrap();
        assert_eq!(table.value().attr("id"), Some("inner"));
    }

    #[test]
    fn test_fragment_input() {
        let parser = Parser::new(window_2025());
        let fragment = format!("<table>{}{}</table>", HEADER, coral_sea());
        assert_eq!(parser.parse_trips(&fragment).len(), 1);
    }

    #[test]
    fn test_column_map_positional_without_headers() {
        assert_eq!(ColumnMap::from_headers(&[]), ColumnMap::POSITIONAL);
    }

    #[test]
    fn test_column_map_synonyms() {
        let headers: Vec<String> =
            ["Trip", "Status", "Depart", "Return", "Cost"].iter().map(|s| s.to_string()).collect();
        let map = ColumnMap::from_headers(&headers);
        assert_eq!(
            map,
            ColumnMap { expedition: 0, departs: 2, returns: 3, price: 4, availability: 1 }
        );
    }

    #[test]
    fn test_column_map_unnamed_field_takes_free_column() {
        let headers: Vec<String> = ["Departs", "Returns", "Name", "Price", "Availability"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = ColumnMap::from_headers(&headers);
        assert_eq!(
            map,
            ColumnMap { expedition: 2, departs: 0, returns: 1, price: 3, availability: 4 }
        );
    }

    #[test]
    fn test_unrecognized_name_header() {
        let parser = Parser::new(window_2025());
        let html = "<table>\
            <tr><th>Departs</th><th>Returns</th><th>Name</th><th>Price</th>\
            <th>Availability</th></tr>\
            <tr><td>12 September 2025</td><td>19 September 2025</td>\
            <td>Coral Sea</td><td>$5,367</td><td>6 available</td></tr>\
            </table>";

        let trips = parser.parse_trips(html);
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].expedition.as_deref(), Some("Coral Sea"));
        assert_eq!(trips[0].departs, Some(date(2025, 9, 12)));
        assert_eq!(trips[0].price_from_aud, Some(5367));
    }

    #[test]
    fn test_column_map_partial_headers_fall_back() {
        let headers: Vec<String> =
            ["", "Departs", "Returns", "", ""].iter().map(|s| s.to_string()).collect();
        assert_eq!(ColumnMap::from_headers(&headers), ColumnMap::POSITIONAL);
    }
}
