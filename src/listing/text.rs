//! Cell text helpers: whitespace cleanup, money, berths, dates and
//! availability labels.

use chrono::{Datelike, NaiveDate};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static MONEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

static BERTHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:berths?|left|avail)").unwrap());

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());

static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{2,4})\b").unwrap());

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?::\d{2}){1,2}(?:\s*[ap]m)?\b|\b\d{1,2}\s*[ap]m\b").unwrap()
});

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]+|\d+").unwrap());

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Collapses every whitespace run (including non-breaking spaces) to a single
/// space and trims the ends.
pub fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns true if the text carries a "sold out" marker.
pub fn is_sold_out(text: &str) -> bool {
    clean(text).to_lowercase().contains("sold out")
}

/// Parses a money amount into whole currency units.
///
/// Thousands separators are stripped, the first integer or decimal token is
/// taken and rounded: `"$2,385"` gives 2385, `"AUD 6,999.00"` gives 6999.
pub fn parse_money(text: &str) -> Option<u32> {
    let stripped = text.replace(',', "");
    let token = MONEY.find(&stripped)?;
    let value: f64 = token.as_str().parse().ok()?;

    Some(value.round() as u32)
}

/// Extracts a berth count from text like "2 berths left" or "4 avail".
pub fn parse_berths(text: &str) -> Option<u32> {
    BERTHS.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Lenient, day-first date parser.
///
/// Understands ISO dates, numeric `d/m/y` forms, and long forms with month
/// names such as "Friday 12 September 2025" or "12th Sep '25". Words that are
/// not month names are ignored, as are clock times like "08:00" or "6pm".
/// When no year is present, the year of `anchor` is used, rolled forward one
/// year if that would put the date before it.
pub fn parse_date(text: &str, anchor: NaiveDate) -> Option<NaiveDate> {
    let text = clean(&CLOCK_TIME.replace_all(text, " "));
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE.captures(&text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = NUMERIC_DATE.captures(&text) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year = expand_year(caps[3].parse().ok()?);

        // Day first, unless only the swapped reading is a valid month
        let (day, month) =
            if second > 12 && first <= 12 { (second, first) } else { (first, second) };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    parse_long_date(&text, anchor)
}

fn parse_long_date(text: &str, anchor: NaiveDate) -> Option<NaiveDate> {
    let mut month = None;
    let mut year = None;
    let mut numbers = Vec::new();

    for token in DATE_TOKEN.find_iter(text) {
        let token = token.as_str();
        if token.chars().all(|c| c.is_ascii_digit()) {
            if token.len() == 4 && year.is_none() {
                year = token.parse::<i32>().ok();
            } else if token.len() <= 2 {
                numbers.extend(token.parse::<u32>().ok());
            }
        } else if month.is_none() {
            month = month_from_name(token);
        }
    }

    let month = month?;
    let mut numbers = numbers.into_iter();
    let day = numbers.by_ref().find(|n| (1..=31).contains(n))?;

    match year.or_else(|| numbers.next().map(|y| expand_year(y as i32))) {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let date = NaiveDate::from_ymd_opt(anchor.year(), month, day)?;
            if date < anchor {
                NaiveDate::from_ymd_opt(anchor.year() + 1, month, day)
            } else {
                Some(date)
            }
        }
    }
}

fn month_from_name(token: &str) -> Option<u32> {
    let token = token.to_lowercase();
    if token == "sept" {
        return Some(9);
    }
    if token.len() < 3 {
        return None;
    }

    MONTHS.iter().position(|name| name.starts_with(&token)).map(|i| i as u32 + 1)
}

fn expand_year(year: i32) -> i32 {
    if year < 100 { 2000 + year } else { year }
}

/// How availability cell text is carried into the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityPolicy {
    /// Keep the cleaned cell text as-is.
    #[default]
    Verbatim,
    /// Map to "Sold Out", "<N> available", "Few left" or "Available" when
    /// recognized; pass anything else through.
    Normalized,
}

impl AvailabilityPolicy {
    /// Applies the policy to raw cell text. Empty text yields `None`.
    pub fn apply(&self, text: &str) -> Option<String> {
        let text = clean(text);
        if text.is_empty() {
            return None;
        }

        match self {
            AvailabilityPolicy::Verbatim => Some(text),
            AvailabilityPolicy::Normalized => Some(normalize_availability(&text)),
        }
    }
}

fn normalize_availability(text: &str) -> String {
    let lower = text.to_lowercase();

    if lower.contains("sold out") {
        return "Sold Out".to_string();
    }
    if let Some(count) = parse_berths(text) {
        return format!("{} available", count);
    }
    if lower.contains("hurry") || lower.contains("few") || lower.contains("limited") {
        return "Few left".to_string();
    }
    if lower.contains("avail") {
        return "Available".to_string();
    }

    text.to_string()
}

impl std::str::FromStr for AvailabilityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbatim" | "raw" => Ok(AvailabilityPolicy::Verbatim),
            "normalized" | "normalised" => Ok(AvailabilityPolicy::Normalized),
            _ => Err(format!("Unknown availability policy: {}. Use: verbatim, normalized", s)),
        }
    }
}

impl std::fmt::Display for AvailabilityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityPolicy::Verbatim => write!(f, "verbatim"),
            AvailabilityPolicy::Normalized => write!(f, "normalized"),
        }
    }
}
