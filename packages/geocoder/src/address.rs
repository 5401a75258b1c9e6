//! Address cleaning for event locations.
//!
//! Organizers type venue addresses by hand and often include details that
//! matter to visitors but not to a geocoder:
//! - Floors: `"Mejlgade 10, 1. sal"`, `"2nd floor"`
//! - Door sides: `"Vestergade 5, 2. th."`, `"st. tv."`
//! - Rooms: `"Godsbanen, lokale 2.12"`, `"Dokk1, room 4"`
//!
//! Nominatim frequently returns no match when these are present, so they
//! are stripped before lookup. This is best effort: an address that still
//! does not resolve after cleaning is simply reported as not found.

use regex::Regex;
use std::sync::LazyLock;

/// Danish floor qualifiers: "1. sal", "2 sal", "3. etage".
static FLOOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),?\s*\b\d+\.?\s*(?:sal|etage)\b\.?").expect("valid regex")
});

/// English floor qualifiers: "2nd floor", "1st fl.".
static ENGLISH_FLOOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),?\s*\b\d+(?:st|nd|rd|th)\s+(?:floor|fl)\b\.?").expect("valid regex")
});

/// Door side after a comma: ", st. tv.", ", 2. th", ", 1 mf".
static SIDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),\s*(?:st|\d+)(?:\.\s*|\s+)(?:tv|th|mf)\b\.?").expect("valid regex")
});

/// Ground floor marker: ", stuen".
static GROUND_FLOOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),\s*stuen\b").expect("valid regex"));

/// Rooms as their own comma-separated part with a numeric id:
/// ", lokale 2.12", ", rum 3", ", room 4B". The following comma (or end of
/// text) is captured and put back.
static ROOM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),\s*(?:lokale|rum|room)\s+\d[\w.\-]*\s*(,|$)").expect("valid regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Location texts that do not describe a place.
static SKIP_PATTERNS: &[&str] = &[
    "-", "N/A", "NA", "TBA", "TBD", "ONLINE", "KOMMER SNART", "UKENDT",
];

/// Result of cleaning an event address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanedAddress {
    /// A query suitable for geocoding.
    Query(String),
    /// The address is not geocodable (empty, placeholder, online).
    NotGeocodable,
}

/// Removes floor, door-side and room qualifiers from `raw` and tidies the
/// remaining comma-separated parts.
///
/// Returns [`CleanedAddress::NotGeocodable`] when nothing meaningful is
/// left or the text is a known placeholder.
#[must_use]
pub fn clean_address(raw: &str) -> CleanedAddress {
    let addr = WHITESPACE_RE.replace_all(raw.trim(), " ");

    if addr.is_empty() || SKIP_PATTERNS.iter().any(|p| addr.eq_ignore_ascii_case(p)) {
        return CleanedAddress::NotGeocodable;
    }

    let addr = SIDE_RE.replace_all(&addr, "");
    let addr = GROUND_FLOOR_RE.replace_all(&addr, "");
    let addr = FLOOR_RE.replace_all(&addr, "");
    let addr = ENGLISH_FLOOR_RE.replace_all(&addr, "");
    let addr = ROOM_RE.replace_all(&addr, "$1");

    let addr = tidy_commas(&addr);

    if addr.is_empty() {
        return CleanedAddress::NotGeocodable;
    }

    CleanedAddress::Query(addr)
}

/// Rejoins the non-empty comma-separated parts of `addr` with `", "`.
fn tidy_commas(addr: &str) -> String {
    addr.split(',')
        .map(|part| WHITESPACE_RE.replace_all(part.trim(), " ").into_owned())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
