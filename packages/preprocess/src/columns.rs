//! Header cleaning and schema detection.
//!
//! Form exports use the full question text as column header, including
//! bracketed help text that may span several lines:
//!
//! ```text
//! Lokation [Skriv den fulde adresse.
//! Har dit arrangement flere adresser, så skriv dem på hver sin linje]
//! ```
//!
//! [`clean_column_name`] reduces such a header to its canonical label
//! (`Lokation`); [`normalize`] applies it to a whole table and checks the
//! result against the known [`Schema`]s.

use std::sync::LazyLock;

use pride_map_event_models::Table;
use regex::Regex;

use crate::schema::Schema;

/// Bracketed help text, possibly spanning lines, plus surrounding space.
static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\s*\[.*?\]\s*").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A table whose headers matched a known schema.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// The table with cleaned column names.
    pub table: Table,
    /// The schema whose required columns are all present.
    pub schema: Schema,
}

/// Cleans one raw header.
///
/// Removes bracketed text together with the whitespace around it, the
/// given suffix phrases and newlines, then collapses whitespace and trims.
/// Text on both sides of a bracket group is joined: `"Start[x]tid"` and
/// `"Start [x] tid"` both become `"Starttid"`.
#[must_use]
pub fn clean_column_name(raw: &str, suffixes: &[&str]) -> String {
    let mut name = BRACKET_RE.replace_all(raw, "").into_owned();
    for suffix in suffixes {
        name = name.replace(suffix, "");
    }
    let name = name.replace(['\r', '\n'], " ");
    WHITESPACE_RE.replace_all(&name, " ").trim().to_string()
}

/// Cleans every header of `raw` and detects its schema.
///
/// Suffixes from all `candidates` are stripped. The first candidate whose
/// required columns are all present wins. When none matches, the cleaned
/// column list is logged at error level and `None` is returned; nothing is
/// guessed.
#[must_use]
pub fn normalize(mut raw: Table, candidates: &[Schema]) -> Option<NormalizedTable> {
    let suffixes: Vec<&str> = candidates
        .iter()
        .flat_map(|s| s.strip_suffixes.iter().map(String::as_str))
        .collect();

    let cleaned: Vec<String> = raw
        .columns()
        .iter()
        .map(|c| clean_column_name(c, &suffixes))
        .collect();

    for (before, after) in raw.columns().iter().zip(&cleaned) {
        if before != after {
            log::debug!("Renamed column {before:?} -> {after:?}");
        }
    }

    let Some(schema) = candidates
        .iter()
        .find(|s| s.missing_columns(&cleaned).is_empty())
    else {
        for schema in candidates {
            log::debug!(
                "Schema '{}' is missing columns: {:?}",
                schema.id,
                schema.missing_columns(&cleaned)
            );
        }
        log::error!("Columns found after cleaning: {cleaned:?}");
        return None;
    };

    log::info!("Detected export schema '{}' ({})", schema.id, schema.name);

    raw.rename_columns(cleaned);
    Some(NormalizedTable {
        table: raw,
        schema: schema.clone(),
    })
}

#[cfg(test)]
mod tests {
    use pride_map_event_models::{FieldValue, Record};

    use super::*;
    use crate::schema::{all_schemas, candidates};

    const SUFFIXES: &[&str] = &["- Maks en sætning", ", skriv linket her"];

    fn raw_table(columns: &[&str]) -> Table {
        Table::new(
            columns.iter().map(ToString::to_string).collect(),
            vec![Record::new(
                columns.iter().map(|_| FieldValue::from_cell("x")).collect(),
            )],
        )
    }

    fn single_date_headers() -> Vec<&'static str> {
        vec![
            "Titel på dit arrangement - Maks en sætning",
            "Arrangør [Navn på forening\neller privatperson]",
            "Lokation [Skriv den fulde adresse.\nFlere adresser skrives på hver sin linje]",
            "Dato",
            "Mailadresse",
        ]
    }

    #[test]
    fn removes_multiline_brackets() {
        assert_eq!(
            clean_column_name(
                "Lokation [Skriv den fulde adresse.\nFlere adresser på hver sin linje]",
                SUFFIXES
            ),
            "Lokation"
        );
    }

    #[test]
    fn removes_known_suffixes() {
        assert_eq!(
            clean_column_name("Titel på dit arrangement - Maks en sætning", SUFFIXES),
            "Titel på dit arrangement"
        );
        assert_eq!(
            clean_column_name("Link til arrangement, skriv linket her", SUFFIXES),
            "Link til arrangement"
        );
    }

    #[test]
    fn joins_lines_and_collapses_whitespace() {
        assert_eq!(
            clean_column_name("  Kort\nbeskrivelse \r\n  af   arrangementet ", SUFFIXES),
            "Kort beskrivelse af arrangementet"
        );
    }

    #[test]
    fn joins_text_around_inner_brackets() {
        assert_eq!(clean_column_name("Start[x]tid", SUFFIXES), "Starttid");
        assert_eq!(clean_column_name("Start [x] tid", SUFFIXES), "Starttid");
    }

    #[test]
    fn cleaned_headers_have_no_residue() {
        let headers = [
            "Titel på dit arrangement - Maks en sætning",
            "Arrangør [Navn\npå forening]",
            "Beskrivelse [Maks 500 tegn]\n[Skriv på dansk eller engelsk]",
            "Link, skriv linket her",
            "Lokation\n[adresse]",
        ];
        for header in headers {
            let cleaned = clean_column_name(header, SUFFIXES);
            assert!(!cleaned.contains(['[', ']', '\n', '\r']), "{cleaned:?}");
            assert!(!cleaned.contains("Maks en sætning"), "{cleaned:?}");
            assert!(!cleaned.contains("skriv linket her"), "{cleaned:?}");
            assert!(!cleaned.contains("  "), "{cleaned:?}");
            assert_eq!(cleaned, cleaned.trim());
        }
    }

    #[test]
    fn detects_single_date_schema() {
        let normalized = normalize(raw_table(&single_date_headers()), &all_schemas()).unwrap();
        assert_eq!(normalized.schema.id, "single_date");
        assert_eq!(
            normalized.table.columns(),
            &[
                "Titel på dit arrangement".to_string(),
                "Arrangør".to_string(),
                "Lokation".to_string(),
                "Dato".to_string(),
                "Mailadresse".to_string(),
            ]
        );
        assert_eq!(normalized.table.len(), 1);
    }

    #[test]
    fn detects_start_end_schema() {
        let headers = [
            "Titel på dit arrangement",
            "Arrangør",
            "Lokation [adresse]",
            "Start [dd/mm/åååå tt:mm]",
            "End",
        ];
        let normalized = normalize(raw_table(&headers), &all_schemas()).unwrap();
        assert_eq!(normalized.schema.id, "start_end");
    }

    #[test]
    fn missing_any_required_column_yields_nothing() {
        let headers = single_date_headers();
        for removed in 0..4 {
            let mut partial = headers.clone();
            partial.remove(removed);
            assert!(
                normalize(raw_table(&partial), &all_schemas()).is_none(),
                "table without {:?} was accepted",
                headers[removed]
            );
        }
    }

    #[test]
    fn forced_schema_is_not_swapped_for_another() {
        let only_start_end = candidates(Some("start_end")).unwrap();
        assert!(normalize(raw_table(&single_date_headers()), &only_start_end).is_none());
    }
}
