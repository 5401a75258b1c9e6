//! Date parsing for the export's date columns.
//!
//! Values that do not parse become `None` rather than errors; the record is
//! kept and consumers decide what to do with an unknown date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pride_map_event_models::{FieldValue, Table};

use crate::schema::{DateFormat, Schema};

/// Suffix of the derived column holding the parsed timestamp.
pub const PARSED_SUFFIX: &str = "_dt";

/// Format of the derived timestamp columns.
pub const PARSED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Day-first layouts with a time of day, tried in order.
const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H.%M.%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H.%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y %H.%M",
];

/// Day-first layouts without a time of day; midnight is assumed.
const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Parses `raw` according to `format`. Returns `None` for blank or
/// unparseable input.
#[must_use]
pub fn parse_date(raw: &str, format: &DateFormat) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match format {
        DateFormat::Explicit { pattern } => NaiveDateTime::parse_from_str(raw, pattern).ok(),
        DateFormat::DayFirst => parse_day_first(raw),
    }
}

fn parse_day_first(raw: &str) -> Option<NaiveDateTime> {
    DAY_FIRST_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DAY_FIRST_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Appends a `<column>_dt` column for every date column of `schema`,
/// holding the parsed timestamp or an empty cell. A derived column that is
/// already present is replaced.
///
/// Returns the number of non-empty values that failed to parse.
pub fn add_parsed_date_columns(table: &mut Table, schema: &Schema) -> usize {
    let mut unparsed = 0;

    for date in &schema.dates {
        let derived = format!("{}{PARSED_SUFFIX}", date.column);
        table.drop_columns(&[derived.as_str()]);

        let values: Vec<FieldValue> = table
            .rows()
            .iter()
            .map(|record| {
                let raw = table.field(record, &date.column);
                let parsed = raw.as_str().and_then(|r| parse_date(r, &date.format));
                if parsed.is_none()
                    && let Some(r) = raw.as_str()
                    && !r.trim().is_empty()
                {
                    log::warn!("Could not parse {} value {r:?}", date.column);
                    unparsed += 1;
                }
                FieldValue::from(parsed.map(|dt| dt.format(PARSED_FORMAT).to_string()))
            })
            .collect();

        table.push_column(derived, values);
    }

    unparsed
}

#[cfg(test)]
mod tests {
    use pride_map_event_models::Record;

    use super::*;
    use crate::schema::candidates;

    fn explicit() -> DateFormat {
        DateFormat::Explicit {
            pattern: "%d/%m/%Y %H.%M.%S".to_string(),
        }
    }

    #[test]
    fn parses_explicit_format() {
        let dt = parse_date("12/08/2025 14.30.00", &explicit()).unwrap();
        assert_eq!(dt.to_string(), "2025-08-12 14:30:00");
    }

    #[test]
    fn explicit_format_is_strict() {
        assert!(parse_date("2025-08-12 14:30", &explicit()).is_none());
        assert!(parse_date("12/08/2025", &explicit()).is_none());
    }

    #[test]
    fn day_first_never_reads_month_first() {
        let dt = parse_date("03/08/2025 18:00", &DateFormat::DayFirst).unwrap();
        assert_eq!(dt.to_string(), "2025-08-03 18:00:00");
    }

    #[test]
    fn day_first_accepts_date_only() {
        let dt = parse_date("16.08.2025", &DateFormat::DayFirst).unwrap();
        assert_eq!(dt.to_string(), "2025-08-16 00:00:00");
    }

    #[test]
    fn rejects_garbage_and_blank() {
        assert!(parse_date("snart", &DateFormat::DayFirst).is_none());
        assert!(parse_date("31/02/2025 10:00", &DateFormat::DayFirst).is_none());
        assert!(parse_date("   ", &explicit()).is_none());
    }

    #[test]
    fn adds_derived_columns_and_keeps_bad_rows() {
        let schema = candidates(Some("single_date")).unwrap().remove(0);
        let mut table = Table::new(
            vec!["Titel på dit arrangement".to_string(), "Dato".to_string()],
            vec![
                Record::new(vec![
                    FieldValue::from_cell("Picnic"),
                    FieldValue::from_cell("12/08/2025 14.00.00"),
                ]),
                Record::new(vec![
                    FieldValue::from_cell("Walk"),
                    FieldValue::from_cell("i morgen"),
                ]),
                Record::new(vec![FieldValue::from_cell("Quiz"), FieldValue::Missing]),
            ],
        );

        let unparsed = add_parsed_date_columns(&mut table, &schema);

        assert_eq!(unparsed, 1);
        assert_eq!(table.len(), 3);
        let rows = table.rows();
        assert_eq!(
            table.field(&rows[0], "Dato_dt").as_str(),
            Some("2025-08-12 14:00:00")
        );
        assert!(table.field(&rows[1], "Dato_dt").is_missing());
        assert!(table.field(&rows[2], "Dato_dt").is_missing());
    }

    #[test]
    fn replaces_existing_derived_column() {
        let schema = candidates(Some("single_date")).unwrap().remove(0);
        let mut table = Table::new(
            vec!["Dato".to_string(), "Dato_dt".to_string()],
            vec![Record::new(vec![
                FieldValue::from_cell("12/08/2025 14.00.00"),
                FieldValue::from_cell("stale"),
            ])],
        );

        add_parsed_date_columns(&mut table, &schema);

        assert_eq!(table.columns(), &["Dato", "Dato_dt"]);
        assert_eq!(
            table.field(&table.rows()[0], "Dato_dt").as_str(),
            Some("2025-08-12 14:00:00")
        );
    }
}
