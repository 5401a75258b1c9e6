#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Table, record and coordinate types shared by the event preprocessing
//! pipeline.
//!
//! An event export is held as a [`Table`]: an ordered list of column names
//! and a list of [`Record`]s whose cells line up with those columns. Cells
//! are [`FieldValue`]s so that "the export left this blank" is explicit
//! instead of being papered over with placeholder text; presentation code
//! decides what to show for a [`FieldValue::Missing`] cell.

use serde::{Deserialize, Serialize};

/// Output column holding the latitude of a single-address event.
pub const LATITUDE_COLUMN: &str = "Latitude";
/// Output column holding the longitude of a single-address event.
pub const LONGITUDE_COLUMN: &str = "Longitude";
/// Output column holding the latitudes of a multi-address event.
pub const LATITUDE_LIST_COLUMN: &str = "Latitude_List";
/// Output column holding the longitudes of a multi-address event.
pub const LONGITUDE_LIST_COLUMN: &str = "Longitude_List";

/// The coordinate columns appended to every enriched table, in output order.
pub const COORDINATE_COLUMNS: [&str; 4] = [
    LATITUDE_COLUMN,
    LONGITUDE_COLUMN,
    LATITUDE_LIST_COLUMN,
    LONGITUDE_LIST_COLUMN,
];

static MISSING: FieldValue = FieldValue::Missing;

/// A single cell of an event record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    /// The export contained a value for this cell.
    Present(String),
    /// The cell was empty or the row was shorter than the header.
    Missing,
}

impl FieldValue {
    /// Builds a cell from raw CSV text. Empty text becomes
    /// [`FieldValue::Missing`]; anything else is kept verbatim.
    #[must_use]
    pub fn from_cell(raw: &str) -> Self {
        if raw.is_empty() {
            Self::Missing
        } else {
            Self::Present(raw.to_string())
        }
    }

    /// Returns the cell text, if present.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing => None,
        }
    }

    /// Returns the cell text, or `fallback` when the cell is missing.
    #[must_use]
    pub fn or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.as_str().unwrap_or(fallback)
    }

    /// Whether the cell is [`FieldValue::Missing`].
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Text written back to CSV: the value, or an empty cell.
    #[must_use]
    pub fn to_cell(&self) -> &str {
        self.or("")
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Missing, Self::Present)
    }
}

/// One row of an event table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    cells: Vec<FieldValue>,
}

impl Record {
    /// Creates a record from cells in column order.
    #[must_use]
    pub const fn new(cells: Vec<FieldValue>) -> Self {
        Self { cells }
    }

    /// Returns the cell at `index`, or [`FieldValue::Missing`] when the row
    /// is shorter than the header.
    #[must_use]
    pub fn cell(&self, index: usize) -> &FieldValue {
        self.cells.get(index).unwrap_or(&MISSING)
    }

    /// All cells in column order.
    #[must_use]
    pub fn cells(&self) -> &[FieldValue] {
        &self.cells
    }

    fn pad_to(&mut self, width: usize) {
        if self.cells.len() < width {
            self.cells.resize(width, FieldValue::Missing);
        }
    }
}

/// An in-memory event table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Creates a table. Rows shorter than the header are padded with
    /// [`FieldValue::Missing`]; extra trailing cells are kept but are never
    /// reachable by column name.
    #[must_use]
    pub fn new(columns: Vec<String>, mut rows: Vec<Record>) -> Self {
        for row in &mut rows {
            row.pad_to(columns.len());
        }
        Self { columns, rows }
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in input order.
    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has neither rows nor columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    /// Index of the first column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Whether a column called `name` exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Looks up the cell of `record` in column `name`.
    ///
    /// Returns [`FieldValue::Missing`] when the column does not exist, so
    /// callers see a missing column and an empty cell the same way.
    #[must_use]
    pub fn field<'a>(&self, record: &'a Record, name: &str) -> &'a FieldValue {
        self.column_index(name)
            .map_or(&MISSING, |index| record.cell(index))
    }

    /// Replaces the column names, keeping the rows untouched.
    ///
    /// # Panics
    ///
    /// Panics if `columns` has a different length than the current header.
    pub fn rename_columns(&mut self, columns: Vec<String>) {
        assert_eq!(
            columns.len(),
            self.columns.len(),
            "renaming must preserve the column count"
        );
        self.columns = columns;
    }

    /// Removes every column whose name is in `names`. Names that are not
    /// present are ignored. Returns the names that were actually removed.
    pub fn drop_columns(&mut self, names: &[&str]) -> Vec<String> {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.contains(&c.as_str()))
            .collect();

        if keep.iter().all(|k| *k) {
            return Vec::new();
        }

        let mut dropped = Vec::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for (column, keep) in std::mem::take(&mut self.columns).into_iter().zip(&keep) {
            if *keep {
                columns.push(column);
            } else {
                dropped.push(column);
            }
        }
        self.columns = columns;

        for row in &mut self.rows {
            let mut index = 0;
            row.cells.retain(|_| {
                let retain = keep.get(index).copied().unwrap_or(true);
                index += 1;
                retain
            });
        }

        dropped
    }

    /// Appends a column. `values` is matched to rows by position; rows
    /// without a corresponding value get [`FieldValue::Missing`].
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<FieldValue>) {
        let width = self.columns.len();
        self.columns.push(name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.pad_to(width);
            row.cells.truncate(width);
            row.cells.push(values.next().unwrap_or(FieldValue::Missing));
        }
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Coordinates resolved for one event.
///
/// Single-address events fill `Latitude`/`Longitude`; multi-address events
/// fill `Latitude_List`/`Longitude_List`. The two shapes are exclusive.
///
/// A multi-address list holds only the addresses that resolved, in input
/// order. When any lookup failed the list is shorter than the address list
/// and index `i` no longer corresponds to address `i`.
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinates {
    /// The location held one address (or none).
    Single(Option<GeoPoint>),
    /// The location held several addresses.
    Multi(Vec<GeoPoint>),
}

impl Coordinates {
    /// Whether at least one coordinate pair was resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::Single(point) => point.is_some(),
            Self::Multi(points) => !points.is_empty(),
        }
    }

    /// Single-address latitude.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        match self {
            Self::Single(point) => point.map(|p| p.latitude),
            Self::Multi(_) => None,
        }
    }

    /// Single-address longitude.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        match self {
            Self::Single(point) => point.map(|p| p.longitude),
            Self::Multi(_) => None,
        }
    }

    /// Multi-address latitudes. `None` for single-address events and for
    /// multi-address events where nothing resolved.
    #[must_use]
    pub fn latitude_list(&self) -> Option<Vec<f64>> {
        match self {
            Self::Multi(points) if !points.is_empty() => {
                Some(points.iter().map(|p| p.latitude).collect())
            }
            _ => None,
        }
    }

    /// Multi-address longitudes. See [`Coordinates::latitude_list`].
    #[must_use]
    pub fn longitude_list(&self) -> Option<Vec<f64>> {
        match self {
            Self::Multi(points) if !points.is_empty() => {
                Some(points.iter().map(|p| p.longitude).collect())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["A".to_string(), "Mailadresse".to_string(), "C".to_string()],
            vec![
                Record::new(vec![
                    FieldValue::from_cell("a1"),
                    FieldValue::from_cell("x@example.org"),
                    FieldValue::from_cell("c1"),
                ]),
                Record::new(vec![FieldValue::from_cell("a2")]),
            ],
        )
    }

    #[test]
    fn empty_cell_is_missing() {
        assert_eq!(FieldValue::from_cell(""), FieldValue::Missing);
        assert_eq!(
            FieldValue::from_cell(" "),
            FieldValue::Present(" ".to_string())
        );
    }

    #[test]
    fn missing_field_uses_caller_fallback() {
        let table = table();
        let row = &table.rows()[1];
        assert_eq!(table.field(row, "C").or("N/A"), "N/A");
        assert_eq!(table.field(row, "Nope").or("N/A"), "N/A");
        assert_eq!(table.field(row, "A").or("N/A"), "a2");
    }

    #[test]
    fn short_rows_are_padded() {
        let table = table();
        assert_eq!(table.rows()[1].cells().len(), 3);
    }

    #[test]
    fn drops_named_columns_only() {
        let mut table = table();
        let dropped = table.drop_columns(&["Mailadresse", "Kolonne 16"]);
        assert_eq!(dropped, vec!["Mailadresse".to_string()]);
        assert_eq!(table.columns(), &["A".to_string(), "C".to_string()]);
        assert_eq!(table.field(&table.rows()[0], "C").as_str(), Some("c1"));
    }

    #[test]
    fn dropping_absent_columns_is_noop() {
        let mut table = table();
        assert!(table.drop_columns(&["Kolonne 16"]).is_empty());
        assert_eq!(table.columns().len(), 3);
    }

    #[test]
    fn pushes_column_aligned_with_rows() {
        let mut table = table();
        table.push_column("D", vec![FieldValue::from_cell("d1")]);
        assert_eq!(table.field(&table.rows()[0], "D").as_str(), Some("d1"));
        assert!(table.field(&table.rows()[1], "D").is_missing());
    }

    #[test]
    fn single_and_list_coordinates_are_exclusive() {
        let single = Coordinates::Single(Some(GeoPoint::new(56.15, 10.2)));
        assert_eq!(single.latitude(), Some(56.15));
        assert!(single.latitude_list().is_none());

        let multi = Coordinates::Multi(vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(3.0, 4.0)]);
        assert!(multi.latitude().is_none());
        assert_eq!(multi.latitude_list(), Some(vec![1.0, 3.0]));
        assert_eq!(multi.longitude_list(), Some(vec![2.0, 4.0]));
    }

    #[test]
    fn empty_multi_is_unresolved() {
        let multi = Coordinates::Multi(Vec::new());
        assert!(!multi.is_resolved());
        assert!(multi.latitude_list().is_none());
    }

    #[test]
    fn geo_point_serializes_as_object() {
        let json = serde_json::to_string(&GeoPoint::new(56.0, 10.0)).unwrap();
        assert_eq!(json, r#"{"latitude":56.0,"longitude":10.0}"#);
    }
}
