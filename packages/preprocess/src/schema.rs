//! Compile-time registry of export schema variants.
//!
//! The submission form has been exported in more than one shape. Each shape
//! is described by a TOML file under `schemas/` naming the canonical
//! (post-cleaning) columns the pipeline relies on, how its date columns are
//! formatted, which instructional suffixes to strip from headers and which
//! columns carry personal data that must never reach the output.

use serde::Deserialize;

use crate::PipelineError;

/// How a date column is formatted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DateFormat {
    /// A single `chrono` format string, e.g. `"%d/%m/%Y %H.%M.%S"`.
    Explicit {
        /// `chrono::format::strftime` pattern.
        pattern: String,
    },
    /// Any common day-first layout (`31/12/2025 18:00`, `31-12-2025`, ...).
    DayFirst,
}

/// A date column and its format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateColumn {
    /// Canonical column name.
    pub column: String,
    /// Expected format.
    pub format: DateFormat,
}

/// An export schema variant loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Schema {
    /// Unique identifier (e.g., `"single_date"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Column holding the event title.
    pub title: String,
    /// Column holding the organizer.
    pub organizer: String,
    /// Column holding the location text (one or more addresses).
    pub location: String,
    /// Date columns, in output order.
    pub dates: Vec<DateColumn>,
    /// Instructional phrases removed from raw headers.
    #[serde(default)]
    pub strip_suffixes: Vec<String>,
    /// Columns removed before processing because they hold personal data.
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

impl Schema {
    /// Every column that must exist after header cleaning.
    #[must_use]
    pub fn required_columns(&self) -> Vec<&str> {
        let mut required = vec![
            self.title.as_str(),
            self.organizer.as_str(),
            self.location.as_str(),
        ];
        required.extend(self.dates.iter().map(|d| d.column.as_str()));
        required
    }

    /// Required columns not present in `columns`.
    #[must_use]
    pub fn missing_columns<'a>(&'a self, columns: &[String]) -> Vec<&'a str> {
        self.required_columns()
            .into_iter()
            .filter(|required| !columns.iter().any(|c| c == required))
            .collect()
    }

    /// The privacy columns as string slices.
    #[must_use]
    pub fn drop_column_names(&self) -> Vec<&str> {
        self.drop_columns.iter().map(String::as_str).collect()
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SCHEMA_TOMLS: &[(&str, &str)] = &[
    ("single_date", include_str!("../schemas/single_date.toml")),
    ("start_end", include_str!("../schemas/start_end.toml")),
];

#[cfg(test)]
const EXPECTED_SCHEMA_COUNT: usize = 2;

/// Returns every registered schema in detection order.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_schemas() -> Vec<Schema> {
    SCHEMA_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse export schema '{name}': {e}"))
        })
        .collect()
}

/// Returns the schemas to try: the one named `id`, or all of them.
///
/// # Errors
///
/// Returns [`PipelineError::UnknownSchema`] if `id` names no schema.
pub fn candidates(id: Option<&str>) -> Result<Vec<Schema>, PipelineError> {
    let schemas = all_schemas();
    let Some(id) = id else {
        return Ok(schemas);
    };

    schemas
        .into_iter()
        .find(|s| s.id == id)
        .map(|s| vec![s])
        .ok_or_else(|| PipelineError::UnknownSchema { id: id.to_string() })
}
