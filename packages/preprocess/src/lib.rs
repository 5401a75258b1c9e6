#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Preprocessing of the pride event export for the dashboard map.
//!
//! [`run`] turns the raw form export into the file the dashboard reads:
//!
//! 1. Read the CSV ([`table`]).
//! 2. Clean the headers and detect the export schema ([`columns`],
//!    [`schema`]). An export missing any required column is rejected
//!    outright.
//! 3. Drop columns holding personal data.
//! 4. Parse the date columns ([`dates`]).
//! 5. Geocode every event's location, one address at a time
//!    ([`location`]).
//! 6. Write the enriched table in one pass.

pub mod columns;
pub mod dates;
pub mod location;
pub mod progress;
pub mod schema;
pub mod table;

use std::path::PathBuf;
use std::sync::Arc;

use pride_map_event_models::Coordinates;
use pride_map_geocoder::{Geocoder, Resolver, ResolverStats};

use crate::columns::NormalizedTable;
use crate::location::LocationSpec;
use crate::progress::ProgressCallback;

/// Errors that abort a preprocessing run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not valid CSV or the output could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A coordinate list could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input file has no header row.
    #[error("Input file {} is empty", .path.display())]
    EmptyInput {
        /// The offending file.
        path: PathBuf,
    },

    /// No known schema matched the cleaned headers.
    #[error("Required columns are missing after header cleaning")]
    MissingRequiredColumns,

    /// The requested schema id is not registered.
    #[error("Unknown export schema: {id}")]
    UnknownSchema {
        /// The requested id.
        id: String,
    },
}

/// Where to read from and write to.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// The raw export.
    pub input: PathBuf,
    /// The enriched output, replaced if it exists.
    pub output: PathBuf,
    /// Force a schema id instead of detecting one.
    pub schema: Option<String>,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The detected (or forced) schema id.
    pub schema: String,
    /// Rows written.
    pub rows: usize,
    /// Rows with one address (or none).
    pub single_address: usize,
    /// Rows with several addresses.
    pub multi_address: usize,
    /// Rows for which no coordinate was resolved.
    pub unresolved_rows: usize,
    /// Non-empty date values that did not parse.
    pub unparsed_dates: usize,
    /// Privacy columns removed from the output.
    pub dropped_columns: Vec<String>,
    /// Geocoding counters.
    pub geocoding: ResolverStats,
}

/// Runs the full preprocessing pipeline.
///
/// Per-address geocoding failures are logged and leave that address
/// without coordinates; they never abort the run. The output is written
/// once, after every row has been processed.
///
/// # Errors
///
/// Returns [`PipelineError`] if the input cannot be read, is empty, lacks
/// a required column, or the output cannot be written. Nothing is written
/// in the first three cases.
pub async fn run<G: Geocoder>(
    options: &RunOptions,
    resolver: &mut Resolver<G>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, PipelineError> {
    let candidates = schema::candidates(options.schema.as_deref())?;
    let raw = table::read_table(&options.input)?;

    let Some(NormalizedTable { mut table, schema }) = columns::normalize(raw, &candidates) else {
        return Err(PipelineError::MissingRequiredColumns);
    };

    let dropped_columns = table.drop_columns(&schema.drop_column_names());
    if !dropped_columns.is_empty() {
        log::info!(
            "Dropped privacy-sensitive columns: {}",
            dropped_columns.join(", ")
        );
    }

    let unparsed_dates = dates::add_parsed_date_columns(&mut table, &schema);

    progress.set_total(table.len() as u64);

    let mut coordinates = Vec::with_capacity(table.len());
    let mut single_address = 0;
    let mut multi_address = 0;
    let mut unresolved_rows = 0;

    for record in table.rows() {
        progress.set_message(table.field(record, &schema.title).or("Event").to_string());

        let spec = LocationSpec::parse(table.field(record, &schema.location).as_str());
        if spec.len() > 1 {
            log::debug!("Event lists {} addresses", spec.len());
        }
        let coords = location::resolve_location(resolver, &spec).await;

        match coords {
            Coordinates::Single(_) => single_address += 1,
            Coordinates::Multi(_) => multi_address += 1,
        }
        if !coords.is_resolved() {
            unresolved_rows += 1;
        }

        coordinates.push(coords);
        progress.inc(1);
    }

    location::append_coordinates(&mut table, &coordinates)?;
    table::write_table(&options.output, &table)?;

    let summary = RunSummary {
        schema: schema.id,
        rows: table.len(),
        single_address,
        multi_address,
        unresolved_rows,
        unparsed_dates,
        dropped_columns,
        geocoding: *resolver.stats(),
    };

    log::info!(
        "Processed {} events ({} single-address, {} multi-address); {} without coordinates, {} unparsed dates",
        summary.rows,
        summary.single_address,
        summary.multi_address,
        summary.unresolved_rows,
        summary.unparsed_dates
    );
    log::info!(
        "Geocoding: {} lookups, {} matched, {} answered from cache, {} skipped",
        summary.geocoding.attempted,
        summary.geocoding.resolved,
        summary.geocoding.cached,
        summary.geocoding.skipped
    );
    progress.finish(format!(
        "{} events, {} without coordinates",
        summary.rows, summary.unresolved_rows
    ));

    Ok(summary)
}
