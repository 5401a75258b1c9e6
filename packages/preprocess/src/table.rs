//! CSV reading and writing.

use std::io::{Read, Write};
use std::path::Path;

use pride_map_event_models::{FieldValue, Record, Table};

use crate::PipelineError;

/// Reads a comma-separated export with a header row.
///
/// Quoted fields may span lines (the export's headers do). Rows may be
/// shorter or longer than the header; short rows are padded with
/// [`FieldValue::Missing`].
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be opened,
/// [`PipelineError::Csv`] if it is not valid CSV, and
/// [`PipelineError::EmptyInput`] if it has no header row.
pub fn read_table(path: &Path) -> Result<Table, PipelineError> {
    let file = std::fs::File::open(path)?;
    let table = read_table_from(file)?;

    if table.columns().is_empty() {
        return Err(PipelineError::EmptyInput {
            path: path.to_path_buf(),
        });
    }

    log::info!(
        "Read {} rows with {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );

    Ok(table)
}

/// Reads CSV from any reader. See [`read_table`].
///
/// # Errors
///
/// Returns [`csv::Error`] if the input is not valid CSV or not UTF-8.
pub fn read_table_from<R: Read>(reader: R) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(Record::new(record.iter().map(FieldValue::from_cell).collect()));
    }

    Ok(Table::new(columns, rows))
}

/// Writes `table` as CSV to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be created or written.
pub fn write_table(path: &Path, table: &Table) -> Result<(), PipelineError> {
    let file = std::fs::File::create(path)?;
    write_table_to(file, table)?;

    log::info!("Wrote {} rows to {}", table.len(), path.display());

    Ok(())
}

/// Writes `table` as CSV to any writer. Missing cells are written empty.
///
/// # Errors
///
/// Returns [`csv::Error`] if writing fails.
pub fn write_table_to<W: Write>(writer: W, table: &Table) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record(table.columns())?;

    let width = table.columns().len();
    for record in table.rows() {
        writer.write_record(record.cells().iter().take(width).map(FieldValue::to_cell))?;
    }

    writer.flush()?;
    Ok(())
}
