//! Workbook reading via `calamine`.

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::error::{ProcessingError, ProcessingResult};
use crate::types::{Cell, Table};

/// Load the registration sheet `sheet_name` from a workbook (`.xlsx`, `.xls`, `.ods`, etc.).
///
/// Behavior:
/// - Fails with [`ProcessingError::SourceNotFound`] if the file does not exist
/// - Fails with [`ProcessingError::SheetNotFound`] (listing the available sheets) if the sheet
///   is absent
/// - Uses the first non-empty row as the header row; blank header cells become `Unnamed: {i}`
/// - Keeps blank rows between records so display row numbers match the sheet; trailing blank
///   rows are dropped
pub fn load_registrations(path: impl AsRef<Path>, sheet_name: &str) -> ProcessingResult<Table> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ProcessingError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = open_workbook_auto(path)?;
    let available = workbook.sheet_names();
    if !available.iter().any(|s| s == sheet_name) {
        return Err(ProcessingError::SheetNotFound {
            sheet: sheet_name.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet_name)?;
    table_from_range(sheet_name, &range)
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|c| matches!(c, Data::Empty))
}

fn table_from_range(sheet: &str, range: &Range<Data>) -> ProcessingResult<Table> {
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows_iter = range.rows().enumerate().skip_while(|(_, row)| is_blank_row(row));

    let (offset, header_row) = rows_iter.next().ok_or_else(|| ProcessingError::EmptySheet {
        sheet: sheet.to_string(),
    })?;
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let name = cell_to_header_string(c);
            if name.trim().is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            }
        })
        .collect();

    let mut data: Vec<&[Data]> = rows_iter.map(|(_, row)| row).collect();
    while data.last().is_some_and(|row| is_blank_row(row)) {
        data.pop();
    }
    let rows = data
        .into_iter()
        .map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(convert_cell).collect();
            cells.resize(headers.len(), Cell::Empty);
            cells
        })
        .collect();

    Ok(Table::new(headers, rows).with_header_row(first_row + offset))
}

fn cell_to_header_string(c: &Data) -> String {
    match convert_cell(c) {
        Cell::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Convert a workbook cell into a [`Cell`].
///
/// Numbers stay numeric; booleans and dates become text; error cells read as empty.
pub fn convert_cell(c: &Data) -> Cell {
    match c {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::Text(ndt.to_string()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
