//! Writing results back into a workbook via `rust_xlsxwriter`.
//!
//! The target workbook keeps every sheet it already has; the invalid-registrations and
//! sibling sheets are added (or replaced in place if they already exist). When the target does
//! not exist yet, the other sheets are taken from the source workbook instead. The workbook is
//! rendered in memory and then moved into place, so a failed run never leaves a half-written
//! or partially copied file behind.

use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, open_workbook_auto};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};
use tracing::info;

use crate::config::SheetNames;
use crate::error::ProcessingResult;
use crate::processing::{InvalidRecord, SiblingGroup};
use crate::types::Cell;

const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Results to add to the output workbook.
#[derive(Debug, Clone, Copy)]
pub struct ResultSheets<'a> {
    /// Headers of the source sheet, used as the trailing columns of the invalid sheet.
    pub headers: &'a [String],
    pub invalid: &'a [InvalidRecord],
    pub siblings: &'a [SiblingGroup],
}

/// Write `results` into the workbook at `path`, preserving its existing sheets.
///
/// If `path` does not exist, the sheets of `source` are carried over instead (when `source` exists
/// either). With neither present a new workbook with just the two result sheets is created.
pub fn write_results(
    path: impl AsRef<Path>,
    source: impl AsRef<Path>,
    names: &SheetNames,
    results: ResultSheets<'_>,
) -> ProcessingResult<()> {
    let path = path.as_ref();
    let source = source.as_ref();
    let existing = if path.exists() {
        read_existing_sheets(path)?
    } else {
        read_existing_sheets(source)?
    };
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    let mut workbook = Workbook::new();
    let mut wrote_invalid = false;
    let mut wrote_siblings = false;

    for (name, range) in &existing {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        if *name == names.invalid {
            write_invalid_sheet(worksheet, results.headers, results.invalid)?;
            wrote_invalid = true;
        } else if *name == names.siblings {
            write_siblings_sheet(worksheet, results.siblings)?;
            wrote_siblings = true;
        } else {
            copy_range(worksheet, range, &date_format)?;
        }
    }
    if !wrote_invalid {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&names.invalid)?;
        write_invalid_sheet(worksheet, results.headers, results.invalid)?;
    }
    if !wrote_siblings {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&names.siblings)?;
        write_siblings_sheet(worksheet, results.siblings)?;
    }

    let buffer = workbook.save_to_buffer()?;
    let staging = staging_path(path);
    if let Err(e) = std::fs::write(&staging, buffer).and_then(|()| std::fs::rename(&staging, path)) {
        let _ = std::fs::remove_file(&staging);
        return Err(e.into());
    }

    info!(
        path = %path.display(),
        invalid_sheet = %names.invalid,
        invalid = results.invalid.len(),
        siblings_sheet = %names.siblings,
        groups = results.siblings.len(),
        "results written"
    );
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn read_existing_sheets(path: &Path) -> ProcessingResult<Vec<(String, Range<Data>)>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let mut workbook = open_workbook_auto(path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        sheets.push((name, range));
    }
    Ok(sheets)
}

fn copy_range(worksheet: &mut Worksheet, range: &Range<Data>, date_format: &Format) -> ProcessingResult<()> {
    let Some((row0, col0)) = range.start() else {
        return Ok(());
    };
    for (r, row) in range.rows().enumerate() {
        let row_num = row0 + r as RowNum;
        for (c, data) in row.iter().enumerate() {
            let col_num = (col0 as usize + c) as ColNum;
            match data {
                Data::Empty | Data::Error(_) => {}
                Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                Data::Int(i) => {
                    worksheet.write_number(row_num, col_num, *i as f64)?;
                }
                Data::Float(f) => {
                    worksheet.write_number(row_num, col_num, *f)?;
                }
                Data::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                Data::DateTime(dt) => {
                    worksheet.write_number_with_format(row_num, col_num, dt.as_f64(), date_format)?;
                }
            }
        }
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: RowNum, col: ColNum, cell: &Cell) -> ProcessingResult<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Cell::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
    }
    Ok(())
}

/// Columns: `Row_Number`, `Validation_Issues`, then the source headers in order.
fn write_invalid_sheet(
    worksheet: &mut Worksheet,
    headers: &[String],
    invalid: &[InvalidRecord],
) -> ProcessingResult<()> {
    worksheet.write_string(0, 0, "Row_Number")?;
    worksheet.write_string(0, 1, "Validation_Issues")?;
    for (c, header) in headers.iter().enumerate() {
        worksheet.write_string(0, (c + 2) as ColNum, header)?;
    }

    for (r, record) in invalid.iter().enumerate() {
        let row = (r + 1) as RowNum;
        worksheet.write_number(row, 0, record.row_number as f64)?;
        worksheet.write_string(row, 1, record.issues_text())?;
        for (c, cell) in record.fields.iter().enumerate() {
            write_cell(worksheet, row, (c + 2) as ColNum, cell)?;
        }
    }
    Ok(())
}

/// Columns: `Parent_Email`, `Number_of_Children`, `Children_Names`, `Row_Numbers`, and
/// `Total_Age` when ages were summed.
fn write_siblings_sheet(worksheet: &mut Worksheet, groups: &[SiblingGroup]) -> ProcessingResult<()> {
    let with_age = groups.iter().any(|g| g.total_age.is_some());

    worksheet.write_string(0, 0, "Parent_Email")?;
    worksheet.write_string(0, 1, "Number_of_Children")?;
    worksheet.write_string(0, 2, "Children_Names")?;
    worksheet.write_string(0, 3, "Row_Numbers")?;
    if with_age {
        worksheet.write_string(0, 4, "Total_Age")?;
    }

    for (r, group) in groups.iter().enumerate() {
        let row = (r + 1) as RowNum;
        let rows: Vec<String> = group.row_numbers.iter().map(|n| n.to_string()).collect();
        worksheet.write_string(row, 0, &group.parent_email)?;
        worksheet.write_number(row, 1, group.number_of_children as f64)?;
        worksheet.write_string(row, 2, group.children_names.join(", "))?;
        worksheet.write_string(row, 3, rows.join(", "))?;
        if let Some(total) = group.total_age {
            worksheet.write_number(row, 4, total as f64)?;
        }
    }
    Ok(())
}
