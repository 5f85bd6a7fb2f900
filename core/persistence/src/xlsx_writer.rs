//! FILENAME: core/persistence/src/xlsx_writer.rs
//! Writes a pivot view as a single-sheet workbook.
//!
//! Layout: one header row (main column, secondary column, count column), then
//! one row per key. With merged cells, each run of equal main values is written
//! once as a vertical merged range.

use crate::PersistenceError;
use log::debug;
use pivot_engine::PivotView;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::fs;
use std::path::Path;

/// Rows a worksheet can hold, header included.
pub const XLSX_MAX_ROWS: usize = 1_048_576;

const SHEET_NAME: &str = "Sheet1";

const MAIN_COL: u16 = 0;
const SECONDARY_COL: u16 = 1;
const COUNT_COL: u16 = 2;

pub fn save_pivot_xlsx(view: &PivotView, path: &Path) -> Result<(), PersistenceError> {
    if view.rows.len() + 1 > XLSX_MAX_ROWS {
        return Err(PersistenceError::TooManyRows(view.rows.len()));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    let index_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Top);

    for (col, header) in view.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    write_body(worksheet, view, &index_format)?;
    worksheet.autofit();

    workbook.save(path)?;
    debug!(
        "[XLSX] wrote {} rows ({} merged spans) to {}",
        view.rows.len(),
        view.merged_spans.len(),
        path.display()
    );
    Ok(())
}

fn write_body(
    worksheet: &mut Worksheet,
    view: &PivotView,
    index_format: &Format,
) -> Result<(), PersistenceError> {
    for (i, row) in view.rows.iter().enumerate() {
        let sheet_row = sheet_row(i);
        if !view.merge_cells {
            worksheet.write_string_with_format(sheet_row, MAIN_COL, &row.main, index_format)?;
        }
        worksheet.write_string_with_format(sheet_row, SECONDARY_COL, &row.secondary, index_format)?;
        worksheet.write_number(sheet_row, COUNT_COL, row.count as f64)?;
    }

    if view.merge_cells {
        for span in &view.merged_spans {
            let first = sheet_row(span.first_row);
            let main = &view.rows[span.first_row].main;
            if span.row_count() > 1 {
                let last = sheet_row(span.last_row);
                worksheet.merge_range(first, MAIN_COL, last, MAIN_COL, main, index_format)?;
            } else {
                worksheet.write_string_with_format(first, MAIN_COL, main, index_format)?;
            }
        }
    }
    Ok(())
}

/// Sheet row of a view row; row 0 holds the headers.
fn sheet_row(view_row: usize) -> u32 {
    (view_row + 1) as u32
}
