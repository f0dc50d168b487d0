// table_loader.rs
use crate::error::{Result, RollerError};
use crate::table_view::Table;
use calamine::{open_workbook_auto, DataType, Range, Reader};
use std::path::Path;

/// Loads one sheet of an xlsx/xls/xlsb/ods workbook as a text table, using
/// the first row as headers.
pub fn load_table(workbook_path: &Path, sheet_name: &str) -> Result<Table> {
    let mut workbook = open_workbook_auto(workbook_path)?;
    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(RollerError::SheetNotFound(sheet_name.to_string()));
    }
    let range = workbook.worksheet_range(sheet_name)?;

    let table = table_from_range(&range)?;
    tracing::info!(
        workbook = %workbook_path.display(),
        sheet = sheet_name,
        rows = table.row_count(),
        "loaded table"
    );
    Ok(table)
}

pub fn table_from_range(range: &Range<DataType>) -> Result<Table> {
    let mut rows = range.rows();
    let header_row = match rows.next() {
        Some(row) => row,
        None => return Table::new(Vec::new()),
    };

    // Blank header cells don't make a column.
    let kept: Vec<(usize, String)> = header_row
        .iter()
        .enumerate()
        .map(|(index, cell)| (index, cell_text(cell)))
        .filter(|(_, header)| !header.trim().is_empty())
        .collect();

    let headers = kept.iter().map(|(_, header)| header.clone()).collect();
    let body = rows
        .map(|row| {
            kept.iter()
                .map(|(index, _)| row.get(*index).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    Table::from_rows(headers, body)
}

pub fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(text) => text.clone(),
        DataType::Int(value) => value.to_string(),
        DataType::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            (*value as i64).to_string()
        }
        other => other.to_string(),
    }
}
