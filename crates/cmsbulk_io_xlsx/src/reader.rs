//! Workbook reader: sheets into positional rows, named records, or template grids.

use std::io::{Cursor, Read, Seek};

use calamine::{Data, Reader, Sheets, open_workbook_auto_from_rs};
use cmsbulk_core::util::convert_excel_serial_to_datetime;
use cmsbulk_core::{CmsBulkError, EnumCellValue, SpecExtractRecord, validate_bulk_width};
use tracing::debug;

use crate::spec::{SpecSheetGrid, SpecTemplateGrid, XlsxIoError};
use crate::util::{derive_template_grid, validate_unique_columns};

/// Read one worksheet from workbook bytes (`xlsx`, `xls`, `xlsb`, `ods`).
///
/// `sheet_name = None` selects the first sheet.
pub fn read_sheet_grid(
    v_workbook: &[u8],
    sheet_name: Option<&str>,
) -> Result<SpecSheetGrid, XlsxIoError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(v_workbook))?;
    read_sheet_grid_from_workbook(&mut workbook, sheet_name)
}

fn read_sheet_grid_from_workbook<RS: Read + Seek>(
    workbook: &mut Sheets<RS>,
    sheet_name: Option<&str>,
) -> Result<SpecSheetGrid, XlsxIoError> {
    let l_sheet_names = workbook.sheet_names();
    let c_sheet_name = match sheet_name {
        Some(name) if l_sheet_names.iter().any(|c_name| c_name == name) => name.to_string(),
        Some(name) => {
            return Err(XlsxIoError::SheetNotFound {
                name: name.to_string(),
                available: l_sheet_names,
            });
        }
        None => l_sheet_names
            .first()
            .cloned()
            .ok_or(XlsxIoError::EmptyWorkbook)?,
    };

    let range = workbook.worksheet_range(&c_sheet_name)?;
    let mut rows: Vec<Vec<EnumCellValue>> = Vec::new();
    if let Some((n_row_start, n_col_start)) = range.start() {
        let (n_row_start, n_col_start) = (n_row_start as usize, n_col_start as usize);
        rows.resize(n_row_start, vec![]);
        for row in range.rows() {
            let mut l_cells = vec![EnumCellValue::None; n_col_start];
            l_cells.extend(row.iter().map(derive_cell_value_from_data));
            rows.push(l_cells);
        }
    }

    debug!(
        sheet = %c_sheet_name,
        n_rows = rows.len(),
        "worksheet read"
    );
    Ok(SpecSheetGrid {
        sheet_name: c_sheet_name,
        rows,
    })
}

/// Normalize one calamine cell.
pub fn derive_cell_value_from_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(val) => convert_excel_serial_to_datetime(val.as_f64())
            .map_or(EnumCellValue::Number(val.as_f64()), EnumCellValue::Date),
        Data::DateTimeIso(val) | Data::DurationIso(val) => EnumCellValue::String(val.clone()),
        Data::Error(val) => EnumCellValue::String(val.to_string()),
    }
}

/// Read positional bulk rows, skipping `n_rows_header` header rows.
///
/// Fails with a schema error when the sheet is narrower than the bulk layout.
pub fn read_bulk_rows(
    v_workbook: &[u8],
    sheet_name: Option<&str>,
    n_rows_header: usize,
) -> Result<Vec<Vec<String>>, XlsxIoError> {
    let grid = read_sheet_grid(v_workbook, sheet_name)?;
    validate_bulk_width(grid.width())?;

    Ok(grid
        .rows
        .iter()
        .skip(n_rows_header)
        .map(|row| row.iter().map(EnumCellValue::to_text).collect())
        .collect())
}

/// Read daily-extract records keyed by the exact header text of row 1.
///
/// Fully blank data rows are skipped. Duplicate header names are rejected.
pub fn read_extract_records(
    v_workbook: &[u8],
    sheet_name: Option<&str>,
) -> Result<Vec<SpecExtractRecord>, XlsxIoError> {
    let grid = read_sheet_grid(v_workbook, sheet_name)?;
    let Some((row_header, l_rows_data)) = grid.rows.split_first() else {
        return Ok(vec![]);
    };

    let l_colnames: Vec<String> = row_header.iter().map(EnumCellValue::to_text).collect();
    let l_colnames_named: Vec<String> = l_colnames
        .iter()
        .filter(|c_name| !c_name.is_empty())
        .cloned()
        .collect();
    validate_unique_columns(&l_colnames_named)
        .map_err(|msg| XlsxIoError::Core(CmsBulkError::UnexpectedInput(msg)))?;

    let mut l_records = Vec::with_capacity(l_rows_data.len());
    for row in l_rows_data {
        if row.iter().all(EnumCellValue::is_blank) {
            continue;
        }
        let mut record = SpecExtractRecord::default();
        for (c_name, value) in l_colnames.iter().zip(row) {
            if c_name.is_empty() {
                continue;
            }
            record.values.insert(c_name.clone(), value.clone());
        }
        l_records.push(record);
    }

    debug!(n_records = l_records.len(), "extract records read");
    Ok(l_records)
}

/// Read a bulk template as a text grid padded to the bulk width.
pub fn read_template_grid(
    v_workbook: &[u8],
    sheet_name: Option<&str>,
) -> Result<SpecTemplateGrid, XlsxIoError> {
    let grid = read_sheet_grid(v_workbook, sheet_name)?;
    Ok(derive_template_grid(&grid))
}
