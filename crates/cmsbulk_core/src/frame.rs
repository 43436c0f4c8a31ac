//! Polars `DataFrame` adapter: frames in, positional rows or named records out.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};
use tracing::debug;

use crate::conf::N_NCOLS_BULK;
use crate::spec::{CmsBulkError, EnumCellValue, SpecExtractRecord};
use crate::validate::validate_bulk_width;

/// Decode a Polars IPC payload.
pub fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, CmsBulkError> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| {
            CmsBulkError::UnexpectedInput(format!("Failed to read IPC DataFrame bytes: {err}"))
        })
}

/// Read the first 76 columns of `df` as positional text rows.
///
/// Fails with [`CmsBulkError::Schema`] when the frame is narrower than the bulk
/// layout; extra columns are ignored.
pub fn derive_bulk_rows_from_dataframe(df: &DataFrame) -> Result<Vec<Vec<String>>, CmsBulkError> {
    validate_bulk_width(df.width())?;

    let l_cols = &df.get_columns()[..N_NCOLS_BULK];
    let mut l_rows = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut row = Vec::with_capacity(N_NCOLS_BULK);
        for col in l_cols {
            row.push(derive_cell_value_from_any_value(col.get(n_idx_row)?).to_text());
        }
        l_rows.push(row);
    }

    debug!(n_rows = l_rows.len(), "bulk rows read from dataframe");
    Ok(l_rows)
}

/// Decode a Polars IPC payload straight into positional bulk rows.
pub fn read_bulk_rows_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Vec<Vec<String>>, CmsBulkError> {
    let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
    derive_bulk_rows_from_dataframe(&df)
}

/// Read every row of `df` as a record keyed by column name.
pub fn derive_extract_records_from_dataframe(
    df: &DataFrame,
) -> Result<Vec<SpecExtractRecord>, CmsBulkError> {
    let l_colnames: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let l_cols = df.get_columns();

    let mut l_records = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut record = SpecExtractRecord::default();
        for (c_name, col) in l_colnames.iter().zip(l_cols) {
            record.values.insert(
                c_name.clone(),
                derive_cell_value_from_any_value(col.get(n_idx_row)?),
            );
        }
        l_records.push(record);
    }

    debug!(
        n_rows = l_records.len(),
        n_cols = l_colnames.len(),
        "extract records read from dataframe"
    );
    Ok(l_records)
}

/// Normalize one Polars scalar.
pub fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        // Dates and datetimes display as ISO text, which the date parser accepts.
        _ => EnumCellValue::String(value.to_string()),
    }
}
