//! Positional CSV emission for cleaned bulk rows.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::debug;

use crate::conf::{C_CSV_DELIMITER, C_CSV_TERMINATOR};
use crate::spec::{
    CmsBulkError, EnumCsvConversion, EnumGateResult, SpecCleanedDataset, SpecValidatorOptions,
};
use crate::util::{derive_bulk_cells, escape_csv_cell};
use crate::validate::gate_bulk_rows;

/// Serialize cleaned rows: `;`-delimited, unquoted, `\n`-terminated, no header.
///
/// Every output record has exactly 76 fields. `\` and `"` are escaped with `\`;
/// cells are assumed free of the delimiter and terminator, which the cleaner
/// guarantees.
pub fn write_csv_bytes(dataset: &SpecCleanedDataset) -> Result<Vec<u8>, CmsBulkError> {
    let mut writer = WriterBuilder::new()
        .delimiter(C_CSV_DELIMITER)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(C_CSV_TERMINATOR))
        .has_headers(false)
        .from_writer(Vec::new());

    for row in &dataset.rows {
        let l_cells: Vec<_> = derive_bulk_cells(row).map(escape_csv_cell).collect();
        writer.write_record(l_cells.iter().map(|c_cell| c_cell.as_bytes()))?;
    }

    let v_bytes = writer
        .into_inner()
        .map_err(|err| CmsBulkError::Csv(err.into_error().into()))?;
    debug!(n_rows = dataset.height(), n_bytes = v_bytes.len(), "csv emitted");
    Ok(v_bytes)
}

/// Gate the rows, then serialize them only when every row passed.
pub fn convert_bulk_rows_to_csv<S: AsRef<str>>(
    rows: &[Vec<S>],
    options: &SpecValidatorOptions,
) -> Result<EnumCsvConversion, CmsBulkError> {
    match gate_bulk_rows(rows, options) {
        EnumGateResult::Cleaned(dataset) => {
            Ok(EnumCsvConversion::Converted(write_csv_bytes(&dataset)?))
        }
        EnumGateResult::Rejected(report) => Ok(EnumCsvConversion::Rejected(report)),
    }
}
