//! Daily-extract to bulk-template mapping engine.

use tracing::{debug, info, warn};

use crate::conf::{EnumBulkField, N_CLIENT_SEQUENCE_WIDTH};
use crate::spec::{
    EnumCellValue, EnumMappingRule, SpecDerivationWarning, SpecDestinationCell,
    SpecExtractRecord, SpecMapperOptions, SpecMappingReport,
};
use crate::util::{
    create_client_number, format_date_ddmmyyyy, format_date_yyyymmdd, normalize_phone_number,
    parse_card_type_code, parse_date_value, split_full_name,
};

/// Map extract rows onto bulk-template destination cells.
///
/// Row `i` of `records` lands on template row `options.n_row_start + i` with
/// sequence number `options.n_sequence_start + i`. Missing source columns read
/// as `""`; unparseable dates and unmapped card types become `""` and are
/// recorded as warnings. Nothing in this pipeline is fatal.
pub fn map_extract_records(
    records: &[SpecExtractRecord],
    options: &SpecMapperOptions,
) -> SpecMappingReport {
    let mut report = SpecMappingReport {
        rows: Vec::with_capacity(records.len()),
        warnings: vec![],
    };

    for (n_idx_row, record) in records.iter().enumerate() {
        let n_row = options.n_row_start + n_idx_row;
        let n_sequence = options.n_sequence_start + n_idx_row;

        let mut l_cells = Vec::with_capacity(options.rules.len());
        for rule in &options.rules {
            let value = match derive_rule_value(&rule.rule, record, n_sequence, options) {
                Ok(value) => value,
                Err(message) => {
                    let warning = SpecDerivationWarning {
                        row_number: n_row,
                        column: rule.field.column(),
                        field_name: rule.field.name().to_string(),
                        message,
                    };
                    warn!(%warning, "derived value degraded to empty");
                    report.warn(warning);
                    String::new()
                }
            };
            l_cells.push(SpecDestinationCell {
                row: n_row,
                column: rule.field.column(),
                value,
                if_force_text_format: true,
            });
        }
        report.rows.push(l_cells);
    }

    info!(
        n_rows = report.rows.len(),
        n_warnings = report.warnings.len(),
        "extract rows mapped"
    );
    report
}

/// Derive one destination value; `Err` carries the degradation reason.
fn derive_rule_value(
    rule: &EnumMappingRule,
    record: &SpecExtractRecord,
    n_sequence: usize,
    options: &SpecMapperOptions,
) -> Result<String, String> {
    match rule {
        EnumMappingRule::Constant(value) => Ok(value.clone()),
        EnumMappingRule::Copy(column) => Ok(record.get_text(column)),
        EnumMappingRule::NameToken(column, n_token) => {
            let l_tokens = split_full_name(&record.get_text(column));
            Ok(l_tokens.get(*n_token).cloned().unwrap_or_default())
        }
        EnumMappingRule::Phone(column) => Ok(normalize_phone_number(&record.get_text(column))),
        EnumMappingRule::RecordDate => Ok(format_date_yyyymmdd(options.date_record)),
        EnumMappingRule::ClientNumber => Ok(create_client_number(
            &options.client_number_prefix,
            n_sequence,
            N_CLIENT_SEQUENCE_WIDTH,
        )),
        EnumMappingRule::ProductCode(column) => {
            let Some(value) = derive_present_value(record, column) else {
                return Err(format!("{column:?} is empty; product code left blank."));
            };
            let Some(n_card_type) = parse_card_type_code(value) else {
                return Err(format!(
                    "{column:?} value {:?} is not an integer code.",
                    value.to_text()
                ));
            };
            match options.product_lookup.resolve(n_card_type) {
                Some(c_product) => Ok(c_product.to_string()),
                None => Err(format!("No product code mapped for card type {n_card_type}.")),
            }
        }
        EnumMappingRule::ExpiryDate(column) => {
            let Some(value) = derive_present_value(record, column) else {
                return Err(format!("{column:?} is empty; expiry date left blank."));
            };
            parse_date_value(value).map(format_date_ddmmyyyy).ok_or_else(|| {
                format!("{column:?} value {:?} is not a date.", value.to_text())
            })
        }
    }
}

fn derive_present_value<'a>(
    record: &'a SpecExtractRecord,
    column: &str,
) -> Option<&'a EnumCellValue> {
    record.get(column).filter(|value| !value.is_blank())
}

/// Lay one mapped row out as a 76-cell bulk row (unset columns `""`).
pub fn derive_bulk_row_from_cells(cells: &[SpecDestinationCell]) -> Vec<String> {
    let mut row = vec![String::new(); crate::conf::N_NCOLS_BULK];
    for cell in cells {
        if let Some(field) = cell.column.checked_sub(1).and_then(EnumBulkField::from_index) {
            row[field.index()] = cell.value.clone();
        } else {
            debug!(column = cell.column, "destination cell outside bulk layout skipped");
        }
    }
    row
}
