//! Bulk-row validator/cleaner and the all-or-nothing gate.

use tracing::{debug, info, warn};

use crate::conf::{N_NCOLS_BULK, TUP_MANDATORY_BULK_FIELDS};
use crate::spec::{
    CmsBulkError, EnumGateResult, SpecCleanedDataset, SpecValidationError, SpecValidationReport,
    SpecValidatorOptions,
};
use crate::util::{clean_cell_text, derive_bulk_cells};

/// Reject a source sheet narrower than the bulk layout.
pub fn validate_bulk_width(n_cols: usize) -> Result<(), CmsBulkError> {
    if n_cols < N_NCOLS_BULK {
        return Err(CmsBulkError::Schema {
            n_cols_found: n_cols,
            n_cols_required: N_NCOLS_BULK,
        });
    }
    Ok(())
}

/// Clean one row to exactly 76 cells.
pub fn clean_bulk_row<S: AsRef<str>>(row: &[S]) -> Vec<String> {
    derive_bulk_cells(row).map(clean_cell_text).collect()
}

/// Names of mandatory fields that are empty in a cleaned 76-cell row.
pub fn find_missing_mandatory_fields(row_cleaned: &[String]) -> Vec<String> {
    TUP_MANDATORY_BULK_FIELDS
        .iter()
        .filter(|field| {
            row_cleaned
                .get(field.index())
                .is_none_or(|val| val.is_empty())
        })
        .map(|field| field.name().to_string())
        .collect()
}

/// Clean and validate every row in one pass.
///
/// Returns the cleaned rows (always 76 cells each, invalid rows included) and
/// one [`SpecValidationError`] per row with missing mandatory fields. The
/// cleaned rows must not be emitted when the error list is non-empty; use
/// [`gate_bulk_rows`] to enforce that.
pub fn validate_bulk_rows<S: AsRef<str>>(
    rows: &[Vec<S>],
    options: &SpecValidatorOptions,
) -> (Vec<Vec<String>>, Vec<SpecValidationError>) {
    let mut l_rows_cleaned = Vec::with_capacity(rows.len());
    let mut l_errors = Vec::new();

    for (n_idx_row, row) in rows.iter().enumerate() {
        let row_cleaned = clean_bulk_row(row);
        let l_missing = find_missing_mandatory_fields(&row_cleaned);
        if !l_missing.is_empty() {
            let n_row_number = options.derive_row_number(n_idx_row);
            debug!(
                row_number = n_row_number,
                n_missing = l_missing.len(),
                "bulk row failed mandatory check"
            );
            l_errors.push(SpecValidationError {
                row_number: n_row_number,
                missing_fields: l_missing,
            });
        }
        l_rows_cleaned.push(row_cleaned);
    }

    (l_rows_cleaned, l_errors)
}

/// Validate and decide: cleaned dataset, or a rejection report with nothing emitted.
pub fn gate_bulk_rows<S: AsRef<str>>(
    rows: &[Vec<S>],
    options: &SpecValidatorOptions,
) -> EnumGateResult {
    let (l_rows_cleaned, l_errors) = validate_bulk_rows(rows, options);

    if l_errors.is_empty() {
        info!(n_rows = l_rows_cleaned.len(), "bulk rows passed validation");
        return EnumGateResult::Cleaned(SpecCleanedDataset {
            rows: l_rows_cleaned,
        });
    }

    let report = SpecValidationReport {
        n_rows_checked: rows.len(),
        errors: l_errors,
    };
    warn!(
        n_rows = report.n_rows_checked,
        n_rejected = report.error_count(),
        "bulk rows rejected; fix before download"
    );
    EnumGateResult::Rejected(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{EnumBulkField, L_BULK_FIELDS};

    fn create_valid_row() -> Vec<String> {
        L_BULK_FIELDS
            .iter()
            .map(|field| format!("v{}", field.index()))
            .collect()
    }

    #[test]
    fn test_valid_rows_produce_no_errors() {
        let l_rows = vec![create_valid_row(), create_valid_row()];
        let (l_cleaned, l_errors) = validate_bulk_rows(&l_rows, &SpecValidatorOptions::default());
        assert!(l_errors.is_empty());
        assert_eq!(l_cleaned.len(), 2);
        assert!(l_cleaned.iter().all(|row| row.len() == N_NCOLS_BULK));
    }

    #[test]
    fn test_each_missing_mandatory_field_is_reported_alone() {
        for field in TUP_MANDATORY_BULK_FIELDS {
            let mut row = create_valid_row();
            row[field.index()] = "   ".to_string();
            let l_rows = vec![create_valid_row(), row];

            let (_, l_errors) = validate_bulk_rows(&l_rows, &SpecValidatorOptions::default());
            assert_eq!(
                l_errors,
                vec![SpecValidationError {
                    row_number: 3,
                    missing_fields: vec![field.name().to_string()],
                }]
            );
        }
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let mut row = create_valid_row();
        row[EnumBulkField::Title.index()] = String::new();
        row[EnumBulkField::Reserved3.index()] = "--".to_string();
        let (l_cleaned, l_errors) = validate_bulk_rows(&[row], &SpecValidatorOptions::default());
        assert!(l_errors.is_empty());
        assert_eq!(l_cleaned[0][EnumBulkField::Reserved3.index()], "");
    }

    #[test]
    fn test_hyphen_only_value_counts_as_missing() {
        let mut row = create_valid_row();
        row[0] = " - - ".to_string();
        let (l_cleaned, l_errors) = validate_bulk_rows(&[row], &SpecValidatorOptions::default());
        assert_eq!(l_errors[0].row_number, 2);
        assert_eq!(l_errors[0].missing_fields, vec!["Record Date".to_string()]);
        assert_eq!(l_cleaned[0][0], "");
    }

    #[test]
    fn test_short_row_fails_on_mandatory_field_beyond_width() {
        let row: Vec<String> = create_valid_row().into_iter().take(70).collect();
        let (l_cleaned, l_errors) = validate_bulk_rows(&[row], &SpecValidatorOptions::default());
        assert_eq!(l_cleaned[0].len(), N_NCOLS_BULK);
        assert_eq!(
            l_errors[0].missing_fields,
            vec![EnumBulkField::CardActionCode.name().to_string()]
        );
    }

    #[test]
    fn test_row_number_offset_follows_header_rows() {
        let options = SpecValidatorOptions { n_rows_header: 3 };
        let l_rows: Vec<Vec<String>> = vec![create_valid_row(), vec![]];
        let (_, l_errors) = validate_bulk_rows(&l_rows, &options);
        assert_eq!(l_errors.len(), 1);
        assert_eq!(l_errors[0].row_number, 5);
        assert_eq!(l_errors[0].missing_fields.len(), TUP_MANDATORY_BULK_FIELDS.len());
    }

    #[test]
    fn test_gate_rejects_whole_dataset_on_any_error() {
        let l_rows = vec![create_valid_row(), vec!["x".to_string()]];
        match gate_bulk_rows(&l_rows, &SpecValidatorOptions::default()) {
            EnumGateResult::Rejected(report) => {
                assert_eq!(report.n_rows_checked, 2);
                assert_eq!(report.error_count(), 1);
                assert!(report.to_lines()[0].starts_with("Row 3: missing Institution Number"));
            }
            EnumGateResult::Cleaned(_) => panic!("expected rejection"),
        }

        let l_rows_ok = vec![create_valid_row()];
        assert!(gate_bulk_rows(&l_rows_ok, &SpecValidatorOptions::default()).is_cleaned());
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let mut row = create_valid_row();
        row[5] = "  a-b ".to_string();
        row[8] = "x;y".to_string();
        let row_once = clean_bulk_row(&row);
        assert_eq!(clean_bulk_row(&row_once), row_once);
    }

    #[test]
    fn test_validate_bulk_width() {
        assert!(validate_bulk_width(76).is_ok());
        assert!(validate_bulk_width(80).is_ok());
        assert!(matches!(
            validate_bulk_width(70),
            Err(CmsBulkError::Schema {
                n_cols_found: 70,
                n_cols_required: 76
            })
        ));
    }
}
