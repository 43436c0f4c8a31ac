//! Shared record, report and option models.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::conf::{
    C_CLIENT_NUMBER_PREFIX, EnumBulkField, N_NROWS_HEADER_DEFAULT, N_TEMPLATE_ROW_START,
    derive_default_mapping_rules, derive_default_product_lookup,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Normalized cell value handed to the kernel by any reader.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Native date/datetime value.
    Date(NaiveDateTime),
}

impl EnumCellValue {
    /// Render as text: integral numbers lose their fraction, blanks become `""`.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(val) => val.clone(),
            Self::Number(val) => crate::util::format_number_text(*val),
            Self::Date(val) => crate::util::format_datetime_text(val),
        }
    }

    /// Whether the value renders as blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(val) => val.trim().is_empty(),
            Self::Number(val) => val.is_nan(),
            Self::Date(_) => false,
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDate> for EnumCellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value.and_time(chrono::NaiveTime::MIN))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BulkValidation

/// One position of the bulk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFieldSpec {
    /// Zero-based column index.
    pub column_index: usize,
    /// Semantic field name.
    pub name: &'static str,
    /// Whether the column must be non-empty.
    pub mandatory: bool,
}

/// Validation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecValidatorOptions {
    /// Header rows preceding data in the source sheet; shifts reported row numbers.
    pub n_rows_header: usize,
}

impl Default for SpecValidatorOptions {
    fn default() -> Self {
        Self {
            n_rows_header: N_NROWS_HEADER_DEFAULT,
        }
    }
}

impl SpecValidatorOptions {
    /// Spreadsheet row number (1-based) of the zero-based data row `n_idx_row`.
    pub fn derive_row_number(&self, n_idx_row: usize) -> usize {
        n_idx_row + 1 + self.n_rows_header
    }
}

/// Missing mandatory fields of one source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecValidationError {
    /// 1-based spreadsheet row number.
    pub row_number: usize,
    /// Missing field names in column order.
    pub missing_fields: Vec<String>,
}

impl fmt::Display for SpecValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {}: missing {}",
            self.row_number,
            self.missing_fields.join(", ")
        )
    }
}

/// Row-indexed rejection report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecValidationReport {
    /// Number of source rows inspected.
    pub n_rows_checked: usize,
    /// Per-row failures.
    pub errors: Vec<SpecValidationError>,
}

impl SpecValidationReport {
    /// Number of rejected rows.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Whether every inspected row passed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// One display line per rejected row.
    pub fn to_lines(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for SpecValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[VALIDATE] checked={} rejected={}",
            self.n_rows_checked,
            self.error_count()
        )
    }
}

/// Cleaned 76-column rows that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCleanedDataset {
    /// Cleaned rows, each exactly 76 cells.
    pub rows: Vec<Vec<String>>,
}

impl SpecCleanedDataset {
    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Outcome of the all-or-nothing validation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumGateResult {
    /// Every row passed; the cleaned rows may be emitted.
    Cleaned(SpecCleanedDataset),
    /// At least one row failed; nothing may be emitted.
    Rejected(SpecValidationReport),
}

impl EnumGateResult {
    /// Whether the gate let the dataset through.
    pub fn is_cleaned(&self) -> bool {
        matches!(self, Self::Cleaned(_))
    }
}

/// Outcome of bulk-to-CSV conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCsvConversion {
    /// Serialized CSV bytes.
    Converted(Vec<u8>),
    /// Validation failed; fix the source before downloading.
    Rejected(SpecValidationReport),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExtractMapping

/// One daily-extract row addressed by column name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecExtractRecord {
    /// Values by exact source column name.
    pub values: BTreeMap<String, EnumCellValue>,
}

impl SpecExtractRecord {
    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<EnumCellValue>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, val)| (key.into(), val.into()))
                .collect(),
        }
    }

    /// Raw value of `column`, `None` when the column is absent.
    pub fn get(&self, column: &str) -> Option<&EnumCellValue> {
        self.values.get(column)
    }

    /// Text of `column`; absent columns read as `""`.
    pub fn get_text(&self, column: &str) -> String {
        self.values
            .get(column)
            .map(EnumCellValue::to_text)
            .unwrap_or_default()
    }
}

/// Card-type code to product-code table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecProductCodeLookup {
    dict_codes: BTreeMap<i64, String>,
}

impl SpecProductCodeLookup {
    /// Wrap a loaded mapping.
    pub fn new(dict_codes: BTreeMap<i64, String>) -> Self {
        Self { dict_codes }
    }

    /// Product code for `n_card_type`.
    pub fn resolve(&self, n_card_type: i64) -> Option<&str> {
        self.dict_codes.get(&n_card_type).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.dict_codes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.dict_codes.is_empty()
    }
}

/// How a destination value is derived from an extract row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumMappingRule {
    /// Fixed literal.
    Constant(String),
    /// Source text copied verbatim.
    Copy(String),
    /// Zero-based whitespace token of a source name.
    NameToken(String, usize),
    /// Source phone with `00` international prefix.
    Phone(String),
    /// Source card type resolved through the product lookup.
    ProductCode(String),
    /// Source date reformatted as `DD/MM/YYYY`.
    ExpiryDate(String),
    /// Run date as `YYYYMMDD`.
    RecordDate,
    /// Client-number prefix plus zero-padded sequence.
    ClientNumber,
}

/// One row of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMappingRule {
    /// Destination bulk field.
    pub field: EnumBulkField,
    /// Derivation rule.
    pub rule: EnumMappingRule,
}

impl SpecMappingRule {
    /// Pair a destination field with its rule.
    pub fn new(field: EnumBulkField, rule: EnumMappingRule) -> Self {
        Self { field, rule }
    }
}

/// Extract-to-bulk mapping options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMapperOptions {
    /// Date written to the record-date column.
    pub date_record: NaiveDate,
    /// Literal prefix of generated client numbers.
    pub client_number_prefix: String,
    /// Sequence number of the first input row.
    pub n_sequence_start: usize,
    /// 1-based destination row of the first input row.
    pub n_row_start: usize,
    /// Card-type lookup.
    pub product_lookup: SpecProductCodeLookup,
    /// Mapping table.
    pub rules: Vec<SpecMappingRule>,
}

impl Default for SpecMapperOptions {
    fn default() -> Self {
        Self {
            date_record: Local::now().date_naive(),
            client_number_prefix: C_CLIENT_NUMBER_PREFIX.to_string(),
            n_sequence_start: 1,
            n_row_start: N_TEMPLATE_ROW_START,
            product_lookup: derive_default_product_lookup(),
            rules: derive_default_mapping_rules(),
        }
    }
}

/// One value placed into the bulk template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDestinationCell {
    /// 1-based template row.
    pub row: usize,
    /// 1-based template column.
    pub column: usize,
    /// Text to write.
    pub value: String,
    /// Write the cell with a text-preserving format.
    pub if_force_text_format: bool,
}

/// Non-fatal derivation failure; the affected cell is written as `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDerivationWarning {
    /// 1-based template row.
    pub row_number: usize,
    /// 1-based template column.
    pub column: usize,
    /// Destination field name.
    pub field_name: String,
    /// Human-readable reason.
    pub message: String,
}

impl fmt::Display for SpecDerivationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {} col {} ({}): {}",
            self.row_number, self.column, self.field_name, self.message
        )
    }
}

/// Mapping output: destination cells per input row plus warnings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecMappingReport {
    /// One cell set per input row, in input order.
    pub rows: Vec<Vec<SpecDestinationCell>>,
    /// Degraded derivations.
    pub warnings: Vec<SpecDerivationWarning>,
}

impl SpecMappingReport {
    /// Record a degraded derivation.
    pub fn warn(&mut self, warning: SpecDerivationWarning) {
        self.warnings.push(warning);
    }

    /// All destination cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &SpecDestinationCell> {
        self.rows.iter().flatten()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Terminal failures of a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum CmsBulkError {
    /// Source exposes fewer columns than the bulk layout requires.
    #[error("Bulk sheet has {n_cols_found} columns; at least {n_cols_required} are required.")]
    Schema {
        /// Columns present in the source.
        n_cols_found: usize,
        /// Columns the bulk layout requires.
        n_cols_required: usize,
    },
    /// Source document could not be interpreted.
    #[error("Unexpected input: {0}")]
    UnexpectedInput(String),
    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    /// DataFrame conversion failed.
    #[error("DataFrame error: {0}")]
    Frame(#[from] polars::error::PolarsError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
