//! XLSX I/O specification models.

use cmsbulk_core::{CmsBulkError, EnumCellValue, SpecMappingReport};

use crate::conf::{C_NUM_FORMAT_TEXT, N_NROWS_TEMPLATE_HEADER};

////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// How destination values keep leading zeros in the written workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumLeadingZeroMode {
    /// Plain strings in cells formatted as text (`@`).
    #[default]
    TextFormat,
    /// String formulas `="value"` in text-formatted cells.
    FormulaQuote,
}

impl EnumLeadingZeroMode {
    /// Parse the CLI/Python spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text-format" | "text_format" | "text" => Some(Self::TextFormat),
            "formula-quote" | "formula_quote" | "formula" => Some(Self::FormulaQuote),
            _ => None,
        }
    }
}

/// Options for writing a filled bulk template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTemplateWriteOptions {
    /// Leading-zero preservation mode for data rows.
    pub leading_zero_mode: EnumLeadingZeroMode,
    /// Template header rows (written verbatim, never formula-quoted).
    pub n_rows_header: usize,
    /// Number format applied to every column and written cell.
    pub num_format: String,
}

impl Default for SpecTemplateWriteOptions {
    fn default() -> Self {
        Self {
            leading_zero_mode: EnumLeadingZeroMode::TextFormat,
            n_rows_header: N_NROWS_TEMPLATE_HEADER,
            num_format: C_NUM_FORMAT_TEXT.to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetModels

/// One worksheet read into absolute positions (row 0 is spreadsheet row 1).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetGrid {
    /// Worksheet name.
    pub sheet_name: String,
    /// Cells by `[row][col]`; rows may differ in length.
    pub rows: Vec<Vec<EnumCellValue>>,
}

impl SpecSheetGrid {
    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Worksheet held as text for template filling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecTemplateGrid {
    /// Worksheet name.
    pub sheet_name: String,
    /// Cell text by `[row][col]`.
    pub rows: Vec<Vec<String>>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-sheet write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet name actually used in the workbook.
    pub sheet_name: String,
    /// Rows written (header included).
    pub n_rows_written: usize,
    /// Destination cells placed over the template.
    pub n_cells_filled: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

/// Result of filling a bulk template with mapped extract rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTemplateFill {
    /// Serialized workbook.
    pub v_workbook: Vec<u8>,
    /// Destination cells and derivation warnings.
    pub mapping_report: SpecMappingReport,
    /// Sheet-level write report.
    pub xlsx_report: SpecXlsxReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Spreadsheet read/write failures.
#[derive(Debug, thiserror::Error)]
pub enum XlsxIoError {
    /// Workbook bytes could not be opened or a sheet could not be read.
    #[error("Failed to read workbook: {0}")]
    Open(#[from] calamine::Error),
    /// Workbook has no worksheet.
    #[error("Workbook contains no worksheet.")]
    EmptyWorkbook,
    /// Requested worksheet is absent.
    #[error("Worksheet {name:?} not found; available: {available:?}")]
    SheetNotFound {
        /// Requested sheet name.
        name: String,
        /// Sheets present in the workbook.
        available: Vec<String>,
    },
    /// Workbook could not be written.
    #[error("xlsx write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    /// Row/column index beyond Excel limits.
    #[error("{0}")]
    IndexOverflow(String),
    /// Kernel-level failure.
    #[error(transparent)]
    Core(#[from] CmsBulkError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
