//! XLSX constants.

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Excel number format that stores cell content as text.
pub const C_NUM_FORMAT_TEXT: &str = "@";
/// Sheet name used when the template sheet has none.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";
/// Header rows of the bulk template.
pub const N_NROWS_TEMPLATE_HEADER: usize = 1;
