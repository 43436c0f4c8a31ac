//! `cmsbulk_io_xlsx` v1:
//! Spreadsheet adapters around the `cmsbulk_core` kernel.
//!
//! - `conf`   : Excel limits and the text number format
//! - `spec`   : grids, options, reports and errors
//! - `util`   : pure helper functions
//! - `reader` : `calamine` sheet reader
//! - `writer` : `rust_xlsxwriter` template writer
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{C_NUM_FORMAT_TEXT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
pub use reader::{read_bulk_rows, read_extract_records, read_sheet_grid, read_template_grid};
pub use spec::{
    EnumLeadingZeroMode, SpecSheetGrid, SpecTemplateFill, SpecTemplateGrid,
    SpecTemplateWriteOptions, SpecXlsxReport, XlsxIoError,
};
pub use util::{apply_destination_cells, derive_template_grid, sanitize_sheet_name};
pub use writer::{derive_quoted_formula, fill_template_xlsx, write_template_workbook};
