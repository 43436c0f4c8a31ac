//! `cmsbulk_core` v1:
//! CMS bulk record validation, CSV emission and daily-extract mapping kernel.
//!
//! Modules:
//! - `conf`     : bulk layout, mandatory set and default lookup/mapping tables
//! - `spec`     : records, reports, options and errors
//! - `util`     : pure cell helpers (cleaning, derivations, output names)
//! - `validate` : validator/cleaner and the all-or-nothing gate
//! - `emit`     : positional CSV emission
//! - `mapper`   : daily-extract to bulk-template mapping engine
//! - `frame`    : Polars `DataFrame` adapter
pub mod conf;
pub mod emit;
pub mod frame;
pub mod mapper;
pub mod spec;
pub mod util;
pub mod validate;

pub use conf::{
    EnumBulkField, L_BULK_FIELDS, N_NCOLS_BULK, TUP_MANDATORY_BULK_FIELDS,
    derive_bulk_field_specs, derive_default_mapping_rules, derive_default_product_lookup,
    derive_mandatory_field_specs,
};
pub use emit::{convert_bulk_rows_to_csv, write_csv_bytes};
pub use frame::{
    derive_bulk_rows_from_dataframe, derive_dataframe_from_ipc_bytes,
    derive_extract_records_from_dataframe, read_bulk_rows_from_ipc_bytes,
};
pub use mapper::{derive_bulk_row_from_cells, map_extract_records};
pub use spec::{
    CmsBulkError, EnumCellValue, EnumCsvConversion, EnumGateResult, EnumMappingRule,
    SpecCleanedDataset, SpecDerivationWarning, SpecDestinationCell, SpecExtractRecord,
    SpecFieldSpec, SpecMapperOptions, SpecMappingReport, SpecMappingRule, SpecProductCodeLookup,
    SpecValidationError, SpecValidationReport, SpecValidatorOptions,
};
pub use util::{derive_csv_file_name, derive_template_file_name};
pub use validate::{gate_bulk_rows, validate_bulk_rows, validate_bulk_width};
