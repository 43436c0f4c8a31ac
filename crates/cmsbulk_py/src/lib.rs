use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use cmsbulk_core::{
    CmsBulkError, EnumCellValue, EnumCsvConversion, N_NCOLS_BULK, SpecDerivationWarning,
    SpecExtractRecord, SpecMapperOptions, SpecMappingReport, SpecProductCodeLookup,
    SpecValidationError, SpecValidationReport, SpecValidatorOptions, derive_bulk_row_from_cells,
    derive_dataframe_from_ipc_bytes, derive_extract_records_from_dataframe,
    read_bulk_rows_from_ipc_bytes,
};
use cmsbulk_io_xlsx::{EnumLeadingZeroMode, SpecTemplateWriteOptions, XlsxIoError};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyDict};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "cmsbulk.kernel.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

////////////////////////////////////////////////////////////////////////////////
// #region ValidationReport

#[pyclass(name = "ValidationError")]
#[derive(Debug, Clone)]
struct PyValidationError {
    #[pyo3(get)]
    row_number: usize,
    #[pyo3(get)]
    missing_fields: Vec<String>,
}

impl From<SpecValidationError> for PyValidationError {
    fn from(error: SpecValidationError) -> Self {
        Self {
            row_number: error.row_number,
            missing_fields: error.missing_fields,
        }
    }
}

#[pymethods]
impl PyValidationError {
    fn __str__(&self) -> String {
        format!(
            "Row {}: missing {}",
            self.row_number,
            self.missing_fields.join(", ")
        )
    }
}

#[pyclass(name = "ValidationReport")]
#[derive(Debug, Clone)]
struct PyValidationReport {
    #[pyo3(get)]
    n_rows_checked: usize,
    #[pyo3(get)]
    errors: Vec<PyValidationError>,
}

impl From<SpecValidationReport> for PyValidationReport {
    fn from(report: SpecValidationReport) -> Self {
        Self {
            n_rows_checked: report.n_rows_checked,
            errors: report
                .errors
                .into_iter()
                .map(PyValidationError::from)
                .collect(),
        }
    }
}

#[pymethods]
impl PyValidationReport {
    #[getter]
    fn error_count(&self) -> usize {
        self.errors.len()
    }

    #[getter]
    fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn lines(&self) -> Vec<String> {
        self.errors.iter().map(PyValidationError::__str__).collect()
    }

    fn __str__(&self) -> String {
        if self.errors.is_empty() {
            return format!("{} row(s) passed validation.", self.n_rows_checked);
        }
        self.lines().join("\n")
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MappingReport

#[pyclass(name = "DerivationWarning")]
#[derive(Debug, Clone)]
struct PyDerivationWarning {
    #[pyo3(get)]
    row_number: usize,
    #[pyo3(get)]
    column: usize,
    #[pyo3(get)]
    field_name: String,
    #[pyo3(get)]
    message: String,
}

impl From<SpecDerivationWarning> for PyDerivationWarning {
    fn from(warning: SpecDerivationWarning) -> Self {
        Self {
            row_number: warning.row_number,
            column: warning.column,
            field_name: warning.field_name,
            message: warning.message,
        }
    }
}

#[pymethods]
impl PyDerivationWarning {
    fn __str__(&self) -> String {
        format!(
            "Row {} column {} ({}): {}",
            self.row_number, self.column, self.field_name, self.message
        )
    }
}

#[pyclass(name = "MappingReport")]
#[derive(Debug, Clone)]
struct PyMappingReport {
    /// `(row, column, value)` destination cells per input row.
    #[pyo3(get)]
    cells: Vec<Vec<(usize, usize, String)>>,
    /// Mapped rows laid out in the 76-column bulk order.
    #[pyo3(get)]
    bulk_rows: Vec<Vec<String>>,
    #[pyo3(get)]
    warnings: Vec<PyDerivationWarning>,
}

impl From<SpecMappingReport> for PyMappingReport {
    fn from(report: SpecMappingReport) -> Self {
        Self {
            cells: report
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| (cell.row, cell.column, cell.value.clone()))
                        .collect()
                })
                .collect(),
            bulk_rows: report
                .rows
                .iter()
                .map(|row| derive_bulk_row_from_cells(row))
                .collect(),
            warnings: report
                .warnings
                .into_iter()
                .map(PyDerivationWarning::from)
                .collect(),
        }
    }
}

#[pymethods]
impl PyMappingReport {
    #[getter]
    fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Conversion

fn map_core_error(exception: CmsBulkError) -> PyErr {
    match exception {
        CmsBulkError::Schema { .. } | CmsBulkError::UnexpectedInput(_) => {
            PyValueError::new_err(exception.to_string())
        }
        CmsBulkError::Csv(_) | CmsBulkError::Frame(_) => {
            PyRuntimeError::new_err(exception.to_string())
        }
    }
}

fn map_xlsx_error(exception: XlsxIoError) -> PyErr {
    match exception {
        XlsxIoError::Core(err) => map_core_error(err),
        XlsxIoError::Open(_) | XlsxIoError::EmptyWorkbook | XlsxIoError::SheetNotFound { .. } => {
            PyValueError::new_err(exception.to_string())
        }
        XlsxIoError::Write(_) | XlsxIoError::IndexOverflow(_) => {
            PyRuntimeError::new_err(exception.to_string())
        }
    }
}

fn parse_leading_zero_mode(value: &str) -> PyResult<EnumLeadingZeroMode> {
    EnumLeadingZeroMode::parse(value).ok_or_else(|| {
        PyValueError::new_err(format!(
            "Invalid leading_zero_mode: `{value}`. Expected one of: ['text-format', 'formula-quote']"
        ))
    })
}

fn derive_bulk_rows(rows: Vec<Vec<Bound<'_, PyAny>>>) -> PyResult<Vec<Vec<String>>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|value| Ok(derive_cell_value_from_py(value)?.to_text()))
                .collect::<PyResult<Vec<String>>>()
        })
        .collect()
}

fn derive_cell_value_from_py(value: &Bound<'_, PyAny>) -> PyResult<EnumCellValue> {
    if value.is_none() {
        return Ok(EnumCellValue::None);
    }
    if let Ok(flag) = value.downcast::<PyBool>() {
        let c_flag = if flag.is_true() { "True" } else { "False" };
        return Ok(EnumCellValue::String(c_flag.to_string()));
    }
    if let Ok(datetime) = value.extract::<NaiveDateTime>() {
        return Ok(EnumCellValue::Date(datetime));
    }
    if let Ok(date) = value.extract::<NaiveDate>() {
        return Ok(EnumCellValue::from(date));
    }
    if let Ok(c_text) = value.extract::<String>() {
        return Ok(EnumCellValue::String(c_text));
    }
    if let Ok(n_value) = value.extract::<f64>() {
        return Ok(EnumCellValue::Number(n_value));
    }
    Ok(EnumCellValue::String(value.str()?.to_string()))
}

fn derive_extract_records(records: Vec<Bound<'_, PyDict>>) -> PyResult<Vec<SpecExtractRecord>> {
    let mut l_records = Vec::with_capacity(records.len());
    for dict_record in records {
        let mut record = SpecExtractRecord::default();
        for (key, value) in dict_record.iter() {
            record
                .values
                .insert(key.extract::<String>()?, derive_cell_value_from_py(&value)?);
        }
        l_records.push(record);
    }
    Ok(l_records)
}

fn derive_mapper_options(
    date: Option<NaiveDate>,
    product_codes: Option<BTreeMap<i64, String>>,
    client_number_prefix: Option<String>,
) -> SpecMapperOptions {
    let mut options = SpecMapperOptions::default();
    if let Some(date) = date {
        options.date_record = date;
    }
    if let Some(dict_codes) = product_codes {
        options.product_lookup = SpecProductCodeLookup::new(dict_codes);
    }
    if let Some(prefix) = client_number_prefix {
        options.client_number_prefix = prefix;
    }
    options
}

fn derive_extract_records_from_ipc(
    v_ipc_df: &[u8],
) -> Result<Vec<SpecExtractRecord>, CmsBulkError> {
    let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
    derive_extract_records_from_dataframe(&df)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Functions

fn derive_validation_report(
    py: Python<'_>,
    l_rows: &[Vec<String>],
    header_rows: usize,
) -> PyValidationReport {
    let options = SpecValidatorOptions {
        n_rows_header: header_rows,
    };
    let (_, l_errors) = py.allow_threads(|| cmsbulk_core::validate_bulk_rows(l_rows, &options));
    PyValidationReport::from(SpecValidationReport {
        n_rows_checked: l_rows.len(),
        errors: l_errors,
    })
}

fn derive_csv_conversion<'py>(
    py: Python<'py>,
    l_rows: &[Vec<String>],
    header_rows: usize,
) -> PyResult<(Option<Bound<'py, PyBytes>>, PyValidationReport)> {
    let options = SpecValidatorOptions {
        n_rows_header: header_rows,
    };
    let conversion = py
        .allow_threads(|| cmsbulk_core::convert_bulk_rows_to_csv(l_rows, &options))
        .map_err(map_core_error)?;

    match conversion {
        EnumCsvConversion::Converted(v_csv) => Ok((
            Some(PyBytes::new(py, &v_csv)),
            PyValidationReport::from(SpecValidationReport {
                n_rows_checked: l_rows.len(),
                errors: vec![],
            }),
        )),
        EnumCsvConversion::Rejected(report) => Ok((None, PyValidationReport::from(report))),
    }
}

/// Cells may be `str`, numbers, dates or `None`; each is rendered as text.
#[pyfunction(name = "validate_bulk_rows")]
#[pyo3(signature = (rows, header_rows = 1))]
fn validate_bulk_rows_py(
    py: Python<'_>,
    rows: Vec<Vec<Bound<'_, PyAny>>>,
    header_rows: usize,
) -> PyResult<PyValidationReport> {
    let l_rows = derive_bulk_rows(rows)?;
    Ok(derive_validation_report(py, &l_rows, header_rows))
}

/// Validate the first 76 columns of a Polars IPC payload.
#[pyfunction(name = "validate_bulk_ipc")]
#[pyo3(signature = (ipc_bytes, header_rows = 1))]
fn validate_bulk_ipc_py(
    py: Python<'_>,
    ipc_bytes: &[u8],
    header_rows: usize,
) -> PyResult<PyValidationReport> {
    let l_rows = py
        .allow_threads(|| read_bulk_rows_from_ipc_bytes(ipc_bytes))
        .map_err(map_core_error)?;
    Ok(derive_validation_report(py, &l_rows, header_rows))
}

/// Return `(csv_bytes | None, report)`; bytes are `None` when any row fails.
#[pyfunction(name = "convert_bulk_rows_to_csv")]
#[pyo3(signature = (rows, header_rows = 1))]
fn convert_bulk_rows_to_csv_py<'py>(
    py: Python<'py>,
    rows: Vec<Vec<Bound<'py, PyAny>>>,
    header_rows: usize,
) -> PyResult<(Option<Bound<'py, PyBytes>>, PyValidationReport)> {
    let l_rows = derive_bulk_rows(rows)?;
    derive_csv_conversion(py, &l_rows, header_rows)
}

#[pyfunction(name = "convert_bulk_ipc_to_csv")]
#[pyo3(signature = (ipc_bytes, header_rows = 1))]
fn convert_bulk_ipc_to_csv_py<'py>(
    py: Python<'py>,
    ipc_bytes: &[u8],
    header_rows: usize,
) -> PyResult<(Option<Bound<'py, PyBytes>>, PyValidationReport)> {
    let l_rows = py
        .allow_threads(|| read_bulk_rows_from_ipc_bytes(ipc_bytes))
        .map_err(map_core_error)?;
    derive_csv_conversion(py, &l_rows, header_rows)
}

#[pyfunction(name = "map_extract_records")]
#[pyo3(signature = (records, date = None, product_codes = None, client_number_prefix = None))]
fn map_extract_records_py(
    py: Python<'_>,
    records: Vec<Bound<'_, PyDict>>,
    date: Option<NaiveDate>,
    product_codes: Option<BTreeMap<i64, String>>,
    client_number_prefix: Option<String>,
) -> PyResult<PyMappingReport> {
    let l_records = derive_extract_records(records)?;
    let options = derive_mapper_options(date, product_codes, client_number_prefix);
    let report = py.allow_threads(|| cmsbulk_core::map_extract_records(&l_records, &options));
    Ok(PyMappingReport::from(report))
}

#[pyfunction(name = "map_extract_ipc")]
#[pyo3(signature = (ipc_bytes, date = None, product_codes = None, client_number_prefix = None))]
fn map_extract_ipc_py(
    py: Python<'_>,
    ipc_bytes: &[u8],
    date: Option<NaiveDate>,
    product_codes: Option<BTreeMap<i64, String>>,
    client_number_prefix: Option<String>,
) -> PyResult<PyMappingReport> {
    let options = derive_mapper_options(date, product_codes, client_number_prefix);
    let report = py
        .allow_threads(|| {
            let l_records = derive_extract_records_from_ipc(ipc_bytes)?;
            Ok::<_, CmsBulkError>(cmsbulk_core::map_extract_records(&l_records, &options))
        })
        .map_err(map_core_error)?;
    Ok(PyMappingReport::from(report))
}

/// Return `(workbook_bytes, mapping_report)`.
#[pyfunction(name = "fill_template_xlsx")]
#[pyo3(signature = (
    template_bytes,
    extract_ipc_bytes,
    sheet_name = None,
    date = None,
    product_codes = None,
    client_number_prefix = None,
    leading_zero_mode = "text-format"
))]
#[allow(clippy::too_many_arguments)]
fn fill_template_xlsx_py<'py>(
    py: Python<'py>,
    template_bytes: &[u8],
    extract_ipc_bytes: &[u8],
    sheet_name: Option<String>,
    date: Option<NaiveDate>,
    product_codes: Option<BTreeMap<i64, String>>,
    client_number_prefix: Option<String>,
    leading_zero_mode: &str,
) -> PyResult<(Bound<'py, PyBytes>, PyMappingReport)> {
    let mapper_options = derive_mapper_options(date, product_codes, client_number_prefix);
    let write_options = SpecTemplateWriteOptions {
        leading_zero_mode: parse_leading_zero_mode(leading_zero_mode)?,
        ..Default::default()
    };

    let fill = py
        .allow_threads(|| {
            let l_records = derive_extract_records_from_ipc(extract_ipc_bytes)?;
            cmsbulk_io_xlsx::fill_template_xlsx(
                template_bytes,
                sheet_name.as_deref(),
                &l_records,
                &mapper_options,
                &write_options,
            )
        })
        .map_err(map_xlsx_error)?;

    Ok((
        PyBytes::new(py, &fill.v_workbook),
        PyMappingReport::from(fill.mapping_report),
    ))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[pymodule]
fn _cmsbulk_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyValidationError>()?;
    module.add_class::<PyValidationReport>()?;
    module.add_class::<PyDerivationWarning>()?;
    module.add_class::<PyMappingReport>()?;
    module.add_function(wrap_pyfunction!(validate_bulk_rows_py, module)?)?;
    module.add_function(wrap_pyfunction!(validate_bulk_ipc_py, module)?)?;
    module.add_function(wrap_pyfunction!(convert_bulk_rows_to_csv_py, module)?)?;
    module.add_function(wrap_pyfunction!(convert_bulk_ipc_to_csv_py, module)?)?;
    module.add_function(wrap_pyfunction!(map_extract_records_py, module)?)?;
    module.add_function(wrap_pyfunction!(map_extract_ipc_py, module)?)?;
    module.add_function(wrap_pyfunction!(fill_template_xlsx_py, module)?)?;
    module.add("N_NCOLS_BULK", N_NCOLS_BULK)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
