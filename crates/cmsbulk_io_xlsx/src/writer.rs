//! XLSX writer that re-serializes filled bulk templates.

use cmsbulk_core::{N_NCOLS_BULK, SpecExtractRecord, SpecMapperOptions, map_extract_records};
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet};
use tracing::{debug, info};

use crate::reader::read_template_grid;
use crate::spec::{
    EnumLeadingZeroMode, SpecTemplateFill, SpecTemplateGrid, SpecTemplateWriteOptions,
    SpecXlsxReport, XlsxIoError,
};
use crate::util::{apply_destination_cells, cast_col_num, cast_row_num, sanitize_sheet_name};

/// Write one template grid as the only sheet of a new workbook.
///
/// Every column up to the bulk width carries the text number format, and every
/// grid cell (blank ones included) is written with it. `n_cells_filled` is
/// recorded in the report as-is.
pub fn write_template_workbook(
    grid: &SpecTemplateGrid,
    n_cells_filled: usize,
    write_options: &SpecTemplateWriteOptions,
) -> Result<(Vec<u8>, SpecXlsxReport), XlsxIoError> {
    let mut report = SpecXlsxReport {
        n_rows_written: grid.rows.len(),
        n_cells_filled,
        ..Default::default()
    };

    let c_sheet_name = sanitize_sheet_name(&grid.sheet_name, "_");
    if c_sheet_name != grid.sheet_name {
        report.warn(format!(
            "Sheet {:?} written as {c_sheet_name:?}.",
            grid.sheet_name
        ));
    }

    let fmt_text = Format::new().set_num_format(write_options.num_format.as_str());
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&c_sheet_name)?;

    let n_width = usize::max(
        grid.rows.iter().map(Vec::len).max().unwrap_or(0),
        N_NCOLS_BULK,
    );
    for n_idx_col in 0..n_width {
        worksheet.set_column_format(cast_col_num(n_idx_col)?, &fmt_text)?;
    }

    for (n_idx_row, row) in grid.rows.iter().enumerate() {
        // Header rows are never formula-quoted.
        let mode = if n_idx_row < write_options.n_rows_header {
            EnumLeadingZeroMode::TextFormat
        } else {
            write_options.leading_zero_mode
        };
        for (n_idx_col, value) in row.iter().enumerate() {
            if value.is_empty() {
                worksheet.write_blank(
                    cast_row_num(n_idx_row)?,
                    cast_col_num(n_idx_col)?,
                    &fmt_text,
                )?;
                continue;
            }
            write_text_cell(worksheet, n_idx_row, n_idx_col, value, &fmt_text, mode)?;
        }
    }

    let v_workbook = workbook.save_to_buffer()?;
    debug!(
        sheet = %c_sheet_name,
        n_rows = report.n_rows_written,
        n_cells_filled,
        n_bytes = v_workbook.len(),
        "template sheet written"
    );
    report.sheet_name = c_sheet_name;
    Ok((v_workbook, report))
}

/// Map extract records onto a template workbook and serialize the result.
///
/// The first template sheet is used when `sheet_name` is `None`.
pub fn fill_template_xlsx(
    v_template: &[u8],
    sheet_name: Option<&str>,
    records: &[SpecExtractRecord],
    mapper_options: &SpecMapperOptions,
    write_options: &SpecTemplateWriteOptions,
) -> Result<SpecTemplateFill, XlsxIoError> {
    let mut grid = read_template_grid(v_template, sheet_name)?;
    let mapping_report = map_extract_records(records, mapper_options);
    let n_cells_filled = apply_destination_cells(&mut grid, mapping_report.cells());

    let (v_workbook, xlsx_report) = write_template_workbook(&grid, n_cells_filled, write_options)?;

    info!(
        n_records = records.len(),
        n_cells_filled,
        n_warnings = mapping_report.warnings.len(),
        "template filled"
    );
    Ok(SpecTemplateFill {
        v_workbook,
        mapping_report,
        xlsx_report,
    })
}

fn write_text_cell(
    worksheet: &mut Worksheet,
    n_idx_row: usize,
    n_idx_col: usize,
    value: &str,
    format: &Format,
    mode: EnumLeadingZeroMode,
) -> Result<(), XlsxIoError> {
    let (n_row, n_col) = (cast_row_num(n_idx_row)?, cast_col_num(n_idx_col)?);
    match mode {
        EnumLeadingZeroMode::TextFormat => {
            worksheet.write_string_with_format(n_row, n_col, value, format)?;
        }
        EnumLeadingZeroMode::FormulaQuote => {
            let formula = Formula::new(derive_quoted_formula(value)).set_result(value);
            worksheet.write_formula_with_format(n_row, n_col, formula, format)?;
        }
    }
    Ok(())
}

/// Build the string formula `="value"` that displays `value` verbatim.
pub fn derive_quoted_formula(value: &str) -> String {
    format!("=\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, Xlsx};
    use chrono::NaiveDate;
    use cmsbulk_core::conf::{C_COL_CARD_TYPE, C_COL_FULL_NAME, C_COL_ID_EXPIRY, C_COL_PHONE};
    use cmsbulk_core::{EnumBulkField, EnumCellValue};
    use std::io::{Cursor, Read};

    use super::*;

    fn create_template_bytes() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Bulk").expect("name");
        for n_idx_col in 0..N_NCOLS_BULK {
            let field = EnumBulkField::from_index(n_idx_col).expect("bulk field");
            worksheet
                .write_string(0, n_idx_col as u16, field.name())
                .expect("write");
        }
        workbook.save_to_buffer().expect("buffer")
    }

    fn create_records() -> Vec<SpecExtractRecord> {
        ["Ahmed Ali Hassan", "Sara Omar"]
            .iter()
            .map(|c_name| {
                SpecExtractRecord::from_pairs([
                    (C_COL_FULL_NAME, EnumCellValue::from(*c_name)),
                    (C_COL_PHONE, "501234567".into()),
                    (C_COL_CARD_TYPE, EnumCellValue::Number(1.0)),
                    (C_COL_ID_EXPIRY, "2026-03-15".into()),
                ])
            })
            .collect()
    }

    fn create_mapper_options() -> SpecMapperOptions {
        SpecMapperOptions {
            date_record: NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"),
            ..Default::default()
        }
    }

    fn read_cell(v_workbook: &[u8], n_row: u32, n_col: u32) -> Data {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(v_workbook)).expect("open");
        let range = workbook.worksheet_range("Bulk").expect("sheet");
        range.get_value((n_row, n_col)).cloned().unwrap_or(Data::Empty)
    }

    #[test]
    fn test_fill_template_keeps_leading_zeros_as_text() {
        let fill = fill_template_xlsx(
            &create_template_bytes(),
            None,
            &create_records(),
            &create_mapper_options(),
            &SpecTemplateWriteOptions::default(),
        )
        .expect("fill");

        assert!(fill.mapping_report.warnings.is_empty());
        assert_eq!(fill.xlsx_report.sheet_name, "Bulk");
        assert_eq!(fill.xlsx_report.n_rows_written, 3);
        assert!(fill.xlsx_report.n_cells_filled > 0);

        let n_col_client = EnumBulkField::ClientNumber.index() as u32;
        let n_col_phone = EnumBulkField::MobilePhone.index() as u32;
        assert_eq!(
            read_cell(&fill.v_workbook, 1, n_col_client),
            Data::String("60420250001".to_string())
        );
        assert_eq!(
            read_cell(&fill.v_workbook, 2, n_col_client),
            Data::String("60420250002".to_string())
        );
        assert_eq!(
            read_cell(&fill.v_workbook, 1, n_col_phone),
            Data::String("00501234567".to_string())
        );
        assert_eq!(
            read_cell(&fill.v_workbook, 0, 0),
            Data::String(EnumBulkField::RecordDate.name().to_string())
        );
    }

    #[test]
    fn test_formula_quote_mode_writes_string_formulas() {
        let options = SpecTemplateWriteOptions {
            leading_zero_mode: EnumLeadingZeroMode::FormulaQuote,
            ..Default::default()
        };
        let fill = fill_template_xlsx(
            &create_template_bytes(),
            Some("Bulk"),
            &create_records()[..1],
            &create_mapper_options(),
            &options,
        )
        .expect("fill");

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(&fill.v_workbook)).expect("open");
        let range = workbook.worksheet_formula("Bulk").expect("formulas");
        let n_col_phone = EnumBulkField::MobilePhone.index() as u32;
        let c_formula = range
            .get_value((1, n_col_phone))
            .cloned()
            .unwrap_or_default();
        assert_eq!(c_formula, "\"00501234567\"");
    }

    #[test]
    fn test_derive_quoted_formula_escapes_quotes() {
        assert_eq!(derive_quoted_formula("0012"), "=\"0012\"");
        assert_eq!(derive_quoted_formula("a\"b"), "=\"a\"\"b\"");
    }

    fn read_zip_text(v_workbook: &[u8], c_path: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(v_workbook)).expect("zip");
        let mut c_text = String::new();
        archive
            .by_name(c_path)
            .expect("zip entry")
            .read_to_string(&mut c_text)
            .expect("read entry");
        c_text
    }

    /// Value of `attr` on the first element starting with `anchor`.
    fn find_attr<'a>(c_xml: &'a str, c_anchor: &str, c_attr: &str) -> &'a str {
        let n_anchor = c_xml.find(c_anchor).expect("anchor");
        let c_element = &c_xml[n_anchor..n_anchor + c_xml[n_anchor..].find('>').expect("tag end")];
        let c_key = format!(" {c_attr}=\"");
        let n_start = c_element.find(&c_key).expect("attribute") + c_key.len();
        let n_len = c_element[n_start..].find('"').expect("closing quote");
        &c_element[n_start..n_start + n_len]
    }

    #[test]
    fn test_every_bulk_column_and_blank_cell_is_text_formatted() {
        let fill = fill_template_xlsx(
            &create_template_bytes(),
            None,
            &create_records(),
            &create_mapper_options(),
            &SpecTemplateWriteOptions::default(),
        )
        .expect("fill");

        let c_sheet = read_zip_text(&fill.v_workbook, "xl/worksheets/sheet1.xml");
        let c_styles = read_zip_text(&fill.v_workbook, "xl/styles.xml");

        let c_style = find_attr(&c_sheet, "<col min=\"1\" max=\"76\"", "style");
        let n_style: usize = c_style.parse().expect("style index");
        let c_cell_xfs = &c_styles[c_styles.find("<cellXfs").expect("cellXfs")..];
        let c_xf = c_cell_xfs.split("<xf ").nth(n_style + 1).expect("xf entry");
        assert!(c_xf.contains("numFmtId=\"49\""), "style {n_style} is not text: {c_xf}");

        // Column 9 (I) is never mapped, so row 3 leaves it blank.
        assert!(fill.mapping_report.cells().all(|cell| cell.column != 9));
        assert!(c_sheet.contains(&format!("<c r=\"I3\" s=\"{n_style}\"/>")));
        assert_eq!(find_attr(&c_sheet, "<c r=\"V2\"", "s"), c_style);
    }

    #[test]
    fn test_sanitized_sheet_name_is_reported() {
        let grid = SpecTemplateGrid {
            sheet_name: "Bulk/2026".to_string(),
            rows: vec![vec!["H".to_string()], vec!["0042".to_string()]],
        };
        let (v_workbook, report) =
            write_template_workbook(&grid, 1, &SpecTemplateWriteOptions::default())
                .expect("write");

        assert_eq!(report.sheet_name, "Bulk_2026");
        assert_eq!(report.warnings.len(), 1);
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(&v_workbook)).expect("open");
        let range = workbook.worksheet_range("Bulk_2026").expect("sheet");
        assert_eq!(
            range.get_value((1, 0)).cloned(),
            Some(Data::String("0042".to_string()))
        );
    }
}
