use chrono::NaiveDate;

use cmsbulk_core::conf::{C_COL_CARD_TYPE, C_COL_FULL_NAME, C_COL_ID_EXPIRY, C_COL_PHONE};
use cmsbulk_core::{
    EnumBulkField, EnumCellValue, EnumCsvConversion, EnumGateResult, L_BULK_FIELDS, N_NCOLS_BULK,
    SpecExtractRecord, SpecMapperOptions, SpecValidatorOptions, convert_bulk_rows_to_csv,
    derive_bulk_row_from_cells, gate_bulk_rows, map_extract_records, write_csv_bytes,
};

fn create_bulk_row(n_seed: usize) -> Vec<String> {
    L_BULK_FIELDS
        .iter()
        .map(|field| format!("R{n_seed}C{}", field.index()))
        .collect()
}

#[test]
fn clean_then_serialize_round_trips_valid_rows() {
    let l_rows: Vec<Vec<String>> = (0..5).map(create_bulk_row).collect();

    let EnumGateResult::Cleaned(dataset) = gate_bulk_rows(&l_rows, &SpecValidatorOptions::default())
    else {
        panic!("valid rows must pass the gate");
    };
    assert_eq!(dataset.rows, l_rows);

    let c_text = String::from_utf8(write_csv_bytes(&dataset).expect("csv")).expect("utf8");
    let l_rows_split: Vec<Vec<String>> = c_text
        .lines()
        .map(|line| line.split(';').map(ToString::to_string).collect())
        .collect();
    assert_eq!(l_rows_split, l_rows);
}

#[test]
fn cleaning_own_output_is_stable() {
    let mut row = create_bulk_row(1);
    row[3] = " 60-42-025 ".to_string();
    row[10] = "a;b".to_string();

    let EnumGateResult::Cleaned(first) = gate_bulk_rows(&[row], &SpecValidatorOptions::default())
    else {
        panic!("row must pass the gate");
    };
    let EnumGateResult::Cleaned(second) =
        gate_bulk_rows(&first.rows, &SpecValidatorOptions::default())
    else {
        panic!("cleaned row must pass the gate");
    };
    assert_eq!(first, second);
    assert_eq!(second.rows[0][3], "6042025");
}

#[test]
fn rejected_rows_produce_no_csv() {
    let mut row_bad = create_bulk_row(2);
    row_bad[EnumBulkField::ProductCode.index()] = "-".to_string();
    let l_rows = vec![create_bulk_row(1), row_bad, create_bulk_row(3)];

    match convert_bulk_rows_to_csv(&l_rows, &SpecValidatorOptions::default()).expect("convert") {
        EnumCsvConversion::Rejected(report) => {
            assert_eq!(report.n_rows_checked, 3);
            assert_eq!(report.to_lines(), vec!["Row 3: missing Product Code".to_string()]);
        }
        EnumCsvConversion::Converted(_) => panic!("no output may be produced"),
    }
}

#[test]
fn mapped_extract_rows_fill_every_mandatory_field_but_card_action() {
    let options = SpecMapperOptions {
        date_record: NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date"),
        ..Default::default()
    };
    let record = SpecExtractRecord::from_pairs([
        (C_COL_FULL_NAME, EnumCellValue::from("Ahmed Ali Hassan")),
        (C_COL_PHONE, "501234567".into()),
        (C_COL_CARD_TYPE, EnumCellValue::Number(1.0)),
        (C_COL_ID_EXPIRY, "2026-03-15".into()),
        ("Identity number", "9871234567".into()),
        ("Street", "Main St".into()),
        ("Bank account", "123456".into()),
    ]);
    let report = map_extract_records(&[record], &options);
    let row = derive_bulk_row_from_cells(&report.rows[0]);
    assert_eq!(row.len(), N_NCOLS_BULK);

    match gate_bulk_rows(&[row], &SpecValidatorOptions::default()) {
        EnumGateResult::Rejected(report) => {
            assert_eq!(
                report.errors[0].missing_fields,
                vec![EnumBulkField::CardActionCode.name().to_string()]
            );
        }
        EnumGateResult::Cleaned(_) => panic!("card action code is never mapped"),
    }
}

#[test]
fn typed_cells_render_as_text_before_the_gate() {
    let date = NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date");
    let n_idx_optional = L_BULK_FIELDS
        .iter()
        .find(|field| field.index() > 2 && !field.is_mandatory())
        .expect("optional field")
        .index();

    let mut l_cells: Vec<EnumCellValue> = create_bulk_row(4)
        .into_iter()
        .map(EnumCellValue::from)
        .collect();
    l_cells[0] = EnumCellValue::Number(20261018.0);
    l_cells[1] = EnumCellValue::Number(12.0);
    l_cells[2] = EnumCellValue::from(date);
    l_cells[n_idx_optional] = EnumCellValue::None;
    let row: Vec<String> = l_cells.iter().map(EnumCellValue::to_text).collect();

    let EnumCsvConversion::Converted(v_csv) =
        convert_bulk_rows_to_csv(&[row], &SpecValidatorOptions::default()).expect("convert")
    else {
        panic!("typed row must pass the gate");
    };
    let c_text = String::from_utf8(v_csv).expect("utf8");
    let l_fields: Vec<&str> = c_text.trim_end().split(';').collect();
    // Cleaning strips the date's hyphens like any other cell.
    assert_eq!(&l_fields[..3], ["20261018", "12", "20260315"]);
    assert_eq!(l_fields[n_idx_optional], "");
}
