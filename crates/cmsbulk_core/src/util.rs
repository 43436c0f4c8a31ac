//! Stateless cell helpers shared by the validator and the mapper.

use std::borrow::Cow;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::conf::{
    C_CSV_ESCAPE, C_CSV_FILE_PREFIX, C_TEMPLATE_FILE_PREFIX, N_NCOLS_BULK,
    TUP_CSV_ESCAPED_CHARS, TUP_CSV_UNSAFE_CHARS, TUP_PLACEHOLDER_CHARS,
};
use crate::spec::EnumCellValue;

/// Text formats accepted for date cells, tried in order.
const TUP_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];
/// Text formats accepted for datetime cells, tried in order.
const TUP_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];
/// Day zero of the Excel 1900 date system (after the leap-year bug).
const N_EXCEL_EPOCH_YMD: (i32, u32, u32) = (1899, 12, 30);

////////////////////////////////////////////////////////////////////////////////
// #region BulkCleaning

/// Clean one bulk cell: drop placeholders, blank out CSV-unsafe chars, trim.
pub fn clean_cell_text(value: &str) -> String {
    let c_value: String = value
        .chars()
        .filter(|chr| !TUP_PLACEHOLDER_CHARS.contains(chr))
        .map(|chr| {
            if TUP_CSV_UNSAFE_CHARS.contains(&chr) {
                ' '
            } else {
                chr
            }
        })
        .collect();
    c_value.trim().to_string()
}

/// Prefix `\` and `"` with the CSV escape character.
pub fn escape_csv_cell(value: &str) -> Cow<'_, str> {
    if !value.contains(TUP_CSV_ESCAPED_CHARS) {
        return Cow::Borrowed(value);
    }
    let mut c_escaped = String::with_capacity(value.len() + 4);
    for chr in value.chars() {
        if TUP_CSV_ESCAPED_CHARS.contains(&chr) {
            c_escaped.push(C_CSV_ESCAPE);
        }
        c_escaped.push(chr);
    }
    Cow::Owned(c_escaped)
}

/// Truncate or pad `row` to the bulk width; absent cells read as `""`.
pub fn derive_bulk_cells<S: AsRef<str>>(row: &[S]) -> impl Iterator<Item = &str> {
    (0..N_NCOLS_BULK).map(move |n_idx| row.get(n_idx).map_or("", |cell| cell.as_ref()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TextRendering

/// Render a number without a trailing `.0` when it is integral.
pub fn format_number_text(x: f64) -> String {
    if x.is_nan() {
        return String::new();
    }
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        return format!("{}", x as i64);
    }
    x.to_string()
}

/// Render a datetime as `YYYY-MM-DD`, keeping the time only when it is set.
pub fn format_datetime_text(value: &NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else if value.nanosecond() == 0 {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Derivations

/// Prefix `00` unless the trimmed phone already carries it; blanks stay blank.
pub fn normalize_phone_number(value: &str) -> String {
    let c_phone = value.trim();
    if c_phone.is_empty() || c_phone.starts_with("00") {
        return c_phone.to_string();
    }
    format!("00{c_phone}")
}

/// Split a full name into `[first, middle, last]`; surplus tokens are dropped.
pub fn split_full_name(value: &str) -> [String; 3] {
    let mut l_tokens = value.split_whitespace();
    std::array::from_fn(|_| l_tokens.next().unwrap_or_default().to_string())
}

/// Parse a card-type cell as an integer code.
pub fn parse_card_type_code(value: &EnumCellValue) -> Option<i64> {
    match value {
        EnumCellValue::Number(n) => convert_integral_f64(*n),
        EnumCellValue::String(s) => {
            let c_value = s.trim();
            c_value
                .parse::<i64>()
                .ok()
                .or_else(|| c_value.parse::<f64>().ok().and_then(convert_integral_f64))
        }
        EnumCellValue::None | EnumCellValue::Date(_) => None,
    }
}

fn convert_integral_f64(x: f64) -> Option<i64> {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 9.0e15 {
        Some(x as i64)
    } else {
        None
    }
}

/// Parse a date cell: native dates, Excel serials, or one of the known text formats.
pub fn parse_date_value(value: &EnumCellValue) -> Option<NaiveDate> {
    match value {
        EnumCellValue::Date(dt) => Some(dt.date()),
        EnumCellValue::Number(n) => convert_excel_serial_to_date(*n),
        EnumCellValue::String(s) => parse_date_text(s),
        EnumCellValue::None => None,
    }
}

/// Parse date text in any of the accepted formats.
pub fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let c_value = value.trim();
    if c_value.is_empty() {
        return None;
    }
    TUP_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(c_value, fmt).ok())
        .or_else(|| {
            TUP_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(c_value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Convert an Excel 1900-system serial day number to a date.
pub fn convert_excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    convert_excel_serial_to_datetime(serial).map(|dt| dt.date())
}

/// Convert an Excel 1900-system serial (days plus day fraction) to a datetime.
pub fn convert_excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let (n_year, n_month, n_day) = N_EXCEL_EPOCH_YMD;
    let dt_epoch = NaiveDate::from_ymd_opt(n_year, n_month, n_day)?.and_time(NaiveTime::MIN);
    let n_days = serial.floor();
    let n_millis = ((serial - n_days) * 86_400_000.0).round() as i64;
    dt_epoch
        .checked_add_signed(Duration::try_days(n_days as i64)?)?
        .checked_add_signed(Duration::try_milliseconds(n_millis)?)
}

/// Format as `DD/MM/YYYY`.
pub fn format_date_ddmmyyyy(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Format as `YYYYMMDD`.
pub fn format_date_yyyymmdd(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Build a client number: prefix plus zero-padded sequence.
pub fn create_client_number(prefix: &str, n_sequence: usize, n_width: usize) -> String {
    format!("{prefix}{:0width$}", n_sequence, width = n_width)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OutputNames

/// `CSC_Converted_YYYYMMDD_HHMMSS.csv`.
pub fn derive_csv_file_name(now: NaiveDateTime) -> String {
    format!("{C_CSV_FILE_PREFIX}_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// `CMS_Bulk_Template_YYYYMMDD.xlsx`.
pub fn derive_template_file_name(date: NaiveDate) -> String {
    format!("{C_TEMPLATE_FILE_PREFIX}_{}.xlsx", format_date_yyyymmdd(date))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
