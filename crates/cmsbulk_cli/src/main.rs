mod cli;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use cmsbulk_core::{
    EnumGateResult, SpecMapperOptions, SpecProductCodeLookup, SpecValidatorOptions,
    derive_csv_file_name, derive_template_file_name, gate_bulk_rows, write_csv_bytes,
};
use cmsbulk_io_xlsx::{
    SpecTemplateWriteOptions, fill_template_xlsx, read_bulk_rows, read_extract_records,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, SourceArgs};

fn setup_logging(log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid --log-level filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref())?;

    match cli.command {
        Command::Validate { input, source } => run_validate(&input, &source),
        Command::Convert {
            input,
            source,
            out_dir,
        } => run_convert(&input, &source, &out_dir),
        Command::Map {
            extract,
            template,
            sheet,
            out_dir,
            product_codes,
            leading_zero_mode,
            date,
        } => {
            let mut mapper_options = SpecMapperOptions::default();
            if let Some(date) = date {
                mapper_options.date_record = date;
            }
            if let Some(path) = product_codes {
                mapper_options.product_lookup = load_product_codes(&path)?;
            }
            let write_options = SpecTemplateWriteOptions {
                leading_zero_mode,
                ..Default::default()
            };
            run_map(
                &extract,
                &template,
                sheet.as_deref(),
                &out_dir,
                &mapper_options,
                &write_options,
            )
        }
    }
}

fn run_validate(input: &Path, source: &SourceArgs) -> Result<ExitCode> {
    match gate_source(input, source)? {
        EnumGateResult::Cleaned(dataset) => {
            println!("{} row(s) passed validation.", dataset.height());
            Ok(ExitCode::SUCCESS)
        }
        EnumGateResult::Rejected(report) => {
            println!("{report}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_convert(input: &Path, source: &SourceArgs, out_dir: &Path) -> Result<ExitCode> {
    let dataset = match gate_source(input, source)? {
        EnumGateResult::Cleaned(dataset) => dataset,
        EnumGateResult::Rejected(report) => {
            println!("{report}");
            eprintln!("No CSV written; fix the rows above and retry.");
            return Ok(ExitCode::FAILURE);
        }
    };

    let v_csv = write_csv_bytes(&dataset).context("Failed to serialize CSV")?;
    let path_file_out = out_dir.join(derive_csv_file_name(Local::now().naive_local()));
    write_output(&path_file_out, &v_csv)?;
    info!(n_rows = dataset.height(), path = %path_file_out.display(), "csv written");
    println!("{}", path_file_out.display());
    Ok(ExitCode::SUCCESS)
}

fn run_map(
    extract: &Path,
    template: &Path,
    sheet: Option<&str>,
    out_dir: &Path,
    mapper_options: &SpecMapperOptions,
    write_options: &SpecTemplateWriteOptions,
) -> Result<ExitCode> {
    let v_extract = read_input(extract)?;
    let v_template = read_input(template)?;

    let l_records = read_extract_records(&v_extract, sheet)
        .with_context(|| format!("Failed to read extract {}", extract.display()))?;
    let fill = fill_template_xlsx(&v_template, None, &l_records, mapper_options, write_options)
        .with_context(|| format!("Failed to fill template {}", template.display()))?;

    let path_file_out = out_dir.join(derive_template_file_name(mapper_options.date_record));
    write_output(&path_file_out, &fill.v_workbook)?;

    for warning in &fill.mapping_report.warnings {
        println!("warning: {warning}");
    }
    for c_warning in &fill.xlsx_report.warnings {
        println!("warning: {c_warning}");
    }
    println!("{}", path_file_out.display());
    Ok(ExitCode::SUCCESS)
}

fn gate_source(input: &Path, source: &SourceArgs) -> Result<EnumGateResult> {
    let v_input = read_input(input)?;
    let l_rows = read_bulk_rows(&v_input, source.sheet.as_deref(), source.header_rows)
        .with_context(|| format!("Failed to read bulk rows from {}", input.display()))?;
    let options = SpecValidatorOptions {
        n_rows_header: source.header_rows,
    };
    Ok(gate_bulk_rows(&l_rows, &options))
}

fn load_product_codes(path: &Path) -> Result<SpecProductCodeLookup> {
    let c_text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read product codes {}", path.display()))?;
    parse_product_codes(&c_text)
        .with_context(|| format!("Invalid product codes in {}", path.display()))
}

/// Parse `{"<card type>": "<product code>"}`.
fn parse_product_codes(c_text: &str) -> Result<SpecProductCodeLookup> {
    let dict_raw: BTreeMap<String, String> = serde_json::from_str(c_text)?;
    let mut dict_codes = BTreeMap::new();
    for (c_card_type, c_product) in dict_raw {
        let Ok(n_card_type) = c_card_type.trim().parse::<i64>() else {
            bail!("card type {c_card_type:?} is not an integer");
        };
        dict_codes.insert(n_card_type, c_product);
    }
    Ok(SpecProductCodeLookup::new(dict_codes))
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_output(path: &Path, v_bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    fs::write(path, v_bytes).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_codes() {
        let lookup = parse_product_codes(r#"{"1": "1201", " 9 ": "1299"}"#).expect("codes");
        assert_eq!(lookup.resolve(1), Some("1201"));
        assert_eq!(lookup.resolve(9), Some("1299"));
        assert_eq!(lookup.resolve(7), None);

        assert!(parse_product_codes(r#"{"gold": "1201"}"#).is_err());
        assert!(parse_product_codes("[1, 2]").is_err());
    }

    #[test]
    fn test_write_output_creates_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("out.csv");
        write_output(&path, b"a;b\n").expect("write");
        assert_eq!(fs::read(&path).expect("read"), b"a;b\n");
    }
}
