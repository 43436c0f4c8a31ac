//! Command-line definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cmsbulk_io_xlsx::EnumLeadingZeroMode;

/// CMS bulk card-record converter.
#[derive(Debug, Parser)]
#[command(name = "cmsbulk", version, about = "Validate, convert and map CMS bulk card records")]
pub struct Cli {
    /// Log filter (e.g. `info`, `cmsbulk_core=debug`); overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a bulk sheet and print the validation report
    Validate {
        /// Workbook holding rows in the 76-column bulk layout
        input: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Validate a bulk sheet and write the semicolon CSV when every row passes
    Convert {
        /// Workbook holding rows in the 76-column bulk layout
        input: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        /// Directory receiving `CSC_Converted_<timestamp>.csv`
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Map a daily extract onto the bulk template
    Map {
        /// Daily-extract workbook (header on row 1)
        extract: PathBuf,

        /// Bulk template workbook
        #[arg(long)]
        template: PathBuf,

        /// Extract worksheet; defaults to the first sheet
        #[arg(long)]
        sheet: Option<String>,

        /// Directory receiving `CMS_Bulk_Template_<date>.xlsx`
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// JSON object of card type to product code, e.g. {"1": "1201"}
        #[arg(long)]
        product_codes: Option<PathBuf>,

        /// How destination cells keep leading zeros
        #[arg(long, default_value = "text-format", value_parser = parse_leading_zero_mode)]
        leading_zero_mode: EnumLeadingZeroMode,

        /// Record date (YYYY-MM-DD); defaults to today
        #[arg(long, value_parser = parse_record_date)]
        date: Option<NaiveDate>,
    },
}

/// Where bulk rows are read from.
#[derive(Debug, clap::Args)]
pub struct SourceArgs {
    /// Worksheet name; defaults to the first sheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// Header rows preceding data
    #[arg(long, default_value_t = cmsbulk_core::conf::N_NROWS_HEADER_DEFAULT)]
    pub header_rows: usize,
}

fn parse_leading_zero_mode(value: &str) -> Result<EnumLeadingZeroMode, String> {
    EnumLeadingZeroMode::parse(value).ok_or_else(|| {
        format!("invalid mode `{value}`; expected one of: text-format, formula-quote")
    })
}

fn parse_record_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("invalid date `{value}`: {err}"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_map_command() {
        let cli = Cli::try_parse_from([
            "cmsbulk",
            "--log-level",
            "debug",
            "map",
            "daily.xlsx",
            "--template",
            "template.xlsx",
            "--leading-zero-mode",
            "formula-quote",
            "--date",
            "2026-03-15",
        ])
        .expect("parse");

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Command::Map {
            leading_zero_mode,
            date,
            out_dir,
            ..
        } = cli.command
        else {
            panic!("expected map command");
        };
        assert_eq!(leading_zero_mode, EnumLeadingZeroMode::FormulaQuote);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 15));
        assert_eq!(out_dir, PathBuf::from("."));
    }

    #[test]
    fn test_rejects_bad_date_and_mode() {
        assert!(
            Cli::try_parse_from([
                "cmsbulk",
                "map",
                "a.xlsx",
                "--template",
                "t.xlsx",
                "--date",
                "15/03/2026"
            ])
            .is_err()
        );
        assert!(
            Cli::try_parse_from([
                "cmsbulk",
                "map",
                "a.xlsx",
                "--template",
                "t.xlsx",
                "--leading-zero-mode",
                "zeros"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_validate_defaults() {
        let cli = Cli::try_parse_from(["cmsbulk", "validate", "bulk.xlsx"]).expect("parse");
        let Command::Validate { source, .. } = cli.command else {
            panic!("expected validate command");
        };
        assert_eq!(source.header_rows, 1);
        assert!(source.sheet.is_none());
    }
}
