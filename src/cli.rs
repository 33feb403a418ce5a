use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::mapping::MergeMode;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Merge new UPCs from a cleaned list into a partner product catalog",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Append UPCs missing from the partner catalog and write the merged catalog
    Merge(MergeArgs),
    /// List the columns of a cleaned UPC list and the roles detected for them
    Columns(ColumnsArgs),
    /// Write a merge profile with the default alias tables
    Profile(ProfileArgs),
}

#[derive(Debug, Args, Default)]
pub struct SourceArgs {
    /// Cleaned UPC list (.xlsx, .xls, .ods, .csv, .tsv)
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// Worksheet to read from the source workbook (defaults to the first)
    #[arg(long = "source-sheet")]
    pub source_sheet: Option<String>,
    /// Delimiter for delimited-text inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited-text inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML profile with alias tables, column selections, and output path
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

#[derive(Debug, Args, Default)]
pub struct ColumnSelectionArgs {
    /// Column holding UPCs
    #[arg(long = "upc-column")]
    pub upc: Option<String>,
    /// Column holding product descriptions
    #[arg(long = "description-column")]
    pub description: Option<String>,
    /// Column holding the brand, or "(None)"
    #[arg(long = "brand-column")]
    pub brand: Option<String>,
    /// Column holding the department (category 1), or "(None)"
    #[arg(long = "department-column")]
    pub department: Option<String>,
    /// Column holding the category (category 2), or "(None)"
    #[arg(long = "category-column")]
    pub category: Option<String>,
    /// Column holding the segment (category 3), or "(None)"
    #[arg(long = "segment-column")]
    pub segment: Option<String>,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Partner dashboard product catalog
    #[arg(short = 'p', long = "partner")]
    pub partner: PathBuf,
    /// Worksheet to read from the partner workbook (defaults to the first)
    #[arg(long = "partner-sheet")]
    pub partner_sheet: Option<String>,
    /// Merged catalog output (.xlsx, .csv, .tsv, or - for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// How source columns are mapped onto roles
    #[arg(long, value_enum, default_value_t = MergeMode::Auto)]
    pub mode: MergeMode,
    #[command(flatten)]
    pub columns: ColumnSelectionArgs,
    /// Number of new rows to preview in the summary (0 = all)
    #[arg(long = "preview-rows", default_value_t = 20)]
    pub preview_rows: usize,
    /// Also write the source list with a STATUS column (Existing/New)
    #[arg(long = "status-output")]
    pub status_output: Option<PathBuf>,
    /// Write a JSON report of the run
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Show the summary without writing the merged catalog
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Number of source rows to show
    #[arg(long, default_value_t = 5)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn merge_args_parse_role_columns() {
        let cli = Cli::try_parse_from([
            "upc-merge",
            "merge",
            "-s",
            "list.xlsx",
            "-p",
            "partner.xlsx",
            "--mode",
            "select",
            "--upc-column",
            "Item Code",
            "--brand-column",
            "(None)",
        ])
        .unwrap();
        let Commands::Merge(args) = cli.command else {
            panic!("expected merge command");
        };
        assert_eq!(args.mode, MergeMode::Select);
        assert_eq!(args.columns.upc.as_deref(), Some("Item Code"));
        assert_eq!(args.columns.brand.as_deref(), Some("(None)"));
        assert_eq!(args.preview_rows, 20);
    }
}
