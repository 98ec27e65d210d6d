use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::merge::MergeMode;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Enrich a sparse CSV dataset from a more complete one by key",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fill or overwrite primary cells from the secondary dataset and append missing rows
    Merge(MergeArgs),
    /// Show or export the column mapping a merge would use
    Mapping(MappingArgs),
    /// Preview the first few rows of a CSV file in a formatted table
    Preview(PreviewArgs),
}

/// Inputs shared by every command that reads both datasets.
#[derive(Debug, Args)]
pub struct DatasetArgs {
    /// Primary CSV: more rows, incomplete values
    #[arg(short = 'p', long = "primary")]
    pub primary: PathBuf,
    /// Secondary CSV: fewer rows, more complete values
    #[arg(short = 's', long = "secondary")]
    pub secondary: PathBuf,
    /// Comma-separated key columns present in both files
    #[arg(short = 'k', long = "key", value_delimiter = ',')]
    pub key: Vec<String>,
    /// Mapping JSON (object of dest->src, or list of {dest, src})
    #[arg(long = "mapping")]
    pub mapping: Option<PathBuf>,
    /// YAML reconcile profile; command-line flags take precedence
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character for both inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the primary file (defaults to utf-8)
    #[arg(long = "primary-encoding")]
    pub primary_encoding: Option<String>,
    /// Character encoding of the secondary file (defaults to utf-8)
    #[arg(long = "secondary-encoding")]
    pub secondary_encoding: Option<String>,
    /// Keep tokens such as N/A or null as text instead of loading them as missing
    #[arg(long = "keep-na-tokens")]
    pub keep_na_tokens: bool,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub inputs: DatasetArgs,
    /// Merge policy
    #[arg(long, value_enum)]
    pub mode: Option<MergeMode>,
    /// Do not append rows that exist only in the secondary file
    #[arg(long = "no-append")]
    pub no_append: bool,
    /// Continue when either file has no data rows
    #[arg(long = "allow-empty")]
    pub allow_empty: bool,
    /// Output CSV file or directory (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Print the first N merged rows as a table (stderr)
    #[arg(long)]
    pub preview: Option<usize>,
    /// Write merge counters and warnings as JSON to this path
    #[arg(long = "stats-json")]
    pub stats_json: Option<PathBuf>,
    /// Save the effective keys, mode and mapping as a YAML profile for --config
    #[arg(long = "save-config")]
    pub save_config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MappingArgs {
    #[command(flatten)]
    pub inputs: DatasetArgs,
    /// Write the resolved mapping JSON here instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input CSV file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding for input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
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
