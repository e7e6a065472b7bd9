use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile yearly CSV datasets across seasons", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile every yearly dataset and write text/LaTeX/CSV report artifacts
    Profile(ProfileArgs),
    /// Compare column schemas across years
    Schema(SchemaArgs),
    /// Summarize missing values per year and across the whole span
    Missing(MissingArgs),
    /// Remove columns by name or prefix from every yearly file
    Drop(DropArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rendered reports and aligned tables
    Text,
    /// One JSON document on stdout
    Json,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Directory containing the yearly CSV files (named like plays_2023.csv)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Directory that receives the report artifacts
    #[arg(short = 'o', long = "output", default_value = "reports")]
    pub output: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows to sample when inferring column types (0 means full scan)
    #[arg(long, default_value_t = 0)]
    pub sample_rows: usize,
    /// Limit number of rows read per file (useful for quick looks; 0 reads everything)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Directory containing the yearly CSV files
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows to sample when inferring column types (0 means full scan)
    #[arg(long, default_value_t = 0)]
    pub sample_rows: usize,
    /// Limit number of rows read per file (0 reads everything)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct MissingArgs {
    /// Directory containing the yearly CSV files
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows to sample when inferring column types (0 means full scan)
    #[arg(long, default_value_t = 0)]
    pub sample_rows: usize,
    /// Limit number of rows read per file (0 reads everything)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct DropArgs {
    /// Directory containing the yearly CSV files to rewrite
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Exact column names to remove
    #[arg(short = 'C', long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Column-name prefixes to remove (every matching column goes)
    #[arg(long = "prefixes", value_delimiter = ',')]
    pub prefixes: Vec<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_parser_accepts_aliases_and_single_chars() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("comma"), Ok(b','));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("^"), Ok(b'^'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }
}
