//! Discovery and loading of yearly CSV files.
//!
//! Files named `<stem>_<year>.csv` (or a bare `<year>.csv`) are read into
//! column-oriented [`Dataset`]s with per-column type inference. A file that
//! fails to open, decode, or parse contributes a failure entry to the
//! [`LoadReport`] and loading continues with the remaining files; the
//! analyzers never see a failed source.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result, bail};
use encoding_rs::{Encoding, UTF_8};
use log::{info, warn};
use regex::Regex;
use serde::Serialize;

use crate::data::{ColumnType, Value, parse_naive_date, parse_naive_datetime, parse_typed_value};
use crate::dataset::{Column, Dataset, DatasetCollection};
use crate::io_utils;

/// Tokens treated as missing values alongside the empty string.
const PLACEHOLDER_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL"];

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    /// Rows sampled for type inference; 0 scans the whole file.
    pub sample_rows: usize,
    /// Row cap per file; 0 reads everything.
    pub limit: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            sample_rows: 0,
            limit: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadedSource {
    pub year: String,
    pub file: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub file: String,
    pub error: String,
}

/// Per-source outcome of one load pass over a directory.
#[derive(Debug, Default, Serialize)]
pub struct LoadReport {
    pub loaded: Vec<LoadedSource>,
    pub failures: Vec<LoadFailure>,
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?:^|_)(\d{4})$").expect("valid year pattern"))
}

/// Extracts the trailing 4-digit year from a file stem such as
/// `play_by_play_2023` or `2023`.
pub fn year_from_stem(stem: &str) -> Option<String> {
    year_pattern()
        .captures(stem)
        .map(|caps| caps[1].to_string())
}

/// Finds yearly CSV/TSV files under `dir`, sorted by year then file name.
pub fn discover(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Reading directory {dir:?}"))?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_tabular = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv")
        );
        if !is_tabular {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            && let Some(year) = year_from_stem(stem)
        {
            found.push((year, path));
        }
    }
    found.sort();
    Ok(found)
}

/// Loads every yearly file under `dir`. Files that fail to load are
/// reported, not fatal; duplicate years beyond the first are rejected.
pub fn load_directory(dir: &Path, options: &LoadOptions) -> Result<(DatasetCollection, LoadReport)> {
    let sources = discover(dir)?;
    if sources.is_empty() {
        bail!("No yearly CSV files (\"*_<year>.csv\") found in {dir:?}");
    }

    let mut datasets = DatasetCollection::new();
    let mut report = LoadReport::default();

    for (year, path) in sources {
        let file = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("<unnamed>")
            .to_string();
        if datasets.contains_year(&year) {
            warn!("Skipping {file}: duplicate year {year}");
            report.failures.push(LoadFailure {
                file,
                error: format!("Duplicate year {year}; an earlier file already supplied it"),
            });
            continue;
        }
        match load_file(&path, &year, options) {
            Ok(dataset) => {
                info!(
                    "Loaded {file}: {} row(s) x {} column(s)",
                    dataset.rows,
                    dataset.column_count()
                );
                report.loaded.push(LoadedSource {
                    year: year.clone(),
                    file,
                    rows: dataset.rows,
                    columns: dataset.column_count(),
                });
                datasets.insert(dataset);
            }
            Err(err) => {
                warn!("Failed to load {file}: {err:#}");
                report.failures.push(LoadFailure {
                    file,
                    error: format!("{err:#}"),
                });
            }
        }
    }

    Ok((datasets, report))
}

/// Reads one yearly file into a typed, column-oriented dataset.
pub fn load_file(path: &Path, year: &str, options: &LoadOptions) -> Result<Dataset> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)?;
    if headers.is_empty() {
        bail!("File has no columns");
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        if options.limit > 0 && row_idx >= options.limit {
            break;
        }
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, options.encoding)?;
        raw_rows.push(decoded);
    }
    if raw_rows.is_empty() {
        bail!("File contains no data rows");
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (col_idx, name) in headers.iter().enumerate() {
        let datatype = infer_column_type(
            raw_rows
                .iter()
                .take(inference_window(options.sample_rows, raw_rows.len()))
                .map(|row| normalize_missing(&row[col_idx])),
        );
        let mut cells = Vec::with_capacity(raw_rows.len());
        for (row_idx, row) in raw_rows.iter().enumerate() {
            let cell = parse_typed_value(normalize_missing(&row[col_idx]), datatype)
                .with_context(|| format!("Column '{name}', row {}", row_idx + 2))?;
            cells.push(normalize_cell(cell));
        }
        columns.push(Column::new(name.clone(), datatype, cells));
    }

    Ok(Dataset::new(year, raw_rows.len(), columns))
}

fn inference_window(sample_rows: usize, total: usize) -> usize {
    if sample_rows == 0 { total } else { sample_rows.min(total) }
}

/// Trims whitespace and maps placeholder tokens to the empty string.
fn normalize_missing(raw: &str) -> &str {
    let trimmed = raw.trim();
    if PLACEHOLDER_TOKENS.contains(&trimmed) {
        ""
    } else {
        trimmed
    }
}

/// A parsed float NaN is a missing value, matching the placeholder policy.
fn normalize_cell(cell: Option<Value>) -> Option<Value> {
    match cell {
        Some(Value::Float(f)) if f.is_nan() => None,
        other => other,
    }
}

/// Narrowest type every non-missing sample value parses as, widening
/// integer -> float -> boolean -> date -> datetime -> string.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut all_integer = true;
    let mut all_float = true;
    let mut all_boolean = true;
    let mut all_date = true;
    let mut all_datetime = true;

    for value in values {
        if value.is_empty() {
            continue;
        }
        all_integer = all_integer && value.parse::<i64>().is_ok();
        all_float = all_float && value.parse::<f64>().map(|f| f.is_finite()).unwrap_or(false);
        all_boolean = all_boolean
            && matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "t" | "yes" | "y" | "1" | "false" | "f" | "no" | "n" | "0"
            );
        all_date = all_date && parse_naive_date(value).is_ok();
        all_datetime = all_datetime && parse_naive_datetime(value).is_ok();
        if !(all_integer || all_float || all_boolean || all_date || all_datetime) {
            return ColumnType::String;
        }
    }

    if all_integer {
        ColumnType::Integer
    } else if all_float {
        ColumnType::Float
    } else if all_boolean {
        ColumnType::Boolean
    } else if all_date {
        ColumnType::Date
    } else if all_datetime {
        ColumnType::DateTime
    } else {
        ColumnType::String
    }
}
