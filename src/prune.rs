//! Removal of columns from every yearly file, by exact name or name prefix.
//!
//! Files are rewritten through a sibling temp file and renamed into place;
//! a file where nothing matches is left untouched.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use log::info;

use crate::cli::DropArgs;
use crate::io_utils;
use crate::loader;

pub fn execute(args: &DropArgs) -> Result<()> {
    if args.columns.is_empty() && args.prefixes.is_empty() {
        bail!("Nothing to drop; supply --columns and/or --prefixes");
    }
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;

    let sources = loader::discover(&args.input)?;
    if sources.is_empty() {
        bail!("No yearly CSV files (\"*_<year>.csv\") found in {:?}", args.input);
    }

    for (_, path) in sources {
        drop_columns_in_file(&path, &args.columns, &args.prefixes, args.delimiter, encoding)
            .with_context(|| format!("Dropping columns from {path:?}"))?;
    }
    Ok(())
}

fn drop_columns_in_file(
    path: &Path,
    names: &[String],
    prefixes: &[String],
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;

    let keep: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !should_drop(name, names, prefixes))
        .map(|(idx, _)| idx)
        .collect();

    if keep.len() == headers.len() {
        info!("No matching columns in {path:?}");
        return Ok(());
    }
    if keep.is_empty() {
        bail!("Dropping the requested columns would leave no columns");
    }

    let temp_path = path.with_extension("tmp");
    let mut writer = io_utils::open_csv_writer_to_path(&temp_path, delimiter)?;
    writer.write_record(keep.iter().map(|idx| headers[*idx].as_str()))?;

    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)?;
        writer.write_record(keep.iter().map(|idx| decoded[*idx].as_str()))?;
    }
    writer.flush()?;
    drop(writer);
    drop(reader);
    fs::rename(&temp_path, path)
        .with_context(|| format!("Replacing {path:?} with rewritten copy"))?;

    info!(
        "Dropped {} column(s) from {path:?}: {} -> {} columns",
        headers.len() - keep.len(),
        headers.len(),
        keep.len()
    );
    Ok(())
}

fn should_drop(name: &str, names: &[String], prefixes: &[String]) -> bool {
    names.iter().any(|candidate| candidate == name)
        || prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
}
