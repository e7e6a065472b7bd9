pub mod cli;
pub mod data;
pub mod dataset;
pub mod error;
pub mod io_utils;
pub mod loader;
pub mod missing;
pub mod profile;
pub mod prune;
pub mod report;
pub mod runner;
pub mod schema;
pub mod table;

use std::collections::BTreeMap;
use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, info};
use serde::Serialize;

use crate::cli::{Cli, Commands, MissingArgs, OutputFormat, SchemaArgs};
use crate::dataset::DatasetCollection;
use crate::loader::{LoadOptions, LoadReport};
use crate::missing::{MissingSummary, MissingnessMatrix};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_survey", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => report::execute(&args),
        Commands::Schema(args) => handle_schema(&args),
        Commands::Missing(args) => handle_missing(&args),
        Commands::Drop(args) => prune::execute(&args),
    }
}

fn load_collection(
    input: &std::path::Path,
    delimiter: Option<u8>,
    input_encoding: Option<&str>,
    sample_rows: usize,
    limit: usize,
) -> Result<(DatasetCollection, LoadReport)> {
    let encoding = io_utils::resolve_encoding(input_encoding)?;
    let options = LoadOptions {
        delimiter,
        encoding,
        sample_rows,
        limit,
    };
    let (datasets, load_report) = loader::load_directory(input, &options)
        .with_context(|| format!("Loading yearly datasets from {input:?}"))?;
    if datasets.is_empty() {
        bail!(
            "All {} source file(s) failed to load; nothing to analyze",
            load_report.failures.len()
        );
    }
    Ok((datasets, load_report))
}

fn handle_schema(args: &SchemaArgs) -> Result<()> {
    let (datasets, _) = load_collection(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        args.sample_rows,
        args.limit,
    )?;
    let comparison = schema::analyze(&datasets)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
        OutputFormat::Text => {
            let overview_headers = vec![
                "year".to_string(),
                "rows".to_string(),
                "columns".to_string(),
            ];
            let overview_rows: Vec<Vec<String>> = datasets
                .iter()
                .map(|(year, dataset)| {
                    vec![
                        year.clone(),
                        dataset.rows.to_string(),
                        dataset.column_count().to_string(),
                    ]
                })
                .collect();
            table::print_table(&overview_headers, &overview_rows);
            println!();

            let common_rows: Vec<Vec<String>> = comparison
                .common_columns
                .iter()
                .map(|column| vec![column.clone()])
                .collect();
            table::print_table(&["common_column".to_string()], &common_rows);
            println!();

            if comparison.has_drift() {
                let unique_rows: Vec<Vec<String>> = comparison
                    .unique_by_year
                    .iter()
                    .map(|(year, columns)| vec![year.clone(), columns.iter().join(", ")])
                    .collect();
                table::print_table(
                    &["year".to_string(), "unique_columns".to_string()],
                    &unique_rows,
                );
                println!();
            }
            println!(
                "Common columns: {}  Total distinct columns: {}",
                comparison.common_columns.len(),
                comparison.total_distinct_columns
            );
        }
    }
    info!(
        "Compared schemas across {} year(s); {} common column(s)",
        datasets.len(),
        comparison.common_columns.len()
    );
    Ok(())
}

#[derive(Serialize)]
struct MissingDocument<'a> {
    summaries: &'a BTreeMap<String, MissingSummary>,
    matrix: &'a MissingnessMatrix,
}

fn handle_missing(args: &MissingArgs) -> Result<()> {
    let (datasets, _) = load_collection(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
        args.sample_rows,
        args.limit,
    )?;

    let mut summaries = BTreeMap::new();
    for (year, dataset) in datasets.iter() {
        summaries.insert(year.clone(), missing::summarize(dataset)?);
    }
    let matrix = MissingnessMatrix::from_summaries(&summaries)?;

    match args.format {
        OutputFormat::Json => {
            let document = MissingDocument {
                summaries: &summaries,
                matrix: &matrix,
            };
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        OutputFormat::Text => {
            // Matrix with one row per column; blank cells mark columns
            // absent from that year, distinct from 0.00.
            let mut headers = vec!["column".to_string()];
            headers.extend(matrix.years.iter().cloned());
            let rows: Vec<Vec<String>> = matrix
                .columns
                .iter()
                .map(|column| {
                    let mut row = vec![column.clone()];
                    for year in &matrix.years {
                        row.push(
                            matrix
                                .cell(year, column)
                                .map(report::format_percent)
                                .unwrap_or_default(),
                        );
                    }
                    row
                })
                .collect();
            table::print_table(&headers, &rows);
            println!();
            println!(
                "Columns with any missing values: {}",
                matrix.columns_with_missing().len()
            );
        }
    }
    info!(
        "Summarized missingness for {} year(s) across {} column(s)",
        matrix.years.len(),
        matrix.columns.len()
    );
    Ok(())
}
