//! Report assembly: plain-text analysis report, LaTeX document, per-year
//! CSV stat exports, and the JSON document for external renderers.
//!
//! Everything here consumes engine output; no statistic is re-derived.
//! Formatting rules are fixed for report stability: percentages carry two
//! decimals, other floating statistics six, and undefined values render as
//! empty fields, never as "NaN" or a fabricated zero.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result, bail};
use chrono::Local;
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::cli::{OutputFormat, ProfileArgs};
use crate::dataset::DatasetCollection;
use crate::io_utils;
use crate::loader::{self, LoadOptions};
use crate::missing::{MissingSummary, MissingnessMatrix};
use crate::profile::ColumnProfile;
use crate::runner;
use crate::schema::{self, SchemaComparison};

const RULE_WIDTH: usize = 100;

/// Row/column shape of one year, with the numeric/non-numeric split.
#[derive(Debug, Clone, Serialize)]
pub struct YearOverview {
    pub year: String,
    pub rows: usize,
    pub columns: usize,
    pub numeric_columns: usize,
    pub non_numeric_columns: usize,
}

#[derive(Debug, Serialize)]
struct FailureEntry {
    source: String,
    error: String,
}

#[derive(Serialize)]
struct SurveyDocument<'a> {
    overview: &'a [YearOverview],
    schema: &'a SchemaComparison,
    missing: &'a MissingnessMatrix,
    profiles: &'a BTreeMap<String, Vec<ColumnProfile>>,
    failures: &'a [FailureEntry],
}

/// Runs the full survey over a directory of yearly files and renders the
/// requested artifacts.
pub fn execute(args: &ProfileArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let options = LoadOptions {
        delimiter: args.delimiter,
        encoding,
        sample_rows: args.sample_rows,
        limit: args.limit,
    };
    let (datasets, load_report) = loader::load_directory(&args.input, &options)?;
    if datasets.is_empty() {
        bail!(
            "All {} source file(s) failed to load; nothing to profile",
            load_report.failures.len()
        );
    }

    let cancel = AtomicBool::new(false);
    let outcome = runner::run(&datasets, &cancel);
    if outcome.missing.is_empty() {
        bail!("No year could be profiled; see the failure list in the log");
    }
    let comparison = schema::analyze(&datasets)?;
    let matrix = MissingnessMatrix::from_summaries(&outcome.missing)?;

    let overview = year_overviews(&datasets);
    let failures: Vec<FailureEntry> = load_report
        .failures
        .iter()
        .map(|f| FailureEntry {
            source: f.file.clone(),
            error: f.error.clone(),
        })
        .chain(outcome.failures.iter().map(|f| FailureEntry {
            source: format!("year {}", f.year),
            error: f.error.clone(),
        }))
        .collect();

    match args.format {
        OutputFormat::Json => {
            let document = SurveyDocument {
                overview: &overview,
                schema: &comparison,
                missing: &matrix,
                profiles: &outcome.profiles,
                failures: &failures,
            };
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        OutputFormat::Text => {
            fs::create_dir_all(&args.output)
                .with_context(|| format!("Creating output directory {:?}", args.output))?;

            let failure_pairs: Vec<(String, String)> = failures
                .iter()
                .map(|f| (f.source.clone(), f.error.clone()))
                .collect();
            let report = text_report(&datasets, &comparison, &outcome.missing, &failure_pairs);
            let report_path = args.output.join("ANALYSIS_REPORT.txt");
            fs::write(&report_path, &report)
                .with_context(|| format!("Writing report to {report_path:?}"))?;
            info!("Wrote {report_path:?}");

            let latex = latex_report(&overview, &outcome.profiles);
            let latex_path = args.output.join("stats_report.tex");
            fs::write(&latex_path, &latex)
                .with_context(|| format!("Writing LaTeX report to {latex_path:?}"))?;
            info!("Wrote {latex_path:?}");

            for (year, profiles) in &outcome.profiles {
                let csv_path = args.output.join(format!("{year}_stats.csv"));
                write_year_stats(&csv_path, profiles)
                    .with_context(|| format!("Writing stats export to {csv_path:?}"))?;
                info!("Wrote {csv_path:?}");
            }

            print!("{report}");
        }
    }
    Ok(())
}

pub fn year_overviews(datasets: &DatasetCollection) -> Vec<YearOverview> {
    datasets
        .iter()
        .map(|(year, dataset)| {
            let numeric = dataset
                .columns
                .iter()
                .filter(|c| c.datatype.is_numeric())
                .count();
            YearOverview {
                year: year.clone(),
                rows: dataset.rows,
                columns: dataset.column_count(),
                numeric_columns: numeric,
                non_numeric_columns: dataset.column_count() - numeric,
            }
        })
        .collect()
}

/// Assembles the plain-text analysis report from engine output.
pub fn text_report(
    datasets: &DatasetCollection,
    comparison: &SchemaComparison,
    missing: &BTreeMap<String, MissingSummary>,
    failures: &[(String, String)],
) -> String {
    let mut lines: Vec<String> = Vec::new();
    let rule = "=".repeat(RULE_WIDTH);
    let thin_rule = "-".repeat(RULE_WIDTH);

    lines.push(rule.clone());
    lines.push("CROSS-YEAR DATASET PROFILE".to_string());
    lines.push(rule.clone());
    lines.push(String::new());

    let years = datasets.years();
    let total_rows = datasets.total_rows();
    lines.push("1. DATASET OVERVIEW".to_string());
    lines.push(thin_rule.clone());
    lines.push(format!("Total Files: {}", datasets.len()));
    if let (Some(first), Some(last)) = (years.first(), years.last()) {
        lines.push(format!("Years Covered: {first} - {last}"));
    }
    lines.push(format!("Total Samples (rows): {}", group_thousands(total_rows)));
    lines.push(String::new());

    lines.push("2. SAMPLES PER YEAR".to_string());
    lines.push(thin_rule.clone());
    for (year, dataset) in datasets.iter() {
        let share = if total_rows > 0 {
            dataset.rows as f64 / total_rows as f64 * 100.0
        } else {
            0.0
        };
        lines.push(format!(
            "  {year}: {} rows ({share:.1}%)",
            group_thousands(dataset.rows)
        ));
    }
    lines.push(String::new());

    lines.push("3. COLUMN CONSISTENCY ANALYSIS".to_string());
    lines.push(thin_rule.clone());
    lines.push(format!(
        "Columns Present in ALL Years: {}",
        comparison.common_columns.len()
    ));
    lines.push(format!(
        "Total Distinct Columns (across all years): {}",
        comparison.total_distinct_columns
    ));
    lines.push(String::new());
    lines.push("Common Columns (present in all years):".to_string());
    for (idx, column) in comparison.common_columns.iter().enumerate() {
        lines.push(format!("  {:2}. {column}", idx + 1));
    }
    lines.push(String::new());
    if comparison.has_drift() {
        lines.push("Columns Unique to Specific Years:".to_string());
        for (year, unique) in &comparison.unique_by_year {
            lines.push(format!("  Year {year}: {}", unique.iter().join(", ")));
        }
        lines.push(String::new());
    }

    lines.push("4. MISSINGNESS ANALYSIS".to_string());
    lines.push(thin_rule.clone());
    let columns_with_missing: std::collections::BTreeSet<&str> = missing
        .values()
        .flat_map(|summary| {
            summary
                .counts
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(name, _)| name.as_str())
        })
        .collect();
    lines.push(format!(
        "Columns with ANY missing values: {}",
        columns_with_missing.len()
    ));
    lines.push(String::new());
    if !columns_with_missing.is_empty() {
        lines.push("Columns with Missing Values (by year):".to_string());
        for (year, summary) in missing {
            if !summary.has_missing {
                continue;
            }
            lines.push(String::new());
            lines.push(format!("  Year {year}:"));
            for (column, pct) in summary.nonzero_percentages() {
                lines.push(format!("    {column}: {}%", format_percent(pct)));
            }
        }
        lines.push(String::new());
    }

    if !failures.is_empty() {
        lines.push("5. SOURCES EXCLUDED FROM ANALYSIS".to_string());
        lines.push(thin_rule.clone());
        for (source, error) in failures {
            lines.push(format!("  {source}: {error}"));
        }
        lines.push(String::new());
    }

    lines.push(rule);
    lines.push(String::new());
    lines.join("\n")
}

/// Builds the LaTeX document: a per-year overview table followed by one
/// section per year with numeric and non-numeric longtables.
pub fn latex_report(
    overview: &[YearOverview],
    profiles: &BTreeMap<String, Vec<ColumnProfile>>,
) -> String {
    let today = Local::now().format("%B %d, %Y");
    let mut doc = String::new();

    doc.push_str("\\documentclass{article}\n");
    doc.push_str("\\usepackage{booktabs}\n");
    doc.push_str("\\usepackage{longtable}\n");
    doc.push_str("\\usepackage{array}\n");
    doc.push_str("\\usepackage{geometry}\n");
    doc.push_str("\\usepackage{pdflscape}\n");
    doc.push_str("\\geometry{margin=1in}\n\n");
    doc.push_str("\\begin{document}\n");
    doc.push_str("\\title{Cross-Year Dataset Statistical Profile}\n");
    let _ = writeln!(doc, "\\date{{Generated on {today}}}");
    doc.push_str("\\maketitle\n\\tableofcontents\n\n");

    doc.push_str("\\section{Dataset Overview}\n");
    doc.push_str("\\begin{tabular}{lrrrr}\n\\toprule\n");
    doc.push_str("Year & Rows & Columns & Numeric & Non-numeric \\\\\n\\midrule\n");
    for entry in overview {
        let _ = writeln!(
            doc,
            "{} & {} & {} & {} & {} \\\\",
            escape_latex(&entry.year),
            group_thousands(entry.rows),
            entry.columns,
            entry.numeric_columns,
            entry.non_numeric_columns
        );
    }
    doc.push_str("\\bottomrule\n\\end{tabular}\n\\clearpage\n\n");

    for entry in overview {
        let Some(year_profiles) = profiles.get(&entry.year) else {
            continue;
        };
        let (numeric, mut non_numeric): (Vec<&ColumnProfile>, Vec<&ColumnProfile>) =
            year_profiles.iter().partition(|p| p.is_numeric_block());
        non_numeric.sort_by(|a, b| a.column.cmp(&b.column));

        let _ = writeln!(doc, "\\section{{Season {}}}", escape_latex(&entry.year));
        let _ = writeln!(
            doc,
            "\\noindent\\textbf{{Rows}}: {}\\newline",
            group_thousands(entry.rows)
        );
        let _ = writeln!(doc, "\\noindent\\textbf{{Columns}}: {}\\newline", entry.columns);
        let _ = writeln!(
            doc,
            "\\noindent\\textbf{{Numeric Columns}}: {}\\newline",
            numeric.len()
        );
        let _ = writeln!(
            doc,
            "\\noindent\\textbf{{Non-numeric Columns}}: {}\\newline",
            non_numeric.len()
        );

        doc.push_str("\\begin{landscape}\n");
        doc.push_str(&numeric_longtable(&numeric));
        doc.push_str("\\clearpage\n");
        doc.push_str(&non_numeric_longtable(&non_numeric));
        doc.push_str("\\end{landscape}\n\\clearpage\n\n");
    }

    doc.push_str("\\end{document}\n");
    doc
}

fn numeric_longtable(profiles: &[&ColumnProfile]) -> String {
    if profiles.is_empty() {
        return "\\paragraph{Numeric column summary} No columns in this category.\n".to_string();
    }
    let mut table = String::new();
    table.push_str("\\paragraph{Numeric column summary}\n");
    table.push_str("\\begingroup\\setlength{\\tabcolsep}{4pt}\\scriptsize\n");
    table.push_str("\\begin{longtable}{p{4.5cm}rrrrrrrrrr}\n\\toprule\n");
    table.push_str(
        "column & non\\_null & missing\\_pct & distinct & mean & std & min & p25 & median & p75 & max \\\\\n",
    );
    table.push_str("\\midrule\n\\endhead\n");
    for p in profiles {
        let _ = writeln!(
            table,
            "{} & {} & {} & {} & {} & {} & {} & {} & {} & {} & {} \\\\",
            escape_latex(&p.column),
            p.non_null,
            format_percent(p.missing_pct),
            p.distinct,
            format_stat(p.mean),
            format_stat(p.std),
            format_stat(p.min),
            format_stat(p.p25),
            format_stat(p.median),
            format_stat(p.p75),
            format_stat(p.max)
        );
    }
    table.push_str("\\bottomrule\n\\end{longtable}\n\\endgroup\n");
    table
}

fn non_numeric_longtable(profiles: &[&ColumnProfile]) -> String {
    if profiles.is_empty() {
        return "\\paragraph{Non-numeric column summary} No columns in this category.\n"
            .to_string();
    }
    let mut table = String::new();
    table.push_str("\\paragraph{Non-numeric column summary}\n");
    table.push_str("\\begingroup\\setlength{\\tabcolsep}{4pt}\\scriptsize\n");
    table.push_str("\\begin{longtable}{p{4.5cm}rrrp{4.5cm}rp{4.5cm}p{4.5cm}}\n\\toprule\n");
    table.push_str(
        "column & non\\_null & missing\\_pct & unique & top & top\\_freq & sample\\_min & sample\\_max \\\\\n",
    );
    table.push_str("\\midrule\n\\endhead\n");
    for p in profiles {
        let _ = writeln!(
            table,
            "{} & {} & {} & {} & {} & {} & {} & {} \\\\",
            escape_latex(&p.column),
            p.non_null,
            format_percent(p.missing_pct),
            p.distinct,
            escape_latex(p.top_value.as_deref().unwrap_or("")),
            p.top_freq.map(|f| f.to_string()).unwrap_or_default(),
            escape_latex(p.sample_min.as_deref().unwrap_or("")),
            escape_latex(p.sample_max.as_deref().unwrap_or(""))
        );
    }
    table.push_str("\\bottomrule\n\\end{longtable}\n\\endgroup\n");
    table
}

/// Writes one year's profiles as a wide CSV, one row per column.
pub fn write_year_stats(path: &Path, profiles: &[ColumnProfile]) -> Result<()> {
    let mut writer = io_utils::open_csv_writer_to_path(path, b',')?;
    writer.write_record([
        "column",
        "dtype",
        "non_null",
        "missing_pct",
        "distinct",
        "mean",
        "std",
        "min",
        "p25",
        "median",
        "p75",
        "max",
        "top_value",
        "top_freq",
        "sample_min",
        "sample_max",
    ])?;
    for p in profiles {
        let record = vec![
            p.column.clone(),
            p.datatype.label().to_string(),
            p.non_null.to_string(),
            format_percent(p.missing_pct),
            p.distinct.to_string(),
            format_stat(p.mean),
            format_stat(p.std),
            format_stat(p.min),
            format_stat(p.p25),
            format_stat(p.median),
            format_stat(p.p75),
            format_stat(p.max),
            p.top_value.clone().unwrap_or_default(),
            p.top_freq.map(|f| f.to_string()).unwrap_or_default(),
            p.sample_min.clone().unwrap_or_default(),
            p.sample_max.clone().unwrap_or_default(),
        ];
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Six-decimal rendering for floating statistics; absent values are blank.
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}"),
        None => String::new(),
    }
}

/// Two-decimal rendering for percentages.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}")
}

/// Inserts thousands separators, matching the overview formatting of the
/// text and LaTeX reports.
pub fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx).is_multiple_of(3) {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn escape_latex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\\' => escaped.push_str("\\textbackslash{}"),
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            other => escaped.push(other),
        }
    }
    escaped
}
