//! Per-column descriptive statistics for one yearly dataset.
//!
//! Columns dispatch on their declared type: integer and float columns get
//! the numeric stat block (mean, sample std, min, quartiles, max), everything
//! else gets the categorical block (top value and frequency, plus observed
//! min/max timestamps for temporal columns). Exactly one block is populated
//! per column. Repeated runs over the same table are byte-identical: ties on
//! the top value break by first-encountered order and every floating result
//! is rounded before it leaves this module.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::data::{ColumnType, Value};
use crate::dataset::{Column, Dataset};
use crate::error::{Result, SurveyError};

/// Floating statistics are rounded to 6 decimals, percentages to 2.
const STAT_DECIMALS: i32 = 6;
const PERCENT_DECIMALS: i32 = 2;

/// Descriptive statistics for one (year, column) pair.
///
/// Optional fields follow the type dispatch: numeric columns populate
/// `mean` through `max` (all absent when every cell is null), non-numeric
/// columns populate `top_value`/`top_freq`, and temporal columns add
/// `sample_min`/`sample_max`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnProfile {
    pub column: String,
    pub datatype: ColumnType,
    pub non_null: usize,
    pub missing_pct: f64,
    pub distinct: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p75: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_freq: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_max: Option<String>,
}

impl ColumnProfile {
    fn base(column: &Column, rows: usize) -> Self {
        let missing = column.missing_count();
        Self {
            column: column.name.clone(),
            datatype: column.datatype,
            non_null: rows - missing,
            missing_pct: missing_percentage(missing, rows),
            distinct: 0,
            mean: None,
            std: None,
            min: None,
            p25: None,
            median: None,
            p75: None,
            max: None,
            top_value: None,
            top_freq: None,
            sample_min: None,
            sample_max: None,
        }
    }

    pub fn is_numeric_block(&self) -> bool {
        self.datatype.is_numeric()
    }
}

/// Profiles every column of one dataset, in table column order.
///
/// Fails with [`SurveyError::EmptyTable`] for a zero-row table (mean and
/// percentiles are undefined) and [`SurveyError::NoColumns`] for a table
/// without columns.
pub fn profile(dataset: &Dataset) -> Result<Vec<ColumnProfile>> {
    if dataset.column_count() == 0 {
        return Err(SurveyError::NoColumns {
            year: dataset.year.clone(),
        });
    }
    if dataset.rows == 0 {
        return Err(SurveyError::EmptyTable {
            year: dataset.year.clone(),
        });
    }

    dataset
        .columns
        .iter()
        .map(|column| {
            if column.datatype.is_numeric() {
                numeric_profile(column, dataset.rows)
            } else {
                categorical_profile(column, dataset.rows)
            }
        })
        .collect()
}

fn numeric_profile(column: &Column, rows: usize) -> Result<ColumnProfile> {
    let mut values = Vec::with_capacity(column.non_null_count());
    for (row, cell) in column.cells.iter().enumerate() {
        match cell {
            None => {}
            Some(Value::Integer(i)) => values.push(*i as f64),
            Some(Value::Float(f)) => values.push(*f),
            Some(other) => {
                return Err(SurveyError::TypeClassification {
                    column: column.name.clone(),
                    detail: format!(
                        "declared {} but row {} holds non-numeric value '{}'",
                        column.datatype,
                        row + 1,
                        other
                    ),
                });
            }
        }
    }

    let mut profile = ColumnProfile::base(column, rows);
    if values.is_empty() {
        return Ok(profile);
    }

    let mut sorted = values.clone();
    sorted.sort_by(f64::total_cmp);

    profile.distinct = distinct_count(&sorted);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    profile.mean = Some(round_stat(mean));
    profile.std = sample_std(&values, mean).map(round_stat);
    profile.min = Some(round_stat(sorted[0]));
    profile.p25 = Some(round_stat(quantile(&sorted, 0.25)));
    profile.median = Some(round_stat(quantile(&sorted, 0.5)));
    profile.p75 = Some(round_stat(quantile(&sorted, 0.75)));
    profile.max = Some(round_stat(sorted[sorted.len() - 1]));
    Ok(profile)
}

fn categorical_profile(column: &Column, rows: usize) -> Result<ColumnProfile> {
    // value -> (occurrences, index of first occurrence)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (row, cell) in column.cells.iter().enumerate() {
        if let Some(value) = cell {
            let entry = counts.entry(value.as_display()).or_insert((0, row));
            entry.0 += 1;
        }
    }

    let mut profile = ColumnProfile::base(column, rows);
    profile.distinct = counts.len();

    if let Some((value, (count, _))) = counts
        .into_iter()
        .max_by(|a, b| a.1.0.cmp(&b.1.0).then_with(|| b.1.1.cmp(&a.1.1)))
    {
        profile.top_value = Some(value);
        profile.top_freq = Some(count);
    }

    if column.datatype.is_temporal() && profile.non_null > 0 {
        let (sample_min, sample_max) = temporal_range(column)?;
        profile.sample_min = sample_min;
        profile.sample_max = sample_max;
    }
    Ok(profile)
}

fn temporal_range(column: &Column) -> Result<(Option<String>, Option<String>)> {
    match column.datatype {
        ColumnType::Date => {
            let mut min: Option<NaiveDate> = None;
            let mut max: Option<NaiveDate> = None;
            for (row, cell) in column.cells.iter().enumerate() {
                match cell {
                    None => {}
                    Some(Value::Date(d)) => {
                        min = Some(min.map_or(*d, |m| m.min(*d)));
                        max = Some(max.map_or(*d, |m| m.max(*d)));
                    }
                    Some(other) => return Err(mismatch(column, row, other)),
                }
            }
            Ok((
                min.map(|d| d.format("%Y-%m-%d").to_string()),
                max.map(|d| d.format("%Y-%m-%d").to_string()),
            ))
        }
        ColumnType::DateTime => {
            let mut min: Option<NaiveDateTime> = None;
            let mut max: Option<NaiveDateTime> = None;
            for (row, cell) in column.cells.iter().enumerate() {
                match cell {
                    None => {}
                    Some(Value::DateTime(dt)) => {
                        min = Some(min.map_or(*dt, |m| m.min(*dt)));
                        max = Some(max.map_or(*dt, |m| m.max(*dt)));
                    }
                    Some(other) => return Err(mismatch(column, row, other)),
                }
            }
            Ok((
                min.map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                max.map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            ))
        }
        _ => Ok((None, None)),
    }
}

fn mismatch(column: &Column, row: usize, value: &Value) -> SurveyError {
    SurveyError::TypeClassification {
        column: column.name.clone(),
        detail: format!(
            "declared {} but row {} holds incompatible value '{}'",
            column.datatype,
            row + 1,
            value
        ),
    }
}

/// Missing percentage from a null count, rounded to 2 decimals. The
/// complementary `1 - non_null/rows` formulation is identical because
/// `non_null` is defined as `rows - missing`.
pub fn missing_percentage(missing: usize, rows: usize) -> f64 {
    round_to(missing as f64 / rows as f64 * 100.0, PERCENT_DECIMALS)
}

fn round_stat(value: f64) -> f64 {
    round_to(value, STAT_DECIMALS)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn distinct_count(sorted: &[f64]) -> usize {
    let mut distinct = 0;
    let mut previous: Option<f64> = None;
    for value in sorted {
        if previous != Some(*value) {
            distinct += 1;
            previous = Some(*value);
        }
    }
    distinct
}

/// Sample standard deviation (denominator n - 1); undefined below two values.
fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Quantile by linear interpolation between closest ranks over a sorted
/// slice. Matches the conventional `q * (n - 1)` rank definition.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
    }
}
