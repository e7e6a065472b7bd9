//! Missing-value analysis: per-year null counts and percentages, and the
//! cross-year missingness matrix.
//!
//! Matrix cells are `Option<f64>` so "column absent this year" stays
//! distinct from "column present with 0% missing". Absence is never
//! collapsed to a numeric entry.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dataset::{Dataset, DatasetCollection};
use crate::error::{Result, SurveyError};
use crate::profile::missing_percentage;

/// Null counts and percentages for one year, in table column order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MissingSummary {
    pub year: String,
    pub counts: Vec<(String, usize)>,
    pub percentages: Vec<(String, f64)>,
    pub has_missing: bool,
}

impl MissingSummary {
    /// Columns with a non-zero missing percentage, highest first; ties
    /// resolve by column name so report output is stable.
    pub fn nonzero_percentages(&self) -> Vec<(String, f64)> {
        let mut nonzero: Vec<(String, f64)> = self
            .percentages
            .iter()
            .filter(|(_, pct)| *pct > 0.0)
            .cloned()
            .collect();
        nonzero.sort_by(|a, b| {
            b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
        });
        nonzero
    }
}

/// Dense year × column grid of missing percentages. `None` marks a column
/// that does not exist in that year's table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MissingnessMatrix {
    pub years: Vec<String>,
    pub columns: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
}

impl MissingnessMatrix {
    /// Builds the matrix from per-year summaries. Years and columns come
    /// out sorted ascending; the column axis is the union across years.
    pub fn from_summaries(summaries: &BTreeMap<String, MissingSummary>) -> Result<Self> {
        if summaries.is_empty() {
            return Err(SurveyError::EmptyInput);
        }

        let years: Vec<String> = summaries.keys().cloned().collect();
        let column_union: BTreeSet<String> = summaries
            .values()
            .flat_map(|summary| summary.percentages.iter().map(|(name, _)| name.clone()))
            .collect();
        let columns: Vec<String> = column_union.into_iter().collect();

        let cells = years
            .iter()
            .map(|year| {
                let summary = &summaries[year];
                let by_name: BTreeMap<&str, f64> = summary
                    .percentages
                    .iter()
                    .map(|(name, pct)| (name.as_str(), *pct))
                    .collect();
                columns
                    .iter()
                    .map(|column| by_name.get(column.as_str()).copied())
                    .collect()
            })
            .collect();

        Ok(Self {
            years,
            columns,
            cells,
        })
    }

    /// Missing percentage for (year, column); `None` when the column is
    /// absent from that year (or the year/column is unknown).
    pub fn cell(&self, year: &str, column: &str) -> Option<f64> {
        let row = self.years.iter().position(|y| y == year)?;
        let col = self.columns.iter().position(|c| c == column)?;
        self.cells[row][col]
    }

    /// Columns carrying a non-zero missing percentage in at least one year.
    pub fn columns_with_missing(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                self.cells
                    .iter()
                    .any(|row| row[*idx].is_some_and(|pct| pct > 0.0))
            })
            .map(|(_, name)| name.clone())
            .collect()
    }
}

/// Per-year null counts and percentages.
///
/// Fails with [`SurveyError::EmptyTable`] for a zero-row table: a missing
/// percentage over zero rows is undefined.
pub fn summarize(dataset: &Dataset) -> Result<MissingSummary> {
    if dataset.rows == 0 {
        return Err(SurveyError::EmptyTable {
            year: dataset.year.clone(),
        });
    }

    let mut counts = Vec::with_capacity(dataset.column_count());
    let mut percentages = Vec::with_capacity(dataset.column_count());
    for column in &dataset.columns {
        let missing = column.missing_count();
        counts.push((column.name.clone(), missing));
        percentages.push((column.name.clone(), missing_percentage(missing, dataset.rows)));
    }

    let has_missing = counts.iter().any(|(_, count)| *count > 0);
    Ok(MissingSummary {
        year: dataset.year.clone(),
        counts,
        percentages,
        has_missing,
    })
}

/// Summarizes every year and assembles the cross-year matrix.
///
/// Fails with [`SurveyError::EmptyInput`] for an empty collection. Callers
/// that need per-year failure isolation go through the batch runner
/// instead, which feeds surviving summaries to
/// [`MissingnessMatrix::from_summaries`].
pub fn analyze(datasets: &DatasetCollection) -> Result<MissingnessMatrix> {
    if datasets.is_empty() {
        return Err(SurveyError::EmptyInput);
    }

    let mut summaries = BTreeMap::new();
    for (year, dataset) in datasets.iter() {
        summaries.insert(year.clone(), summarize(dataset)?);
    }
    MissingnessMatrix::from_summaries(&summaries)
}
