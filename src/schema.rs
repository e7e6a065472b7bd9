//! Cross-year schema consistency analysis.
//!
//! Column-name sets are compared with explicit set algebra over `BTreeSet`s
//! so results are deterministic regardless of year iteration order.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dataset::DatasetCollection;
use crate::error::{Result, SurveyError};

/// Outcome of comparing column schemas across every year.
///
/// `total_distinct_columns` counts each column name once no matter how many
/// years carry it; the original report called this "total unique columns"
/// and the count is preserved under that meaning.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SchemaComparison {
    /// Columns present in every year, sorted alphabetically.
    pub common_columns: Vec<String>,
    /// Per-year columns outside the common set. Years whose unique set is
    /// empty are omitted entirely.
    pub unique_by_year: BTreeMap<String, BTreeSet<String>>,
    /// Size of the union of all per-year column sets.
    pub total_distinct_columns: usize,
}

impl SchemaComparison {
    pub fn has_drift(&self) -> bool {
        !self.unique_by_year.is_empty()
    }
}

/// Compares column sets across all years of the collection.
///
/// Fails with [`SurveyError::EmptyInput`] for an empty collection: the
/// intersection of zero sets is undefined and must not be reported as
/// "no common columns".
pub fn analyze(datasets: &DatasetCollection) -> Result<SchemaComparison> {
    if datasets.is_empty() {
        return Err(SurveyError::EmptyInput);
    }

    let per_year: BTreeMap<&String, BTreeSet<String>> = datasets
        .iter()
        .map(|(year, dataset)| (year, dataset.column_names()))
        .collect();

    let mut sets = per_year.values();
    let first = sets.next().cloned().unwrap_or_default();
    let common: BTreeSet<String> = sets.fold(first, |acc, columns| {
        acc.intersection(columns).cloned().collect()
    });

    let mut union: BTreeSet<String> = BTreeSet::new();
    for columns in per_year.values() {
        union.extend(columns.iter().cloned());
    }

    let mut unique_by_year = BTreeMap::new();
    for (year, columns) in &per_year {
        let unique: BTreeSet<String> = columns.difference(&common).cloned().collect();
        if !unique.is_empty() {
            unique_by_year.insert((*year).clone(), unique);
        }
    }

    Ok(SchemaComparison {
        common_columns: common.into_iter().collect(),
        unique_by_year,
        total_distinct_columns: union.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnType, Value};
    use crate::dataset::{Column, Dataset};

    fn dataset_with_columns(year: &str, names: &[&str]) -> Dataset {
        let columns = names
            .iter()
            .map(|name| {
                Column::new(
                    *name,
                    ColumnType::Integer,
                    vec![Some(Value::Integer(1)), Some(Value::Integer(2))],
                )
            })
            .collect();
        Dataset::new(year, 2, columns)
    }

    fn collection(specs: &[(&str, &[&str])]) -> DatasetCollection {
        let mut datasets = DatasetCollection::new();
        for (year, names) in specs {
            datasets.insert(dataset_with_columns(year, names));
        }
        datasets
    }

    #[test]
    fn empty_collection_is_rejected() {
        let err = analyze(&DatasetCollection::new()).unwrap_err();
        assert!(matches!(err, SurveyError::EmptyInput));
    }

    #[test]
    fn drifted_years_report_common_unique_and_distinct_counts() {
        let datasets = collection(&[("2021", &["a", "b", "c"]), ("2022", &["a", "b", "d"])]);
        let comparison = analyze(&datasets).unwrap();

        assert_eq!(comparison.common_columns, vec!["a", "b"]);
        assert_eq!(comparison.total_distinct_columns, 4);
        assert!(comparison.has_drift());

        let unique_2021 = comparison.unique_by_year.get("2021").unwrap();
        assert_eq!(unique_2021.iter().collect::<Vec<_>>(), vec!["c"]);
        let unique_2022 = comparison.unique_by_year.get("2022").unwrap();
        assert_eq!(unique_2022.iter().collect::<Vec<_>>(), vec!["d"]);
    }

    #[test]
    fn identical_schemas_omit_unique_entries() {
        let datasets = collection(&[("2021", &["a", "b"]), ("2022", &["a", "b"])]);
        let comparison = analyze(&datasets).unwrap();

        assert_eq!(comparison.common_columns, vec!["a", "b"]);
        assert!(comparison.unique_by_year.is_empty());
        assert!(!comparison.has_drift());
        assert_eq!(comparison.total_distinct_columns, 2);
    }

    #[test]
    fn common_columns_are_subset_of_every_year() {
        let datasets = collection(&[
            ("2020", &["a", "b", "c", "x"]),
            ("2021", &["a", "b", "y"]),
            ("2022", &["b", "a", "z"]),
        ]);
        let comparison = analyze(&datasets).unwrap();

        for (_, dataset) in datasets.iter() {
            let names = dataset.column_names();
            for column in &comparison.common_columns {
                assert!(names.contains(column));
            }
        }
        for (year, unique) in &comparison.unique_by_year {
            for column in unique {
                assert!(
                    !comparison.common_columns.contains(column),
                    "year {year} unique column {column} overlaps the common set"
                );
            }
        }
    }

    #[test]
    fn single_year_collection_treats_all_columns_as_common() {
        let datasets = collection(&[("2021", &["b", "a"])]);
        let comparison = analyze(&datasets).unwrap();

        assert_eq!(comparison.common_columns, vec!["a", "b"]);
        assert!(comparison.unique_by_year.is_empty());
        assert_eq!(comparison.total_distinct_columns, 2);
    }
}
