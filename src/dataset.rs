//! In-memory, column-oriented representation of one yearly dataset and the
//! collection handed to the cross-year analyzers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::{ColumnType, Value};

/// One named, typed column. `cells.len()` always equals the owning
/// dataset's row count; missing cells are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub datatype: ColumnType,
    pub cells: Vec<Option<Value>>,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: ColumnType, cells: Vec<Option<Value>>) -> Self {
        Self {
            name: name.into(),
            datatype,
            cells,
        }
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.cells.len() - self.missing_count()
    }
}

/// One year's table. Row count is fixed at construction; every column
/// carries exactly `rows` cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub year: String,
    pub rows: usize,
    pub columns: Vec<Column>,
}

impl Dataset {
    pub fn new(year: impl Into<String>, rows: usize, columns: Vec<Column>) -> Self {
        let dataset = Self {
            year: year.into(),
            rows,
            columns,
        };
        debug_assert!(
            dataset.columns.iter().all(|c| c.cells.len() == dataset.rows),
            "every column must carry exactly `rows` cells"
        );
        dataset
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> BTreeSet<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Yearly datasets keyed by year. `BTreeMap` keeps iteration in ascending
/// year order; 4-digit year strings sort lexically the same as numerically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetCollection {
    datasets: BTreeMap<String, Dataset>,
}

impl DatasetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a dataset under its year, replacing any previous entry.
    pub fn insert(&mut self, dataset: Dataset) -> Option<Dataset> {
        self.datasets.insert(dataset.year.clone(), dataset)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn contains_year(&self, year: &str) -> bool {
        self.datasets.contains_key(year)
    }

    pub fn get(&self, year: &str) -> Option<&Dataset> {
        self.datasets.get(year)
    }

    pub fn years(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Dataset)> {
        self.datasets.iter()
    }

    pub fn total_rows(&self) -> usize {
        self.datasets.values().map(|d| d.rows).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_column(name: &str, values: &[Option<i64>]) -> Column {
        Column::new(
            name,
            ColumnType::Integer,
            values.iter().map(|v| v.map(Value::Integer)).collect(),
        )
    }

    #[test]
    fn column_counts_split_null_and_non_null() {
        let column = int_column("score", &[Some(1), None, Some(3), None]);
        assert_eq!(column.missing_count(), 2);
        assert_eq!(column.non_null_count(), 2);
    }

    #[test]
    fn collection_iterates_years_ascending() {
        let mut collection = DatasetCollection::new();
        collection.insert(Dataset::new("2023", 0, Vec::new()));
        collection.insert(Dataset::new("2021", 0, Vec::new()));
        collection.insert(Dataset::new("2022", 0, Vec::new()));

        assert_eq!(collection.years(), vec!["2021", "2022", "2023"]);
    }

    #[test]
    fn insert_replaces_duplicate_year() {
        let mut collection = DatasetCollection::new();
        collection.insert(Dataset::new("2021", 1, vec![int_column("a", &[Some(1)])]));
        let previous = collection.insert(Dataset::new("2021", 1, vec![int_column("b", &[Some(2)])]));

        assert!(previous.is_some());
        assert_eq!(collection.len(), 1);
        assert!(collection.get("2021").unwrap().column("b").is_some());
    }
}
