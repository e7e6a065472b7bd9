use std::collections::BTreeSet;

use proptest::prelude::*;

use csv_survey::data::{ColumnType, Value};
use csv_survey::dataset::{Column, Dataset, DatasetCollection};
use csv_survey::missing;
use csv_survey::profile::{self, missing_percentage};
use csv_survey::schema;

fn dataset_with_columns(year: &str, names: &[String]) -> Dataset {
    let columns = names
        .iter()
        .map(|name| {
            Column::new(
                name.clone(),
                ColumnType::Integer,
                vec![Some(Value::Integer(0))],
            )
        })
        .collect();
    Dataset::new(year, 1, columns)
}

fn column_name_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-e][a-z]{0,3}", 1..8)
        .prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn schema_comparison_is_insertion_order_independent(
        year_columns in prop::collection::vec(column_name_strategy(), 2..5)
    ) {
        let mut forward = DatasetCollection::new();
        for (idx, names) in year_columns.iter().enumerate() {
            forward.insert(dataset_with_columns(&format!("{}", 2018 + idx), names));
        }
        let mut reversed = DatasetCollection::new();
        for (idx, names) in year_columns.iter().enumerate().rev() {
            reversed.insert(dataset_with_columns(&format!("{}", 2018 + idx), names));
        }

        let a = schema::analyze(&forward).unwrap();
        let b = schema::analyze(&reversed).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn common_columns_are_a_subset_and_unique_sets_are_disjoint(
        year_columns in prop::collection::vec(column_name_strategy(), 1..5)
    ) {
        let mut datasets = DatasetCollection::new();
        for (idx, names) in year_columns.iter().enumerate() {
            datasets.insert(dataset_with_columns(&format!("{}", 2018 + idx), names));
        }
        let comparison = schema::analyze(&datasets).unwrap();
        let common: BTreeSet<&String> = comparison.common_columns.iter().collect();

        for (_, dataset) in datasets.iter() {
            let names = dataset.column_names();
            for column in &comparison.common_columns {
                prop_assert!(names.contains(column));
            }
        }
        for unique in comparison.unique_by_year.values() {
            for column in unique {
                prop_assert!(!common.contains(column));
            }
        }

        let mut union = BTreeSet::new();
        for (_, dataset) in datasets.iter() {
            union.extend(dataset.column_names());
        }
        prop_assert_eq!(comparison.total_distinct_columns, union.len());
    }

    #[test]
    fn missing_percentage_formulas_agree(rows in 1usize..400, missing in 0usize..400) {
        let missing = missing.min(rows);
        let non_null = rows - missing;
        let pct_from_missing = missing as f64 / rows as f64 * 100.0;
        let pct_from_non_null = (1.0 - non_null as f64 / rows as f64) * 100.0;
        prop_assert!((pct_from_missing - pct_from_non_null).abs() < 1e-9);

        let rounded = missing_percentage(missing, rows);
        prop_assert!((rounded - pct_from_missing).abs() <= 0.005 + 1e-9);
        prop_assert!((0.0..=100.0).contains(&rounded));
    }

    #[test]
    fn numeric_percentiles_are_monotonic(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 1..60),
        nulls in prop::collection::vec(any::<bool>(), 0..20)
    ) {
        let mut cells: Vec<Option<Value>> = values
            .iter()
            .map(|v| Some(Value::Float(*v)))
            .collect();
        cells.extend(nulls.iter().map(|_| None));

        let rows = cells.len();
        let dataset = Dataset::new("2021", rows, vec![Column::new("v", ColumnType::Float, cells)]);
        let profiles = profile::profile(&dataset).unwrap();
        let p = &profiles[0];

        let min = p.min.unwrap();
        let p25 = p.p25.unwrap();
        let median = p.median.unwrap();
        let p75 = p.p75.unwrap();
        let max = p.max.unwrap();
        prop_assert!(min <= p25 && p25 <= median && median <= p75 && p75 <= max);
        prop_assert_eq!(p.non_null, values.len());
    }

    #[test]
    fn missing_counts_and_non_null_always_partition_rows(
        cells in prop::collection::vec(prop::option::of(-1000i64..1000), 1..80)
    ) {
        let rows = cells.len();
        let nulls = cells.iter().filter(|c| c.is_none()).count();
        let column = Column::new(
            "v",
            ColumnType::Integer,
            cells.iter().map(|c| c.map(Value::Integer)).collect(),
        );
        let dataset = Dataset::new("2021", rows, vec![column]);

        let profiles = profile::profile(&dataset).unwrap();
        prop_assert_eq!(profiles[0].non_null, rows - nulls);
        prop_assert_eq!(profiles[0].missing_pct, missing_percentage(nulls, rows));

        let summary = missing::summarize(&dataset).unwrap();
        prop_assert_eq!(summary.counts[0].1, nulls);
        prop_assert_eq!(summary.has_missing, nulls > 0);
    }
}
