mod common;

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;

use common::{TestWorkspace, write_drifted_years};

use csv_survey::data::ColumnType;
use csv_survey::loader::{self, LoadOptions};
use csv_survey::missing::{self, MissingnessMatrix};
use csv_survey::profile::ColumnProfile;
use csv_survey::report;
use csv_survey::runner;
use csv_survey::schema;

fn load(workspace: &TestWorkspace) -> csv_survey::dataset::DatasetCollection {
    let (datasets, load_report) =
        loader::load_directory(workspace.path(), &LoadOptions::default()).expect("load directory");
    assert!(load_report.failures.is_empty(), "unexpected load failures");
    datasets
}

#[test]
fn loaded_datasets_profile_to_expected_statistics() {
    let workspace = TestWorkspace::new();
    write_drifted_years(&workspace);

    let datasets = load(&workspace);
    let dataset = datasets.get("2021").expect("2021 loaded");
    assert_eq!(dataset.rows, 3);

    let profiles = csv_survey::profile::profile(dataset).expect("profile 2021");
    let points = profiles.iter().find(|p| p.column == "points").unwrap();
    assert_eq!(points.datatype, ColumnType::Integer);
    assert_eq!(points.non_null, 2);
    assert_eq!(points.missing_pct, 33.33);
    assert_eq!(points.distinct, 2);
    assert_eq!(points.mean, Some(1.5));
    assert_eq!(points.min, Some(1.0));
    assert_eq!(points.median, Some(1.5));
    assert_eq!(points.max, Some(2.0));

    let label = profiles.iter().find(|p| p.column == "label").unwrap();
    assert_eq!(label.non_null, 3);
    assert_eq!(label.distinct, 2);
    assert_eq!(label.top_value.as_deref(), Some("x"));
    assert_eq!(label.top_freq, Some(2));
    assert!(label.mean.is_none());
}

#[test]
fn schema_comparison_detects_drift_between_years() {
    let workspace = TestWorkspace::new();
    write_drifted_years(&workspace);

    let datasets = load(&workspace);
    let comparison = schema::analyze(&datasets).expect("schema comparison");

    assert_eq!(comparison.common_columns, vec!["label", "points"]);
    assert_eq!(comparison.total_distinct_columns, 3);
    assert_eq!(comparison.unique_by_year.len(), 1);
    let unique_2021 = comparison.unique_by_year.get("2021").unwrap();
    assert_eq!(unique_2021.iter().collect::<Vec<_>>(), vec!["extra"]);
}

#[test]
fn missingness_matrix_distinguishes_absent_from_clean() {
    let workspace = TestWorkspace::new();
    write_drifted_years(&workspace);

    let datasets = load(&workspace);
    let matrix = missing::analyze(&datasets).expect("missingness matrix");

    assert_eq!(matrix.years, vec!["2021", "2022"]);
    assert_eq!(matrix.cell("2021", "points"), Some(33.33));
    assert_eq!(matrix.cell("2021", "extra"), Some(0.0));
    assert_eq!(matrix.cell("2022", "extra"), None);
    assert_eq!(matrix.cell("2022", "points"), Some(0.0));
}

#[test]
fn batch_run_produces_reports_for_every_year() {
    let workspace = TestWorkspace::new();
    write_drifted_years(&workspace);

    let datasets = load(&workspace);
    let outcome = runner::run(&datasets, &AtomicBool::new(false));
    assert_eq!(outcome.completed_years(), 2);
    assert!(outcome.failures.is_empty());

    let comparison = schema::analyze(&datasets).expect("schema comparison");
    let text = report::text_report(&datasets, &comparison, &outcome.missing, &[]);
    assert!(text.contains("Total Files: 2"));
    assert!(text.contains("Years Covered: 2021 - 2022"));
    assert!(text.contains("points: 33.33%"));

    let overview = report::year_overviews(&datasets);
    let latex = report::latex_report(&overview, &outcome.profiles);
    assert!(latex.contains("\\section{Season 2021}"));
    assert!(latex.contains("1.500000"));
}

#[test]
fn year_stats_export_writes_one_row_per_column() {
    let workspace = TestWorkspace::new();
    write_drifted_years(&workspace);

    let datasets = load(&workspace);
    let profiles = csv_survey::profile::profile(datasets.get("2021").unwrap()).unwrap();
    let out_path = workspace.path().join("2021_stats.csv");
    report::write_year_stats(&out_path, &profiles).expect("write stats export");

    let contents = std::fs::read_to_string(&out_path).expect("read stats export");
    let mut lines = contents.lines();
    let header = lines.next().expect("header row");
    assert!(header.contains("missing_pct"));
    assert!(header.contains("top_value"));
    assert_eq!(lines.count(), profiles.len());
    assert!(contents.contains("1.500000"));
    assert!(!contents.contains("NaN"));
}

#[test]
fn profiles_and_matrix_serialize_without_undefined_literals() {
    let workspace = TestWorkspace::new();
    workspace.write("plays_2021.csv", "empty_col,label\n,x\n,y\n");

    let datasets = load(&workspace);
    let profiles = csv_survey::profile::profile(datasets.get("2021").unwrap()).unwrap();
    let empty = profiles.iter().find(|p| p.column == "empty_col").unwrap();
    assert_eq!(empty.non_null, 0);
    assert_eq!(empty.missing_pct, 100.0);

    // Undefined statistics drop out of the JSON entirely.
    let json = serde_json::to_string(&profiles).unwrap();
    assert!(!json.contains("NaN"));
    assert!(!json.contains("\"mean\":null"));
}

#[test]
fn repeated_pipeline_runs_are_byte_identical() {
    let workspace = TestWorkspace::new();
    write_drifted_years(&workspace);

    let run_once = || -> (String, String) {
        let datasets = load(&workspace);
        let outcome = runner::run(&datasets, &AtomicBool::new(false));
        let profiles: &BTreeMap<String, Vec<ColumnProfile>> = &outcome.profiles;
        let matrix = MissingnessMatrix::from_summaries(&outcome.missing).unwrap();
        (
            serde_json::to_string(profiles).unwrap(),
            serde_json::to_string(&matrix).unwrap(),
        )
    };

    let (profiles_a, matrix_a) = run_once();
    let (profiles_b, matrix_b) = run_once();
    assert_eq!(profiles_a, profiles_b);
    assert_eq!(matrix_a, matrix_b);
}

#[test]
fn temporal_columns_survive_the_full_pipeline() {
    let workspace = TestWorkspace::new();
    workspace.write(
        "games_2021.csv",
        "game_date,kickoff\n2021-09-12,2021-09-12 13:00:00\n2021-01-03,2021-01-03 20:15:00\n,\n",
    );

    let datasets = load(&workspace);
    let profiles = csv_survey::profile::profile(datasets.get("2021").unwrap()).unwrap();

    let game_date = profiles.iter().find(|p| p.column == "game_date").unwrap();
    assert_eq!(game_date.datatype, ColumnType::Date);
    assert_eq!(game_date.sample_min.as_deref(), Some("2021-01-03"));
    assert_eq!(game_date.sample_max.as_deref(), Some("2021-09-12"));

    let kickoff = profiles.iter().find(|p| p.column == "kickoff").unwrap();
    assert_eq!(kickoff.datatype, ColumnType::DateTime);
    assert_eq!(kickoff.sample_min.as_deref(), Some("2021-01-03 20:15:00"));
    assert_eq!(kickoff.sample_max.as_deref(), Some("2021-09-12 13:00:00"));
}
