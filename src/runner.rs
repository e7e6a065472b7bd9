//! Batch orchestration over a dataset collection.
//!
//! Each year is profiled independently: a failure in one year is recorded
//! and the remaining years still run. A shared cancellation flag is checked
//! before each year starts, so a caller can abort a long multi-year batch
//! while keeping the already-completed years' results valid.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use serde::Serialize;

use crate::dataset::DatasetCollection;
use crate::missing::{self, MissingSummary};
use crate::profile::{self, ColumnProfile};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearFailure {
    pub year: String,
    pub error: String,
}

/// Partial-result container for one batch run. `profiles` and `missing`
/// hold every year that succeeded; `failures` names the rest.
#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    pub profiles: BTreeMap<String, Vec<ColumnProfile>>,
    pub missing: BTreeMap<String, MissingSummary>,
    pub failures: Vec<YearFailure>,
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn completed_years(&self) -> usize {
        self.profiles.len()
    }
}

/// Profiles and missingness-summarizes every year in ascending order.
pub fn run(datasets: &DatasetCollection, cancel: &AtomicBool) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (year, dataset) in datasets.iter() {
        if cancel.load(Ordering::Relaxed) {
            warn!("Cancellation requested; stopping before year {year}");
            outcome.cancelled = true;
            break;
        }

        match profile::profile(dataset) {
            Ok(profiles) => {
                info!(
                    "Profiled year {year}: {} row(s), {} column(s)",
                    dataset.rows,
                    profiles.len()
                );
                outcome.profiles.insert(year.clone(), profiles);
            }
            Err(err) => {
                warn!("Skipping year {year}: {err}");
                outcome.failures.push(YearFailure {
                    year: year.clone(),
                    error: err.to_string(),
                });
                continue;
            }
        }

        match missing::summarize(dataset) {
            Ok(summary) => {
                outcome.missing.insert(year.clone(), summary);
            }
            Err(err) => {
                warn!("Missingness summary failed for year {year}: {err}");
                outcome.profiles.remove(year.as_str());
                outcome.failures.push(YearFailure {
                    year: year.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    outcome
}
