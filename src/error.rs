use thiserror::Error;

/// Error taxonomy for the profiling engine.
///
/// Per-dataset failures (`EmptyTable`, `NoColumns`, `TypeClassification`)
/// are isolated by the batch runner; cross-dataset analyses fail fast with
/// `EmptyInput` instead of returning a misleading empty result.
#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("No datasets supplied; cross-year analysis needs at least one year")]
    EmptyInput,

    #[error("Dataset for year {year} has zero rows")]
    EmptyTable { year: String },

    #[error("Dataset for year {year} has zero columns")]
    NoColumns { year: String },

    #[error("Column '{column}' could not be classified: {detail}")]
    TypeClassification { column: String, detail: String },
}

pub type Result<T> = std::result::Result<T, SurveyError>;
