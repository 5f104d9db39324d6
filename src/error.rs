use thiserror::Error;

/// Everything that can stop an analysis run.
///
/// Value coercion problems and single-point projects are not in here: they
/// are recovered where they happen and show up only as default values.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("required column(s) missing from input: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("no usable records in input")]
    EmptyDataset,

    #[error("found {found} distinct project(s) but {required} tiers were requested")]
    TooFewProjects { found: usize, required: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{stage} returned {detail}")]
    InvalidAssignment { stage: &'static str, detail: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
