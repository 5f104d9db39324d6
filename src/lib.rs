//! Project performance scoring.
//!
//! Takes per-project, per-year operational records (cost, investment,
//! fraud incidents, satisfaction, processing time) and produces a ranked,
//! tiered assessment of every project with statistical outliers flagged.
//!
//! ```no_run
//! use project_scorer::{loader, pipeline, PipelineConfig};
//!
//! let (records, _) = loader::load_records("AIProjectDataSet.csv", b';')?;
//! let outcome = pipeline::run_pipeline(&records, &PipelineConfig::default())?;
//! for p in &outcome.ranked {
//!     println!("{} {:.4} {}", p.project_name, p.final_score, p.category);
//! }
//! # Ok::<(), project_scorer::AnalysisError>(())
//! ```
pub mod anomaly;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod scoring;
pub mod tiers;
pub mod trends;
pub mod types;
pub mod util;

pub use config::{Linkage, PipelineConfig, ScoreWeights};
pub use error::{AnalysisError, Result};
pub use pipeline::{run_pipeline, run_pipeline_with, AnalysisOutcome};
pub use types::{Category, Record, ScoredProject};
