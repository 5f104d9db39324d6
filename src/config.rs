// Constants every pipeline stage takes as a parameter.
//
// A `PipelineConfig` is built once (defaults, optionally overlaid by a JSON
// file and CLI flags) and handed to each stage by reference.
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Linkage criterion used when merging clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    #[default]
    Ward,
    Complete,
    Average,
    Single,
}

/// Weights of the composite score. They must sum to 1 so the score stays in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub trend: f64,
    pub efficiency: f64,
    pub budget: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights { trend: 0.50, efficiency: 0.30, budget: 0.20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub epsilon: f64,
    pub efficiency_scale: f64,
    pub min_regression_points: usize,
    pub cluster_count: usize,
    pub linkage: Linkage,
    pub contamination: f64,
    pub n_estimators: usize,
    pub max_samples: usize,
    pub seed: u64,
    pub weights: ScoreWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            epsilon: 1e-5,
            efficiency_scale: 1_000_000.0,
            min_regression_points: 2,
            cluster_count: 3,
            linkage: Linkage::Ward,
            contamination: 0.15,
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
            weights: ScoreWeights::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config. Fields that are absent keep their default value.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: PipelineConfig = serde_json::from_str(&text)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster_count < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "cluster_count must be at least 2 (got {})",
                self.cluster_count
            )));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnalysisError::InvalidConfig(format!(
                "contamination must be in (0, 0.5] (got {})",
                self.contamination
            )));
        }
        if self.n_estimators == 0 || self.max_samples == 0 {
            return Err(AnalysisError::InvalidConfig(
                "n_estimators and max_samples must be positive".to_string(),
            ));
        }
        if self.min_regression_points < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_regression_points must be at least 2 (got {})",
                self.min_regression_points
            )));
        }
        if !(self.epsilon > 0.0) {
            return Err(AnalysisError::InvalidConfig("epsilon must be positive".to_string()));
        }
        let w = self.weights;
        if [w.trend, w.efficiency, w.budget].iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "score weights must be non-negative".to_string(),
            ));
        }
        let total = w.trend + w.efficiency + w.budget;
        if (total - 1.0).abs() > 1e-9 {
            return Err(AnalysisError::InvalidConfig(format!(
                "score weights must sum to 1 (got {total})"
            )));
        }
        Ok(())
    }
}
