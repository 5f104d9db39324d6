//! End-to-end analysis: records in, ranked and categorised projects out.
//!
//! Each stage is a pure function over the previous stage's table:
//! derive -> aggregate -> normalize -> {tiers, anomalies} -> score.
use crate::anomaly::{IsolationForest, OutlierDetector};
use crate::config::PipelineConfig;
use crate::error::{AnalysisError, Result};
use crate::metrics::derive_metrics;
use crate::normalize::normalize;
use crate::scoring::{rank_projects, ScoringInputs};
use crate::tiers::{label_tiers, Agglomerative, TierAssigner};
use crate::trends::aggregate_projects;
use crate::types::{ClusterProfile, FeatureVector, Record, ScoredProject};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Highest `final_score` first.
    pub ranked: Vec<ScoredProject>,
    pub clusters: Vec<ClusterProfile>,
    pub record_count: usize,
}

impl AnalysisOutcome {
    pub fn project_count(&self) -> usize {
        self.ranked.len()
    }

    pub fn anomaly_count(&self) -> usize {
        self.ranked.iter().filter(|p| p.is_anomaly).count()
    }

    pub fn top(&self) -> Option<&ScoredProject> {
        self.ranked.first()
    }

    /// Lowest-ranked project.
    pub fn highest_risk(&self) -> Option<&ScoredProject> {
        self.ranked.last()
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &ScoredProject> {
        self.ranked.iter().filter(|p| p.is_anomaly)
    }
}

/// Run the analysis with the clustering and outlier detector named by `config`.
pub fn run_pipeline(records: &[Record], config: &PipelineConfig) -> Result<AnalysisOutcome> {
    let tiers = Agglomerative::new(config.linkage);
    let outliers = IsolationForest::from_config(config);
    run_pipeline_with(records, config, &tiers, &outliers)
}

/// Same as [`run_pipeline`] with caller-supplied algorithms.
pub fn run_pipeline_with(
    records: &[Record],
    config: &PipelineConfig,
    tiers: &dyn TierAssigner,
    outliers: &dyn OutlierDetector,
) -> Result<AnalysisOutcome> {
    config.validate()?;
    if records.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let derived = derive_metrics(records, config);
    let aggregates = aggregate_projects(&derived, config);
    if aggregates.len() < config.cluster_count {
        return Err(AnalysisError::TooFewProjects {
            found: aggregates.len(),
            required: config.cluster_count,
        });
    }

    let normalized = normalize(&aggregates);
    let points: Vec<FeatureVector> = normalized.iter().map(|n| n.features()).collect();

    let clusters = tiers.assign(&points, config.cluster_count)?;
    check_len("tier assigner", clusters.len(), points.len())?;
    if let Some(&bad) = clusters.iter().find(|&&c| c >= config.cluster_count) {
        return Err(AnalysisError::InvalidAssignment {
            stage: "tier assigner",
            detail: format!("cluster id {bad} for {} tiers", config.cluster_count),
        });
    }
    let (categories, profiles) = label_tiers(&normalized, &clusters);

    let anomaly_scores = outliers.scores(&points);
    check_len("outlier scores", anomaly_scores.len(), points.len())?;
    let anomalies = outliers.flag(&anomaly_scores);
    check_len("outlier flags", anomalies.len(), points.len())?;

    let inputs = ScoringInputs {
        aggregates: &aggregates,
        normalized: &normalized,
        clusters: &clusters,
        categories: &categories,
        anomalies: &anomalies,
        anomaly_scores: &anomaly_scores,
    };
    let ranked = rank_projects(&inputs, &config.weights);

    let outcome = AnalysisOutcome { ranked, clusters: profiles, record_count: records.len() };
    info!(
        records = outcome.record_count,
        projects = outcome.project_count(),
        anomalies = outcome.anomaly_count(),
        "analysis complete"
    );
    Ok(outcome)
}

// Pluggable stages must return one entry per project.
fn check_len(stage: &'static str, got: usize, expected: usize) -> Result<()> {
    if got == expected {
        return Ok(());
    }
    Err(AnalysisError::InvalidAssignment {
        stage,
        detail: format!("{got} entries for {expected} projects"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn record(name: &str, year: f64, cost: &str, inv: &str, fraud: &str, csat: &str) -> Record {
        Record::new(name, year, [cost, inv, fraud, csat, "5"])
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = run_pipeline(&[], &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset));
    }

    #[test]
    fn too_few_projects_is_fatal() {
        let records = vec![
            record("A", 2020.0, "100", "100", "1", "1"),
            record("B", 2020.0, "100", "100", "2", "1"),
        ];
        let err = run_pipeline(&records, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::TooFewProjects { found: 2, required: 3 }));
    }

    #[test]
    fn invalid_config_is_rejected_before_work() {
        let records = vec![record("A", 2020.0, "1", "1", "1", "1")];
        let cfg = PipelineConfig { contamination: 0.9, ..Default::default() };
        assert!(matches!(run_pipeline(&records, &cfg), Err(AnalysisError::InvalidConfig(_))));
    }

    struct Truncated;

    impl TierAssigner for Truncated {
        fn assign(&self, points: &[FeatureVector], _k: usize) -> Result<Vec<usize>> {
            Ok(vec![0; points.len() - 1])
        }
    }

    struct NoScores;

    impl OutlierDetector for NoScores {
        fn scores(&self, _points: &[FeatureVector]) -> Vec<f64> {
            Vec::new()
        }

        fn flag(&self, scores: &[f64]) -> Vec<bool> {
            vec![false; scores.len()]
        }
    }

    #[test]
    fn misaligned_stage_output_is_an_error() {
        let records = vec![
            record("A", 2020.0, "100", "100", "1", "1"),
            record("B", 2020.0, "100", "100", "2", "1"),
            record("C", 2020.0, "100", "100", "3", "1"),
        ];
        let cfg = PipelineConfig::default();
        let forest = IsolationForest::from_config(&cfg);

        let err = run_pipeline_with(&records, &cfg, &Truncated, &forest).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidAssignment { stage: "tier assigner", .. }));
        assert_eq!(err.to_string(), "tier assigner returned 2 entries for 3 projects");

        let err = run_pipeline_with(&records, &cfg, &Agglomerative::default(), &NoScores).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidAssignment { stage: "outlier scores", .. }));
    }

    #[test]
    fn rising_cheap_project_beats_flat_overrun() {
        // A: efficiency rising over three years, spends what was invested.
        // B: efficiency falling, costs double the investment.
        let records = vec![
            record("A", 2020.0, "100", "100", "1", "2"),
            record("A", 2021.0, "100", "100", "2", "2"),
            record("A", 2022.0, "100", "100", "3", "2"),
            record("B", 2020.0, "200", "100", "3", "2"),
            record("B", 2021.0, "200", "100", "2", "2"),
            record("B", 2022.0, "200", "100", "2", "2"),
        ];
        let cfg = PipelineConfig { cluster_count: 2, ..Default::default() };
        let outcome = run_pipeline(&records, &cfg).unwrap();

        assert_eq!(outcome.ranked[0].project_name, "A");
        assert_eq!(outcome.ranked[1].project_name, "B");
        assert_ne!(outcome.ranked[1].category, Category::Star);
        assert_eq!(outcome.ranked[0].category, Category::Star);
        assert!((outcome.ranked[0].final_score - 1.0).abs() < 1e-12);
        assert!(outcome.ranked[1].final_score.abs() < 1e-12);
    }
}
