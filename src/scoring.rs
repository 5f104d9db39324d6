//! Weighted composite score and final ranking.
use crate::config::ScoreWeights;
use crate::types::{Category, NormalizedAggregate, ProjectAggregate, ScoredProject};
use tracing::debug;

/// `trend * w_t + efficiency * w_e + (1 - budget_deviation) * w_b`, all
/// inputs already scaled to [0, 1].
pub fn composite_score(n: &NormalizedAggregate, w: &ScoreWeights) -> f64 {
    let budget_score = 1.0 - n.budget_deviation;
    let score = w.trend * n.trend_slope + w.efficiency * n.efficiency_score + w.budget * budget_score;
    // Rounding can push a perfect score an ulp past 1.
    score.clamp(0.0, 1.0)
}

/// Per-project inputs of the ranking, all aligned with `aggregates`.
pub struct ScoringInputs<'a> {
    pub aggregates: &'a [ProjectAggregate],
    pub normalized: &'a [NormalizedAggregate],
    pub clusters: &'a [usize],
    pub categories: &'a [Category],
    pub anomalies: &'a [bool],
    pub anomaly_scores: &'a [f64],
}

/// Build the scored table and sort it by `final_score`, highest first.
/// The sort is stable, so equal scores keep input order.
pub fn rank_projects(inputs: &ScoringInputs<'_>, weights: &ScoreWeights) -> Vec<ScoredProject> {
    let mut scored: Vec<ScoredProject> = inputs
        .aggregates
        .iter()
        .enumerate()
        .map(|(i, a)| ScoredProject {
            project_name: a.project_name.clone(),
            observations: a.observations,
            efficiency_score: a.efficiency_score,
            budget_deviation: a.budget_deviation,
            trend_slope: a.trend_slope,
            avg_processing_time: a.avg_processing_time,
            cluster: inputs.clusters[i],
            category: inputs.categories[i],
            is_anomaly: inputs.anomalies[i],
            anomaly_score: inputs.anomaly_scores[i],
            final_score: composite_score(&inputs.normalized[i], weights),
        })
        .collect();
    scored.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    debug!(projects = scored.len(), "projects ranked");
    scored
}
