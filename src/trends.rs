//! Per-project aggregation: mean metrics plus an efficiency-over-time slope.
use crate::config::PipelineConfig;
use crate::types::{DerivedRecord, ProjectAggregate};
use crate::util::average;
use std::collections::HashMap;
use tracing::debug;

/// Ordinary least-squares slope of `ys` against `xs`.
///
/// Returns 0 when the slope is undefined: fewer than two points or no
/// spread on the x axis.
pub fn ols_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = average(&xs[..n]);
    let mean_y = average(&ys[..n]);
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys).take(n) {
        let dx = x - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }
    if sxx <= f64::EPSILON * n as f64 {
        return 0.0;
    }
    let slope = sxy / sxx;
    if slope.is_finite() { slope } else { 0.0 }
}

/// Group records by project (first-appearance order) and reduce each group
/// to one [`ProjectAggregate`].
pub fn aggregate_projects(records: &[DerivedRecord], config: &PipelineConfig) -> Vec<ProjectAggregate> {
    #[derive(Default)]
    struct Acc {
        years: Vec<f64>,
        efficiency: Vec<f64>,
        deviation: Vec<f64>,
        processing: Vec<f64>,
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Acc)> = Vec::new();
    for r in records {
        let slot = *index.entry(r.project_name.as_str()).or_insert_with(|| {
            groups.push((r.project_name.as_str(), Acc::default()));
            groups.len() - 1
        });
        let acc = &mut groups[slot].1;
        acc.years.push(r.year);
        acc.efficiency.push(r.efficiency_score);
        acc.deviation.push(r.budget_deviation);
        acc.processing.push(r.processing_time);
    }

    let aggregates: Vec<ProjectAggregate> = groups
        .into_iter()
        .map(|(name, acc)| {
            let observations = acc.years.len();
            let trend_slope = if observations >= config.min_regression_points {
                ols_slope(&acc.years, &acc.efficiency)
            } else {
                debug!(project = name, observations, "too few points for a trend, slope set to 0");
                0.0
            };
            ProjectAggregate {
                project_name: name.to_string(),
                observations,
                efficiency_score: average(&acc.efficiency),
                budget_deviation: average(&acc.deviation),
                trend_slope,
                avg_processing_time: average(&acc.processing),
            }
        })
        .collect();
    debug!(projects = aggregates.len(), "projects aggregated");
    aggregates
}
