//! Min-max scaling of the per-project features.
use crate::types::{NormalizedAggregate, ProjectAggregate};
use crate::util::min_max;
use tracing::debug;

/// Rescale `values` to [0, 1] using the slice's own min and max.
///
/// A constant column (zero range) maps to all zeros.
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let Some((min, max)) = min_max(values) else {
        return Vec::new();
    };
    let range = max - min;
    if range.abs() < f64::EPSILON * max.abs().max(1.0) {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|&x| ((x - min) / range).clamp(0.0, 1.0))
        .collect()
}

/// Scale efficiency, trend and budget deviation independently over the
/// whole project population. Output rows line up 1:1 with the input.
pub fn normalize(aggregates: &[ProjectAggregate]) -> Vec<NormalizedAggregate> {
    let column = |f: fn(&ProjectAggregate) -> f64| -> Vec<f64> {
        min_max_scale(&aggregates.iter().map(f).collect::<Vec<_>>())
    };
    let efficiency = column(|a| a.efficiency_score);
    let trend = column(|a| a.trend_slope);
    let deviation = column(|a| a.budget_deviation);

    let normalized: Vec<NormalizedAggregate> = aggregates
        .iter()
        .enumerate()
        .map(|(i, a)| NormalizedAggregate {
            project_name: a.project_name.clone(),
            efficiency_score: efficiency[i],
            trend_slope: trend[i],
            budget_deviation: deviation[i],
        })
        .collect();
    debug!(projects = normalized.len(), "features normalized");
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(name: &str, eff: f64, slope: f64, dev: f64) -> ProjectAggregate {
        ProjectAggregate {
            project_name: name.to_string(),
            observations: 2,
            efficiency_score: eff,
            budget_deviation: dev,
            trend_slope: slope,
            avg_processing_time: 0.0,
        }
    }

    #[test]
    fn scales_to_unit_interval() {
        let scaled = min_max_scale(&[10.0, 20.0, 15.0, 30.0]);
        assert_eq!(scaled, vec![0.0, 0.5, 0.25, 1.0]);
    }

    #[test]
    fn constant_column_is_all_zero() {
        assert_eq!(min_max_scale(&[3.3, 3.3, 3.3]), vec![0.0; 3]);
        assert_eq!(min_max_scale(&[7.0]), vec![0.0]);
        assert!(min_max_scale(&[]).is_empty());
    }

    #[test]
    fn each_feature_is_scaled_independently() {
        let aggs = vec![
            agg("A", 100.0, -2.0, 0.5),
            agg("B", 300.0, 2.0, 0.5),
            agg("C", 200.0, 0.0, 0.5),
        ];
        let n = normalize(&aggs);
        assert_eq!(n.len(), 3);
        assert_eq!(n[0].project_name, "A");

        let eff: Vec<f64> = n.iter().map(|x| x.efficiency_score).collect();
        let trend: Vec<f64> = n.iter().map(|x| x.trend_slope).collect();
        let dev: Vec<f64> = n.iter().map(|x| x.budget_deviation).collect();
        assert_eq!(eff, vec![0.0, 1.0, 0.5]);
        assert_eq!(trend, vec![0.0, 1.0, 0.5]);
        assert_eq!(dev, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn min_is_zero_and_max_is_one() {
        let values = [4.2, -7.1, 19.9, 0.0, 3.14];
        let scaled = min_max_scale(&values);
        let lo = scaled.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 1.0);
    }
}
