//! Outlier flags from a seeded isolation forest.
//!
//! Points that get isolated in few random splits are unusual. The forest is
//! grown from a `Pcg64` seeded with a fixed value, so the same input and
//! seed always produce the same flags.
use crate::config::PipelineConfig;
use crate::types::FeatureVector;
use crate::util::quantile;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::debug;

/// Anything that can mark unusual points in a population.
pub trait OutlierDetector {
    /// Per-point anomaly scores; higher means more unusual.
    fn scores(&self, points: &[FeatureVector]) -> Vec<f64>;

    /// Turn scores already computed by [`OutlierDetector::scores`] into
    /// one flag per point.
    fn flag(&self, scores: &[f64]) -> Vec<bool>;

    fn detect(&self, points: &[FeatureVector]) -> Vec<bool> {
        self.flag(&self.scores(points))
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        IsolationForest { n_estimators: 100, max_samples: 256, contamination: 0.15, seed: 42 }
    }
}

impl IsolationForest {
    pub fn from_config(config: &PipelineConfig) -> Self {
        IsolationForest {
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            contamination: config.contamination,
            seed: config.seed,
        }
    }
}

enum Node {
    Leaf { size: usize },
    Split { feature: usize, threshold: f64, left: Box<Node>, right: Box<Node> },
}

/// Average path length of an unsuccessful BST search among `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            let harmonic = (n - 1.0).ln() + 0.577_215_664_901_532_9;
            2.0 * harmonic - 2.0 * (n - 1.0) / n
        }
    }
}

fn grow(points: &[FeatureVector], rows: &[usize], depth: usize, limit: usize, rng: &mut Pcg64) -> Node {
    if depth >= limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }
    // Only features that still vary inside this node can split it.
    let spans: Vec<(usize, f64, f64)> = (0..3)
        .filter_map(|f| {
            let lo = rows.iter().map(|&r| points[r][f]).fold(f64::INFINITY, f64::min);
            let hi = rows.iter().map(|&r| points[r][f]).fold(f64::NEG_INFINITY, f64::max);
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();
    if spans.is_empty() {
        return Node::Leaf { size: rows.len() };
    }
    let (feature, lo, hi) = spans[rng.random_range(0..spans.len())];
    let threshold = rng.random_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) = rows.iter().partition(|&&r| points[r][feature] < threshold);
    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(points, &left, depth + 1, limit, rng)),
        right: Box::new(grow(points, &right, depth + 1, limit, rng)),
    }
}

fn path_length(node: &Node, point: &FeatureVector, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split { feature, threshold, left, right } => {
            if point[*feature] < *threshold {
                path_length(left, point, depth + 1)
            } else {
                path_length(right, point, depth + 1)
            }
        }
    }
}

impl OutlierDetector for IsolationForest {
    fn scores(&self, points: &[FeatureVector]) -> Vec<f64> {
        let n = points.len();
        if n == 0 || self.n_estimators == 0 {
            return vec![0.0; n];
        }
        let sample = self.max_samples.clamp(1, n);
        let limit = (sample as f64).log2().ceil().max(1.0) as usize;
        let mut rng = Pcg64::seed_from_u64(self.seed);

        let trees: Vec<Node> = (0..self.n_estimators)
            .map(|_| {
                let rows = index::sample(&mut rng, n, sample).into_vec();
                grow(points, &rows, 0, limit, &mut rng)
            })
            .collect();

        let norm = average_path_length(sample);
        points
            .iter()
            .map(|p| {
                let mean_depth = trees.iter().map(|t| path_length(t, p, 0)).sum::<f64>() / trees.len() as f64;
                if norm > 0.0 { 2f64.powf(-mean_depth / norm) } else { 0.5 }
            })
            .collect()
    }

    fn flag(&self, scores: &[f64]) -> Vec<bool> {
        if scores.len() < 2 {
            return vec![false; scores.len()];
        }
        let threshold = quantile(scores, 1.0 - self.contamination);
        let flags: Vec<bool> = scores.iter().map(|&s| s > threshold).collect();
        debug!(
            flagged = flags.iter().filter(|f| **f).count(),
            population = flags.len(),
            threshold,
            "isolation forest finished"
        );
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud_with_outliers() -> Vec<FeatureVector> {
        let mut pts: Vec<FeatureVector> = (0..18)
            .map(|i| {
                let t = i as f64 / 18.0;
                [0.45 + 0.1 * t, 0.5 + 0.05 * (t * 6.0).sin(), 0.5 - 0.08 * t]
            })
            .collect();
        pts.push([0.0, 1.0, 0.0]);
        pts.push([1.0, 0.0, 1.0]);
        pts
    }

    #[test]
    fn path_length_constants() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(16));
    }

    #[test]
    fn flags_the_far_points() {
        let pts = cloud_with_outliers();
        let flags = IsolationForest::default().detect(&pts);
        assert!(flags[18], "first outlier not flagged");
        assert!(flags[19], "second outlier not flagged");
        let flagged = flags.iter().filter(|f| **f).count();
        // 15% of 20 points.
        assert!((2..=3).contains(&flagged), "flagged {flagged}");
    }

    #[test]
    fn same_seed_same_flags() {
        let pts = cloud_with_outliers();
        let forest = IsolationForest { seed: 7, ..Default::default() };
        assert_eq!(forest.scores(&pts), forest.scores(&pts));
        assert_eq!(forest.detect(&pts), forest.detect(&pts));
    }

    #[test]
    fn flags_from_precomputed_scores_match_detect() {
        let pts = cloud_with_outliers();
        let forest = IsolationForest::default();
        let scores = forest.scores(&pts);
        assert_eq!(forest.flag(&scores), forest.detect(&pts));
        assert_eq!(forest.flag(&[0.9]), vec![false]);
    }

    #[test]
    fn scores_are_in_unit_interval() {
        let pts = cloud_with_outliers();
        for s in IsolationForest::default().scores(&pts) {
            assert!(s > 0.0 && s <= 1.0);
        }
    }

    #[test]
    fn tiny_and_constant_populations() {
        let forest = IsolationForest::default();
        assert!(forest.detect(&[]).is_empty());
        assert_eq!(forest.detect(&[[0.5, 0.5, 0.5]]), vec![false]);
        // No feature varies, every point is equally normal.
        assert_eq!(forest.detect(&[[0.1, 0.1, 0.1]; 5]), vec![false; 5]);
    }
}
