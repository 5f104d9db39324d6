//! Performance tiers: agglomerative clustering in scaled feature space,
//! then STAR / STANDARD / RISKY labels from each cluster's quality index.
use crate::config::Linkage;
use crate::error::{AnalysisError, Result};
use crate::types::{Category, ClusterProfile, FeatureVector, NormalizedAggregate};
use crate::util::average;
use tracing::debug;

/// Anything that can split `points` into `k` groups.
///
/// Returned ids must lie in `0..k` and every id must be used.
pub trait TierAssigner {
    fn assign(&self, points: &[FeatureVector], k: usize) -> Result<Vec<usize>>;
}

/// Bottom-up hierarchical clustering with Euclidean distances.
#[derive(Debug, Clone, Copy, Default)]
pub struct Agglomerative {
    pub linkage: Linkage,
}

impl Agglomerative {
    pub fn new(linkage: Linkage) -> Self {
        Agglomerative { linkage }
    }
}

fn squared_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl TierAssigner for Agglomerative {
    fn assign(&self, points: &[FeatureVector], k: usize) -> Result<Vec<usize>> {
        let n = points.len();
        if k == 0 || n < k {
            return Err(AnalysisError::TooFewProjects { found: n, required: k });
        }

        // Ward works on squared distances (Lance-Williams form), the other
        // criteria on plain Euclidean distances.
        let mut dist = vec![vec![0.0f64; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d2 = squared_distance(&points[i], &points[j]);
                let d = if self.linkage == Linkage::Ward { d2 } else { d2.sqrt() };
                dist[i][j] = d;
                dist[j][i] = d;
            }
        }

        let mut size = vec![1usize; n];
        let mut active = vec![true; n];
        // owner[p] = slot of the cluster currently holding point p
        let mut owner: Vec<usize> = (0..n).collect();
        let mut clusters = n;

        while clusters > k {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in (0..n).filter(|&i| active[i]) {
                for j in ((i + 1)..n).filter(|&j| active[j]) {
                    if best.map_or(true, |(_, _, d)| dist[i][j] < d) {
                        best = Some((i, j, dist[i][j]));
                    }
                }
            }
            let Some((a, b, d_ab)) = best else { break };

            let (na, nb) = (size[a] as f64, size[b] as f64);
            for m in (0..n).filter(|&m| active[m] && m != a && m != b) {
                let (d_am, d_bm) = (dist[a][m], dist[b][m]);
                let nm = size[m] as f64;
                let merged = match self.linkage {
                    Linkage::Ward => ((na + nm) * d_am + (nb + nm) * d_bm - nm * d_ab) / (na + nb + nm),
                    Linkage::Complete => d_am.max(d_bm),
                    Linkage::Single => d_am.min(d_bm),
                    Linkage::Average => (na * d_am + nb * d_bm) / (na + nb),
                };
                dist[a][m] = merged;
                dist[m][a] = merged;
            }
            size[a] += size[b];
            active[b] = false;
            for o in owner.iter_mut().filter(|o| **o == b) {
                *o = a;
            }
            clusters -= 1;
        }

        // Renumber 0..k by first appearance so ids do not depend on slot numbers.
        let mut remap: Vec<Option<usize>> = vec![None; n];
        let mut next = 0;
        let labels = owner
            .iter()
            .map(|&slot| {
                *remap[slot].get_or_insert_with(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();
        Ok(labels)
    }
}

/// Label clusters by quality index (mean scaled efficiency + mean scaled
/// trend).
///
/// STAR goes to the first cluster id with the highest index, RISKY to the
/// first id with the lowest index among the rest, every other cluster is
/// STANDARD. Returns the per-project categories and one profile per
/// cluster, ordered by id.
pub fn label_tiers(
    normalized: &[NormalizedAggregate],
    assignments: &[usize],
) -> (Vec<Category>, Vec<ClusterProfile>) {
    let k = assignments.iter().copied().max().map_or(0, |m| m + 1);

    let mut profiles: Vec<ClusterProfile> = (0..k)
        .map(|c| {
            let members: Vec<&NormalizedAggregate> = normalized
                .iter()
                .zip(assignments)
                .filter(|(_, a)| **a == c)
                .map(|(p, _)| p)
                .collect();
            let mean = |f: fn(&NormalizedAggregate) -> f64| {
                average(&members.iter().map(|p| f(p)).collect::<Vec<_>>())
            };
            let mean_efficiency = mean(|p| p.efficiency_score);
            let mean_trend = mean(|p| p.trend_slope);
            ClusterProfile {
                cluster: c,
                category: Category::Standard,
                members: members.len(),
                mean_efficiency,
                mean_trend,
                mean_budget_deviation: mean(|p| p.budget_deviation),
                quality_index: mean_efficiency + mean_trend,
            }
        })
        .collect();

    let star = first_extreme(&profiles, None, |q, best| q > best);
    let risky = first_extreme(&profiles, star, |q, best| q < best);
    for p in &mut profiles {
        if Some(p.cluster) == star {
            p.category = Category::Star;
        } else if Some(p.cluster) == risky {
            p.category = Category::Risky;
        }
    }
    debug!(clusters = k, ?star, ?risky, "tiers labelled");

    let categories = assignments
        .iter()
        .map(|&a| profiles[a].category)
        .collect();
    (categories, profiles)
}

// First cluster id whose quality index wins `better`, skipping `exclude`.
fn first_extreme(
    profiles: &[ClusterProfile],
    exclude: Option<usize>,
    better: impl Fn(f64, f64) -> bool,
) -> Option<usize> {
    let mut pick: Option<&ClusterProfile> = None;
    for p in profiles.iter().filter(|p| Some(p.cluster) != exclude) {
        if pick.map_or(true, |cur| better(p.quality_index, cur.quality_index)) {
            pick = Some(p);
        }
    }
    pick.map(|p| p.cluster)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(name: &str, eff: f64, trend: f64, dev: f64) -> NormalizedAggregate {
        NormalizedAggregate {
            project_name: name.to_string(),
            efficiency_score: eff,
            trend_slope: trend,
            budget_deviation: dev,
        }
    }

    fn blobs() -> Vec<NormalizedAggregate> {
        vec![
            norm("hi-1", 0.95, 0.90, 0.10),
            norm("lo-1", 0.05, 0.10, 0.90),
            norm("mid-1", 0.50, 0.45, 0.50),
            norm("hi-2", 1.00, 1.00, 0.05),
            norm("lo-2", 0.00, 0.00, 1.00),
            norm("mid-2", 0.45, 0.50, 0.55),
        ]
    }

    fn points(ns: &[NormalizedAggregate]) -> Vec<FeatureVector> {
        ns.iter().map(NormalizedAggregate::features).collect()
    }

    #[test]
    fn separates_three_blobs_with_every_linkage() {
        let ns = blobs();
        for linkage in [Linkage::Ward, Linkage::Complete, Linkage::Average, Linkage::Single] {
            let labels = Agglomerative::new(linkage).assign(&points(&ns), 3).unwrap();
            assert_eq!(labels, vec![0, 1, 2, 0, 1, 2], "linkage {linkage:?}");
        }
    }

    #[test]
    fn rejects_more_clusters_than_points() {
        let ns = blobs();
        let err = Agglomerative::default().assign(&points(&ns[..2]), 3).unwrap_err();
        assert!(matches!(err, AnalysisError::TooFewProjects { found: 2, required: 3 }));
    }

    #[test]
    fn one_point_per_cluster_when_k_equals_n() {
        let ns = blobs();
        let labels = Agglomerative::default().assign(&points(&ns[..3]), 3).unwrap();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn star_and_risky_follow_quality_index() {
        let ns = blobs();
        let labels = Agglomerative::default().assign(&points(&ns), 3).unwrap();
        let (cats, profiles) = label_tiers(&ns, &labels);

        assert_eq!(cats[0], Category::Star);
        assert_eq!(cats[3], Category::Star);
        assert_eq!(cats[1], Category::Risky);
        assert_eq!(cats[2], Category::Standard);

        let star = profiles.iter().find(|p| p.category == Category::Star).unwrap();
        let risky = profiles.iter().find(|p| p.category == Category::Risky).unwrap();
        for p in &profiles {
            assert!(star.quality_index >= p.quality_index);
            assert!(risky.quality_index <= p.quality_index);
        }
        assert_eq!(profiles.iter().map(|p| p.members).sum::<usize>(), 6);
    }

    #[test]
    fn ties_still_yield_one_star_and_one_risky() {
        let ns = vec![
            norm("a", 0.5, 0.5, 0.0),
            norm("b", 0.5, 0.5, 0.5),
            norm("c", 0.5, 0.5, 1.0),
        ];
        let (cats, profiles) = label_tiers(&ns, &[0, 1, 2]);
        assert_eq!(cats, vec![Category::Star, Category::Risky, Category::Standard]);
        assert_eq!(profiles.iter().filter(|p| p.category == Category::Star).count(), 1);
        assert_eq!(profiles.iter().filter(|p| p.category == Category::Risky).count(), 1);
    }

    #[test]
    fn four_clusters_leave_two_standard() {
        let ns = vec![
            norm("mid-high", 0.60, 0.60, 0.3),
            norm("top", 0.90, 0.95, 0.1),
            norm("bottom", 0.10, 0.05, 0.9),
            norm("mid-low", 0.40, 0.35, 0.6),
        ];
        let (cats, profiles) = label_tiers(&ns, &[0, 1, 2, 3]);
        assert_eq!(
            cats,
            vec![Category::Standard, Category::Star, Category::Risky, Category::Standard]
        );
        assert_eq!(profiles.len(), 4);
        assert_eq!(profiles.iter().filter(|p| p.category == Category::Star).count(), 1);
        assert_eq!(profiles.iter().filter(|p| p.category == Category::Risky).count(), 1);
        assert_eq!(profiles.iter().filter(|p| p.category == Category::Standard).count(), 2);
    }

    #[test]
    fn two_clusters_get_star_and_risky() {
        let ns = vec![norm("good", 1.0, 1.0, 0.0), norm("bad", 0.0, 0.0, 1.0)];
        let (cats, _) = label_tiers(&ns, &[0, 1]);
        assert_eq!(cats, vec![Category::Star, Category::Risky]);
    }
}
