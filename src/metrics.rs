//! Per-record derived features.
use crate::config::PipelineConfig;
use crate::types::{DerivedRecord, Record};
use crate::util::coerce_f64;
use tracing::debug;

/// `|cost - investment| / (investment + eps)`.
pub fn budget_deviation(cost: f64, investment: f64, eps: f64) -> f64 {
    ((cost - investment) / (investment + eps)).abs()
}

/// `(fraud * csat) / (cost + eps) * scale`.
pub fn efficiency_score(fraud: f64, csat: f64, cost: f64, eps: f64, scale: f64) -> f64 {
    (fraud * csat) / (cost + eps) * scale
}

/// Coerce the raw fields of every record and attach the derived metrics.
///
/// Never fails: unparseable or missing numbers count as zero.
pub fn derive_metrics(records: &[Record], config: &PipelineConfig) -> Vec<DerivedRecord> {
    let eps = config.epsilon;
    let derived: Vec<DerivedRecord> = records
        .iter()
        .map(|r| {
            let cost = coerce_f64(r.cost.as_deref());
            let investment = coerce_f64(r.investment.as_deref());
            let fraud = coerce_f64(r.fraud.as_deref());
            let csat = coerce_f64(r.csat.as_deref());
            let processing_time = coerce_f64(r.processing_time.as_deref());
            DerivedRecord {
                project_name: r.project_name.clone(),
                year: r.year,
                cost,
                investment,
                fraud,
                csat,
                processing_time,
                budget_deviation: sanitize(budget_deviation(cost, investment, eps)),
                efficiency_score: sanitize(efficiency_score(fraud, csat, cost, eps, config.efficiency_scale)),
            }
        })
        .collect();
    debug!(records = derived.len(), "derived metrics computed");
    derived
}

// A denominator of exactly -eps (e.g. investment == -1e-5) would divide by zero.
fn sanitize(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive_one(raw: [&str; 5]) -> DerivedRecord {
        let rec = Record::new("P", 2020.0, raw);
        derive_metrics(&[rec], &PipelineConfig::default()).remove(0)
    }

    #[test]
    fn computes_both_metrics() {
        let d = derive_one(["200", "100", "2", "4,5", "7"]);
        assert_eq!(d.cost, 200.0);
        assert_eq!(d.csat, 4.5);
        assert!((d.budget_deviation - 100.0 / (100.0 + 1e-5)).abs() < 1e-12);
        let expected = 2.0 * 4.5 / (200.0 + 1e-5) * 1_000_000.0;
        assert!((d.efficiency_score - expected).abs() < 1e-6);
    }

    #[test]
    fn budget_deviation_is_never_negative() {
        for (cost, inv) in [(0.0, 10.0), (10.0, 0.0), (5.0, 5.0), (-3.0, 2.0), (1e9, 1.0)] {
            assert!(budget_deviation(cost, inv, 1e-5) >= 0.0);
        }
    }

    #[test]
    fn malformed_cost_becomes_zero() {
        let d = derive_one(["1.234,56", "100", "1", "1", ""]);
        assert_eq!(d.cost, 0.0);
        assert_eq!(d.processing_time, 0.0);
        assert!((d.budget_deviation - 100.0 / (100.0 + 1e-5)).abs() < 1e-12);
        assert!(d.efficiency_score.is_finite());
    }

    #[test]
    fn all_zero_inputs_stay_finite() {
        let d = derive_one(["", "", "", "", ""]);
        assert_eq!(d.budget_deviation, 0.0);
        assert_eq!(d.efficiency_score, 0.0);
    }

    #[test]
    fn efficiency_sign_follows_numerator() {
        let d = derive_one(["10", "10", "-2", "3", "0"]);
        assert!(d.efficiency_score < 0.0);
    }
}
