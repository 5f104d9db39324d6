use crate::pipeline::AnalysisOutcome;
use crate::types::{
    AnalysisSummary, ClusterProfileRow, ProjectHighlight, RankedProjectRow, ScatterPoint, ScoredProject,
};
use crate::util::format_number;
use std::fmt::Write as _;
use tabled::{settings::Style, Table};

pub fn ranked_rows(outcome: &AnalysisOutcome) -> Vec<RankedProjectRow> {
    outcome
        .ranked
        .iter()
        .enumerate()
        .map(|(idx, p)| RankedProjectRow {
            rank: idx + 1,
            project_name: p.project_name.clone(),
            category: p.category,
            final_score: format_number(p.final_score, 4),
            trend_slope: format_number(p.trend_slope, 2),
            efficiency_score: format_number(p.efficiency_score, 2),
            budget_deviation: format_number(p.budget_deviation, 4),
            cluster: p.cluster,
            is_anomaly: p.is_anomaly,
        })
        .collect()
}

pub fn cluster_rows(outcome: &AnalysisOutcome) -> Vec<ClusterProfileRow> {
    outcome
        .clusters
        .iter()
        .map(|c| ClusterProfileRow {
            cluster: c.cluster,
            category: c.category,
            members: c.members,
            mean_efficiency: format_number(c.mean_efficiency, 4),
            mean_trend: format_number(c.mean_trend, 4),
            mean_budget_deviation: format_number(c.mean_budget_deviation, 4),
            quality_index: format_number(c.quality_index, 4),
        })
        .collect()
}

/// Raw (unformatted) values for plotting trend against efficiency.
pub fn scatter_points(outcome: &AnalysisOutcome) -> Vec<ScatterPoint> {
    outcome
        .ranked
        .iter()
        .map(|p| ScatterPoint {
            project_name: p.project_name.clone(),
            trend_slope: p.trend_slope,
            efficiency_score: p.efficiency_score,
            category: p.category,
            final_score: p.final_score,
            is_anomaly: p.is_anomaly,
        })
        .collect()
}

fn highlight(p: &ScoredProject) -> ProjectHighlight {
    ProjectHighlight {
        project_name: p.project_name.clone(),
        final_score: p.final_score,
        trend_slope: p.trend_slope,
        efficiency_score: p.efficiency_score,
        category: p.category,
    }
}

pub fn summary(outcome: &AnalysisOutcome) -> AnalysisSummary {
    AnalysisSummary {
        generated_at: chrono::Local::now().to_rfc3339(),
        total_records: outcome.record_count,
        total_projects: outcome.project_count(),
        total_anomalies: outcome.anomaly_count(),
        top_performer: outcome.top().map(highlight),
        highest_risk: outcome.highest_risk().map(highlight),
        anomalies: outcome.anomalies().map(|p| p.project_name.clone()).collect(),
    }
}

/// Plain-text report: best and worst project, outliers, full ranking.
pub fn render_text_report(outcome: &AnalysisOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "PROJECT PERFORMANCE ANALYSIS REPORT");

    if let Some(best) = outcome.top() {
        let _ = writeln!(out, "\nTOP PERFORMING PROJECT: {}", best.project_name);
        let _ = writeln!(out, "   - Final Score: {}", format_number(best.final_score, 4));
        let _ = writeln!(out, "   - Trend Slope: {}", format_number(best.trend_slope, 2));
        let _ = writeln!(out, "   - Efficiency: {}", format_number(best.efficiency_score, 2));
    }
    if let Some(worst) = outcome.highest_risk() {
        let _ = writeln!(out, "\nHIGHEST RISK PROJECT: {}", worst.project_name);
        let _ = writeln!(out, "   - Final Score: {}", format_number(worst.final_score, 4));
        let _ = writeln!(out, "   - Category: {}", worst.category);
    }

    let names: Vec<&str> = outcome.anomalies().map(|p| p.project_name.as_str()).collect();
    let listed = if names.is_empty() { "None".to_string() } else { names.join(", ") };
    let _ = writeln!(out, "\nDETECTED OUTLIERS (Anomalies): {listed}");
    let _ = writeln!(out, "(Unusual projects: possible breakthroughs or failures worth a closer look.)");

    let _ = writeln!(out, "\n--- RANKED PROJECT LIST ---");
    let rows = ranked_rows(outcome);
    if rows.is_empty() {
        let _ = writeln!(out, "(no rows)");
    } else {
        let _ = writeln!(out, "{}", Table::new(rows).with(Style::markdown()));
    }
    out
}
