use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// One CSV row as it comes out of the reader, after header trimming.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Project Name", default)]
    pub project_name: Option<String>,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "Cost", default)]
    pub cost: Option<String>,
    #[serde(rename = "Investment", default)]
    pub investment: Option<String>,
    #[serde(rename = "Fraud", default)]
    pub fraud: Option<String>,
    #[serde(rename = "CSAT", default)]
    pub csat: Option<String>,
    #[serde(rename = "ProcessingTime", default)]
    pub processing_time: Option<String>,
}

/// A project-year observation. Numeric fields are still raw text here;
/// the metric deriver coerces them.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub project_name: String,
    pub year: f64,
    pub cost: Option<String>,
    pub investment: Option<String>,
    pub fraud: Option<String>,
    pub csat: Option<String>,
    pub processing_time: Option<String>,
}

impl Record {
    /// Convenience constructor taking the five raw fields in column order
    /// (`Cost`, `Investment`, `Fraud`, `CSAT`, `ProcessingTime`).
    pub fn new(project_name: &str, year: f64, raw: [&str; 5]) -> Self {
        let field = |s: &str| Some(s.to_string());
        Record {
            project_name: project_name.to_string(),
            year,
            cost: field(raw[0]),
            investment: field(raw[1]),
            fraud: field(raw[2]),
            csat: field(raw[3]),
            processing_time: field(raw[4]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub project_name: String,
    pub year: f64,
    pub cost: f64,
    pub investment: f64,
    pub fraud: f64,
    pub csat: f64,
    pub processing_time: f64,
    pub budget_deviation: f64,
    pub efficiency_score: f64,
}

/// One row per distinct project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAggregate {
    pub project_name: String,
    pub observations: usize,
    pub efficiency_score: f64,
    pub budget_deviation: f64,
    pub trend_slope: f64,
    pub avg_processing_time: f64,
}

/// Point in scaled feature space: (efficiency, trend, budget deviation).
pub type FeatureVector = [f64; 3];

/// The three clustering/scoring features of a project, each min-max scaled
/// over the whole population.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAggregate {
    pub project_name: String,
    pub efficiency_score: f64,
    pub trend_slope: f64,
    pub budget_deviation: f64,
}

impl NormalizedAggregate {
    /// Feature vector in the order (efficiency, trend, budget deviation).
    pub fn features(&self) -> FeatureVector {
        [self.efficiency_score, self.trend_slope, self.budget_deviation]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "STAR (High Perf.)")]
    Star,
    #[serde(rename = "STANDARD")]
    Standard,
    #[serde(rename = "RISKY (Low Perf.)")]
    Risky,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Star => "STAR (High Perf.)",
            Category::Standard => "STANDARD",
            Category::Risky => "RISKY (Low Perf.)",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final, ranked entity handed to reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProject {
    pub project_name: String,
    pub observations: usize,
    pub efficiency_score: f64,
    pub budget_deviation: f64,
    pub trend_slope: f64,
    pub avg_processing_time: f64,
    pub cluster: usize,
    pub category: Category,
    pub is_anomaly: bool,
    pub anomaly_score: f64,
    pub final_score: f64,
}

/// Cluster-level statistics in scaled feature space.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub category: Category,
    pub members: usize,
    pub mean_efficiency: f64,
    pub mean_trend: f64,
    pub mean_budget_deviation: f64,
    pub quality_index: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankedProjectRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Project Name")]
    #[tabled(rename = "Project Name")]
    pub project_name: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Final_Score")]
    #[tabled(rename = "Final_Score")]
    pub final_score: String,
    #[serde(rename = "Trend_Slope")]
    #[tabled(rename = "Trend_Slope")]
    pub trend_slope: String,
    #[serde(rename = "Efficiency_Score")]
    #[tabled(rename = "Efficiency_Score")]
    pub efficiency_score: String,
    #[serde(rename = "Budget_Deviation")]
    #[tabled(rename = "Budget_Deviation")]
    pub budget_deviation: String,
    #[serde(rename = "Cluster")]
    #[tabled(rename = "Cluster")]
    pub cluster: usize,
    #[serde(rename = "Is_Anomaly")]
    #[tabled(rename = "Is_Anomaly")]
    pub is_anomaly: bool,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ClusterProfileRow {
    #[serde(rename = "Cluster")]
    #[tabled(rename = "Cluster")]
    pub cluster: usize,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Members")]
    #[tabled(rename = "Members")]
    pub members: usize,
    #[serde(rename = "MeanEfficiency")]
    #[tabled(rename = "MeanEfficiency")]
    pub mean_efficiency: String,
    #[serde(rename = "MeanTrend")]
    #[tabled(rename = "MeanTrend")]
    pub mean_trend: String,
    #[serde(rename = "MeanBudgetDeviation")]
    #[tabled(rename = "MeanBudgetDeviation")]
    pub mean_budget_deviation: String,
    #[serde(rename = "QualityIndex")]
    #[tabled(rename = "QualityIndex")]
    pub quality_index: String,
}

/// Plot-ready point: x = trend, y = efficiency, hue = category,
/// size = final score, marker = anomaly flag.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ScatterPoint {
    #[serde(rename = "Project Name")]
    pub project_name: String,
    #[serde(rename = "Trend_Slope")]
    pub trend_slope: f64,
    #[serde(rename = "Efficiency_Score")]
    pub efficiency_score: f64,
    #[serde(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Final_Score")]
    pub final_score: f64,
    #[serde(rename = "Is_Anomaly")]
    pub is_anomaly: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProjectHighlight {
    pub project_name: String,
    pub final_score: f64,
    pub trend_slope: f64,
    pub efficiency_score: f64,
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub generated_at: String,
    pub total_records: usize,
    pub total_projects: usize,
    pub total_anomalies: usize,
    pub top_performer: Option<ProjectHighlight>,
    pub highest_risk: Option<ProjectHighlight>,
    pub anomalies: Vec<String>,
}
