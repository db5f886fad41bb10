use super::super::domain::{AttemptOutcome, FacilityVisit, TrainingStatus};
use super::super::filter::{FilterCriteria, FilterOptions};
use chrono::NaiveDate;
use serde::Serialize;

/// Rendering contract handed to the chart layer alongside the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Donut {
        hole: f32,
        text_info: &'static str,
        show_legend: bool,
    },
    Bar {
        #[serde(skip_serializing_if = "Option::is_none")]
        y_range: Option<[f64; 2]>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color_scale: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        text_template: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bar_mode: Option<&'static str>,
    },
    DualAxisLine {
        primary_axis_title: &'static str,
        secondary_axis_title: &'static str,
        hover_mode: &'static str,
    },
    Histogram {
        bins: usize,
        color: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub total: usize,
    pub completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_pct: Option<f64>,
    /// "N (x.x%)", or "0" for an empty view.
    pub completed_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    /// One decimal, or "N/A" when no record carries a score.
    pub average_score_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSlice {
    pub status: TrainingStatus,
    pub count: usize,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBreakdownView {
    pub chart: ChartSpec,
    pub total: usize,
    pub slices: Vec<StatusSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleScoreEntry {
    pub module: String,
    pub mean_score: f64,
    pub pass_rate_pct: f64,
    pub scored: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleScoresView {
    pub chart: ChartSpec,
    pub modules: Vec<ModuleScoreEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortMonth {
    /// First day of the calendar month.
    pub month: NaiveDate,
    pub label: String,
    pub started: usize,
    pub completed: usize,
    pub completion_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub secondary_axis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortTrendView {
    pub chart: ChartSpec,
    pub series: Vec<TrendSeries>,
    pub months: Vec<CohortMonth>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityVisitCount {
    pub status: FacilityVisit,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityVisitView {
    pub department: String,
    pub chart: ChartSpec,
    pub breakdown: Vec<FacilityVisitCount>,
    pub total_assigned: usize,
    pub completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_pct: Option<f64>,
    pub completed_display: String,
    pub scheduled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingsView {
    pub top: Vec<RankedEntry>,
    pub bottom: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptBreakdownEntry {
    pub module: String,
    pub passed_first: usize,
    pub passed_second: usize,
    pub failed: usize,
    pub attempted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptSeries {
    pub outcome: AttemptOutcome,
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptBreakdownView {
    pub chart: ChartSpec,
    pub series: Vec<AttemptSeries>,
    pub modules: Vec<AttemptBreakdownEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceMarker {
    pub value: f64,
    pub label: String,
    pub color: &'static str,
    pub dash: &'static str,
    pub position: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationHistogramView {
    pub chart: ChartSpec,
    pub samples: usize,
    pub mean_days: f64,
    pub marker: ReferenceMarker,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub full_name: String,
    pub department: String,
    pub team: Option<String>,
    pub training_start: Option<NaiveDate>,
    pub training_end: Option<NaiveDate>,
    pub duration_days: Option<i64>,
    pub average_score: Option<f64>,
    pub status: Option<TrainingStatus>,
}

/// Everything the dashboard page renders for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub filters: FilterOptions,
    pub metrics: HeadlineMetrics,
    pub status_breakdown: StatusBreakdownView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_scores: Option<ModuleScoresView>,
    pub cohort_trend: CohortTrendView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_visits: Option<FacilityVisitView>,
    pub rankings: RankingsView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<AttemptBreakdownView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationHistogramView>,
    pub details: Vec<DetailRow>,
}
