mod dashboard;
mod summary;
pub mod views;

pub use dashboard::DashboardReport;
pub use summary::{
    attempt_breakdown, cohort_trend, detail_rows, duration_histogram, facility_visits,
    headline_metrics, module_scores, rankings, status_breakdown, HISTOGRAM_BINS, RANKING_SIZE,
};
