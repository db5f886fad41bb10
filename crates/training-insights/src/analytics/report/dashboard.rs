use super::super::domain::TrainingDataset;
use super::super::filter::{FilterCriteria, FilterOptions};
use super::summary;
use super::views::DashboardView;
use tracing::debug;

/// Composes every dashboard section for one filter selection.
#[derive(Debug, Clone)]
pub struct DashboardReport {
    facility_department: String,
}

impl DashboardReport {
    pub fn new(facility_department: impl Into<String>) -> Self {
        Self {
            facility_department: facility_department.into(),
        }
    }

    pub fn facility_department(&self) -> &str {
        &self.facility_department
    }

    /// The facility sub-report only accompanies the unfiltered view or the
    /// facility department itself.
    pub fn shows_facility_visits(&self, criteria: &FilterCriteria) -> bool {
        match criteria.department.as_value() {
            None => true,
            Some(department) => department == self.facility_department,
        }
    }

    pub fn build(&self, dataset: &TrainingDataset, criteria: &FilterCriteria) -> DashboardView {
        let filtered = criteria.apply(dataset.iter());
        let modules = dataset.tracked_modules();
        debug!(
            total = dataset.len(),
            filtered = filtered.len(),
            "recomputing dashboard"
        );

        let facility_visits = if self.shows_facility_visits(criteria) {
            summary::facility_visits(dataset.iter(), &self.facility_department)
        } else {
            None
        };

        DashboardView {
            criteria: criteria.clone(),
            filters: FilterOptions::build(dataset.iter(), &criteria.department),
            metrics: summary::headline_metrics(&filtered),
            status_breakdown: summary::status_breakdown(&filtered),
            module_scores: summary::module_scores(&filtered, &modules),
            cohort_trend: summary::cohort_trend(&filtered),
            facility_visits,
            rankings: summary::rankings(&filtered),
            attempts: summary::attempt_breakdown(&filtered, &modules),
            duration: summary::duration_histogram(&filtered),
            details: summary::detail_rows(&filtered),
        }
    }
}
