use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use training_insights::analytics::{DashboardReport, SessionCache, TrainingImporter};
use training_insights::config::DashboardConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Per-process dashboard session: one uploaded dataset shared by every request.
#[derive(Debug)]
pub(crate) struct DashboardState {
    session: Mutex<SessionCache>,
    pub(crate) importer: TrainingImporter,
    pub(crate) report: DashboardReport,
}

impl DashboardState {
    pub(crate) fn new(importer: TrainingImporter, report: DashboardReport) -> Self {
        Self {
            session: Mutex::new(SessionCache::new()),
            importer,
            report,
        }
    }

    pub(crate) fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            TrainingImporter::new(config.sheet_name.clone()),
            DashboardReport::new(config.facility_department.clone()),
        )
    }

    /// A panic mid-upload leaves the cache either empty or fully replaced,
    /// so a poisoned lock is still safe to reuse.
    pub(crate) fn session(&self) -> MutexGuard<'_, SessionCache> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) type SharedDashboard = Arc<DashboardState>;
