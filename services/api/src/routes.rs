use crate::infra::{AppState, DashboardState, SharedDashboard};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use training_insights::analytics::filter::Selection;
use training_insights::analytics::report::views::DashboardView;
use training_insights::analytics::{DatasetInfo, FilterCriteria, FilterOptions, UploadFormat};
use training_insights::error::AppError;

const AWAITING_UPLOAD_MESSAGE: &str =
    "Пожалуйста, загрузите файл с данными обучения для отображения аналитики.";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadQuery {
    #[serde(default)]
    pub(crate) format: Option<String>,
}

impl UploadQuery {
    fn upload_format(&self) -> Option<UploadFormat> {
        match self.format.as_deref().map(str::trim) {
            None | Some("") => Some(UploadFormat::Spreadsheet),
            Some(raw) if raw.eq_ignore_ascii_case("csv") => Some(UploadFormat::Csv),
            Some(raw)
                if ["xlsx", "xls", "xlsm", "xlsb", "ods", "spreadsheet"]
                    .iter()
                    .any(|known| raw.eq_ignore_ascii_case(known)) =>
            {
                Some(UploadFormat::Spreadsheet)
            }
            Some(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FiltersQuery {
    #[serde(default)]
    pub(crate) department: Selection,
}

#[derive(Debug, Serialize)]
pub(crate) struct DatasetSummary {
    #[serde(flatten)]
    pub(crate) info: DatasetInfo,
    pub(crate) cache_hit: bool,
    pub(crate) filters: FilterOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReadyDashboard {
    pub(crate) dataset: DatasetInfo,
    #[serde(flatten)]
    pub(crate) view: DashboardView,
}

/// No upload yet is a normal state for the page, not an error.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub(crate) enum DashboardResponse {
    AwaitingUpload { message: &'static str },
    Ready(Box<ReadyDashboard>),
}

pub(crate) fn router(dashboard: SharedDashboard) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(dashboard_router(dashboard))
}

pub(crate) fn dashboard_router(dashboard: SharedDashboard) -> Router {
    Router::new()
        .route(
            "/api/v1/dataset",
            axum::routing::post(upload_dataset).delete(clear_dataset),
        )
        .route("/api/v1/filters", get(filter_options))
        .route("/api/v1/dashboard", get(dashboard_endpoint))
        .with_state(dashboard)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn upload_dataset(
    State(dashboard): State<Arc<DashboardState>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let Some(format) = query.upload_format() else {
        let message = format!(
            "unsupported upload format '{}'",
            query.format.unwrap_or_default()
        );
        return Ok((StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response());
    };

    // Parsing a large workbook is CPU-bound; keep it off the async workers.
    let load = tokio::task::spawn_blocking(move || {
        let mut session = dashboard.session();
        session.load_with(&body, |bytes| dashboard.importer.load_bytes(bytes, format))
    })
    .await
    .map_err(std::io::Error::from)??;
    let info = load.loaded.info();
    info!(
        digest = %info.digest,
        records = info.total_records,
        cache_hit = load.cache_hit,
        "dataset upload accepted"
    );

    let summary = DatasetSummary {
        filters: FilterOptions::build(load.loaded.dataset.iter(), &Selection::All),
        cache_hit: load.cache_hit,
        info,
    };
    Ok(Json(summary).into_response())
}

pub(crate) async fn clear_dataset(State(dashboard): State<Arc<DashboardState>>) -> StatusCode {
    dashboard.session().clear();
    StatusCode::NO_CONTENT
}

pub(crate) async fn filter_options(
    State(dashboard): State<Arc<DashboardState>>,
    Query(query): Query<FiltersQuery>,
) -> Json<FilterOptions> {
    let loaded = dashboard.session().current().cloned();
    let options = match loaded {
        Some(loaded) => FilterOptions::build(loaded.dataset.iter(), &query.department),
        None => FilterOptions::build(std::iter::empty(), &query.department),
    };
    Json(options)
}

pub(crate) async fn dashboard_endpoint(
    State(dashboard): State<Arc<DashboardState>>,
    Query(criteria): Query<FilterCriteria>,
) -> Json<DashboardResponse> {
    let Some(loaded) = dashboard.session().current().cloned() else {
        return Json(DashboardResponse::AwaitingUpload {
            message: AWAITING_UPLOAD_MESSAGE,
        });
    };

    let view = dashboard.report.build(&loaded.dataset, &criteria);
    Json(DashboardResponse::Ready(Box::new(ReadyDashboard {
        dataset: loaded.info(),
        view,
    })))
}
