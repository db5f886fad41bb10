use clap::Args;
use serde_json::json;
use std::fmt;
use std::path::{Path, PathBuf};
use training_insights::analytics::filter::Selection;
use training_insights::analytics::report::views::{DashboardView, RankedEntry};
use training_insights::analytics::{
    DashboardReport, DatasetInfo, FilterCriteria, SessionCache, TrainingImporter, UploadFormat,
};
use training_insights::config::AppConfig;
use training_insights::error::AppError;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Training results workbook (xlsx/xls/ods) or CSV export
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Treat the file as CSV regardless of its extension
    #[arg(long)]
    pub(crate) csv: bool,
    /// Override the configured sheet name
    #[arg(long)]
    pub(crate) sheet: Option<String>,
    /// Restrict to one department ("All" for every department)
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Restrict to one team within the selected department
    #[arg(long)]
    pub(crate) team: Option<String>,
    /// Restrict to one training status token
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Print the dashboard as pretty JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

impl ReportArgs {
    fn upload_format(&self) -> UploadFormat {
        let csv_extension = self
            .file
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));

        if self.csv || csv_extension {
            UploadFormat::Csv
        } else {
            UploadFormat::Spreadsheet
        }
    }

    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            department: Selection::parse(self.department.as_deref()),
            team: Selection::parse(self.team.as_deref()),
            status: Selection::parse(self.status.as_deref()),
        }
    }
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let sheet_name = args
        .sheet
        .clone()
        .unwrap_or_else(|| config.dashboard.sheet_name.clone());
    let importer = TrainingImporter::new(sheet_name);
    let report = DashboardReport::new(config.dashboard.facility_department.clone());

    let bytes = read_upload(&args.file)?;
    let format = args.upload_format();
    let mut session = SessionCache::new();
    let load = session.load_with(&bytes, |bytes| importer.load_bytes(bytes, format))?;

    let info = load.loaded.info();
    let view = report.build(&load.loaded.dataset, &args.criteria());

    if args.json {
        let payload = json!({ "dataset": info, "dashboard": view });
        let rendered = serde_json::to_string_pretty(&payload).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{}", DashboardText::new(&info, &view));
    }

    Ok(())
}

fn read_upload(path: &Path) -> Result<Vec<u8>, AppError> {
    Ok(std::fs::read(path)?)
}

/// Plain-text rendering of a dashboard for terminals.
pub(crate) struct DashboardText<'a> {
    info: &'a DatasetInfo,
    view: &'a DashboardView,
}

impl<'a> DashboardText<'a> {
    pub(crate) fn new(info: &'a DatasetInfo, view: &'a DashboardView) -> Self {
        Self { info, view }
    }
}

fn score_or_dash(score: Option<f64>) -> String {
    score
        .map(|score| format!("{score:.1}"))
        .unwrap_or_else(|| "-".to_string())
}

fn write_ranking(f: &mut fmt::Formatter<'_>, entries: &[RankedEntry]) -> fmt::Result {
    for (position, entry) in entries.iter().enumerate() {
        writeln!(
            f,
            "  {}. {} | {} | {}",
            position + 1,
            entry.full_name,
            entry.team.as_deref().unwrap_or("-"),
            score_or_dash(entry.average_score)
        )?;
    }
    Ok(())
}

impl fmt::Display for DashboardText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;

        writeln!(f, "Аналитика обучения сотрудников")?;
        writeln!(
            f,
            "Загружено: {} записей ({} строк пропущено), {}",
            self.info.total_records,
            self.info.skipped_rows,
            self.info.loaded_at.format("%Y-%m-%d %H:%M")
        )?;
        writeln!(
            f,
            "Фильтры: подразделение={}, отдел={}, статус={}",
            view.criteria.department.as_value().unwrap_or("All"),
            view.criteria.effective_team().as_value().unwrap_or("All"),
            view.criteria.status.as_value().unwrap_or("All")
        )?;

        writeln!(f, "\nВсего сотрудников: {}", view.metrics.total)?;
        writeln!(f, "Завершили обучение: {}", view.metrics.completed_display)?;
        writeln!(f, "Средний балл: {}", view.metrics.average_score_display)?;

        writeln!(f, "\nСтатусы прохождения обучения")?;
        if view.status_breakdown.slices.is_empty() {
            writeln!(f, "- нет данных")?;
        }
        for slice in &view.status_breakdown.slices {
            writeln!(
                f,
                "- {}: {} ({:.1}%)",
                slice.status, slice.count, slice.percentage
            )?;
        }

        if let Some(scores) = &view.module_scores {
            writeln!(f, "\nРезультаты по модулям обучения")?;
            for entry in &scores.modules {
                writeln!(
                    f,
                    "- {}: средний балл {:.1}, сдали {:.1}% ({} оценок)",
                    entry.module, entry.mean_score, entry.pass_rate_pct, entry.scored
                )?;
            }
        }

        if !view.cohort_trend.months.is_empty() {
            writeln!(f, "\nДинамика обучения")?;
            for month in &view.cohort_trend.months {
                writeln!(
                    f,
                    "- {}: начали {}, завершили {} ({:.1}%)",
                    month.label, month.started, month.completed, month.completion_pct
                )?;
            }
        }

        if let Some(visits) = &view.facility_visits {
            writeln!(f, "\nПосещение МПП ({})", visits.department)?;
            for entry in &visits.breakdown {
                writeln!(f, "- {}: {}", entry.status.token(), entry.count)?;
            }
            writeln!(f, "Всего назначено: {}", visits.total_assigned)?;
            writeln!(f, "Завершили: {}", visits.completed_display)?;
            writeln!(f, "Запланировано: {}", visits.scheduled)?;
        }

        writeln!(f, "\nТоп-5 результатов")?;
        write_ranking(f, &view.rankings.top)?;
        writeln!(f, "Худшие 5 результатов")?;
        write_ranking(f, &view.rankings.bottom)?;

        if let Some(attempts) = &view.attempts {
            writeln!(f, "\nАнализ попыток прохождения тестов")?;
            for entry in &attempts.modules {
                writeln!(
                    f,
                    "- {}: с первой {}, со второй {}, не сдали {}",
                    entry.module, entry.passed_first, entry.passed_second, entry.failed
                )?;
            }
        }

        if let Some(duration) = &view.duration {
            writeln!(f, "\nДлительность обучения")?;
            writeln!(f, "{} ({} сотрудников)", duration.marker.label, duration.samples)?;
            for bin in duration.bins.iter().filter(|bin| bin.count > 0) {
                writeln!(f, "- {:.1}..{:.1}: {}", bin.start, bin.end, bin.count)?;
            }
        }

        writeln!(f, "\nДетализированные данные")?;
        for row in &view.details {
            writeln!(
                f,
                "- {} | {} | {} | {} | {} | {}",
                row.full_name,
                row.department,
                row.team.as_deref().unwrap_or("-"),
                row.duration_days
                    .map(|days| format!("{days} дн."))
                    .unwrap_or_else(|| "-".to_string()),
                score_or_dash(row.average_score),
                row.status
                    .as_ref()
                    .map(|status| status.token())
                    .unwrap_or("-")
            )?;
        }

        Ok(())
    }
}
