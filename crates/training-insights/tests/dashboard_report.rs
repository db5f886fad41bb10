use chrono::NaiveDate;
use training_insights::analytics::domain::{FacilityVisit, TrainingDataset};
use training_insights::analytics::ingest::columns::REQUIRED_COLUMNS;
use training_insights::analytics::ingest::{Cell, RawSheet, RawWorkbook};
use training_insights::analytics::report::{self, views::ChartSpec};
use training_insights::analytics::{
    DashboardReport, FilterCriteria, ModuleCatalog, TrainingImporter, TrainingStatus,
};

const SHEET: &str = "РЕЗУЛЬТАТЫ ПЕРВИЧНОГО ОБУЧЕНИЯ";
const FACILITY: &str = "Коммерческий департамент";

struct Row<'a> {
    name: &'a str,
    department: &'a str,
    team: &'a str,
    start: &'a str,
    end: &'a str,
    score: &'a str,
    status: &'a str,
    visit: &'a str,
    module_x: (&'a str, &'a str),
}

impl<'a> Row<'a> {
    fn new(name: &'a str, department: &'a str) -> Self {
        Self {
            name,
            department,
            team: "",
            start: "",
            end: "",
            score: "",
            status: "",
            visit: "-",
            module_x: ("", ""),
        }
    }

    fn cells(&self) -> Vec<Cell> {
        [
            self.name,
            self.department,
            self.team,
            "",
            self.start,
            self.end,
            self.score,
            self.status,
            self.visit,
            self.module_x.0,
            self.module_x.1,
        ]
        .into_iter()
        .map(|value| {
            if value.is_empty() {
                Cell::Empty
            } else {
                Cell::text(value)
            }
        })
        .collect()
    }
}

fn load(rows: &[Row<'_>]) -> TrainingDataset {
    let headers = REQUIRED_COLUMNS
        .iter()
        .map(|column| column.to_string())
        .chain([
            "X попытка 1 результат".to_string(),
            "X попытка 2 результат".to_string(),
        ])
        .collect();
    let workbook = RawWorkbook::new(vec![RawSheet::new(
        SHEET,
        headers,
        rows.iter().map(Row::cells).collect(),
    )]);

    TrainingImporter::new(SHEET)
        .with_catalog(ModuleCatalog::from_names(["X"]))
        .load_workbook(&workbook)
        .expect("workbook normalizes")
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[test]
fn status_breakdown_reports_shares_of_filtered_total() {
    let dataset = load(&[
        Row {
            status: "завершено",
            ..Row::new("А", "Склад")
        },
        Row {
            status: "завершено",
            ..Row::new("Б", "Склад")
        },
        Row {
            status: "в процессе",
            ..Row::new("В", "Склад")
        },
    ]);

    let view = DashboardReport::new(FACILITY).build(&dataset, &FilterCriteria::all());
    let slices = &view.status_breakdown.slices;

    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].status, TrainingStatus::Completed);
    assert_eq!(slices[0].count, 2);
    assert_eq!(round1(slices[0].percentage), 66.7);
    assert_eq!(slices[0].color, Some("#2ecc71"));
    assert_eq!(slices[1].status, TrainingStatus::InProgress);
    assert_eq!(round1(slices[1].percentage), 33.3);
    assert_eq!(slices[1].color, Some("#f39c12"));
    assert!(matches!(
        view.status_breakdown.chart,
        ChartSpec::Donut { show_legend: false, .. }
    ));
    assert_eq!(view.metrics.completed_display, "2 (66.7%)");
}

#[test]
fn module_scores_use_effective_attempts() {
    let dataset = load(&[
        Row {
            module_x: ("90", ""),
            ..Row::new("А", "Склад")
        },
        Row {
            module_x: ("70", "95"),
            ..Row::new("Б", "Склад")
        },
        Row::new("В", "Склад"),
    ]);

    let view = DashboardReport::new(FACILITY).build(&dataset, &FilterCriteria::all());
    let scores = view.module_scores.expect("module X scored");

    assert_eq!(scores.modules.len(), 1);
    assert_eq!(scores.modules[0].module, "X");
    assert_eq!(scores.modules[0].mean_score, 92.5);
    assert_eq!(scores.modules[0].pass_rate_pct, 100.0);
    assert_eq!(scores.modules[0].scored, 2);
}

#[test]
fn attempt_outcomes_sum_to_first_attempts() {
    let dataset = load(&[
        Row {
            module_x: ("90", ""),
            ..Row::new("А", "Склад")
        },
        Row {
            module_x: ("70", "95"),
            ..Row::new("Б", "Склад")
        },
        Row {
            module_x: ("70", "80"),
            ..Row::new("В", "Склад")
        },
        Row {
            module_x: ("40", ""),
            ..Row::new("Г", "Склад")
        },
        Row {
            module_x: ("", "99"),
            ..Row::new("Д", "Склад")
        },
    ]);

    let view = DashboardReport::new(FACILITY).build(&dataset, &FilterCriteria::all());
    let attempts = view.attempts.expect("module X attempted");
    let entry = &attempts.modules[0];

    assert_eq!(entry.passed_first, 1);
    assert_eq!(entry.passed_second, 1);
    assert_eq!(entry.failed, 2);
    assert_eq!(entry.attempted, 4);
    assert_eq!(
        entry.passed_first + entry.passed_second + entry.failed,
        entry.attempted
    );
    assert_eq!(attempts.series.len(), 3);
    assert_eq!(attempts.series[2].color, "#e74c3c");
}

#[test]
fn empty_filter_result_renders_placeholders() {
    let dataset = load(&[Row {
        score: "88",
        status: "завершено",
        start: "2024-01-10",
        end: "2024-01-20",
        module_x: ("90", ""),
        ..Row::new("А", "Склад")
    }]);

    let criteria = FilterCriteria::all().department("Нет такого");
    let view = DashboardReport::new(FACILITY).build(&dataset, &criteria);

    assert_eq!(view.metrics.total, 0);
    assert_eq!(view.metrics.completed_display, "0");
    assert_eq!(view.metrics.average_score_display, "N/A");
    assert!(view.status_breakdown.slices.is_empty());
    assert!(view.module_scores.is_none());
    assert!(view.attempts.is_none());
    assert!(view.duration.is_none());
    assert!(view.cohort_trend.months.is_empty());
    assert!(view.rankings.top.is_empty());
    assert!(view.details.is_empty());
}

#[test]
fn cohort_trend_groups_by_start_month() {
    let dataset = load(&[
        Row {
            start: "2024-03-02",
            status: "завершено",
            ..Row::new("А", "Склад")
        },
        Row {
            start: "2024-03-28",
            status: "в процессе",
            ..Row::new("Б", "Склад")
        },
        Row {
            start: "2024-01-15",
            ..Row::new("В", "Склад")
        },
        Row::new("Г", "Склад"),
    ]);

    let trend = DashboardReport::new(FACILITY)
        .build(&dataset, &FilterCriteria::all())
        .cohort_trend;

    assert_eq!(trend.months.len(), 2);
    assert_eq!(trend.months[0].month, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(trend.months[0].completion_pct, 0.0);
    let march = &trend.months[1];
    assert_eq!(march.started, 2);
    assert_eq!(march.completed, 1);
    assert_eq!(march.completion_pct, 50.0);
    assert!(trend.series.iter().any(|series| series.secondary_axis));
}

#[test]
fn rankings_keep_missing_scores_out_when_enough_are_scored() {
    let names = ["А", "Б", "В", "Г", "Д", "Е", "Ж"];
    let scores = ["70", "", "95", "88", "", "60", "95"];
    let rows: Vec<Row<'_>> = names
        .iter()
        .zip(scores)
        .map(|(name, score)| Row {
            score,
            ..Row::new(name, "Склад")
        })
        .collect();
    let dataset = load(&rows);

    let rankings = DashboardReport::new(FACILITY)
        .build(&dataset, &FilterCriteria::all())
        .rankings;

    let top: Vec<&str> = rankings.top.iter().map(|entry| entry.full_name.as_str()).collect();
    let bottom: Vec<&str> = rankings
        .bottom
        .iter()
        .map(|entry| entry.full_name.as_str())
        .collect();
    assert_eq!(top, vec!["В", "Ж", "Г", "А", "Е"]);
    assert_eq!(bottom, vec!["Е", "А", "Г", "В", "Ж"]);
    assert!(rankings.top.iter().all(|entry| entry.average_score.is_some()));
}

#[test]
fn rankings_fall_back_to_unscored_records() {
    let dataset = load(&[
        Row {
            score: "75",
            ..Row::new("А", "Склад")
        },
        Row::new("Б", "Склад"),
    ]);

    let rankings = DashboardReport::new(FACILITY)
        .build(&dataset, &FilterCriteria::all())
        .rankings;

    assert_eq!(rankings.top.len(), 2);
    assert_eq!(rankings.top[0].full_name, "А");
    assert_eq!(rankings.bottom[0].full_name, "А");
    assert_eq!(rankings.bottom[1].average_score, None);
}

#[test]
fn facility_visits_ignore_active_filters_but_respect_department_choice() {
    let dataset = load(&[
        Row {
            visit: "пройдено",
            status: "завершено",
            ..Row::new("А", FACILITY)
        },
        Row {
            visit: "запланировано",
            ..Row::new("Б", FACILITY)
        },
        Row {
            visit: "-",
            ..Row::new("В", FACILITY)
        },
        Row {
            visit: "пройдено",
            ..Row::new("Г", "Склад")
        },
    ]);
    let report = DashboardReport::new(FACILITY);

    let filtered = FilterCriteria::all().status("завершено");
    let view = report.build(&dataset, &filtered);
    let visits = view.facility_visits.expect("shown for All");

    assert_eq!(view.metrics.total, 1);
    assert_eq!(visits.total_assigned, 2);
    assert_eq!(visits.completed, 1);
    assert_eq!(visits.completed_display, "1 (50.0%)");
    assert_eq!(visits.scheduled, 1);
    let not_applicable = visits
        .breakdown
        .iter()
        .find(|entry| entry.status == FacilityVisit::NotApplicable)
        .expect("category listed");
    assert_eq!(not_applicable.count, 1);
    assert_eq!(not_applicable.color, Some("#95a5a6"));

    let own_department = FilterCriteria::all().department(FACILITY);
    assert!(report.build(&dataset, &own_department).facility_visits.is_some());

    let other_department = FilterCriteria::all().department("Склад");
    assert!(report.build(&dataset, &other_department).facility_visits.is_none());
}

#[test]
fn duration_histogram_and_detail_table() {
    let dataset = load(&[
        Row {
            start: "2024-01-01",
            end: "2024-01-11",
            score: "80",
            ..Row::new("А", "Склад")
        },
        Row {
            start: "2024-01-01",
            end: "2024-01-31",
            score: "95",
            ..Row::new("Б", "Склад")
        },
        Row {
            start: "2024-02-10",
            end: "2024-02-01",
            ..Row::new("В", "Склад")
        },
    ]);

    let view = DashboardReport::new(FACILITY).build(&dataset, &FilterCriteria::all());
    let duration = view.duration.expect("durations known");

    assert_eq!(duration.samples, 2);
    assert_eq!(duration.mean_days, 20.0);
    assert_eq!(duration.bins.len(), report::HISTOGRAM_BINS);
    assert_eq!(duration.bins.iter().map(|bin| bin.count).sum::<usize>(), 2);
    assert_eq!(duration.marker.label, "Среднее: 20.0 дней");

    let names: Vec<&str> = view
        .details
        .iter()
        .map(|row| row.full_name.as_str())
        .collect();
    assert_eq!(names, vec!["Б", "А", "В"]);
    assert_eq!(view.details[2].duration_days, None);
}

#[test]
fn filter_options_follow_department_selection() {
    let dataset = load(&[
        Row {
            team: "Север",
            ..Row::new("А", "Продажи")
        },
        Row {
            team: "Юг",
            ..Row::new("Б", "Продажи")
        },
        Row {
            team: "Цех 1",
            ..Row::new("В", "Производство")
        },
    ]);

    let report = DashboardReport::new(FACILITY);
    assert!(report
        .build(&dataset, &FilterCriteria::all())
        .filters
        .teams
        .is_none());

    let view = report.build(&dataset, &FilterCriteria::all().department("Продажи").team("Юг"));
    assert_eq!(
        view.filters.teams,
        Some(vec!["All".to_string(), "Север".to_string(), "Юг".to_string()])
    );
    assert_eq!(view.metrics.total, 1);
}
