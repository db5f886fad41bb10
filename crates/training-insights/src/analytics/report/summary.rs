use super::super::domain::{
    AttemptOutcome, FacilityVisit, ModuleSpec, TrainingRecord, TrainingStatus, PASS_THRESHOLD,
};
use super::views::{
    AttemptBreakdownEntry, AttemptBreakdownView, AttemptSeries, ChartSpec, CohortMonth,
    CohortTrendView, DetailRow, DurationHistogramView, FacilityVisitCount, FacilityVisitView,
    HeadlineMetrics, HistogramBin, ModuleScoreEntry, ModuleScoresView, RankedEntry, RankingsView,
    ReferenceMarker, StatusBreakdownView, StatusSlice, TrendSeries,
};
use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const RANKING_SIZE: usize = 5;
pub const HISTOGRAM_BINS: usize = 20;

fn percentage(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn count_with_share(count: usize, share: Option<f64>) -> String {
    match share {
        Some(pct) => format!("{count} ({pct:.1}%)"),
        None => "0".to_string(),
    }
}

pub fn headline_metrics(records: &[&TrainingRecord]) -> HeadlineMetrics {
    let total = records.len();
    let completed = records.iter().filter(|record| record.is_completed()).count();
    let completed_pct = percentage(completed, total);

    let scores: Vec<f64> = records
        .iter()
        .filter_map(|record| record.average_score)
        .collect();
    let average_score = mean(&scores);

    HeadlineMetrics {
        total,
        completed,
        completed_pct,
        completed_display: count_with_share(completed, completed_pct),
        average_score,
        average_score_display: average_score
            .map(|score| format!("{score:.1}"))
            .unwrap_or_else(|| "N/A".to_string()),
    }
}

/// Counts per status, largest first; records without a status only count
/// toward the denominator.
pub fn status_breakdown(records: &[&TrainingRecord]) -> StatusBreakdownView {
    let total = records.len();
    let mut counts: Vec<(TrainingStatus, usize)> = Vec::new();

    for status in records.iter().filter_map(|record| record.status.as_ref()) {
        match counts.iter_mut().find(|(seen, _)| seen == status) {
            Some((_, count)) => *count += 1,
            None => counts.push((status.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let slices = counts
        .into_iter()
        .map(|(status, count)| StatusSlice {
            color: status.color(),
            percentage: percentage(count, total).unwrap_or(0.0),
            status,
            count,
        })
        .collect();

    StatusBreakdownView {
        chart: ChartSpec::Donut {
            hole: 0.4,
            text_info: "percent+label",
            show_legend: false,
        },
        total,
        slices,
    }
}

/// Mean effective score and pass rate per module. `None` when no module has
/// a single effective score.
pub fn module_scores(
    records: &[&TrainingRecord],
    modules: &[(usize, &ModuleSpec)],
) -> Option<ModuleScoresView> {
    let entries: Vec<ModuleScoreEntry> = modules
        .iter()
        .filter_map(|(slot, spec)| {
            let scores: Vec<f64> = records
                .iter()
                .filter_map(|record| record.module(*slot))
                .filter_map(|attempts| attempts.effective_score())
                .collect();
            let mean_score = mean(&scores)?;
            let passed = scores.iter().filter(|score| **score >= PASS_THRESHOLD).count();

            Some(ModuleScoreEntry {
                module: spec.name.clone(),
                mean_score,
                pass_rate_pct: percentage(passed, scores.len()).unwrap_or(0.0),
                scored: scores.len(),
            })
        })
        .collect();

    if entries.is_empty() {
        return None;
    }

    Some(ModuleScoresView {
        chart: ChartSpec::Bar {
            y_range: Some([0.0, 100.0]),
            color_scale: Some("Viridis"),
            text_template: Some("%{text:.1f}"),
            bar_mode: None,
        },
        modules: entries,
    })
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Monthly cohorts keyed by training start, oldest first.
pub fn cohort_trend(records: &[&TrainingRecord]) -> CohortTrendView {
    let mut cohorts: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

    for record in records {
        let Some(start) = record.training_start else {
            continue;
        };
        let entry = cohorts.entry(month_start(start)).or_default();
        entry.0 += 1;
        if record.is_completed() {
            entry.1 += 1;
        }
    }

    let months = cohorts
        .into_iter()
        .map(|(month, (started, completed))| CohortMonth {
            month,
            label: month.format("%Y-%m").to_string(),
            started,
            completed,
            completion_pct: percentage(completed, started).unwrap_or(0.0),
        })
        .collect();

    CohortTrendView {
        chart: ChartSpec::DualAxisLine {
            primary_axis_title: "Количество сотрудников",
            secondary_axis_title: "Процент завершения (%)",
            hover_mode: "x unified",
        },
        series: vec![
            TrendSeries {
                key: "started",
                label: "Начали обучение",
                color: "#3498db",
                secondary_axis: false,
            },
            TrendSeries {
                key: "completed",
                label: "Завершили обучение",
                color: "#2ecc71",
                secondary_axis: false,
            },
            TrendSeries {
                key: "completion_pct",
                label: "Процент завершения",
                color: "#f39c12",
                secondary_axis: true,
            },
        ],
        months,
    }
}

/// Facility-visit figures for `department`, drawn from the full dataset
/// regardless of the active filters. `None` when the department has no rows.
pub fn facility_visits<'a, I>(records: I, department: &str) -> Option<FacilityVisitView>
where
    I: IntoIterator<Item = &'a TrainingRecord>,
{
    let visits: Vec<&FacilityVisit> = records
        .into_iter()
        .filter(|record| record.department == department)
        .map(|record| &record.facility_visit)
        .collect();

    if visits.is_empty() {
        return None;
    }

    let mut breakdown: Vec<FacilityVisitCount> = [
        FacilityVisit::Passed,
        FacilityVisit::Scheduled,
        FacilityVisit::NotApplicable,
    ]
    .into_iter()
    .map(|status| FacilityVisitCount {
        count: visits.iter().filter(|visit| ***visit == status).count(),
        color: status.color(),
        status,
    })
    .collect();

    for visit in &visits {
        if let FacilityVisit::Other(_) = visit {
            match breakdown.iter_mut().find(|entry| &entry.status == *visit) {
                Some(entry) => entry.count += 1,
                None => breakdown.push(FacilityVisitCount {
                    status: (*visit).clone(),
                    count: 1,
                    color: None,
                }),
            }
        }
    }

    let total_assigned = visits.iter().filter(|visit| visit.is_assigned()).count();
    let completed = visits
        .iter()
        .filter(|visit| ***visit == FacilityVisit::Passed)
        .count();
    let scheduled = visits
        .iter()
        .filter(|visit| ***visit == FacilityVisit::Scheduled)
        .count();
    let completed_pct = percentage(completed, total_assigned);

    Some(FacilityVisitView {
        department: department.to_string(),
        chart: ChartSpec::Bar {
            y_range: None,
            color_scale: None,
            text_template: None,
            bar_mode: None,
        },
        breakdown,
        total_assigned,
        completed,
        completed_pct,
        completed_display: count_with_share(completed, completed_pct),
        scheduled,
    })
}

/// Orders by score with missing scores last in either direction; the sort
/// is stable so ties keep sheet order.
fn sorted_by_score<'a>(records: &[&'a TrainingRecord], descending: bool) -> Vec<&'a TrainingRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| match (a.average_score, b.average_score) {
        (Some(left), Some(right)) => {
            if descending {
                right.total_cmp(&left)
            } else {
                left.total_cmp(&right)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted
}

fn ranked(record: &TrainingRecord) -> RankedEntry {
    RankedEntry {
        full_name: record.full_name.clone(),
        team: record.team.clone(),
        average_score: record.average_score,
    }
}

pub fn rankings(records: &[&TrainingRecord]) -> RankingsView {
    let top = sorted_by_score(records, true)
        .into_iter()
        .take(RANKING_SIZE)
        .map(ranked)
        .collect();
    let bottom = sorted_by_score(records, false)
        .into_iter()
        .take(RANKING_SIZE)
        .map(ranked)
        .collect();

    RankingsView { top, bottom }
}

/// First-attempt, second-attempt, and failed counts per attempted module.
pub fn attempt_breakdown(
    records: &[&TrainingRecord],
    modules: &[(usize, &ModuleSpec)],
) -> Option<AttemptBreakdownView> {
    let entries: Vec<AttemptBreakdownEntry> = modules
        .iter()
        .filter_map(|(slot, spec)| {
            let mut entry = AttemptBreakdownEntry {
                module: spec.name.clone(),
                passed_first: 0,
                passed_second: 0,
                failed: 0,
                attempted: 0,
            };

            for outcome in records
                .iter()
                .filter_map(|record| record.module(*slot))
                .filter_map(|attempts| attempts.outcome())
            {
                entry.attempted += 1;
                match outcome {
                    AttemptOutcome::PassedFirst => entry.passed_first += 1,
                    AttemptOutcome::PassedSecond => entry.passed_second += 1,
                    AttemptOutcome::Failed => entry.failed += 1,
                }
            }

            (entry.attempted > 0).then_some(entry)
        })
        .collect();

    if entries.is_empty() {
        return None;
    }

    Some(AttemptBreakdownView {
        chart: ChartSpec::Bar {
            y_range: None,
            color_scale: None,
            text_template: None,
            bar_mode: Some("stack"),
        },
        series: AttemptOutcome::ordered()
            .into_iter()
            .map(|outcome| AttemptSeries {
                outcome,
                label: outcome.label(),
                color: outcome.color(),
            })
            .collect(),
        modules: entries,
    })
}

/// Equal-width buckets over [min, max]; the last bucket is closed on the right.
fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };

    let upper = if max > min { max } else { min + 1.0 };
    let width = (upper - min) / bins as f64;
    let mut counts = vec![0usize; bins];

    for value in values {
        let index = ((value - min) / width).floor() as usize;
        counts[index.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| HistogramBin {
            start: min + width * index as f64,
            end: min + width * (index + 1) as f64,
            count,
        })
        .collect()
}

/// Distribution of known training durations; `None` when none are known.
pub fn duration_histogram(records: &[&TrainingRecord]) -> Option<DurationHistogramView> {
    let durations: Vec<f64> = records
        .iter()
        .filter_map(|record| record.duration_days)
        .map(|days| days as f64)
        .collect();
    let mean_days = mean(&durations)?;

    Some(DurationHistogramView {
        chart: ChartSpec::Histogram {
            bins: HISTOGRAM_BINS,
            color: "#3498db",
        },
        samples: durations.len(),
        mean_days,
        marker: ReferenceMarker {
            value: mean_days,
            label: format!("Среднее: {mean_days:.1} дней"),
            color: "red",
            dash: "dash",
            position: "top",
        },
        bins: histogram(&durations, HISTOGRAM_BINS),
    })
}

pub fn detail_rows(records: &[&TrainingRecord]) -> Vec<DetailRow> {
    sorted_by_score(records, true)
        .into_iter()
        .map(|record| DetailRow {
            full_name: record.full_name.clone(),
            department: record.department.clone(),
            team: record.team.clone(),
            training_start: record.training_start,
            training_end: record.training_end,
            duration_days: record.duration_days,
            average_score: record.average_score,
            status: record.status.clone(),
        })
        .collect()
}
