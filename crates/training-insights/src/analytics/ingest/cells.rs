use super::workbook::Cell;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

const MISSING_SENTINEL: &str = "-";
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M:%S"];

pub(crate) static EMPTY: Cell = Cell::Empty;

/// Maps the dash placeholder and blank text to `Cell::Empty`.
pub(crate) fn normalize_missing(cell: &Cell) -> &Cell {
    match cell {
        Cell::Text(value) if value.trim().is_empty() || value.trim() == MISSING_SENTINEL => {
            &EMPTY
        }
        other => other,
    }
}

pub(crate) fn text(cell: &Cell) -> Option<String> {
    match normalize_missing(cell) {
        Cell::Empty => None,
        Cell::Text(value) => Some(value.trim().to_string()),
        Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            Some(format!("{}", *value as i64))
        }
        Cell::Number(value) => Some(value.to_string()),
        Cell::Date(value) => Some(value.date().to_string()),
        Cell::Bool(value) => Some(value.to_string()),
    }
}

pub(crate) fn number(cell: &Cell) -> Option<f64> {
    match normalize_missing(cell) {
        Cell::Number(value) if value.is_finite() => Some(*value),
        Cell::Text(value) => value
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite()),
        _ => None,
    }
}

pub(crate) fn date(cell: &Cell) -> Option<NaiveDate> {
    match normalize_missing(cell) {
        Cell::Date(value) => Some(value.date()),
        Cell::Number(serial) => excel_serial_date(*serial),
        Cell::Text(value) => parse_date_text(value),
        _ => None,
    }
}

/// Excel serial day numbers count from 1899-12-30.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(datetime.naive_utc().date());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|datetime| datetime.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        })
}
