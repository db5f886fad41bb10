use crate::analytics::domain::ModuleCatalog;
use std::collections::HashMap;
use tracing::debug;

pub const FULL_NAME: &str = "ФИО";
pub const DEPARTMENT: &str = "подразделение";
pub const TEAM: &str = "отдел";
pub const EMPLOYMENT_DATE: &str = "дата трудоустройства";
pub const TRAINING_START: &str = "дата начала обучения";
pub const TRAINING_END: &str = "дата окончания обучения";
pub const AVERAGE_SCORE: &str = "Среднее значение";
pub const STATUS: &str = "статус прохождения обучения";
pub const FACILITY_VISIT: &str = "Посещение МПП";

pub const REQUIRED_COLUMNS: [&str; 9] = [
    FULL_NAME,
    DEPARTMENT,
    TEAM,
    EMPLOYMENT_DATE,
    TRAINING_START,
    TRAINING_END,
    AVERAGE_SCORE,
    STATUS,
    FACILITY_VISIT,
];

/// Cell positions of one module's attempt columns.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ModuleColumns {
    pub(crate) catalog_index: usize,
    pub(crate) first: usize,
    pub(crate) second: Option<usize>,
}

/// Resolved positions of every column the normalizer reads.
#[derive(Debug, Clone)]
pub(crate) struct ColumnLayout {
    pub(crate) full_name: usize,
    pub(crate) department: usize,
    pub(crate) team: usize,
    pub(crate) employment_date: usize,
    pub(crate) training_start: usize,
    pub(crate) training_end: usize,
    pub(crate) average_score: usize,
    pub(crate) status: usize,
    pub(crate) facility_visit: usize,
    pub(crate) modules: Vec<ModuleColumns>,
}

impl ColumnLayout {
    /// Returns the missing required headers when the layout cannot be built.
    pub(crate) fn resolve(
        headers: &[String],
        catalog: &ModuleCatalog,
    ) -> Result<Self, Vec<String>> {
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            positions.entry(header.as_str()).or_insert(index);
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !positions.contains_key(*column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let lookup = |column: &str| positions[column];

        let mut modules = Vec::with_capacity(catalog.len());
        for (catalog_index, spec) in catalog.modules().iter().enumerate() {
            match positions.get(spec.first_attempt_column.as_str()) {
                Some(&first) => modules.push(ModuleColumns {
                    catalog_index,
                    first,
                    second: positions.get(spec.second_attempt_column.as_str()).copied(),
                }),
                None => debug!(module = %spec.name, "module columns absent; module skipped"),
            }
        }

        Ok(Self {
            full_name: lookup(FULL_NAME),
            department: lookup(DEPARTMENT),
            team: lookup(TEAM),
            employment_date: lookup(EMPLOYMENT_DATE),
            training_start: lookup(TRAINING_START),
            training_end: lookup(TRAINING_END),
            average_score: lookup(AVERAGE_SCORE),
            status: lookup(STATUS),
            facility_visit: lookup(FACILITY_VISIT),
            modules,
        })
    }
}
