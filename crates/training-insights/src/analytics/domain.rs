use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

/// Minimum module score that counts as a pass.
pub const PASS_THRESHOLD: f64 = 85.0;

const STANDARD_MODULES: [&str; 9] = [
    "ЦИКЛ ОБРАБОТКИ МП НА МПП",
    "ХАРАКТЕРИСТИКА МЯСНОЙ ПРОДУКЦИИ",
    "ПОЛУТУШИ",
    "ИНДУСТРИАЛЬНЫЙ УПАКОВКА",
    "ПОТРЕБИТЕЛЬСКАЯ УПАКОВКА",
    "ДЮРОК",
    "ТРИММИНГ",
    "СУБПРОДУКТЫ",
    "Итоговое тестирование.",
];

/// Progress of an employee through the training programme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrainingStatus {
    NotStarted,
    InProgress,
    Completed,
    /// A token outside the known set, kept verbatim.
    Other(String),
}

impl TrainingStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let status = match trimmed.to_lowercase().as_str() {
            "не начато" => Self::NotStarted,
            "в процессе" => Self::InProgress,
            "завершено" => Self::Completed,
            _ => Self::Other(trimmed.to_string()),
        };
        Some(status)
    }

    /// The spreadsheet token for this status.
    pub fn token(&self) -> &str {
        match self {
            Self::NotStarted => "не начато",
            Self::InProgress => "в процессе",
            Self::Completed => "завершено",
            Self::Other(token) => token,
        }
    }

    pub fn color(&self) -> Option<&'static str> {
        match self {
            Self::Completed => Some("#2ecc71"),
            Self::InProgress => Some("#f39c12"),
            Self::NotStarted => Some("#e74c3c"),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for TrainingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

/// Status of the on-site facility visit tracked for one department.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FacilityVisit {
    Passed,
    Scheduled,
    NotApplicable,
    Other(String),
}

impl FacilityVisit {
    /// Missing cells mean the visit was never assigned.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(trimmed) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::NotApplicable;
        };

        match trimmed.to_lowercase().as_str() {
            "пройдено" => Self::Passed,
            "запланировано" => Self::Scheduled,
            "-" => Self::NotApplicable,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::Passed => "пройдено",
            Self::Scheduled => "запланировано",
            Self::NotApplicable => "-",
            Self::Other(token) => token,
        }
    }

    pub fn color(&self) -> Option<&'static str> {
        match self {
            Self::Passed => Some("#2ecc71"),
            Self::Scheduled => Some("#f39c12"),
            Self::NotApplicable => Some("#95a5a6"),
            Self::Other(_) => None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

impl Serialize for FacilityVisit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

/// One module's two test attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModuleAttempts {
    pub first: Option<f64>,
    pub second: Option<f64>,
}

/// How a module attempt history resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    PassedFirst,
    PassedSecond,
    Failed,
}

impl AttemptOutcome {
    pub const fn ordered() -> [Self; 3] {
        [Self::PassedFirst, Self::PassedSecond, Self::Failed]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PassedFirst => "Прошли с 1 попытки",
            Self::PassedSecond => "Прошли со 2 попытки",
            Self::Failed => "Не прошли",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::PassedFirst => "#2ecc71",
            Self::PassedSecond => "#f39c12",
            Self::Failed => "#e74c3c",
        }
    }
}

impl ModuleAttempts {
    pub fn new(first: Option<f64>, second: Option<f64>) -> Self {
        Self { first, second }
    }

    /// Score used for module statistics: a passing first attempt wins, otherwise
    /// the retake. Nothing counts without a first attempt.
    pub fn effective_score(&self) -> Option<f64> {
        let first = self.first?;
        if first >= PASS_THRESHOLD {
            Some(first)
        } else {
            self.second
        }
    }

    /// `None` when the module was never attempted.
    pub fn outcome(&self) -> Option<AttemptOutcome> {
        let first = self.first?;
        let outcome = if first >= PASS_THRESHOLD {
            AttemptOutcome::PassedFirst
        } else if self.second.is_some_and(|second| second >= PASS_THRESHOLD) {
            AttemptOutcome::PassedSecond
        } else {
            AttemptOutcome::Failed
        };
        Some(outcome)
    }
}

/// A training module and the two columns holding its attempt scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSpec {
    pub name: String,
    pub first_attempt_column: String,
    pub second_attempt_column: String,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            first_attempt_column: format!("{name} попытка 1 результат"),
            second_attempt_column: format!("{name} попытка 2 результат"),
            name,
        }
    }
}

/// Ordered list of modules tracked in the results sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCatalog {
    modules: Vec<ModuleSpec>,
}

impl ModuleCatalog {
    pub fn standard() -> Self {
        Self::from_names(STANDARD_MODULES)
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: names.into_iter().map(ModuleSpec::new).collect(),
        }
    }

    pub fn modules(&self) -> &[ModuleSpec] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// One employee row from the results sheet after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    /// Zero-based position among the accepted data rows.
    pub row: usize,
    pub full_name: String,
    pub department: String,
    pub team: Option<String>,
    pub employment_date: Option<NaiveDate>,
    pub training_start: Option<NaiveDate>,
    pub training_end: Option<NaiveDate>,
    pub duration_days: Option<i64>,
    pub average_score: Option<f64>,
    pub status: Option<TrainingStatus>,
    /// Parallel to the dataset's catalog; `None` where the sheet lacks the module.
    pub modules: Vec<Option<ModuleAttempts>>,
    pub facility_visit: FacilityVisit,
}

impl TrainingRecord {
    pub fn is_completed(&self) -> bool {
        self.status == Some(TrainingStatus::Completed)
    }

    pub fn module(&self, index: usize) -> Option<&ModuleAttempts> {
        self.modules.get(index).and_then(Option::as_ref)
    }
}

/// Days between start and end; reversed windows count as unknown.
pub fn training_duration(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<i64> {
    let days = (end? - start?).num_days();
    (days >= 0).then_some(days)
}

/// Immutable result of normalizing one upload.
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    pub catalog: ModuleCatalog,
    /// Catalog positions whose attempt-1 column exists in the sheet.
    pub available_modules: Vec<usize>,
    pub records: Vec<TrainingRecord>,
    pub skipped_rows: usize,
}

impl TrainingDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingRecord> {
        self.records.iter()
    }

    /// Catalog modules present in the sheet, with their record slot.
    pub fn tracked_modules(&self) -> Vec<(usize, &ModuleSpec)> {
        self.available_modules
            .iter()
            .filter_map(|&index| self.catalog.modules().get(index).map(|spec| (index, spec)))
            .collect()
    }
}
