use super::domain::TrainingRecord;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

/// Token meaning "no filtering on this dimension".
pub const ALL_TOKEN: &str = "All";
const ALL_TOKEN_RU: &str = "Все";

static ALL: Selection = Selection::All;

/// One filter dimension: everything, or a single exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(value) if value.eq_ignore_ascii_case(ALL_TOKEN) || value == ALL_TOKEN_RU => {
                Self::All
            }
            Some(value) => Self::Only(value.to_string()),
        }
    }

    pub fn only(value: impl Into<String>) -> Self {
        Self::Only(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value),
        }
    }

    fn admits(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => value == Some(expected.as_str()),
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_value().unwrap_or(ALL_TOKEN))
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::parse(raw.as_deref()))
    }
}

/// Department, team, and status selections from the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub department: Selection,
    #[serde(default)]
    pub team: Selection,
    #[serde(default)]
    pub status: Selection,
}

impl FilterCriteria {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Selection::only(department);
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Selection::only(team);
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Selection::only(status);
        self
    }

    /// Teams are department-scoped, so a team selection without a
    /// department selection is ignored.
    pub fn effective_team(&self) -> &Selection {
        if self.department.is_all() {
            &ALL
        } else {
            &self.team
        }
    }

    pub fn matches(&self, record: &TrainingRecord) -> bool {
        self.department.admits(Some(record.department.as_str()))
            && self.effective_team().admits(record.team.as_deref())
            && self
                .status
                .admits(record.status.as_ref().map(|status| status.token()))
    }

    /// Builds a new view; the input is never modified.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a TrainingRecord>
    where
        I: IntoIterator<Item = &'a TrainingRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

/// Choices offered by the sidebar selectors, each led by the "All" token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub departments: Vec<String>,
    /// Present only once a specific department is chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<String>>,
    pub statuses: Vec<String>,
}

impl FilterOptions {
    pub fn build<'a, I>(records: I, department: &Selection) -> Self
    where
        I: IntoIterator<Item = &'a TrainingRecord> + Clone,
    {
        let departments = with_all(distinct(
            records.clone().into_iter().map(|record| Some(record.department.as_str())),
        ));

        let teams = department.as_value().map(|selected| {
            with_all(distinct(
                records
                    .clone()
                    .into_iter()
                    .filter(|record| record.department == selected)
                    .map(|record| record.team.as_deref()),
            ))
        });

        let statuses = with_all(distinct(
            records
                .into_iter()
                .map(|record| record.status.as_ref().map(|status| status.token())),
        ));

        Self {
            departments,
            teams,
            statuses,
        }
    }
}

/// Distinct present values in first-seen order.
fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = Option<&'a str>>,
{
    let mut seen = HashSet::new();
    values
        .flatten()
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}

fn with_all(values: Vec<String>) -> Vec<String> {
    std::iter::once(ALL_TOKEN.to_string()).chain(values).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::domain::{FacilityVisit, TrainingStatus};

    fn record(row: usize, department: &str, team: Option<&str>, status: &str) -> TrainingRecord {
        TrainingRecord {
            row,
            full_name: format!("Сотрудник {row}"),
            department: department.to_string(),
            team: team.map(str::to_string),
            employment_date: None,
            training_start: None,
            training_end: None,
            duration_days: None,
            average_score: None,
            status: TrainingStatus::parse(status),
            modules: Vec::new(),
            facility_visit: FacilityVisit::NotApplicable,
        }
    }

    fn sample() -> Vec<TrainingRecord> {
        vec![
            record(0, "Продажи", Some("Север"), "завершено"),
            record(1, "Продажи", Some("Юг"), "в процессе"),
            record(2, "Производство", Some("Цех 1"), "завершено"),
            record(3, "Продажи", None, "не начато"),
            record(4, "Производство", Some("Цех 1"), "в процессе"),
        ]
    }

    fn rows(view: &[&TrainingRecord]) -> Vec<usize> {
        view.iter().map(|record| record.row).collect()
    }

    #[test]
    fn all_selections_are_identity() {
        let records = sample();
        assert_eq!(rows(&FilterCriteria::all().apply(&records)), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn department_team_and_status_narrow_the_view() {
        let records = sample();
        let criteria = FilterCriteria::all()
            .department("Продажи")
            .team("Юг")
            .status("в процессе");
        assert_eq!(rows(&criteria.apply(&records)), vec![1]);

        let criteria = FilterCriteria::all().status("завершено");
        assert_eq!(rows(&criteria.apply(&records)), vec![0, 2]);
    }

    #[test]
    fn team_is_ignored_without_department() {
        let records = sample();
        let criteria = FilterCriteria::all().team("Юг");
        assert_eq!(criteria.apply(&records).len(), records.len());
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = sample();
        let criteria = FilterCriteria::all().department("Производство").status("завершено");
        let once = criteria.apply(&records);
        let twice = criteria.apply(once.iter().copied());
        assert_eq!(rows(&once), rows(&twice));
    }

    #[test]
    fn filter_dimensions_commute() {
        let records = sample();
        let department = FilterCriteria::all().department("Продажи").team("Север");
        let status = FilterCriteria::all().status("завершено");
        let combined = department.clone().status("завершено");

        let department_first = status.apply(department.apply(&records));
        let status_first = department.apply(status.apply(&records));
        let at_once = combined.apply(&records);

        assert_eq!(rows(&department_first), rows(&status_first));
        assert_eq!(rows(&department_first), rows(&at_once));
        assert_eq!(rows(&at_once), vec![0]);
    }

    #[test]
    fn empty_result_is_allowed() {
        let records = sample();
        let criteria = FilterCriteria::all().department("Бухгалтерия");
        assert!(criteria.apply(&records).is_empty());
    }

    #[test]
    fn options_scope_teams_to_department() {
        let records = sample();
        let options = FilterOptions::build(&records, &Selection::All);
        assert_eq!(options.departments, vec!["All", "Продажи", "Производство"]);
        assert_eq!(options.teams, None);
        assert_eq!(
            options.statuses,
            vec!["All", "завершено", "в процессе", "не начато"]
        );

        let options = FilterOptions::build(&records, &Selection::only("Продажи"));
        assert_eq!(
            options.teams,
            Some(vec!["All".to_string(), "Север".to_string(), "Юг".to_string()])
        );
    }

    #[test]
    fn selection_parses_all_tokens() {
        assert_eq!(Selection::parse(None), Selection::All);
        assert_eq!(Selection::parse(Some(" all ")), Selection::All);
        assert_eq!(Selection::parse(Some("Все")), Selection::All);
        assert_eq!(
            Selection::parse(Some("Продажи")),
            Selection::only("Продажи")
        );
    }
}
