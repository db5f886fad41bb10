mod cells;
pub mod columns;
mod workbook;

pub use workbook::{Cell, RawSheet, RawWorkbook};

use crate::analytics::domain::{
    training_duration, FacilityVisit, ModuleAttempts, ModuleCatalog, TrainingDataset,
    TrainingRecord, TrainingStatus,
};
use columns::ColumnLayout;
use tracing::{info, warn};

/// The upload cannot yield a dataset at all.
#[derive(Debug, thiserror::Error)]
pub enum MalformedInputError {
    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },
    #[error("sheet '{sheet}' has no header row")]
    MissingHeader { sheet: String },
    #[error("sheet '{sheet}' is missing required columns: {}", columns.join(", "))]
    MissingColumns { sheet: String, columns: Vec<String> },
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unable to read spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedInputError),
}

/// Uploaded file encodings the importer understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadFormat {
    #[default]
    Spreadsheet,
    Csv,
}

/// Reads raw uploads into normalized datasets for one configured sheet.
#[derive(Debug, Clone)]
pub struct TrainingImporter {
    sheet_name: String,
    catalog: ModuleCatalog,
}

impl TrainingImporter {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            catalog: ModuleCatalog::standard(),
        }
    }

    pub fn with_catalog(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn load_bytes(
        &self,
        bytes: &[u8],
        format: UploadFormat,
    ) -> Result<TrainingDataset, IngestError> {
        let workbook = match format {
            UploadFormat::Spreadsheet => RawWorkbook::from_spreadsheet_bytes(bytes)?,
            UploadFormat::Csv => RawWorkbook::from_csv_reader(&self.sheet_name, bytes)?,
        };
        self.load_workbook(&workbook)
    }

    pub fn load_workbook(&self, workbook: &RawWorkbook) -> Result<TrainingDataset, IngestError> {
        let sheet = workbook.sheet(&self.sheet_name).ok_or_else(|| {
            MalformedInputError::MissingSheet {
                sheet: self.sheet_name.clone(),
                available: workbook.sheet_names(),
            }
        })?;
        let dataset = normalize(sheet, &self.catalog)?;

        info!(
            sheet = %self.sheet_name,
            records = dataset.len(),
            skipped = dataset.skipped_rows,
            modules = dataset.available_modules.len(),
            "training results normalized"
        );
        Ok(dataset)
    }
}

/// Turns the results sheet into typed records.
pub fn normalize(
    sheet: &RawSheet,
    catalog: &ModuleCatalog,
) -> Result<TrainingDataset, MalformedInputError> {
    if sheet.headers.iter().all(String::is_empty) {
        return Err(MalformedInputError::MissingHeader {
            sheet: sheet.name.clone(),
        });
    }

    let layout = ColumnLayout::resolve(&sheet.headers, catalog).map_err(|columns| {
        MalformedInputError::MissingColumns {
            sheet: sheet.name.clone(),
            columns,
        }
    })?;

    let mut records = Vec::with_capacity(sheet.rows.len());
    let mut skipped_rows = 0;

    for (line, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(|cell| cells::normalize_missing(cell).is_empty()) {
            continue;
        }

        match normalize_row(row, &layout, catalog.len(), records.len()) {
            Some(record) => records.push(record),
            None => {
                // Header occupies the first sheet line.
                warn!(row = line + 2, "row lacks full name or department; skipped");
                skipped_rows += 1;
            }
        }
    }

    Ok(TrainingDataset {
        catalog: catalog.clone(),
        available_modules: layout
            .modules
            .iter()
            .map(|columns| columns.catalog_index)
            .collect(),
        records,
        skipped_rows,
    })
}

fn normalize_row(
    row: &[Cell],
    layout: &ColumnLayout,
    module_count: usize,
    position: usize,
) -> Option<TrainingRecord> {
    let cell = |index: usize| row.get(index).unwrap_or(&cells::EMPTY);

    let full_name = cells::text(cell(layout.full_name))?;
    let department = cells::text(cell(layout.department))?;

    let training_start = cells::date(cell(layout.training_start));
    let training_end = cells::date(cell(layout.training_end));

    let mut modules = vec![None; module_count];
    for columns in &layout.modules {
        let first = cells::number(cell(columns.first));
        let second = columns.second.and_then(|index| cells::number(cell(index)));
        modules[columns.catalog_index] = Some(ModuleAttempts::new(first, second));
    }

    Some(TrainingRecord {
        row: position,
        full_name,
        department,
        team: cells::text(cell(layout.team)),
        employment_date: cells::date(cell(layout.employment_date)),
        training_start,
        training_end,
        duration_days: training_duration(training_start, training_end),
        average_score: cells::number(cell(layout.average_score)),
        status: cells::text(cell(layout.status)).and_then(|raw| TrainingStatus::parse(&raw)),
        modules,
        facility_visit: FacilityVisit::parse(cells::text(cell(layout.facility_visit)).as_deref()),
    })
}
