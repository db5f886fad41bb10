use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDateTime;
use std::io::{Cursor, Read};

/// A spreadsheet cell reduced to the shapes the normalizer understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Bool(bool),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(value) => Cell::Text(value.clone()),
            Data::Float(value) => Cell::Number(*value),
            Data::Int(value) => Cell::Number(*value as f64),
            Data::Bool(value) => Cell::Bool(*value),
            Data::DateTime(value) => match value.as_datetime() {
                Some(datetime) => Cell::Date(datetime),
                None => Cell::Number(value.as_f64()),
            },
            Data::DateTimeIso(value) | Data::DurationIso(value) => Cell::Text(value.clone()),
        }
    }
}

/// Header row plus data rows of one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Treats the first non-blank row as the header row.
    fn from_grid(name: String, grid: Vec<Vec<Cell>>) -> Self {
        let mut rows = grid.into_iter().skip_while(|row| row.iter().all(Cell::is_empty));
        let headers = rows
            .next()
            .map(|row| row.iter().map(header_text).collect())
            .unwrap_or_default();

        Self {
            name,
            headers,
            rows: rows.collect(),
        }
    }
}

fn header_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(value) => value.trim().to_string(),
        Cell::Number(value) => value.to_string(),
        Cell::Date(value) => value.to_string(),
        Cell::Bool(value) => value.to_string(),
    }
}

/// All sheets of an uploaded file, in workbook order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWorkbook {
    pub sheets: Vec<RawSheet>,
}

impl RawWorkbook {
    pub fn new(sheets: Vec<RawSheet>) -> Self {
        Self { sheets }
    }

    /// Reads xlsx, xlsm, xls, or ods content.
    pub fn from_spreadsheet_bytes(bytes: &[u8]) -> Result<Self, calamine::Error> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let mut sheets = Vec::new();

        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name)?;
            let grid = range
                .rows()
                .map(|row| row.iter().map(Cell::from_data).collect())
                .collect();
            sheets.push(RawSheet::from_grid(name, grid));
        }

        Ok(Self { sheets })
    }

    /// Wraps a CSV export as a single sheet called `sheet_name`.
    pub fn from_csv_reader<R: Read>(sheet_name: &str, reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut grid = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            grid.push(
                record
                    .iter()
                    .map(|field| {
                        let field = field.trim_start_matches('\u{feff}');
                        if field.is_empty() {
                            Cell::Empty
                        } else {
                            Cell::text(field)
                        }
                    })
                    .collect(),
            );
        }

        Ok(Self {
            sheets: vec![RawSheet::from_grid(sheet_name.to_string(), grid)],
        })
    }

    pub fn sheet(&self, name: &str) -> Option<&RawSheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }
}
