use chrono::NaiveDate;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use training_insights::analytics::domain::{FacilityVisit, ModuleAttempts};
use training_insights::analytics::ingest::columns::REQUIRED_COLUMNS;
use training_insights::analytics::{
    IngestError, MalformedInputError, TrainingImporter, TrainingStatus, UploadFormat,
};

const SHEET: &str = "РЕЗУЛЬТАТЫ ПЕРВИЧНОГО ОБУЧЕНИЯ";

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Two sheets: an unrelated one first, then the results sheet with one employee.
fn results_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd.mm.yyyy");

    let other = workbook.add_worksheet();
    other.set_name("Other").expect("sheet name");
    other.write_string(0, 0, "Справочник").expect("write");

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET).expect("sheet name");

    let headers = REQUIRED_COLUMNS.iter().copied().chain([
        "ДЮРОК попытка 1 результат",
        "ДЮРОК попытка 2 результат",
    ]);
    for (column, header) in headers.enumerate() {
        sheet
            .write_string(0, column as u16, header)
            .expect("write header");
    }

    let employed = ExcelDateTime::from_ymd(2023, 12, 1).expect("date");
    let start = ExcelDateTime::from_ymd(2024, 1, 10).expect("date");
    let end = ExcelDateTime::from_ymd(2024, 1, 25).expect("date");

    sheet.write_string(1, 0, "Иванов Иван").expect("write");
    sheet
        .write_string(1, 1, "Коммерческий департамент")
        .expect("write");
    sheet.write_string(1, 2, "-").expect("write");
    sheet
        .write_datetime_with_format(1, 3, &employed, &date_format)
        .expect("write");
    sheet
        .write_datetime_with_format(1, 4, &start, &date_format)
        .expect("write");
    sheet
        .write_datetime_with_format(1, 5, &end, &date_format)
        .expect("write");
    sheet.write_number(1, 6, 91.5).expect("write");
    sheet.write_string(1, 7, "завершено").expect("write");
    sheet.write_string(1, 8, "пройдено").expect("write");
    sheet.write_number(1, 9, 70.0).expect("write");
    sheet.write_number(1, 10, 95.0).expect("write");

    workbook.save_to_buffer().expect("workbook serializes")
}

#[test]
fn xlsx_upload_normalizes_native_cells() {
    let bytes = results_workbook();
    let dataset = TrainingImporter::new(SHEET)
        .load_bytes(&bytes, UploadFormat::Spreadsheet)
        .expect("workbook loads");

    assert_eq!(dataset.len(), 1);
    let record = &dataset.records[0];
    assert_eq!(record.full_name, "Иванов Иван");
    assert_eq!(record.team, None);
    assert_eq!(record.employment_date, Some(ymd(2023, 12, 1)));
    assert_eq!(record.training_start, Some(ymd(2024, 1, 10)));
    assert_eq!(record.training_end, Some(ymd(2024, 1, 25)));
    assert_eq!(record.duration_days, Some(15));
    assert_eq!(record.average_score, Some(91.5));
    assert_eq!(record.status, Some(TrainingStatus::Completed));
    assert_eq!(record.facility_visit, FacilityVisit::Passed);

    let duroc = dataset
        .tracked_modules()
        .into_iter()
        .find(|(_, spec)| spec.name == "ДЮРОК")
        .map(|(slot, _)| slot)
        .expect("module tracked");
    assert_eq!(
        record.module(duroc),
        Some(&ModuleAttempts::new(Some(70.0), Some(95.0)))
    );
}

#[test]
fn missing_results_sheet_lists_workbook_sheets() {
    let bytes = results_workbook();
    let error = TrainingImporter::new("nope")
        .load_bytes(&bytes, UploadFormat::Spreadsheet)
        .expect_err("sheet absent");

    assert!(matches!(
        &error,
        IngestError::Malformed(MalformedInputError::MissingSheet { available, .. })
            if available == &vec!["Other".to_string(), SHEET.to_string()]
    ));
    assert_eq!(
        error.to_string(),
        format!("sheet 'nope' not found (available: Other, {SHEET})")
    );
}
