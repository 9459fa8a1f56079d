use crate::config::AppendConfig;
use crate::error::{Error, Result};
use crate::value::{from_excel_serial, is_date_format, parse_date, CellValue, SourceRow};
use std::path::Path;
use umya_spreadsheet::structs::{Cell, Worksheet};
use umya_spreadsheet::Spreadsheet;

pub fn open_workbook(path: &Path) -> Result<Spreadsheet> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    match extension(path).as_str() {
        "xlsx" | "xlsm" => open_xlsx(path),
        "xls" => open_xls(path),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

/// Fail with [`Error::UnsupportedFormat`] unless `path` is a workbook the
/// ledger can be saved back to.
pub fn ensure_saveable(path: &Path) -> Result<()> {
    match extension(path).as_str() {
        "xlsx" | "xlsm" => Ok(()),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn open_xlsx(path: &Path) -> Result<Spreadsheet> {
    umya_spreadsheet::reader::xlsx::read(path).map_err(|e| Error::InvalidExcel {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

fn open_xls(path: &Path) -> Result<Spreadsheet> {
    xlrd::open(path).map_err(|e| Error::InvalidExcel {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

/// Read the loading export into ledger-named rows.
///
/// Row 1 holds the headers. Headers missing from the translation table are
/// dropped, date columns go through [`parse_date`], and rows with no value
/// in any mapped column are skipped.
pub fn read_source_rows(path: &Path, config: &AppendConfig) -> Result<Vec<SourceRow>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let (headers, records) = if extension(path) == "csv" {
        read_csv_grid(path)?
    } else {
        let workbook = open_workbook(path)?;
        let sheet = workbook.get_sheet(&0).ok_or_else(|| Error::InvalidExcel {
            path: path.to_path_buf(),
            details: "workbook has no sheets".to_string(),
        })?;
        read_sheet_grid(sheet)
    };

    Ok(translate_rows(&headers, records, config))
}

fn read_sheet_grid(sheet: &Worksheet) -> (Vec<String>, Vec<Vec<CellValue>>) {
    let (max_col, max_row) = sheet.get_highest_column_and_row();

    let headers = (1..=max_col)
        .map(|col| {
            sheet
                .get_cell((col, 1))
                .map(|c| c.get_value().into_owned())
                .unwrap_or_default()
        })
        .collect();

    let records = (2..=max_row)
        .map(|row| {
            (1..=max_col)
                .map(|col| {
                    sheet
                        .get_cell((col, row))
                        .map(read_cell)
                        .unwrap_or(CellValue::Empty)
                })
                .collect()
        })
        .collect();

    (headers, records)
}

/// Numbers shown with a date format are dates.
fn read_cell(cell: &Cell) -> CellValue {
    match CellValue::from_umya(cell.get_cell_value()) {
        CellValue::Number(n) => {
            let dated = cell
                .get_style()
                .get_number_format()
                .filter(|nf| is_date_format(nf.get_format_code()))
                .and_then(|_| from_excel_serial(n));
            dated.map_or(CellValue::Number(n), CellValue::Date)
        }
        other => other,
    }
}

fn read_csv_grid(path: &Path) -> Result<(Vec<String>, Vec<Vec<CellValue>>)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok((headers, records))
}

fn translate_rows(
    headers: &[String],
    records: Vec<Vec<CellValue>>,
    config: &AppendConfig,
) -> Vec<SourceRow> {
    // (source position, ledger name) for every mapped header
    let mapped: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| config.translate(h).map(|target| (idx, target)))
        .collect();

    if mapped.is_empty() {
        return Vec::new();
    }

    records
        .into_iter()
        .map(|mut record| {
            mapped
                .iter()
                .map(|&(idx, target)| {
                    let raw = record
                        .get_mut(idx)
                        .map(|v| std::mem::replace(v, CellValue::Empty))
                        .unwrap_or(CellValue::Empty);
                    let value = match raw {
                        CellValue::Text(s) if s.is_empty() => CellValue::Empty,
                        v if config.is_date_column(target) => parse_date(v),
                        v => v,
                    };
                    (target, value)
                })
                .collect::<SourceRow>()
        })
        .filter(|row| !row.is_blank())
        .collect()
}
