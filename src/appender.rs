//! Appends loading rows below the last populated ledger row.
//!
//! The formulas of the template row are replayed into every new row. The row
//! number inside each formula is rewritten by plain text substitution: every
//! occurrence of the template row number becomes the new row number, even
//! where it is part of an unrelated reference or a constant.

use crate::error::{Error, Result};
use crate::table::TableRegion;
use crate::value::{to_excel_serial, CellValue, SourceRow, DATE_FORMAT_CODE};
use std::collections::{BTreeMap, BTreeSet};
use umya_spreadsheet::structs::Worksheet;

const HEADER_ROW: u32 = 1;

/// Ledger column name → 1-based column index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndexMap(BTreeMap<String, u32>);

impl ColumnIndexMap {
    /// Match `names` against the header row. Exact, case-sensitive; the
    /// leftmost header wins when a name repeats.
    pub fn from_header<'a>(sheet: &Worksheet, names: impl IntoIterator<Item = &'a str>) -> Self {
        let (max_col, _) = sheet.get_highest_column_and_row();
        let mut header: BTreeMap<String, u32> = BTreeMap::new();
        for col in 1..=max_col {
            if let Some(cell) = sheet.get_cell((col, HEADER_ROW)) {
                let name = cell.get_value();
                if !name.is_empty() {
                    header.entry(name.into_owned()).or_insert(col);
                }
            }
        }

        let mut map = BTreeMap::new();
        for name in names {
            if let Some(&col) = header.get(name) {
                map.insert(name.to_string(), col);
            }
        }
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Formulas of one row, keyed by column index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaTemplate {
    row: u32,
    formulas: BTreeMap<u32, String>,
}

impl FormulaTemplate {
    pub fn capture(sheet: &Worksheet, row: u32) -> Self {
        let (max_col, _) = sheet.get_highest_column_and_row();
        let formulas = (1..=max_col)
            .filter_map(|col| {
                let cell = sheet.get_cell((col, row))?;
                let formula = cell.get_formula();
                (cell.get_cell_value().is_formula() && !formula.is_empty())
                    .then(|| (col, formula.to_string()))
            })
            .collect();
        Self { row, formulas }
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// The formulas rewritten for `target_row`.
    pub fn for_row(&self, target_row: u32) -> impl Iterator<Item = (u32, String)> + '_ {
        let from = self.row.to_string();
        let to = target_row.to_string();
        self.formulas
            .iter()
            .map(move |(&col, formula)| (col, formula.replace(&from, &to)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Row the formulas were copied from.
    pub template_row: u32,
    pub start_row: u32,
    /// Last row holding appended data.
    pub new_last_row: u32,
    pub rows_written: usize,
    pub columns_mapped: usize,
    pub formulas_replayed: usize,
}

pub struct LedgerAppender<'a> {
    date_columns: &'a BTreeSet<String>,
}

impl<'a> LedgerAppender<'a> {
    pub fn new(date_columns: &'a BTreeSet<String>) -> Self {
        Self { date_columns }
    }

    /// Write `rows` below the last populated row of `sheet`.
    ///
    /// Fails with [`Error::NoMappedColumns`] before touching the sheet when
    /// none of the row columns appear in the header. When `table` is given,
    /// its last row supplies the formula template.
    pub fn append(
        &self,
        sheet: &mut Worksheet,
        rows: &[SourceRow],
        table: Option<&TableRegion>,
    ) -> Result<AppendOutcome> {
        let columns = ColumnIndexMap::from_header(
            sheet,
            rows.iter().flat_map(|row| row.column_names()),
        );
        if columns.is_empty() {
            return Err(Error::NoMappedColumns);
        }

        let last_row = last_data_row(sheet);
        let start_row = last_row + 1;
        let template_row = match table {
            Some(region) if region.last_row() > region.first_row() => region.last_row(),
            _ => last_row,
        };
        let template = FormulaTemplate::capture(sheet, template_row);

        tracing::debug!(
            last_row,
            template_row,
            columns = columns.len(),
            formulas = template.len(),
            "appending {} rows",
            rows.len()
        );

        for (offset, row) in rows.iter().enumerate() {
            let row_num = start_row + offset as u32;

            for (name, value) in row.iter() {
                let Some(col) = columns.get(name) else {
                    continue;
                };
                let is_date = self.date_columns.contains(name);
                write_value(sheet, col, row_num, value, is_date);
            }

            for (col, formula) in template.for_row(row_num) {
                sheet.get_cell_mut((col, row_num)).set_formula(formula);
            }
        }

        Ok(AppendOutcome {
            template_row,
            start_row,
            new_last_row: start_row + rows.len() as u32 - 1,
            rows_written: rows.len(),
            columns_mapped: columns.len(),
            formulas_replayed: template.len(),
        })
    }
}

fn write_value(sheet: &mut Worksheet, col: u32, row: u32, value: &CellValue, is_date: bool) {
    let cell = sheet.get_cell_mut((col, row));
    match value {
        CellValue::Date(date) if is_date => {
            cell.set_value_number(to_excel_serial(*date));
            cell.get_style_mut()
                .get_number_format_mut()
                .set_format_code(DATE_FORMAT_CODE);
        }
        CellValue::Date(date) => {
            cell.set_value_number(to_excel_serial(*date));
        }
        CellValue::Empty if is_date => {
            cell.set_value_string("");
        }
        CellValue::Empty => {
            cell.set_blank();
        }
        CellValue::Text(s) => {
            cell.set_value_string(s.as_str());
        }
        CellValue::Number(n) => {
            cell.set_value_number(*n);
        }
        CellValue::Bool(b) => {
            cell.set_value_bool(*b);
        }
    }
}

/// Highest row whose first cell holds text or a formula; the header row when
/// no row qualifies. Whitespace-only text counts as populated.
pub fn last_data_row(sheet: &Worksheet) -> u32 {
    let (_, max_row) = sheet.get_highest_column_and_row();
    (HEADER_ROW..=max_row)
        .rev()
        .find(|&row| {
            sheet.get_cell((1, row)).is_some_and(|cell| {
                cell.get_cell_value().is_formula() || !cell.get_value().is_empty()
            })
        })
        .unwrap_or(HEADER_ROW)
}
