use crate::error::Result;
use crate::OutputFormat;
use csv::WriterBuilder;
use ssfmt::{FormatOptions, NumberFormat};
use std::io::Write;
use umya_spreadsheet::structs::Worksheet;
use umya_spreadsheet::CellRawValue;

pub struct PreviewConfig {
    pub format: OutputFormat,
}

/// Write the header row and rows `first..=last` of `sheet` as delimited text.
///
/// Values are rendered through their number format; formula cells show
/// their formula text.
pub fn write_rows<W: Write>(
    sheet: &Worksheet,
    first: u32,
    last: u32,
    writer: W,
    config: &PreviewConfig,
) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .delimiter(config.format.delimiter())
        .from_writer(writer);

    let (max_col, _) = sheet.get_highest_column_and_row();
    let opts = FormatOptions::default();

    for row in std::iter::once(1).chain(first..=last) {
        let record: Vec<String> = (1..=max_col)
            .map(|col| get_cell_formatted_value(sheet, col, row, &opts))
            .collect();
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn get_cell_formatted_value(sheet: &Worksheet, col: u32, row: u32, opts: &FormatOptions) -> String {
    let Some(cell) = sheet.get_cell((col, row)) else {
        return String::new();
    };

    if cell.get_cell_value().is_formula() {
        return format!("={}", cell.get_formula());
    }

    let raw_value = cell.get_value();
    if raw_value.is_empty() {
        return String::new();
    }

    let format_code = cell
        .get_style()
        .get_number_format()
        .map(|nf| nf.get_format_code())
        .unwrap_or("General");

    let fmt = match NumberFormat::parse(format_code) {
        Ok(f) => f,
        Err(_) => return raw_value.to_string(),
    };

    // Dates are serial numbers too. Numeric-looking text stays text.
    let number = match cell.get_cell_value().get_raw_value() {
        CellRawValue::Numeric(n) => Some(*n),
        CellRawValue::Lazy(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    if let Some(num) = number {
        return fmt.format(num, opts);
    }

    fmt.format_text(&raw_value, opts)
}
