//! Scalar cell values moved from the loading export into the ledger.

use chrono::{Duration, NaiveDate};
use umya_spreadsheet::{CellRawValue, CellValue as UmyaValue};

/// Number format applied to date cells written into the ledger (day/month/year).
pub const DATE_FORMAT_CODE: &str = "d/m/y";

const DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%d/%m/%Y"];

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Convert a stored umya value. Lazily-typed cells become numbers when
    /// they parse as one and text otherwise.
    pub fn from_umya(cv: &UmyaValue) -> Self {
        match cv.get_raw_value() {
            CellRawValue::Numeric(n) => CellValue::Number(*n),
            CellRawValue::Bool(b) => CellValue::Bool(*b),
            CellRawValue::String(s) => CellValue::Text(s.to_string()),
            CellRawValue::RichText(rt) => CellValue::Text(rt.get_text().to_string()),
            CellRawValue::Lazy(s) => match s.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::Text(s.to_string()),
            },
            CellRawValue::Error(_) => CellValue::Text(cv.get_value().into_owned()),
            CellRawValue::Empty => CellValue::Empty,
        }
    }
}

/// One row of the loading export, keyed by ledger column name in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    cells: Vec<(String, CellValue)>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column. A repeated name replaces the earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: CellValue) {
        let name = name.into();
        match self.cells.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.cells.push((name, value)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

impl<S: Into<String>> FromIterator<(S, CellValue)> for SourceRow {
    fn from_iter<I: IntoIterator<Item = (S, CellValue)>>(iter: I) -> Self {
        let mut row = SourceRow::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

/// Parse a date column value.
///
/// Text is tried as `day.month.year`, then `day/month/year`. Empty input
/// yields [`CellValue::Empty`]; text matching neither format is returned
/// unchanged, so a date column may hold a mix of dates and raw strings.
pub fn parse_date(value: CellValue) -> CellValue {
    let text = match value {
        CellValue::Text(text) => text,
        other => return other,
    };
    if text.is_empty() {
        return CellValue::Empty;
    }
    let trimmed = text.trim();
    match DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    {
        Some(date) => CellValue::Date(date),
        None => CellValue::Text(text),
    }
}

fn excel_epoch() -> NaiveDate {
    // 1899-12-30 absorbs the phantom 1900-02-29 for every date after March 1900.
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Excel 1900-system serial number for a date.
pub fn to_excel_serial(date: NaiveDate) -> f64 {
    (date - excel_epoch()).num_days() as f64
}

/// Date of an Excel 1900-system serial. The time of day is dropped; serials
/// below 1 have no calendar date.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial >= i32::MAX as f64 {
        return None;
    }
    excel_epoch().checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Whether a number format code displays a date or time.
///
/// Only the first section counts. Quoted literals, escaped characters and
/// bracketed parts such as colours or locales are skipped; elapsed-time
/// codes like `[h]:mm` are durations, not dates.
pub fn is_date_format(code: &str) -> bool {
    let mut escaped = false;
    let mut quoted = false;
    let mut brackets = 0u8;
    let mut prev = ' ';
    let mut elapsed = false;
    let mut am_pm = false;

    for c in code.chars() {
        match (c, escaped, quoted, am_pm, brackets) {
            (_, true, ..) => escaped = false,
            ('_' | '\\', ..) => escaped = true,
            ('"', _, true, _, _) => quoted = false,
            (_, _, true, _, _) => (),
            ('"', ..) => quoted = true,
            (';', ..) => return false,
            ('[', ..) => brackets += 1,
            (']', .., 1) if elapsed => return false,
            (']', ..) => brackets = brackets.saturating_sub(1),
            ('a' | 'A', _, _, false, 0) => am_pm = true,
            ('p' | 'm' | '/' | 'P' | 'M', _, _, true, 0) => return true,
            ('d' | 'm' | 'h' | 'y' | 's' | 'D' | 'M' | 'H' | 'Y' | 'S', _, _, false, 0) => {
                return true;
            }
            _ => {
                if !(elapsed && c.eq_ignore_ascii_case(&prev)) {
                    elapsed = prev == '[' && matches!(c, 'm' | 'h' | 's' | 'M' | 'H' | 'S');
                }
            }
        }
        prev = c;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_both_separators() {
        let dotted = parse_date(CellValue::Text("25.12.2024".into()));
        let slashed = parse_date(CellValue::Text("25/12/2024".into()));
        assert_eq!(dotted, CellValue::Date(date(2024, 12, 25)));
        assert_eq!(dotted, slashed);
    }

    #[test]
    fn test_parse_date_trims_whitespace() {
        assert_eq!(
            parse_date(CellValue::Text(" 01.02.2025 ".into())),
            CellValue::Date(date(2025, 2, 1))
        );
    }

    #[test]
    fn test_parse_date_keeps_unparsed_text() {
        assert_eq!(
            parse_date(CellValue::Text("not-a-date".into())),
            CellValue::Text("not-a-date".into())
        );
        // ISO order is not one of the accepted formats.
        assert_eq!(
            parse_date(CellValue::Text("2024-12-25".into())),
            CellValue::Text("2024-12-25".into())
        );
    }

    #[test]
    fn test_parse_date_empty() {
        assert_eq!(parse_date(CellValue::Text(String::new())), CellValue::Empty);
        assert_eq!(parse_date(CellValue::Empty), CellValue::Empty);
    }

    #[test]
    fn test_parse_date_passes_through_non_text() {
        let d = CellValue::Date(date(2024, 1, 1));
        assert_eq!(parse_date(d.clone()), d);
        assert_eq!(parse_date(CellValue::Number(45000.0)), CellValue::Number(45000.0));
    }

    #[test]
    fn test_source_row_keeps_order_and_replaces() {
        let mut row: SourceRow = [
            ("LOAD", CellValue::Text("A1".into())),
            ("PESO", CellValue::Number(10.0)),
        ]
        .into_iter()
        .collect();
        row.insert("LOAD", CellValue::Text("A2".into()));

        assert_eq!(row.column_names().collect::<Vec<_>>(), ["LOAD", "PESO"]);
        assert_eq!(row.get("LOAD"), Some(&CellValue::Text("A2".into())));
        assert!(!row.is_blank());
        assert!(SourceRow::from_iter([("M3", CellValue::Empty)]).is_blank());
    }

    #[test]
    fn test_to_excel_serial() {
        assert_eq!(to_excel_serial(date(2023, 3, 1)), 44986.0);
        assert_eq!(to_excel_serial(date(1900, 3, 1)), 61.0);
    }

    #[test]
    fn test_from_excel_serial() {
        assert_eq!(from_excel_serial(45651.0), Some(date(2024, 12, 25)));
        // Time of day is dropped.
        assert_eq!(from_excel_serial(45651.75), Some(date(2024, 12, 25)));
        assert_eq!(from_excel_serial(61.0), Some(date(1900, 3, 1)));
        assert_eq!(from_excel_serial(0.5), None);
        assert_eq!(from_excel_serial(f64::NAN), None);
    }

    #[test]
    fn test_is_date_format() {
        assert!(is_date_format("dd.mm.yyyy"));
        assert!(is_date_format("d/m/y"));
        assert!(is_date_format("yyyy-mm-dd hh:mm"));
        assert!(is_date_format("[$-409]d-mmm-yy"));
        assert!(is_date_format("h:mm AM/PM"));

        assert!(!is_date_format("General"));
        assert!(!is_date_format("0.00"));
        assert!(!is_date_format("#,##0;[Red]-#,##0"));
        assert!(!is_date_format("\"days\" 0"));
        assert!(!is_date_format("[Red]0.0"));
        assert!(!is_date_format("[h]:mm:ss"));
    }
}
