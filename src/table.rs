//! Table region and conditional-formatting bookkeeping around an append.
//!
//! Both are captured from the ledger before rows are written and stretched
//! down to the new last row afterwards.

use umya_spreadsheet::structs::{Table, TableStyleInfo, Worksheet};

/// First data row covered by rewritten conditional-formatting ranges.
const FIRST_DATA_ROW: u32 = 2;

/// Display options of a table style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStyle {
    pub name: String,
    pub show_first_column: bool,
    pub show_last_column: bool,
    pub show_row_stripes: bool,
    pub show_column_stripes: bool,
}

impl TableStyle {
    fn from_umya(info: &TableStyleInfo) -> Self {
        Self {
            name: info.get_name().to_string(),
            show_first_column: info.is_show_first_col(),
            show_last_column: info.is_show_last_col(),
            show_row_stripes: info.is_show_row_stripes(),
            show_column_stripes: info.is_show_col_stripes(),
        }
    }

    fn to_umya(&self) -> TableStyleInfo {
        TableStyleInfo::new(
            &self.name,
            self.show_first_column,
            self.show_last_column,
            self.show_row_stripes,
            self.show_column_stripes,
        )
    }
}

/// A named table as found in the ledger. Coordinates are `(column, row)`, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegion {
    pub name: String,
    pub top_left: (u32, u32),
    pub bottom_right: (u32, u32),
    /// Whether the first row of the area holds the column names.
    pub header_row: bool,
    pub style: Option<TableStyle>,
}

impl TableRegion {
    #[cfg(test)]
    pub fn new(name: &str, top_left: (u32, u32), bottom_right: (u32, u32)) -> Self {
        Self {
            name: name.to_string(),
            top_left,
            bottom_right,
            header_row: true,
            style: None,
        }
    }

    pub fn first_row(&self) -> u32 {
        self.top_left.1
    }

    pub fn last_row(&self) -> u32 {
        self.bottom_right.1
    }

    pub fn range(&self) -> String {
        format!(
            "{}:{}",
            cell_name(self.top_left.0, self.top_left.1),
            cell_name(self.bottom_right.0, self.bottom_right.1)
        )
    }

    fn from_umya(sheet: &Worksheet, table: &Table) -> Self {
        let (from, to) = table.get_area();
        let top_left = (*from.get_col_num(), *from.get_row_num());
        let bottom_right = (*to.get_col_num(), *to.get_row_num());

        let header_row = !table.get_columns().is_empty()
            && table.get_columns().iter().enumerate().all(|(i, column)| {
                sheet
                    .get_cell((top_left.0 + i as u32, top_left.1))
                    .is_some_and(|cell| cell.get_value() == column.get_name())
            });

        Self {
            name: table.get_name().to_string(),
            top_left,
            bottom_right,
            header_row,
            style: table.get_style_info().map(TableStyle::from_umya),
        }
    }
}

/// The first table of the sheet, if any.
pub fn capture_table(sheet: &Worksheet) -> Option<TableRegion> {
    let table = sheet.get_tables().first()?;
    Some(TableRegion::from_umya(sheet, table))
}

/// Re-register `region` so it ends at `new_last_row` and carries its captured
/// style again. Returns the resulting range, or `None` when the table is no
/// longer present in the sheet.
pub fn extend_table(sheet: &mut Worksheet, region: &TableRegion, new_last_row: u32) -> Option<String> {
    let table = sheet
        .get_tables_mut()
        .iter_mut()
        .find(|t| t.get_name() == region.name)?;

    let mut extended = region.clone();
    extended.bottom_right.1 = region.last_row().max(new_last_row);

    let top_left = cell_name(extended.top_left.0, extended.top_left.1);
    let bottom_right = cell_name(extended.bottom_right.0, extended.bottom_right.1);
    table.set_area((top_left.as_str(), bottom_right.as_str()));
    table.set_style_info(region.style.as_ref().map(TableStyle::to_umya));

    Some(extended.range())
}

/// Stretch every conditional-formatting range down to `new_last_row`.
/// Returns how many rule ranges were rewritten.
pub fn extend_conditional_formatting(sheet: &mut Worksheet, new_last_row: u32) -> usize {
    let mut rules = sheet.get_conditional_formatting_collection().to_vec();
    let mut changed = 0;

    for rule in rules.iter_mut() {
        let sqref = rule.get_sequence_of_references().get_sqref();
        if let Some(extended) = extend_sqref(&sqref, new_last_row) {
            tracing::debug!(from = %sqref, to = %extended, "extending conditional format");
            let mut references = rule.get_sequence_of_references().clone();
            references.set_sqref(extended);
            rule.set_sequence_of_references(references);
            changed += 1;
        }
    }

    if changed > 0 {
        sheet.set_conditional_formatting_collection(rules);
    }
    changed
}

/// Rewrite each range of a space-separated `sqref` as
/// `<start col>2:<end col><new_last_row>`. Ranges already reaching
/// `new_last_row`, and whole-column or whole-row ranges, are kept.
/// `None` when nothing changes.
pub fn extend_sqref(sqref: &str, new_last_row: u32) -> Option<String> {
    let mut changed = false;
    let parts: Vec<String> = sqref
        .split_whitespace()
        .map(|part| {
            let (start, end) = part.split_once(':').unwrap_or((part, part));
            match (split_cell(start), split_cell(end)) {
                (Some((start_col, _)), Some((end_col, end_row))) if end_row < new_last_row => {
                    changed = true;
                    format!("{start_col}{FIRST_DATA_ROW}:{end_col}{new_last_row}")
                }
                _ => part.to_string(),
            }
        })
        .collect();

    changed.then(|| parts.join(" "))
}

/// Split `"AB12"` into `("AB", 12)`. Absolute markers are dropped.
fn split_cell(cell: &str) -> Option<(String, u32)> {
    let cell = cell.replace('$', "");
    let digits = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, number) = cell.split_at(digits);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((letters.to_ascii_uppercase(), number.parse().ok()?))
}

/// Column letters for a 1-based index (1 → A, 27 → AA).
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn cell_name(col: u32, row: u32) -> String {
    format!("{}{}", column_letters(col), row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use umya_spreadsheet::structs::{
        ConditionalFormatValues, ConditionalFormatting, ConditionalFormattingRule,
        SequenceOfReferences, TableColumn,
    };

    fn add_conditional_format(sheet: &mut Worksheet, sqref: &str) {
        let mut rule = ConditionalFormattingRule::default();
        rule.set_type(ConditionalFormatValues::Expression);
        let mut references = SequenceOfReferences::default();
        references.set_sqref(sqref);
        let mut formatting = ConditionalFormatting::default();
        formatting.set_sequence_of_references(references);
        formatting.add_conditional_collection(rule);
        sheet.add_conditional_formatting_collection(formatting);
    }

    fn sqrefs(sheet: &Worksheet) -> Vec<String> {
        sheet
            .get_conditional_formatting_collection()
            .iter()
            .map(|cf| cf.get_sequence_of_references().get_sqref())
            .collect()
    }

    fn sheet_with_table(book: &mut umya_spreadsheet::Spreadsheet) -> &mut Worksheet {
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.get_cell_mut("A1").set_value("LOAD");
        sheet.get_cell_mut("B1").set_value("PESO");
        sheet.get_cell_mut("A2").set_value("L1");
        sheet.get_cell_mut("B2").set_value_number(3);
        sheet.get_cell_mut("A3").set_value("L2");
        sheet.get_cell_mut("B3").set_value_number(4);

        let mut table = Table::new("Seguimento", ("A1", "B3"));
        table.add_column(TableColumn::new("LOAD"));
        table.add_column(TableColumn::new("PESO"));
        table.set_style_info(Some(TableStyleInfo::new(
            "TableStyleMedium2",
            false,
            false,
            true,
            false,
        )));
        sheet.add_table(table);
        sheet
    }

    #[test]
    fn test_capture_table() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = sheet_with_table(&mut book);

        let region = capture_table(sheet).unwrap();
        assert_eq!(region.name, "Seguimento");
        assert_eq!(region.top_left, (1, 1));
        assert_eq!(region.bottom_right, (2, 3));
        assert_eq!(region.range(), "A1:B3");
        assert!(region.header_row);

        let style = region.style.unwrap();
        assert_eq!(style.name, "TableStyleMedium2");
        assert!(style.show_row_stripes);
        assert!(!style.show_first_column);
        assert!(!style.show_column_stripes);
    }

    #[test]
    fn test_capture_without_table() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        assert!(capture_table(sheet).is_none());
    }

    #[test]
    fn test_extend_table_keeps_style() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = sheet_with_table(&mut book);
        let region = capture_table(sheet).unwrap();

        let range = extend_table(sheet, &region, 7).unwrap();
        assert_eq!(range, "A1:B7");

        let table = &sheet.get_tables()[0];
        let (from, to) = table.get_area();
        assert_eq!((*from.get_col_num(), *from.get_row_num()), (1, 1));
        assert_eq!((*to.get_col_num(), *to.get_row_num()), (2, 7));
        assert_eq!(
            table.get_style_info().map(|s| s.get_name().to_string()),
            Some("TableStyleMedium2".to_string())
        );
    }

    #[test]
    fn test_extend_table_never_shrinks() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = sheet_with_table(&mut book);
        let region = capture_table(sheet).unwrap();

        assert_eq!(extend_table(sheet, &region, 2).as_deref(), Some("A1:B3"));
    }

    #[test]
    fn test_extend_table_missing() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        let region = TableRegion::new("Gone", (1, 1), (3, 4));
        assert!(extend_table(sheet, &region, 10).is_none());
    }

    #[test]
    fn test_extend_conditional_formatting() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = sheet_with_table(&mut book);
        add_conditional_format(sheet, "C2:D2");
        add_conditional_format(sheet, "A2:A40");
        add_conditional_format(sheet, "B:B");

        assert_eq!(extend_conditional_formatting(sheet, 5), 1);
        assert_eq!(sqrefs(sheet), ["C2:D5", "A2:A40", "B:B"]);
        assert_eq!(
            sheet.get_conditional_formatting_collection()[0]
                .get_conditional_collection()
                .len(),
            1
        );
    }

    #[test]
    fn test_extend_conditional_formatting_none() {
        let mut book = umya_spreadsheet::new_file();
        let sheet = sheet_with_table(&mut book);
        assert_eq!(extend_conditional_formatting(sheet, 5), 0);
        assert!(sqrefs(sheet).is_empty());
    }

    #[test]
    fn test_extend_sqref() {
        assert_eq!(extend_sqref("C2:AB10", 15).as_deref(), Some("C2:AB15"));
        assert_eq!(extend_sqref("A1:Z2", 5).as_deref(), Some("A2:Z5"));
        assert_eq!(extend_sqref("D4", 9).as_deref(), Some("D2:D9"));
        assert_eq!(
            extend_sqref("A2:A10 C2:C3", 12).as_deref(),
            Some("A2:A12 C2:C12")
        );
        // Already covering the new rows.
        assert_eq!(extend_sqref("A2:A50", 12), None);
        // Whole columns carry no row to extend.
        assert_eq!(extend_sqref("A:A", 12), None);
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(28), "AB");
        assert_eq!(column_letters(702), "ZZ");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn test_split_cell() {
        assert_eq!(split_cell("AB12"), Some(("AB".to_string(), 12)));
        assert_eq!(split_cell("$c$3"), Some(("C".to_string(), 3)));
        assert_eq!(split_cell("12"), None);
        assert_eq!(split_cell("A"), None);
    }
}
