//! Spreadsheet loading (xlsx, xls, xlsb, ods).
//!
//! Every sheet is parsed; exactly one table comes back. The choice is the
//! first sheet with data rows, else the first sheet. This can pick the wrong
//! sheet when an earlier, unrelated sheet has data.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use crate::error::ParseError;
use crate::table::{Cell, Table};

/// Parse workbook bytes and return the selected sheet's table.
pub fn parse_workbook(bytes: &[u8]) -> Result<Table, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        sheets.push((name, range_to_table(&range)));
    }

    let sheet_names: Vec<&str> = sheets.iter().map(|(n, _)| n.as_str()).collect();
    debug!(sheets = ?sheet_names, "workbook parsed");

    let (name, table) = select_sheet(sheets).ok_or(ParseError::NoSheets)?;
    debug!(
        sheet = %name,
        rows = table.row_count(),
        columns = table.column_count(),
        "sheet selected"
    );
    Ok(table)
}

/// First non-empty sheet, else the first sheet, else `None`.
pub fn select_sheet(sheets: Vec<(String, Table)>) -> Option<(String, Table)> {
    let idx = sheets
        .iter()
        .position(|(_, table)| !table.is_empty())
        .unwrap_or(0);
    sheets.into_iter().nth(idx)
}

/// First row is the header. Rows with no values at all are dropped.
fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_name).collect(),
        None => return Table::default(),
    };

    let data = rows
        .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    Table::new(headers, data)
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => format!("{}", other),
    }
}

fn cell_from_data(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::from_text(s),
        Data::DateTime(dt) => Cell::DateTime(
            dt.as_datetime()
                .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
                .unwrap_or_else(|| dt.as_f64().to_string()),
        ),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::DateTime(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{pivot_by_year, Reducer};
    use rust_xlsxwriter::{ExcelDateTime as XlsxDate, Format, Workbook};

    /// "Cover" sheet left blank, then "Data" with `year | recorded | count`.
    fn two_sheet_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("Cover").unwrap();

        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let data = workbook.add_worksheet();
        data.set_name("Data").unwrap();
        data.write_string(0, 0, "year").unwrap();
        data.write_string(0, 1, "recorded").unwrap();
        data.write_string(0, 2, "count").unwrap();
        for (row, (year, month, count)) in [(2000, 6, 1), (2000, 9, 1), (2001, 3, 4)]
            .into_iter()
            .enumerate()
        {
            let row = row as u32 + 1;
            let date = XlsxDate::from_ymd(year as u16, month, 1).unwrap();
            data.write_number(row, 0, year).unwrap();
            data.write_datetime_with_format(row, 1, &date, &date_format).unwrap();
            data.write_number(row, 2, count).unwrap();
        }

        workbook.save_to_buffer().unwrap()
    }

    fn sheet(name: &str, rows: usize) -> (String, Table) {
        let data = (0..rows)
            .map(|i| vec![Cell::Int(2000 + i as i64), Cell::Float(i as f64)])
            .collect();
        (
            name.to_string(),
            Table::new(vec!["year".into(), "count".into()], data),
        )
    }

    // -------------------------------------------------------------------------
    // SHEET SELECTION
    // -------------------------------------------------------------------------

    #[test]
    fn test_select_skips_empty_first_sheet() {
        let (name, table) = select_sheet(vec![sheet("Cover", 0), sheet("Data", 3)]).unwrap();
        assert_eq!(name, "Data");
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_select_prefers_first_non_empty() {
        let (name, _) =
            select_sheet(vec![sheet("Notes", 1), sheet("Data", 50)]).unwrap();
        assert_eq!(name, "Notes");
    }

    #[test]
    fn test_select_falls_back_to_first_sheet() {
        let (name, table) = select_sheet(vec![sheet("A", 0), sheet("B", 0)]).unwrap();
        assert_eq!(name, "A");
        assert!(table.is_empty());
    }

    #[test]
    fn test_select_no_sheets() {
        assert!(select_sheet(vec![]).is_none());
    }

    // -------------------------------------------------------------------------
    // RANGE CONVERSION
    // -------------------------------------------------------------------------

    #[test]
    fn test_range_to_table() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 2));
        range.set_value((0, 0), Data::String("year".into()));
        range.set_value((0, 1), Data::String("max_temp".into()));
        // (0, 2) left blank
        range.set_value((1, 0), Data::Float(1990.0));
        range.set_value((1, 1), Data::Float(31.5));
        range.set_value((1, 2), Data::String("x".into()));
        // row 2 entirely empty
        range.set_value((3, 0), Data::Int(1991));
        range.set_value((3, 1), Data::Error(calamine::CellErrorType::Div0));

        let table = range_to_table(&range);

        assert_eq!(table.columns(), &["year", "max_temp", "Unnamed: 2"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0][1], Cell::Float(31.5));
        assert_eq!(table.rows()[1][0], Cell::Int(1991));
        assert_eq!(table.rows()[1][1], Cell::Empty);
    }

    #[test]
    fn test_header_only_range_is_empty() {
        let mut range: Range<Data> = Range::new((0, 0), (0, 1));
        range.set_value((0, 0), Data::String("year".into()));
        range.set_value((0, 1), Data::String("count".into()));
        assert!(range_to_table(&range).is_empty());
    }

    #[test]
    fn test_numeric_headers() {
        assert_eq!(header_name(&Data::Float(1990.0)), "1990");
        assert_eq!(header_name(&Data::Int(7)), "7");
    }

    #[test]
    fn test_dates_kept_as_iso_text() {
        assert_eq!(
            cell_from_data(&Data::DateTimeIso("2000-06-01".into())),
            Cell::DateTime("2000-06-01".into())
        );
    }

    // -------------------------------------------------------------------------
    // WORKBOOK BYTES
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_workbook_skips_empty_first_sheet() {
        let table = parse_workbook(&two_sheet_workbook()).unwrap();

        assert_eq!(table.columns(), &["year", "recorded", "count"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows()[2][0].as_year(), Some(2001));
        assert_eq!(table.rows()[2][2].as_f64(), Some(4.0));
    }

    #[test]
    fn test_workbook_dates_are_not_charted() {
        let table = parse_workbook(&two_sheet_workbook()).unwrap();
        assert!(matches!(&table.rows()[0][1], Cell::DateTime(d) if d.starts_with("2000-06-01")));

        let pivot = pivot_by_year(&table, "year", Reducer::Sum);

        assert_eq!(pivot.columns, vec!["count"]);
        assert_eq!(pivot.get(2000, "count"), Some(2.0));
        assert_eq!(pivot.get(2001, "count"), Some(4.0));
    }

    // -------------------------------------------------------------------------
    // FAILURES
    // -------------------------------------------------------------------------

    #[test]
    fn test_garbage_bytes_fail() {
        assert!(parse_workbook(b"definitely not a spreadsheet").is_err());
    }

    #[test]
    fn test_empty_bytes_fail() {
        assert!(parse_workbook(b"").is_err());
    }
}
