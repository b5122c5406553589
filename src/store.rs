use crate::error::{FeverError, Result};
use crate::{fmt_temp, LogRecord, DT_FORMAT};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Workbook};
use std::path::Path;

pub const COL_DATETIME: &str = "Date & Time";
pub const COL_TEMPERATURE: &str = "Temperature (°F)";
pub const COL_FEELING: &str = "Feeling";
pub const COL_MEDICINE: &str = "Medicine";
pub const COL_NOTES: &str = "Additional Notes";

pub const COLUMNS: [&str; 5] = [
    COL_DATETIME,
    COL_TEMPERATURE,
    COL_FEELING,
    COL_MEDICINE,
    COL_NOTES,
];

/// extra characters added to the longest value of each column
pub const COLUMN_PADDING: usize = 4;

const HEADER_FILL: u32 = 0xFFD700;

/// One spreadsheet cell as it is kept between read and rewrite.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Empty => None,
        }
    }

    fn from_data(d: &Data) -> Cell {
        match d {
            Data::Empty => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            other => Cell::Text(other.to_string()),
        }
    }

    fn text(s: &str) -> Cell {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", fmt_temp(*n)),
        }
    }
}

/// The whole store: header row and data rows, in file order.
/// Every row has exactly `header.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

impl Table {
    /// empty store with the fixed header
    pub fn new() -> Table {
        Table {
            header: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Reads the first worksheet; the first row is the header.
    /// Data beyond the last labeled column gets an unnamed header cell,
    /// so that a rewrite keeps it.
    /// A sheet without any cell gives an empty header and no rows.
    pub fn read(path: &Path) -> Result<Table> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(FeverError::NoWorksheet)??;
        let width = range.width();
        let mut rows = range.rows();
        let mut header: Vec<String> = match rows.next() {
            Some(r) => r.iter().map(|d| Cell::from_data(d).to_string()).collect(),
            None => Vec::new(),
        };
        let rows: Vec<Vec<Cell>> = rows
            .map(|r| {
                let mut cells: Vec<Cell> = r.iter().map(Cell::from_data).collect();
                cells.resize(width, Cell::Empty);
                cells
            })
            .filter(|cells| cells.iter().any(|c| *c != Cell::Empty))
            .collect();
        header.resize(width, String::new());
        let unnamed = header.iter().filter(|h| h.is_empty()).count();
        if unnamed > 0 && !rows.is_empty() {
            tracing::warn!(
                path = %path.display(),
                columns = unnamed,
                "store has unnamed columns, keeping them"
            );
        }
        tracing::debug!(path = %path.display(), rows = rows.len(), "read store");
        Ok(Table { header, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// returns the column index, appending the column if absent
    fn ensure_column(&mut self, name: &str) -> usize {
        match self.column_index(name) {
            Some(i) => i,
            None => {
                self.header.push(name.to_string());
                for row in self.rows.iter_mut() {
                    row.push(Cell::Empty);
                }
                self.header.len() - 1
            }
        }
    }

    /// Appends the record as the last row, placing each field by column name.
    pub fn push_record(&mut self, record: &LogRecord) {
        let fields = [
            (COL_DATETIME, Cell::Text(record.timestamp.format(DT_FORMAT).to_string())),
            (COL_TEMPERATURE, Cell::Number(record.temperature)),
            (COL_FEELING, Cell::text(&record.feeling)),
            (COL_MEDICINE, Cell::text(&record.medicine)),
            (COL_NOTES, Cell::text(&record.notes)),
        ];
        let indices: Vec<usize> = fields.iter().map(|(n, _)| self.ensure_column(n)).collect();
        let mut row = vec![Cell::Empty; self.header.len()];
        for (i, (_, cell)) in indices.into_iter().zip(fields.iter()) {
            row[i] = cell.clone();
        }
        self.rows.push(row);
    }

    /// Width of each column: longest stringified value, header included, plus padding.
    pub fn column_widths(&self) -> Vec<usize> {
        self.header
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let longest = self
                    .rows
                    .iter()
                    .map(|r| r[i].to_string().chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0);
                longest + COLUMN_PADDING
            })
            .collect()
    }

    /// Overwrites `path` with the whole table, styling the header row
    /// and sizing every column to its content.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let header_format = header_format();
        for (c, h) in self.header.iter().enumerate() {
            sheet.write_string_with_format(0, c as u16, h.as_str(), &header_format)?;
        }
        for (r, row) in self.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) => {
                        sheet.write_string(r, c as u16, s.as_str())?;
                    }
                    Cell::Number(n) => {
                        sheet.write_number(r, c as u16, *n)?;
                    }
                }
            }
        }
        for (c, w) in self.column_widths().into_iter().enumerate() {
            sheet.set_column_width(c as u16, w as f64)?;
        }
        workbook.save(path)?;
        tracing::debug!(path = %path.display(), rows = self.rows.len(), "wrote store");
        Ok(())
    }
}

pub fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, temperature: f64, feeling: &str) -> LogRecord {
        LogRecord {
            timestamp: NaiveDate::from_ymd_opt(2026, 1, day)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
            temperature,
            feeling: feeling.to_string(),
            medicine: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn push_record_places_fields_by_name() {
        let mut t = Table::new();
        t.push_record(&record(2, 98.6, "tired"));
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0][0], Cell::Text("02-Jan-2026 09:05 AM".to_string()));
        assert_eq!(t.rows[0][1], Cell::Number(98.6));
        assert_eq!(t.rows[0][2], Cell::Text("tired".to_string()));
        assert_eq!(t.rows[0][3], Cell::Empty);
    }

    #[test]
    fn push_record_keeps_foreign_columns() {
        let mut t = Table {
            header: vec!["Temperature (°F)".to_string(), "Pulse".to_string()],
            rows: vec![vec![Cell::Number(99.0), Cell::Number(72.0)]],
        };
        t.push_record(&record(3, 100.0, ""));
        assert_eq!(t.header.len(), 6);
        assert_eq!(t.header[1], "Pulse");
        assert_eq!(t.rows[0], vec![
            Cell::Number(99.0),
            Cell::Number(72.0),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty
        ]);
        assert_eq!(t.rows[1][0], Cell::Number(100.0));
        assert_eq!(t.rows[1][1], Cell::Empty);
    }

    #[test]
    fn column_widths_use_longest_value_plus_padding() {
        let mut t = Table::new();
        t.push_record(&record(2, 101.0, "very tired today"));
        let w = t.column_widths();
        // "02-Jan-2026 09:05 AM" is 20 chars
        assert_eq!(w[0], 20 + COLUMN_PADDING);
        // header "Temperature (°F)" is longer than "101.0"
        assert_eq!(w[1], 16 + COLUMN_PADDING);
        assert_eq!(w[2], 16 + COLUMN_PADDING);
        assert_eq!(w[3], "Medicine".len() + COLUMN_PADDING);
    }

    #[test]
    fn column_widths_are_stable() {
        let mut t = Table::new();
        t.push_record(&record(2, 98.6, "ok"));
        assert_eq!(t.column_widths(), t.clone().column_widths());
    }

    #[test]
    fn cell_numbers_display_with_one_decimal_when_whole() {
        assert_eq!(Cell::Number(101.0).to_string(), "101.0");
        assert_eq!(Cell::Number(98.6).to_string(), "98.6");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn cell_as_f64_coerces_text() {
        assert_eq!(Cell::Text(" 99.5 ".to_string()).as_f64(), Some(99.5));
        assert_eq!(Cell::Text("high".to_string()).as_f64(), None);
        assert_eq!(Cell::Empty.as_f64(), None);
    }

    #[test]
    fn unnamed_columns_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hand_edited.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, COL_DATETIME).unwrap();
        sheet.write_string(0, 1, COL_TEMPERATURE).unwrap();
        sheet.write_string(1, 0, "01-Jan-2026 08:00 AM").unwrap();
        sheet.write_number(1, 1, 99.2).unwrap();
        sheet.write_string(1, 3, "pulse 88").unwrap();
        workbook.save(&path).unwrap();

        let mut t = Table::read(&path).unwrap();
        assert_eq!(t.header.len(), 4);
        assert_eq!(t.rows[0][3], Cell::Text("pulse 88".to_string()));
        t.push_record(&record(2, 100.1, ""));
        t.write(&path).unwrap();

        let again = Table::read(&path).unwrap();
        assert_eq!(again.rows.len(), 2);
        assert_eq!(again.rows[0][3], Cell::Text("pulse 88".to_string()));
        assert_eq!(again.rows[1][again.column_index(COL_TEMPERATURE).unwrap()], Cell::Number(100.1));
    }
}
