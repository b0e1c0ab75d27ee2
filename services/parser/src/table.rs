//! Untyped rectangular table produced by the CSV and workbook loaders.
//!
//! Cells keep whatever the source gave us. Whether a column is numeric is
//! decided at aggregation time from its contents, not stored here.

use serde::Serialize;

/// Markers read as missing values (the common CSV null spellings).
pub const NA_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A", "#NA", "-nan", "-NaN",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Spreadsheet date or time, as ISO text. Never numeric.
    DateTime(String),
}

impl Cell {
    /// Build a cell from raw CSV text. Null markers become [`Cell::Empty`].
    pub fn from_text(raw: &str) -> Self {
        if NA_MARKERS.contains(&raw.trim()) {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric value of the cell, if it has one. Text is parsed; booleans
    /// count as 0 and 1.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Int(i) => *i as f64,
            Cell::Float(f) => *f,
            Cell::Bool(b) => f64::from(u8::from(*b)),
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::DateTime(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Integral year value (`1990`, `1990.0`, `"1990"`).
    pub fn as_year(&self) -> Option<i64> {
        if matches!(self, Cell::Bool(_)) {
            return None;
        }
        let value = self.as_f64()?;
        (value.fract() == 0.0).then_some(value as i64)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, normalizing header names and padding/truncating rows
    /// to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns = normalize_headers(columns);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// No data rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// A column is numeric when every non-empty cell parses as a number and
    /// at least one does.
    pub fn is_numeric_column(&self, col: usize) -> bool {
        let mut seen_number = false;
        for row in &self.rows {
            let cell = &row[col];
            if cell.is_empty() {
                continue;
            }
            if cell.as_f64().is_none() {
                return false;
            }
            seen_number = true;
        }
        seen_number
    }

    pub fn numeric_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&c| self.is_numeric_column(c))
            .collect()
    }

    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn tail(&self, n: usize) -> Table {
        let skip = self.rows.len().saturating_sub(n);
        Table {
            columns: self.columns.clone(),
            rows: self.rows[skip..].to_vec(),
        }
    }

    /// Keep only the named columns, in the given order. `None` if any is missing.
    pub fn select(&self, names: &[&str]) -> Option<Table> {
        let indices: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<_>>()?;
        Some(Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Keep rows matching `keep`, preserving order.
    pub fn filter_rows(&self, mut keep: impl FnMut(&[Cell]) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r.as_slice())).cloned().collect(),
        }
    }

    pub(crate) fn sort_rows_by(
        &mut self,
        mut compare: impl FnMut(&[Cell], &[Cell]) -> std::cmp::Ordering,
    ) {
        self.rows.sort_by(|a, b| compare(a, b));
    }
}

/// Blank headers become `Unnamed: <index>`; repeated names get `.1`, `.2`, ...
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{}.{}", base, n);
            n += 1;
        }
        out.push(candidate);
    }
    out
}
