//! Grouping and pivoting into chart-ready views.
//!
//! No interpolation and no gap filling: a (year, column) pair with no numeric
//! input is simply absent (`None`). Rows whose year is not an integral number
//! never reach a pivot.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::category::PivotShape;
use crate::roles::RoleMapping;
use crate::table::{Cell, Table};

/// Rows shown in any table view.
pub const DISPLAY_ROW_CAP: usize = 1000;

/// Entities preselected when present in the data, in priority order.
pub const DEFAULT_ENTITY_PRIORITY: &[&str] = &["World", "United States", "China", "India", "Pakistan"];

pub const DEFAULT_ENTITY_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Sum,
    Mean,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn finish(self, reducer: Reducer) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(match reducer {
            Reducer::Sum => self.sum,
            Reducer::Mean => self.sum / self.count as f64,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub year: i64,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotView {
    /// Name of the year column the rows are keyed on.
    pub index: String,
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

impl PivotView {
    pub fn empty(index: &str) -> Self {
        Self {
            index: index.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn get(&self, year: i64, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|r| r.year == year)
            .and_then(|r| r.values[col])
    }
}

/// Distinct non-empty text entities, sorted.
pub fn available_entities(table: &Table, entity_col: &str) -> Vec<String> {
    let Some(idx) = table.column_index(entity_col) else {
        return Vec::new();
    };
    table
        .rows()
        .iter()
        .filter_map(|row| row[idx].as_text())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Up to [`DEFAULT_ENTITY_LIMIT`] entities from [`DEFAULT_ENTITY_PRIORITY`]
/// that exist in `available`. Empty when none match.
pub fn default_entities(available: &[String]) -> Vec<String> {
    DEFAULT_ENTITY_PRIORITY
        .iter()
        .filter(|candidate| available.iter().any(|a| a == *candidate))
        .take(DEFAULT_ENTITY_LIMIT)
        .map(|c| c.to_string())
        .collect()
}

fn is_selected(cell: &Cell, selection: &[String]) -> bool {
    cell.as_text()
        .is_some_and(|entity| selection.iter().any(|s| s == entity))
}

/// Rows = years, columns = selected entities that have data, cell = reducer
/// over the value column. Unknown columns or an empty selection give an
/// empty view.
pub fn pivot_by_entity(
    table: &Table,
    entity_col: &str,
    year_col: &str,
    value_col: &str,
    selection: &[String],
    reducer: Reducer,
) -> PivotView {
    let (Some(e), Some(y), Some(v)) = (
        table.column_index(entity_col),
        table.column_index(year_col),
        table.column_index(value_col),
    ) else {
        return PivotView::empty(year_col);
    };

    let mut groups: BTreeMap<(i64, String), Accumulator> = BTreeMap::new();
    for row in table.rows() {
        if !is_selected(&row[e], selection) {
            continue;
        }
        let (Some(year), Some(value)) = (row[y].as_year(), row[v].as_f64()) else {
            continue;
        };
        let entity = row[e].as_text().unwrap_or_default().to_string();
        groups.entry((year, entity)).or_default().push(value);
    }

    let columns: Vec<String> = groups
        .keys()
        .map(|(_, entity)| entity.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut rows: BTreeMap<i64, Vec<Option<f64>>> = BTreeMap::new();
    for ((year, entity), acc) in groups {
        let col = columns.iter().position(|c| *c == entity).unwrap_or_default();
        rows.entry(year).or_insert_with(|| vec![None; columns.len()])[col] = acc.finish(reducer);
    }

    PivotView {
        index: year_col.to_string(),
        columns,
        rows: rows
            .into_iter()
            .map(|(year, values)| PivotRow { year, values })
            .collect(),
    }
}

/// Rows = years, columns = every numeric column except the year column,
/// cell = reducer per year.
pub fn pivot_by_year(table: &Table, year_col: &str, reducer: Reducer) -> PivotView {
    let Some(y) = table.column_index(year_col) else {
        return PivotView::empty(year_col);
    };

    let numeric: Vec<usize> = table.numeric_columns().into_iter().filter(|&c| c != y).collect();

    let mut groups: BTreeMap<i64, Vec<Accumulator>> = BTreeMap::new();
    for row in table.rows() {
        let Some(year) = row[y].as_year() else {
            continue;
        };
        let accs = groups
            .entry(year)
            .or_insert_with(|| vec![Accumulator::default(); numeric.len()]);
        for (acc, &col) in accs.iter_mut().zip(&numeric) {
            if let Some(value) = row[col].as_f64() {
                acc.push(value);
            }
        }
    }

    PivotView {
        index: year_col.to_string(),
        columns: numeric.iter().map(|&c| table.columns()[c].clone()).collect(),
        rows: groups
            .into_iter()
            .map(|(year, accs)| PivotRow {
                year,
                values: accs.into_iter().map(|a| a.finish(reducer)).collect(),
            })
            .collect(),
    }
}

/// Dispatch on shape. `None` when a role the shape needs is unbound.
pub fn aggregate(
    table: &Table,
    roles: &RoleMapping,
    shape: PivotShape,
    selection: &[String],
    reducer: Reducer,
) -> Option<PivotView> {
    let year = roles.year.as_deref()?;
    match shape {
        PivotShape::EntityYear => {
            let entity = roles.entity.as_deref()?;
            let value = roles.value.as_deref()?;
            Some(pivot_by_entity(table, entity, year, value, selection, reducer))
        }
        PivotShape::YearOnly => Some(pivot_by_year(table, year, reducer)),
    }
}

/// Rows shown under the chart: the selected entity rows for entity×year
/// data, otherwise the first [`DISPLAY_ROW_CAP`] rows.
pub fn display_rows(
    table: &Table,
    roles: &RoleMapping,
    shape: PivotShape,
    selection: &[String],
) -> Table {
    match (
        shape,
        roles.entity.as_deref(),
        roles.year.as_deref(),
        roles.value.as_deref(),
    ) {
        (PivotShape::EntityYear, Some(entity), Some(year), Some(value)) => {
            filtered_rows(table, entity, year, value, selection)
        }
        _ => table.head(DISPLAY_ROW_CAP),
    }
}

fn compare_year(a: &Cell, b: &Cell) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `[entity, year, value]` rows for the selection, sorted by entity then
/// year, capped to the last [`DISPLAY_ROW_CAP`] rows.
pub fn filtered_rows(
    table: &Table,
    entity_col: &str,
    year_col: &str,
    value_col: &str,
    selection: &[String],
) -> Table {
    let Some(projected) = table.select(&[entity_col, year_col, value_col]) else {
        return Table::default();
    };
    let mut filtered = projected.filter_rows(|row| is_selected(&row[0], selection));
    filtered.sort_rows_by(|a, b| {
        a[0].as_text()
            .cmp(&b[0].as_text())
            .then_with(|| compare_year(&a[1], &b[1]))
    });
    filtered.tail(DISPLAY_ROW_CAP)
}
