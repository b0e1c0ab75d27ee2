//! Dashboard sections: Fetch -> Parse -> Normalize -> Aggregate for one
//! source, with every failure absorbed into the report.
//!
//! Building a section never returns an error. A download or parse failure
//! gives an `unavailable` report with a warning notice; missing columns give
//! a `raw_only` report with the first rows of the table.

use collector::{DatasetKind, Fetcher, Source, Transport};
use futures::future::join_all;
use parser::aggregate::{
    aggregate, available_entities, default_entities, display_rows, DISPLAY_ROW_CAP,
};
use parser::{
    parse_csv, parse_workbook, resolve_roles, DatasetCategory, PivotShape, PivotView, Role, Table,
};
use serde::Serialize;
use tracing::{info, warn};

pub const SCHEMA_MISMATCH_NOTICE: &str =
    "Displayed first rows because expected columns were not found.";
pub const EMPTY_SELECTION_NOTICE: &str = "Select at least one country to view the time series.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    /// Chart and table available.
    Ready,
    /// Expected columns missing; raw rows only.
    RawOnly,
    /// Nothing could be loaded.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityOptions {
    pub available: Vec<String>,
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub id: String,
    pub title: String,
    pub category: Option<DatasetCategory>,
    pub status: SectionStatus,
    pub notices: Vec<Notice>,
    pub entities: Option<EntityOptions>,
    pub chart: Option<PivotView>,
    pub table: Option<Table>,
}

impl SectionReport {
    fn new(source: &Source, category: Option<DatasetCategory>) -> Self {
        Self {
            id: source.id.clone(),
            title: source.title.clone(),
            category,
            status: SectionStatus::Ready,
            notices: Vec::new(),
            entities: None,
            chart: None,
            table: None,
        }
    }

    fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    fn unavailable(mut self, message: String) -> Self {
        self.status = SectionStatus::Unavailable;
        self.notice(NoticeLevel::Warning, message);
        self
    }

    fn raw_only(mut self, table: &Table, message: impl Into<String>) -> Self {
        self.status = SectionStatus::RawOnly;
        self.table = Some(table.head(DISPLAY_ROW_CAP));
        self.notice(NoticeLevel::Info, message);
        self
    }
}

/// Which entities the caller wants charted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Up to three entities from the built-in priority list.
    Default,
    Explicit(Vec<String>),
}

impl Selection {
    /// `None` means default; `Some("")` is an explicit empty selection.
    pub fn from_query(entities: Option<&str>) -> Self {
        match entities {
            None => Selection::Default,
            Some(list) => Selection::Explicit(
                list.split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

fn kind_label(kind: DatasetKind) -> &'static str {
    match kind {
        DatasetKind::Csv => "CSV",
        DatasetKind::Workbook => "Excel",
    }
}

/// Build one section. Never fails; see module docs.
pub async fn build_section<T: Transport>(
    fetcher: &Fetcher<T>,
    source: &Source,
    selection: &Selection,
) -> SectionReport {
    let category = source.category.parse::<DatasetCategory>();
    let report = SectionReport::new(source, category.as_ref().ok().copied());
    let label = kind_label(source.kind);

    let resource = match fetcher.fetch(&source.url).await {
        Ok(r) => r,
        Err(e) => {
            warn!(section = %source.id, error = %e, "fetch failed");
            return report.unavailable(format!("Could not load {} from {}: {}", label, source.url, e));
        }
    };

    let parsed = match source.kind {
        DatasetKind::Csv => parse_csv(&resource.bytes),
        DatasetKind::Workbook => parse_workbook(&resource.bytes),
    };
    let table = match parsed {
        Ok(t) => t,
        Err(e) => {
            warn!(section = %source.id, error = %e, "parse failed");
            return report.unavailable(format!("Could not load {} from {}: {}", label, source.url, e));
        }
    };

    match category {
        Ok(category) => shape_section(report, &table, category, selection),
        Err(e) => {
            warn!(section = %source.id, error = %e, "no shaping rules for category");
            report.raw_only(&table, format!("{}; showing raw rows.", e))
        }
    }
}

/// Normalize and aggregate an already-parsed table into the report.
fn shape_section(
    mut report: SectionReport,
    table: &Table,
    category: DatasetCategory,
    selection: &Selection,
) -> SectionReport {
    if table.is_empty() {
        return report.unavailable("Dataset contains no rows.".to_string());
    }

    let roles = resolve_roles(table, category.candidates());
    let missing = roles.missing(category.required_roles());
    if !missing.is_empty() {
        let missing: Vec<String> = missing.iter().map(Role::to_string).collect();
        warn!(section = %report.id, missing = ?missing, "expected columns not found");
        return report.raw_only(table, SCHEMA_MISMATCH_NOTICE);
    }

    let shape = category.shape();
    let entities = match (shape, roles.entity.as_deref()) {
        (PivotShape::EntityYear, Some(entity)) => {
            let available = available_entities(table, entity);
            let selected = match selection {
                Selection::Default => default_entities(&available),
                Selection::Explicit(chosen) => {
                    let mut selected: Vec<String> = Vec::new();
                    for name in chosen {
                        if available.contains(name) && !selected.contains(name) {
                            selected.push(name.clone());
                        }
                    }
                    selected
                }
            };
            Some(EntityOptions { available, selected })
        }
        _ => None,
    };
    let selected = entities.as_ref().map(|e| e.selected.as_slice()).unwrap_or_default();

    // Required roles are all bound at this point.
    let Some(pivot) = aggregate(table, &roles, shape, selected, category.reducer()) else {
        return report.raw_only(table, SCHEMA_MISMATCH_NOTICE);
    };
    info!(
        section = %report.id,
        columns = pivot.columns.len(),
        years = pivot.rows.len(),
        "pivot built"
    );

    match shape {
        PivotShape::EntityYear if selected.is_empty() => {
            report.notice(NoticeLevel::Info, EMPTY_SELECTION_NOTICE);
            report.chart = Some(pivot);
        }
        PivotShape::EntityYear => {
            report.table = Some(display_rows(table, &roles, shape, selected));
            report.chart = Some(pivot);
        }
        PivotShape::YearOnly => {
            // No numeric columns means nothing to chart; the table still shows.
            if !pivot.columns.is_empty() {
                report.chart = Some(pivot);
            }
            report.table = Some(display_rows(table, &roles, shape, selected));
        }
    }
    report.entities = entities;

    report
}

/// Build every given section concurrently with default selections.
pub async fn build_dashboard<'a, T: Transport>(
    fetcher: &Fetcher<T>,
    sources: impl IntoIterator<Item = &'a Source>,
) -> Vec<SectionReport> {
    let selection = Selection::Default;
    join_all(
        sources
            .into_iter()
            .map(|source| build_section(fetcher, source, &selection)),
    )
    .await
}
