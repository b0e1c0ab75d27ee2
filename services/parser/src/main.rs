//! Parser CLI - parses a local dataset file and prints how it would be charted
//!
//! Usage:
//!   cargo run --bin parser -- --file data/co2.csv --category emissions
//!   cargo run --bin parser -- --file data/temp.xlsx --category temperature
//!   cargo run --bin parser -- --file data/gdp.csv --category gdp --entities World,China

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use parser::aggregate::{self, available_entities, default_entities, DISPLAY_ROW_CAP};
use parser::{parse_csv, parse_workbook, resolve_roles, DatasetCategory, PivotShape, PivotView, Table};
use tokio::fs;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Csv,
    Workbook,
}

#[derive(Parser, Debug)]
#[command(name = "parser", about = "Parses a dataset file into a chart-ready pivot")]
struct Args {
    /// Path to a CSV or spreadsheet file
    #[arg(long)]
    file: PathBuf,

    /// File kind (default: guessed from the extension)
    #[arg(long, value_enum)]
    kind: Option<Kind>,

    /// Dataset category: emissions, gdp, energy, temperature, disasters
    #[arg(long)]
    category: DatasetCategory,

    /// Comma-separated entity selection (default: built-in priority list)
    #[arg(long, value_delimiter = ',')]
    entities: Option<Vec<String>>,

    /// Print the pivot as JSON instead of a text summary
    #[arg(long, default_value = "false")]
    json: bool,
}

/// Detect if file is XLS/XLSX/ODS based on extension
fn guess_kind(path: &Path) -> Kind {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("xls" | "xlsx" | "xlsm" | "xlsb" | "ods") => Kind::Workbook,
        _ => Kind::Csv,
    }
}

fn print_pivot(pivot: &PivotView) {
    println!("\nPivot ({} rows x {} columns):", pivot.rows.len(), pivot.columns.len());
    println!("  {:>6} | {}", pivot.index, pivot.columns.join(" | "));
    for row in pivot.rows.iter().take(10) {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|v| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string()))
            .collect();
        println!("  {:>6} | {}", row.year, cells.join(" | "));
    }
    if pivot.rows.len() > 10 {
        println!("  ... and {} more", pivot.rows.len() - 10);
    }
}

fn print_table_summary(label: &str, table: &Table) {
    println!("\n{} ({} rows): {}", label, table.row_count(), table.columns().join(", "));
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).init();

    let args = Args::parse();

    println!("=== ecodash Parser ===");
    println!("File: {}", args.file.display());
    println!("Category: {}", args.category);

    let bytes = fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    println!("Content size: {} bytes", bytes.len());

    let table = match args.kind.unwrap_or_else(|| guess_kind(&args.file)) {
        Kind::Csv => parse_csv(&bytes).context("Failed to parse CSV")?,
        Kind::Workbook => parse_workbook(&bytes).context("Failed to parse workbook")?,
    };
    print_table_summary("Table", &table);

    if table.is_empty() {
        println!("Table has no rows - nothing to chart");
        return Ok(());
    }

    let category = args.category;
    let roles = resolve_roles(&table, category.candidates());

    println!("\nColumn mapping:");
    println!("  Entity: {:?}", roles.entity);
    println!("  Year:   {:?}", roles.year);
    println!("  Value:  {:?}", roles.value);

    let missing = roles.missing(category.required_roles());
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|r| r.to_string()).collect();
        println!("\nExpected columns not found ({}); raw display only.", names.join(", "));
        print_table_summary("First rows", &table.head(DISPLAY_ROW_CAP));
        return Ok(());
    }

    let selection = match (&args.entities, roles.entity.as_deref()) {
        (Some(chosen), _) => chosen.clone(),
        (None, Some(entity_col)) => default_entities(&available_entities(&table, entity_col)),
        (None, None) => Vec::new(),
    };
    if category.shape() == PivotShape::EntityYear {
        println!("Selection: {:?}", selection);
    }

    let pivot = aggregate::aggregate(&table, &roles, category.shape(), &selection, category.reducer())
        .context("Required roles unbound")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&pivot)?);
    } else {
        print_pivot(&pivot);
    }

    print_table_summary(
        "Display rows",
        &aggregate::display_rows(&table, &roles, category.shape(), &selection),
    );

    println!("\n=== Parsing Complete ===");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_kind() {
        assert!(matches!(guess_kind(Path::new("a/b.xlsx")), Kind::Workbook));
        assert!(matches!(guess_kind(Path::new("b.XLS")), Kind::Workbook));
        assert!(matches!(guess_kind(Path::new("b.csv")), Kind::Csv));
        assert!(matches!(guess_kind(Path::new("noext")), Kind::Csv));
    }
}
