//! Collector CLI - downloads dataset resources and reports what came back
//!
//! Usage:
//!   # List configured sources:
//!   cargo run --bin collector -- --list
//!
//!   # Single URL:
//!   cargo run --bin collector -- --url https://...
//!
//!   # Every enabled source (built-in catalog or --config file):
//!   cargo run --bin collector -- --config config/sources.json
//!
//!   # One source from the catalog:
//!   cargo run --bin collector -- --source-id co2

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use collector::{Config, Fetcher, HttpTransport, Source, SourcesConfig};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "collector", about = "Fetches dataset resources from public sources")]
struct Args {
    /// Source identifier from the catalog
    #[arg(long)]
    source_id: Option<String>,

    /// URL to fetch (single-URL mode)
    #[arg(long)]
    url: Option<String>,

    /// Path to a sources config file (overrides SOURCES_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the catalog and exit
    #[arg(long, default_value = "false")]
    list: bool,

    /// Include disabled sources in batch mode
    #[arg(long, default_value = "false")]
    all: bool,
}

/// Print summary of available sources
fn print_sources_summary(sources_config: &SourcesConfig) {
    println!("\nConfigured sources ({}):", sources_config.version);
    println!("{:-<60}", "");
    for source in &sources_config.sources {
        let status = if source.enabled { "✓" } else { "✗" };
        println!(
            "  {} {} - {} [{:?}, {}]",
            status, source.id, source.title, source.kind, source.category
        );
        println!("      {}", source.url);
    }
    println!("{:-<60}", "");
}

async fn collect(fetcher: &Fetcher, sources: &[&Source]) -> (usize, usize) {
    let mut collected = 0;
    let mut failed = 0;

    for source in sources {
        println!("\n[{}] {}", source.id, source.title);
        match fetcher.fetch(&source.url).await {
            Ok(resource) => {
                println!("  ✓ {} bytes, {}", resource.size_bytes, resource.content_hash);
                if let Some(ct) = &resource.content_type {
                    println!("    content-type: {}", ct);
                }
                collected += 1;
            }
            Err(e) => {
                eprintln!("  ✗ Failed: {}", e);
                failed += 1;
            }
        }
    }

    (collected, failed)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if args.config.is_some() {
        config.sources_config = args.config.clone();
    }

    println!("=== ecodash Collector ===");

    let sources_config = SourcesConfig::load_or_builtin(config.sources_config.as_deref()).await?;

    if args.list {
        print_sources_summary(&sources_config);
        return Ok(());
    }

    let transport = HttpTransport::new(&config).context("Failed to build HTTP client")?;
    let fetcher = Fetcher::new(transport);

    if let Some(url) = &args.url {
        println!("URL: {}", url);
        let resource = fetcher.fetch(url).await?;
        println!("\n=== Collection Complete ===");
        println!("Size: {} bytes", resource.size_bytes);
        println!("Hash: {}", resource.content_hash);
        println!("Fetched at: {}", resource.fetched_at);
        return Ok(());
    }

    let sources: Vec<&Source> = sources_config
        .sources
        .iter()
        .filter(|s| match &args.source_id {
            Some(id) => &s.id == id,
            None => args.all || s.enabled,
        })
        .collect();

    if sources.is_empty() {
        print_sources_summary(&sources_config);
        anyhow::bail!("No sources match the filter criteria");
    }

    println!("Processing {} source(s)...", sources.len());
    let (collected, failed) = collect(&fetcher, &sources).await;

    println!("\n=== Collection Summary ===");
    println!("Collected: {}", collected);
    println!("Failed: {}", failed);

    if collected == 0 {
        anyhow::bail!("Every source failed to download");
    }

    Ok(())
}
