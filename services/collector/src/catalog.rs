//! Source catalog: which datasets exist, where they live and how to read them.
//!
//! The built-in catalog covers the six dashboard datasets. A JSON file with
//! the same shape (see `config/sources.json`) can replace it.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Content host shared by every built-in source.
pub const BASE_URL: &str = "https://raw.githubusercontent.com/Veto1oox/GroupProjEEP105/main/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Csv,
    Workbook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    pub kind: DatasetKind,
    /// Dataset category key, e.g. `emissions` or `temperature`.
    pub category: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub version: String,
    pub sources: Vec<Source>,
}

fn builtin_source(
    id: &str,
    title: &str,
    description: &str,
    file: &str,
    kind: DatasetKind,
    category: &str,
    enabled: bool,
) -> Source {
    Source {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        url: format!("{BASE_URL}{file}"),
        kind,
        category: category.to_string(),
        enabled,
    }
}

impl SourcesConfig {
    pub fn builtin() -> Self {
        use DatasetKind::{Csv, Workbook};
        Self {
            version: "builtin".to_string(),
            sources: vec![
                builtin_source(
                    "co2",
                    "Global CO₂ Emissions (Fossil + Land Use)",
                    "Annual CO₂ emissions by country",
                    "co2-fossil-plus-land-use.csv",
                    Csv,
                    "emissions",
                    true,
                ),
                builtin_source(
                    "gdp",
                    "Global GDP",
                    "GDP by country and year",
                    "glb_gdp.csv",
                    Csv,
                    "gdp",
                    true,
                ),
                builtin_source(
                    "energy",
                    "Energy Use",
                    "Energy consumption, summed by year",
                    "ene_cosp.csv",
                    Csv,
                    "energy",
                    true,
                ),
                builtin_source(
                    "temperature",
                    "Pakistan Min/Max Temperature",
                    "Temperature measures, averaged by year",
                    "pak_min_max_temp.xlsx",
                    Workbook,
                    "temperature",
                    true,
                ),
                builtin_source(
                    "disasters",
                    "Reported Disasters: Pakistan, India, Iran",
                    "Disaster counts, summed by year",
                    "pak_ind_irn_disasters.xlsx",
                    Workbook,
                    "disasters",
                    true,
                ),
                builtin_source(
                    "co2-per-capita",
                    "CO₂ Emissions per Capita (consumption based)",
                    "Listed as a data source; not shown as a section",
                    "co2_pcap_cons.csv",
                    Csv,
                    "emissions",
                    false,
                ),
            ],
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read sources config {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse sources config")
    }

    /// Load from `path` when given, otherwise the built-in catalog.
    pub async fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p).await,
            None => Ok(Self::builtin()),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter().filter(|s| s.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_six_sources_on_one_host() {
        let config = SourcesConfig::builtin();
        assert_eq!(config.sources.len(), 6);
        assert!(config.sources.iter().all(|s| s.url.starts_with(BASE_URL)));

        let csv = config.sources.iter().filter(|s| s.kind == DatasetKind::Csv).count();
        let xlsx = config.sources.iter().filter(|s| s.kind == DatasetKind::Workbook).count();
        assert_eq!((csv, xlsx), (4, 2));
    }

    #[test]
    fn test_enabled_sections() {
        let config = SourcesConfig::builtin();
        let ids: Vec<&str> = config.enabled().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["co2", "gdp", "energy", "temperature", "disasters"]);
    }

    #[test]
    fn test_find() {
        let config = SourcesConfig::builtin();
        assert_eq!(config.find("temperature").unwrap().kind, DatasetKind::Workbook);
        assert!(config.find("missing").is_none());
    }

    #[test]
    fn test_from_json_defaults_enabled() {
        let json = r#"{
            "version": "1",
            "sources": [
                {"id": "x", "title": "X", "url": "https://example.org/x.csv", "kind": "csv", "category": "gdp"}
            ]
        }"#;
        let config = SourcesConfig::from_json(json).unwrap();
        assert!(config.sources[0].enabled);
        assert_eq!(config.sources[0].description, "");
    }

    #[test]
    fn test_from_json_rejects_unknown_kind() {
        let json = r#"{"version": "1", "sources": [
            {"id": "x", "title": "X", "url": "u", "kind": "parquet", "category": "gdp"}
        ]}"#;
        assert!(SourcesConfig::from_json(json).is_err());
    }
}
