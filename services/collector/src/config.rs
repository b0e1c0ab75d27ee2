use std::path::PathBuf;

/// HTTP and catalog settings shared by the collector CLI and the API.
#[derive(Debug, Clone)]
pub struct Config {
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub sources_config: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout_secs: 120,
            user_agent: "ecodash/0.1".to_string(),
            sources_config: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            user_agent: std::env::var("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            sources_config: std::env::var("SOURCES_CONFIG").ok().map(PathBuf::from),
        }
    }
}
