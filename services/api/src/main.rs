//! API Service - dashboard sections for the ecodash catalog
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /sources - Dataset catalog
//! - GET /sections/:id?entities= - One section, optionally with an entity selection
//! - GET /dashboard - Every enabled section with default selections

mod sections;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use collector::{Config, Fetcher, HttpTransport, SourcesConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sections::{build_dashboard, build_section, SectionReport, Selection};

// ============================================================================
// Config & state
// ============================================================================

#[derive(Debug, Clone)]
struct ApiConfig {
    bind: String,
    http: Config,
}

impl ApiConfig {
    fn from_env() -> Self {
        Self {
            bind: std::env::var("API_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            http: Config::from_env(),
        }
    }
}

/// One fetcher (and so one cache) for the life of the process.
struct AppState {
    fetcher: Fetcher<HttpTransport>,
    sources: SourcesConfig,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
    cached_resources: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct DashboardResponse {
    generated_at: DateTime<Utc>,
    sections: Vec<SectionReport>,
}

#[derive(Deserialize)]
struct SectionQuery {
    entities: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        cached_resources: state.fetcher.cache().len(),
    })
}

async fn sources_handler(State(state): State<Arc<AppState>>) -> Json<SourcesConfig> {
    Json(state.sources.clone())
}

async fn section_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<SectionQuery>,
) -> Response {
    let Some(source) = state.sources.find(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown section '{}'", id),
            }),
        )
            .into_response();
    };

    let selection = Selection::from_query(params.entities.as_deref());
    Json(build_section(&state.fetcher, source, &selection).await).into_response()
}

async fn dashboard_handler(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let sections = build_dashboard(&state.fetcher, state.sources.enabled()).await;
    Json(DashboardResponse {
        generated_at: Utc::now(),
        sections,
    })
}

fn router(state: Arc<AppState>) -> Router {
    // CORS for web frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/sources", get(sources_handler))
        .route("/sections/:id", get(section_handler))
        .route("/dashboard", get(dashboard_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).init();

    let config = ApiConfig::from_env();

    println!("=== ecodash API ===");

    let sources = SourcesConfig::load_or_builtin(config.http.sources_config.as_deref()).await?;
    println!(
        "Loaded {} sources ({} enabled)",
        sources.sources.len(),
        sources.enabled().count()
    );

    let transport = HttpTransport::new(&config.http).context("Failed to build HTTP client")?;
    let state = Arc::new(AppState {
        fetcher: Fetcher::new(transport),
        sources,
    });

    let app = router(state);

    println!("API listening on http://{}", config.bind);
    println!("\nEndpoints:");
    println!("  GET /health");
    println!("  GET /sources");
    println!("  GET /sections/:id?entities=World,China");
    println!("  GET /dashboard");

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!(bind = %config.bind, "serving");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        let transport = HttpTransport::new(&Config::default()).unwrap();
        Arc::new(AppState {
            fetcher: Fetcher::new(transport),
            sources: SourcesConfig::builtin(),
        })
    }

    #[tokio::test]
    async fn test_unknown_section_is_not_found() {
        let response = section_handler(
            State(state()),
            Path("nope".to_string()),
            Query(SectionQuery { entities: None }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_reports_empty_cache() {
        let Json(health) = health_handler(State(state())).await;
        assert!(health.ok);
        assert_eq!(health.cached_resources, 0);
    }

    #[tokio::test]
    async fn test_sources_lists_catalog() {
        let Json(catalog) = sources_handler(State(state())).await;
        assert!(catalog.find("co2").is_some());
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state());
    }
}
