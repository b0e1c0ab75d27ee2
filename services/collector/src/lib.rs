//! Collector - fetches raw dataset resources from public URLs
//!
//! Responsibilities:
//! - Fetch resources (CSV, XLS/XLSX) over HTTP
//! - Keep a per-session read-through cache keyed by URL
//! - Describe the configured sources (built-in catalog or JSON file)

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;

pub use cache::ResponseCache;
pub use catalog::{DatasetKind, Source, SourcesConfig};
pub use config::Config;
pub use error::FetchError;
pub use fetch::{Download, FetchedResource, Fetcher, HttpTransport, Transport};
