use thiserror::Error;

/// Failure to retrieve a resource. Always carries the URL that was requested.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not fetch {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Http { url, .. } | FetchError::Transport { url, .. } => url,
        }
    }
}
