use thiserror::Error;

/// Failures a scrape run can end with
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {status} - {reason} (URL: {url})")]
    Http {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("Network error: could not connect to the server at {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date '{0}': expected DD/MM/YYYY")]
    InvalidDate(String),
}

impl ScrapeError {
    /// Sorts a reqwest failure into "no response at all" vs everything else.
    pub fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_connect() || source.is_timeout() {
            ScrapeError::Network {
                url: url.to_string(),
                source,
            }
        } else {
            ScrapeError::Request {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Short label for log output
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Http { .. } => "http",
            ScrapeError::Network { .. } => "network",
            ScrapeError::Request { .. } => "request",
            ScrapeError::Io(_) => "io",
            ScrapeError::Json(_) => "json",
            ScrapeError::InvalidDate(_) => "config",
        }
    }
}
