use std::path::PathBuf;

use thiserror::Error;

/// Errors raised across the crawl and report paths.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Page unreachable, timed out, or the session could not be opened
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// A field or the whole page could not be extracted
    #[error("extraction of `{field}` failed: {message}")]
    Extraction { field: String, message: String },

    /// Snapshot or report could not be read or written
    #[error("persistence error at {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cookie-consent popup could not be dismissed
    #[error("consent handling failed: {0}")]
    Consent(String),

    /// Crawl failed before collecting anything; no snapshot was written
    #[error("crawl collected no listings ({reason})")]
    NothingCollected { reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScoutError {
    pub fn navigation(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn extraction(field: impl Into<String>, message: impl ToString) -> Self {
        Self::Extraction {
            field: field.into(),
            message: message.to_string(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoutError>;
