//! Error types for the merger.
//!
//! Fatal errors abort the run. Per-source download failures are also
//! represented here, but the merger records them and moves on.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the merger library.
#[derive(Debug, Error)]
pub enum MergerError {
    /// A source descriptor failed validation.
    #[error("Invalid source '{header}': {reason}")]
    InvalidSource { header: String, reason: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to download a single source module.
    #[error("Failed to download {header} from {url}: {source}")]
    SourceDownload {
        header: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body exceeded the configured maximum size.
    #[error("Response from {url} is too large: {size} bytes (max {max} bytes)")]
    ResponseTooLarge { url: String, size: u64, max: u64 },

    /// Failed to read the sources list.
    #[error("Failed to read sources file {}: {source}", .path.display())]
    SourcesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sources list is not a valid YAML sequence of descriptors.
    #[error("Failed to parse sources file {}: {source}", .path.display())]
    SourcesParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Failed to read the module template.
    #[error("Failed to read template {}: {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file.
    #[error("Failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for merger operations.
pub type Result<T> = std::result::Result<T, MergerError>;
