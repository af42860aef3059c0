//! Configuration constants, default paths and source list loading.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::error::{MergerError, Result};
use crate::types::SourceDescriptor;

/// Dash budget of a source divider, excluding the header text itself.
pub const MAX_DIVIDER_LENGTH: usize = 30;

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum accepted size of a single downloaded module (10 MB).
///
/// Modules are small text files; anything larger is almost certainly not one.
pub const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Default location of the sources list.
pub const DEFAULT_SOURCES_PATH: &str = "data/sgmodules.yaml";

/// Default location of the module template.
pub const DEFAULT_TEMPLATE_PATH: &str = "data/templates/All-in-One.sgmodule.template";

/// Default location of the merged rule list.
pub const DEFAULT_RULE_LIST_PATH: &str = "ruleset/reject.list";

/// Default location of the merged `DIRECT` rule list.
pub const DEFAULT_DIRECT_LIST_PATH: &str = "ruleset/direct.list";

/// Default location of the rendered module.
pub const DEFAULT_OUTPUT_PATH: &str = "sgmodule/All-in-One.sgmodule";

/// Date format used for the `{{currentDate}}` placeholder.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Input and output paths for a merge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    pub sources_path: PathBuf,
    pub template_path: PathBuf,
    pub rule_list_path: PathBuf,
    pub direct_list_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            sources_path: PathBuf::from(DEFAULT_SOURCES_PATH),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            rule_list_path: PathBuf::from(DEFAULT_RULE_LIST_PATH),
            direct_list_path: PathBuf::from(DEFAULT_DIRECT_LIST_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl MergeConfig {
    pub fn with_sources_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources_path = path.into();
        self
    }

    pub fn with_template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = path.into();
        self
    }

    pub fn with_rule_list_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rule_list_path = path.into();
        self
    }

    pub fn with_direct_list_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.direct_list_path = path.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }
}

/// Validate a source descriptor before any request is made.
///
/// # Examples
/// ```
/// use sgmodule_merger::config::validate_source;
/// use sgmodule_merger::types::SourceDescriptor;
///
/// let ok = SourceDescriptor::new("https://example.com/a.sgmodule", "Ads");
/// assert!(validate_source(&ok).is_ok());
///
/// let bad = SourceDescriptor::new("ftp://example.com/a.sgmodule", "Ads");
/// assert!(validate_source(&bad).is_err());
/// ```
pub fn validate_source(source: &SourceDescriptor) -> Result<()> {
    let invalid = |reason: String| MergerError::InvalidSource {
        header: source.header.clone(),
        reason,
    };

    if source.header.trim().is_empty() {
        return Err(invalid(format!("empty header for {}", source.url)));
    }

    let url = Url::parse(&source.url).map_err(|e| invalid(format!("invalid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Parse a YAML sources list.
///
/// The document must be a sequence of `{url, header}` mappings. Every entry is
/// validated; the first invalid one fails the whole list.
pub fn parse_sources(yaml: &str, path: &Path) -> Result<Vec<SourceDescriptor>> {
    let sources: Vec<SourceDescriptor> =
        serde_yaml_ng::from_str(yaml).map_err(|source| MergerError::SourcesParse {
            path: path.to_path_buf(),
            source,
        })?;

    for source in &sources {
        validate_source(source)?;
    }

    Ok(sources)
}

/// Load and validate the sources list from disk.
pub fn load_sources(path: &Path) -> Result<Vec<SourceDescriptor>> {
    let yaml = fs::read_to_string(path).map_err(|source| MergerError::SourcesRead {
        path: path.to_path_buf(),
        source,
    })?;
    let sources = parse_sources(&yaml, path)?;
    tracing::debug!(count = sources.len(), path = %path.display(), "Loaded sources");
    Ok(sources)
}
