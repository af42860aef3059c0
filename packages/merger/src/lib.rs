//! Surge module merger - combine remote `.sgmodule` files into one.
//!
//! Downloads every configured source module, extracts its bracketed
//! sections, cleans and accumulates them per category, and renders the
//! result into a module template. `[Rule]` content is additionally written
//! to deduplicated rule lists.
//!
//! # Example
//!
//! ```
//! use sgmodule_merger::types::{Category, SectionMap, SourceDescriptor};
//!
//! let mut sections = SectionMap::new();
//! let source = SourceDescriptor::new("https://example.com/ads.sgmodule", "Ads");
//! sections.ingest(&source, "[MITM]\nhostname = %APPEND% ads.example.com\n");
//! assert_eq!(sections.joined(Category::Mitm), "ads.example.com");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, default paths and source list loading
//! - [`types`]: Core data types (sources, categories, accumulated sections)
//! - [`error`]: Error types and Result alias
//! - [`http`]: HTTP client for downloading sources
//! - [`sections`]: `[Section]` extraction
//! - [`clean`]: Comment stripping, dividers and MITM hostnames
//! - [`rules`]: Rule policy handling and rule lists
//! - [`template`]: Placeholder substitution
//! - [`output`]: Output file writing
//! - [`cli`]: Command-line interface
//! - [`merger`]: Main merge pipeline

pub mod clean;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod merger;
pub mod output;
pub mod rules;
pub mod sections;
pub mod template;
pub mod types;

// Re-export main functions
pub use merger::{merge_sources, run, MergeOutcome, MergeSummary};

// Re-export commonly used items
pub use config::{load_sources, MergeConfig};
pub use error::{MergerError, Result};
pub use types::{Category, HostnameSet, SectionMap, SourceDescriptor};
