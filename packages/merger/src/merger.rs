//! Merge pipeline that ties all components together.

use std::fs;
use std::path::PathBuf;

use reqwest::blocking::Client;

use crate::clean::{divider, extract_hostnames, strip_comments};
use crate::config::{load_sources, MergeConfig};
use crate::error::{MergerError, Result};
use crate::http::{create_client, download_text};
use crate::output::write_outputs;
use crate::rules::{build_rule_lists, rule_block, RuleStats};
use crate::sections::extract_sections;
use crate::template::{render, TemplateContext};
use crate::types::{Category, SectionMap, SourceDescriptor};

/// A source that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSource {
    pub header: String,
    pub url: String,
    pub error: String,
}

/// Everything accumulated from the sources.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub sections: SectionMap,
    /// Headers of successfully merged sources, in source order.
    pub headers: Vec<String>,
    pub failed: Vec<FailedSource>,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub merged: Vec<String>,
    pub failed: Vec<FailedSource>,
    /// Blocks per category (hostnames for `MITM`).
    pub counts: Vec<(Category, usize)>,
    pub reject_stats: RuleStats,
    pub direct_stats: RuleStats,
    /// Files written, in write order.
    pub written: Vec<PathBuf>,
}

impl SectionMap {
    /// Add every known section of one source's module text.
    ///
    /// Sections with nothing left after cleanup contribute no block.
    pub fn ingest(&mut self, source: &SourceDescriptor, content: &str) {
        for section in extract_sections(content) {
            let Some(category) = Category::from_section_name(&section.name) else {
                tracing::debug!(header = %source.header, section = %section.name, "Ignoring section");
                continue;
            };

            match category {
                Category::Mitm => {
                    let hostnames = extract_hostnames(&section.body);
                    tracing::debug!(header = %source.header, count = hostnames.len(), "Collected MITM hostnames");
                    self.extend_hostnames(hostnames);
                }
                Category::Rule => {
                    let block = rule_block(&source.header, &section.body);
                    if block.rules.is_empty() {
                        continue;
                    }
                    tracing::debug!(header = %source.header, count = block.rules.len(), "Added rules");
                    self.push_rules(block);
                }
                other => {
                    let cleaned = strip_comments(&section.body);
                    if cleaned.is_empty() {
                        continue;
                    }
                    tracing::debug!(header = %source.header, section = other.as_str(), "Added section");
                    self.push_block(other, format!("{}\n{cleaned}", divider(&source.header)));
                }
            }
        }
    }
}

/// Download one source's module text.
pub fn fetch_source(client: &Client, source: &SourceDescriptor) -> Result<String> {
    download_text(client, &source.url).map_err(|e| {
        if let MergerError::Http(inner) = e {
            MergerError::SourceDownload {
                header: source.header.clone(),
                url: source.url.clone(),
                source: inner,
            }
        } else {
            e
        }
    })
}

/// Fetch and ingest all sources in order, skipping the ones that fail.
pub fn merge_sources(client: &Client, sources: &[SourceDescriptor]) -> MergeOutcome {
    merge_sources_with(client, sources, |_, _| {})
}

/// Like [`merge_sources`], calling `on_fetch` before each download.
pub fn merge_sources_with<F>(
    client: &Client,
    sources: &[SourceDescriptor],
    mut on_fetch: F,
) -> MergeOutcome
where
    F: FnMut(usize, &SourceDescriptor),
{
    let mut outcome = MergeOutcome::default();

    for (index, source) in sources.iter().enumerate() {
        on_fetch(index, source);

        match fetch_source(client, source) {
            Ok(content) => {
                outcome.sections.ingest(source, &content);
                outcome.headers.push(source.header.clone());
                tracing::info!(header = %source.header, "Merged source");
            }
            Err(e) => {
                tracing::warn!(header = %source.header, url = %source.url, error = %e, "Skipping source");
                outcome.failed.push(FailedSource {
                    header: source.header.clone(),
                    url: source.url.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}

/// Run the whole pipeline with the given paths.
pub fn run(config: &MergeConfig) -> Result<MergeSummary> {
    run_with(config, |_, _| {})
}

/// Like [`run`], calling `on_fetch` before each download.
pub fn run_with<F>(config: &MergeConfig, on_fetch: F) -> Result<MergeSummary>
where
    F: FnMut(usize, &SourceDescriptor),
{
    let sources = load_sources(&config.sources_path)?;

    // Read the template up front so a bad path fails before any download.
    let template =
        fs::read_to_string(&config.template_path).map_err(|source| MergerError::TemplateRead {
            path: config.template_path.clone(),
            source,
        })?;

    let client = create_client()?;
    let outcome = merge_sources_with(&client, &sources, on_fetch);

    if !outcome.sections.has_rules() {
        tracing::warn!("No Rule content extracted");
    }

    let lists = build_rule_lists(outcome.sections.rule_blocks());
    let context = TemplateContext::today(&outcome.sections, &outcome.headers);
    let module = render(&template, &context);

    // All outputs are produced before anything is written.
    write_outputs(&[
        (config.rule_list_path.as_path(), lists.reject.as_str()),
        (config.direct_list_path.as_path(), lists.direct.as_str()),
        (config.output_path.as_path(), module.as_str()),
    ])?;

    tracing::info!(
        merged = outcome.headers.len(),
        failed = outcome.failed.len(),
        output = %config.output_path.display(),
        "Merge complete"
    );

    let counts = Category::ALL
        .into_iter()
        .map(|c| (c, outcome.sections.count(c)))
        .collect();

    Ok(MergeSummary {
        merged: outcome.headers,
        failed: outcome.failed,
        counts,
        reject_stats: RuleStats::from_list(&lists.reject),
        direct_stats: RuleStats::from_list(&lists.direct),
        written: vec![
            config.rule_list_path.clone(),
            config.direct_list_path.clone(),
            config.output_path.clone(),
        ],
    })
}
