//! Command-line interface for the merger.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{
    MergeConfig, DEFAULT_DIRECT_LIST_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_RULE_LIST_PATH,
    DEFAULT_SOURCES_PATH, DEFAULT_TEMPLATE_PATH,
};
use crate::error::Result;
use crate::merger::{run_with, MergeSummary};

/// Surge module merger - combine remote modules into one module and rule list.
#[derive(Parser)]
#[command(name = "sgmodule-merger")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download all sources and write the merged module and rule lists.
    Merge {
        /// YAML list of sources ({url, header} entries)
        #[arg(short, long, default_value = DEFAULT_SOURCES_PATH)]
        sources: PathBuf,

        /// Module template with placeholders
        #[arg(short, long, default_value = DEFAULT_TEMPLATE_PATH)]
        template: PathBuf,

        /// Rendered module output path
        #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,

        /// Merged rule list output path
        #[arg(long, default_value = DEFAULT_RULE_LIST_PATH)]
        rule_list: PathBuf,

        /// Merged DIRECT rule list output path
        #[arg(long, default_value = DEFAULT_DIRECT_LIST_PATH)]
        direct_list: PathBuf,
    },
}

impl Commands {
    fn into_config(self) -> MergeConfig {
        let Commands::Merge {
            sources,
            template,
            output,
            rule_list,
            direct_list,
        } = self;
        MergeConfig::default()
            .with_sources_path(sources)
            .with_template_path(template)
            .with_output_path(output)
            .with_rule_list_path(rule_list)
            .with_direct_list_path(direct_list)
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    merge_command(&cli.command.into_config())
}

/// Execute the merge command.
fn merge_command(config: &MergeConfig) -> Result<()> {
    println!(
        "{} sources from {}",
        style("Merging").bold(),
        style(config.sources_path.display()).cyan()
    );
    println!();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Loading sources...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let summary = match run_with(config, |index, source| {
        pb.set_message(format!("[{}] Downloading {}...", index + 1, source.header));
    }) {
        Ok(summary) => summary,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.finish_and_clear();
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &MergeSummary) {
    println!("  Merged: {}", style(summary.merged.len()).green());
    for header in &summary.merged {
        println!("    {header}");
    }

    if !summary.failed.is_empty() {
        println!("  Failed: {}", style(summary.failed.len()).yellow().bold());
        for failed in &summary.failed {
            println!("    {}: {}", style(&failed.header).yellow(), failed.error);
        }
    }

    for (category, count) in &summary.counts {
        println!("  {}: {count}", category.as_str());
    }
    println!("  Rules: {}", summary.reject_stats);
    println!("  Direct rules: {}", summary.direct_stats);

    println!();
    println!("{}", style("Saved to:").green().bold());
    for path in &summary.written {
        println!("  {}", path.display());
    }
}
