//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use citegen_core::history::DEFAULT_HISTORY_CAP;
use citegen_core::{DEFAULT_CONCURRENCY, Style, TitlePolicy};

/// Generate formatted citations for batches of source URLs.
///
/// Citegen reads newline-separated URLs (as arguments or on stdin),
/// resolves each one against a citation API, and reports per-URL results
/// with an aggregate export.
#[derive(Parser, Debug)]
#[command(name = "citegen")]
#[command(author, version, about)]
pub struct Args {
    /// Source URLs to cite (reads stdin when omitted)
    pub urls: Vec<String>,

    /// Citation style: apa, mla, chicago, or harvard
    #[arg(short, long, default_value = "apa")]
    pub style: Style,

    /// Base URL of the citation API
    #[arg(long, default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Maximum concurrent citation requests (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Write the aggregated export text to this file
    #[arg(short = 'e', long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Persist successful citations to this SQLite history database
    #[arg(long, value_name = "PATH")]
    pub history_db: Option<PathBuf>,

    /// Maximum history entries retained (oldest pruned first)
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAP as u32, value_parser = clap::value_parser!(u32).range(1..))]
    pub history_cap: u32,

    /// History entry title source: metadata or url
    #[arg(long, default_value = "metadata", value_parser = parse_title_policy)]
    pub title_source: TitlePolicy,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_title_policy(value: &str) -> Result<TitlePolicy, String> {
    match value.to_ascii_lowercase().as_str() {
        "metadata" => Ok(TitlePolicy::MetadataTitle),
        "url" => Ok(TitlePolicy::Url),
        other => Err(format!(
            "unknown title source '{other}' (expected 'metadata' or 'url')"
        )),
    }
}
