//! CLI entry point for the citegen tool.

use std::io::{self, IsTerminal, Read};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;
use citegen_core::{
    BatchConfig, BatchEngine, CitationApiClient, SourceType, SqliteHistoryStore,
    history::HistoryStore, normalize_input,
};
use tracing::{debug, info, warn};
use url::Url;

mod cli;
mod output;
mod progress_ui;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    // Read input: from positional args or stdin
    let args_were_provided = !args.urls.is_empty();
    let (input_text, stdin_was_piped) = if args.urls.is_empty() && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        (buffer, true)
    } else {
        (args.urls.join("\n"), false)
    };

    let urls = normalize_input(&input_text);
    if urls.is_empty() {
        // Input that was given but normalizes to nothing is a caller
        // mistake; only a bare interactive invocation gets the quick-start
        // guidance and a clean exit.
        if !args_were_provided {
            output::print_quick_start_guidance(stdin_was_piped);
            if !stdin_was_piped {
                return Ok(());
            }
        }
        anyhow::bail!("no URLs to process");
    }

    info!(urls = urls.len(), style = %args.style, "Starting citation batch");

    // Catch a malformed base URL here instead of as N transport failures.
    let api_url = Url::parse(&args.api_url)
        .map_err(|e| anyhow::anyhow!("invalid --api-url '{}': {e}", args.api_url))?;

    let client = Arc::new(CitationApiClient::new(api_url.as_str())?);

    let engine = BatchEngine::new(
        client.clone(),
        client,
        BatchConfig {
            concurrency: usize::from(args.concurrency),
            title_policy: args.title_source,
            source_type: SourceType::Website,
        },
    )?;

    // Ctrl-C requests cooperative cancellation; completed items are kept.
    let cancel = engine.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight items");
            cancel.cancel();
        }
    });

    let use_bar = !args.no_progress && !args.quiet && io::stdout().is_terminal();
    let (bar_handle, bar_stop) = progress_ui::spawn_progress_ui(use_bar, engine.subscribe_progress());

    let result = engine.run(urls, args.style).await;

    bar_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = bar_handle {
        let _ = handle.await;
    }

    let result = result?;

    if !args.quiet {
        output::print_batch_report(&result);
    }

    if let Some(export_path) = &args.export {
        std::fs::write(export_path, result.export_text())?;
        info!(path = %export_path.display(), "Export written");
    }

    if let Some(db_path) = &args.history_db {
        let store = SqliteHistoryStore::open(db_path, args.history_cap as usize).await?;
        let entries = result.to_history_entries(args.title_source);
        store.append(&entries).await?;
        info!(
            saved = entries.len(),
            path = %db_path.display(),
            "History updated"
        );
        store.close().await;
    }

    info!(
        succeeded = result.success_count(),
        failed = result.failure_count(),
        total = result.len(),
        partial = result.partial(),
        "Citation batch complete"
    );

    // Partial failures are reported per item; only a fully-failed batch
    // exits nonzero.
    if result.success_count() == 0 {
        anyhow::bail!("all {} citation(s) failed", result.len());
    }

    Ok(())
}
