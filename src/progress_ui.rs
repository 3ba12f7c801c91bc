//! Progress UI (percentage bar) for batch runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use citegen_core::ProgressState;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

/// Spawns the progress UI (percentage bar) when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_bar` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_bar: bool,
    progress: watch::Receiver<ProgressState>,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_bar {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_bar_inner(progress, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_bar_inner(
    progress: watch::Receiver<ProgressState>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        while !stop.load(Ordering::SeqCst) {
            let state = *progress.borrow();
            bar.set_position(u64::from(state.percent()));
            bar.set_message(format!(
                "[{}/{}] Generating citations...",
                state.completed(),
                state.total()
            ));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        let state = *progress.borrow();
        bar.set_position(u64::from(state.percent()));
        bar.finish_and_clear();
    })
}
