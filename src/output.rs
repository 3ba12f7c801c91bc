//! CLI output formatting and display helpers.

use citegen_core::{BatchResult, ItemOutcome};

/// Message when no input was provided at all.
pub const NO_INPUT_GUIDANCE: &str = "No input provided. Pipe URLs via stdin or pass as arguments.";

/// Message when stdin was piped but empty.
pub const EMPTY_STDIN_GUIDANCE: &str =
    "Received empty stdin input. Pipe newline-separated URLs, or pass them as arguments.";

/// Example for piping input.
pub const INPUT_PIPE_EXAMPLE: &str = "Example: echo 'https://example.com' | citegen";

/// Example for passing URLs as arguments.
pub const INPUT_ARG_EXAMPLE: &str = "Example: citegen https://example.com -s apa";

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending ellipsis if truncated.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let text_len = text.chars().count();
    if text_len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    if width == 1 {
        return "…".to_string();
    }

    let mut output: String = text.chars().take(width - 1).collect();
    output.push('…');
    output
}

/// Returns lines for quick-start guidance (headline + examples), truncated to width.
pub fn quick_start_guidance_lines(empty_stdin: bool, width: usize) -> Vec<String> {
    let headline = if empty_stdin {
        EMPTY_STDIN_GUIDANCE
    } else {
        NO_INPUT_GUIDANCE
    };

    vec![
        truncate_to_width(headline, width),
        truncate_to_width(INPUT_PIPE_EXAMPLE, width),
        truncate_to_width(INPUT_ARG_EXAMPLE, width),
    ]
}

/// Prints quick-start guidance to stdout (no input or empty stdin).
pub fn print_quick_start_guidance(empty_stdin: bool) {
    let width = terminal_width().min(80);
    for line in quick_start_guidance_lines(empty_stdin, width) {
        println!("{line}");
    }
}

/// Renders one outcome as a report line: check or cross, URL, then
/// citation text or error message.
pub(crate) fn render_outcome_line(outcome: &ItemOutcome, width: usize) -> String {
    let line = match outcome {
        ItemOutcome::Success { url, citation, .. } => format!("✓ {url}\n  {citation}"),
        ItemOutcome::Failure { url, error } => format!("✗ {url}\n  Error: {error}"),
    };
    line.lines()
        .map(|part| truncate_to_width(part, width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the end-of-run summary line.
pub(crate) fn render_summary_line(result: &BatchResult) -> String {
    let mut summary = format!(
        "Generated {} of {} citations ({} failed)",
        result.success_count(),
        result.len(),
        result.failure_count()
    );
    if result.partial() {
        summary.push_str(" [cancelled before completion]");
    }
    summary
}

/// Prints the per-item report and summary to stdout.
pub(crate) fn print_batch_report(result: &BatchResult) {
    let width = terminal_width();
    for outcome in result.outcomes() {
        println!("{}", render_outcome_line(outcome, width));
        println!();
    }
    println!("{}", render_summary_line(result));
}
