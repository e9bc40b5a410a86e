//! Terminal progress feedback for long-running subprocesses.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

const TEMPLATE_SPINNER: &str = "{spinner:.cyan} {msg} ({elapsed})";

/// Set to any value to suppress spinners even on a terminal.
pub const QUIET_ENV: &str = "RISKMAP_QUIET";

/// Determine if progress indicators should be displayed
pub fn should_show_progress() -> bool {
    if std::env::var_os(QUIET_ENV).is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

/// Create a ticking spinner with the given message.
///
/// Returns a hidden progress bar when output is not interactive, so callers
/// never need to branch.
pub fn spinner(msg: &str) -> ProgressBar {
    if !should_show_progress() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(TEMPLATE_SPINNER)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_is_hidden_without_terminal() {
        // Test harness output is captured, so stderr is never a terminal here
        if !std::io::stderr().is_terminal() {
            assert!(spinner("working").is_hidden());
        }
    }
}
