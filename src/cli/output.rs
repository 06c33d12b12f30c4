//! Progress display and summaries for CLI

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::{Report, RunSnapshot};

/// Progress bar driven by run snapshots
pub struct RunProgress {
    bar: ProgressBar,
}

impl RunProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}",
        ) {
            bar.set_style(style.progress_chars("█▓▒░  "));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// A bar that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Reflect the latest snapshot
    pub fn update(&self, snapshot: &RunSnapshot) {
        self.bar.set_position(u64::from(snapshot.percent));
        self.bar.set_message(snapshot.step.clone());
    }

    /// Print a line above the bar
    pub fn note(&self, msg: &str) {
        self.bar.println(format!("  ⚠ {}", msg));
    }

    pub fn finish_success(&self, msg: &str) {
        self.bar.finish_with_message(format!("✓ {}", msg));
    }

    pub fn finish_error(&self, msg: &str) {
        self.bar.abandon_with_message(format!("✗ {}", msg));
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary printed after a successful run
pub fn format_summary(report: &Report, rows: usize, output: &Path, duration: Duration) -> String {
    let mut out = String::new();
    out.push_str("\nReport Summary\n");
    out.push_str("==============\n");
    out.push_str(&format!("Rows analysed: {}\n", rows));
    out.push_str(&format!(
        "Queries:       {} run, {} failed\n",
        report.queries_run(),
        report.queries_failed()
    ));
    out.push_str(&format!("Extraction:    {}\n", report.extraction().name()));
    out.push_str(&format!("Size:          {} bytes\n", report.html().len()));
    out.push_str(&format!("Duration:      {:.1}s\n", duration.as_secs_f64()));
    out.push_str(&format!("Written to:    {}\n", output.display()));
    out
}
