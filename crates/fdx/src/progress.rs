// AI
//! 📊 progress.rs — "Are we there yet?" — every ingest, every time, forever.
//!
//! 🚀 Two jobs: a progress bar while the elements go by, and a comfy table
//! at the end that says how it went.
//!
//! ⚠️  Warning: Watching this progress bar will not make it go faster.
//! Neither will refreshing it. We've tried. Science says no.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::time::Duration;

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use indicatif::{ProgressBar, ProgressStyle};

use crate::supervisors::RunReport;

/// 🔢 Formats a number with commas for the 3 people in the audience who like readability.
/// "1000000" → "1,000,000" — you're welcome, eyes.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ Formats a Duration into MM:SS.mmm, or HH:MM:SS once it gets long.
/// Ingest runs are usually quick, so the milliseconds earn their keep.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, seconds, duration.subsec_millis())
    }
}

/// 📊 A progress bar over elements processed. indicatif hides it on its own
/// when stderr isn't a terminal, so tests and pipes stay quiet.
pub(crate) struct IngestProgress {
    progress_bar: ProgressBar,
}

impl std::fmt::Debug for IngestProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("IngestProgress")
            .field("position", &self.progress_bar.position())
            .finish()
    }
}

impl IngestProgress {
    pub(crate) fn new(total_elements: u64) -> Self {
        let progress_bar = ProgressBar::new(total_elements);
        // 🎨 cyan because it's classy. falls back to the plain bar if the template ever goes bad.
        let style = ProgressStyle::with_template("🍴 {msg} [{bar:40.cyan/blue}] {pos}/{len} elements")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style);
        progress_bar.set_message("ingesting");
        Self { progress_bar }
    }

    pub(crate) fn inc(&self) {
        self.progress_bar.inc(1);
    }

    /// ✅ Ring the bell. We made it. (Or we ran out of elements. Same energy.)
    pub(crate) fn finish(&self) {
        self.progress_bar.finish_with_message("done");
    }

    /// 💀 Stop the bar where it died, so the terminal isn't left mid-redraw.
    pub(crate) fn abandon(&self) {
        self.progress_bar.abandon_with_message("failed");
    }
}

/// 🍽️ The end-of-run table. Printed by the CLI, built here so it can be tested.
pub fn render_run_summary(report: &RunReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["🍴 ingest", "count"]);

    let rows: [(&str, String); 6] = [
        ("total elements", format_number(report.total_elements as u64)),
        ("accepted", format_number(report.accepted as u64)),
        ("rejected", format_number(report.rejected as u64)),
        ("indexed", format_number(report.indexed_count as u64)),
        ("batches", format_number(report.batches_submitted as u64)),
        ("elapsed", format_duration(report.elapsed)),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}
