//! The four report generators and their shared rendering helpers.

pub mod dashboard;
pub mod export;
pub mod search;
pub mod stats;

use std::fs;
use std::path::Path;

use crate::error::{ReportError, Result};

pub use dashboard::{DashboardData, DashboardReport};
pub use export::{ExportRange, ExportRecord, ExportReport, JsonExportSummary, NotesSummary};
pub use search::{SearchHit, SearchQuery, SearchReport, SearchResults};
pub use stats::{StatsReport, SummaryStats};

/// `1234567` → `1,234,567`.
pub fn fmt_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// First `max` characters, with `...` appended when something was cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Write a fully rendered artifact in one go.
pub(crate) fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| ReportError::write_failure(path, e))
}
