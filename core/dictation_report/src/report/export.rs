//! Bulk export: one JSON array, or one Markdown note per local day.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use time::Date;
use tracing::{error, info, warn};

use crate::apps::Canonicalizer;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::report::{fmt_thousands, write_output};
use crate::store::{DictationEvent, FilterSet, Store};

#[derive(Clone, Copy, Debug, Default)]
pub struct ExportRange {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub skip_cancelled: bool,
}

/// One exported dictation. Text and metadata only, never audio.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRecord {
    pub id: Option<String>,
    /// Local `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: Option<String>,
    pub app: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "asrText")]
    pub asr_text: Option<String>,
    #[serde(rename = "formattedText")]
    pub formatted_text: Option<String>,
    #[serde(rename = "editedText")]
    pub edited_text: Option<String>,
    pub duration: Option<f64>,
    #[serde(rename = "numWords")]
    pub num_words: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct JsonExportSummary {
    pub path: PathBuf,
    pub count: usize,
    pub bytes: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DailyNote {
    pub day: String,
    pub words: i64,
    pub dictations: usize,
    pub content: String,
}

impl DailyNote {
    pub fn file_name(&self) -> String {
        note_file_name(&self.day)
    }
}

#[derive(Clone, Debug)]
pub struct NotesSummary {
    pub dir: PathBuf,
    pub written: usize,
    pub expected: usize,
}

pub fn note_file_name(day: &str) -> String {
    format!("{day} Voice Log.md")
}

pub struct ExportReport {
    config: ReportConfig,
    apps: Canonicalizer,
}

impl ExportReport {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            apps: Canonicalizer::notes(),
        }
    }

    fn filter(range: &ExportRange) -> FilterSet {
        let mut f = FilterSet::events().between(range.from, range.to);
        f.exclude_cancelled = range.skip_cancelled;
        f
    }

    pub fn records(&self, range: &ExportRange) -> Result<Vec<ExportRecord>> {
        let store = Store::open(&self.config)?;
        let tz = store.normalizer();

        let mut filter = Self::filter(range);
        filter.require_formatted_text = true;
        let rows = store.query(&filter)?;

        Ok(rows
            .into_iter()
            .map(|e| ExportRecord {
                id: e.id,
                timestamp: e.timestamp.map(|ts| tz.local_datetime(ts)),
                app: e.app,
                url: e.url,
                asr_text: e.raw_text,
                formatted_text: e.formatted_text,
                edited_text: e.edited_text,
                duration: e.duration_seconds,
                num_words: e.num_words,
            })
            .collect())
    }

    /// Serialize everything first, then write once: a failed query or
    /// serialization leaves no file behind.
    pub fn write_json(&self, range: &ExportRange, output: &Path) -> Result<JsonExportSummary> {
        let records = self.records(range)?;
        let body = serde_json::to_vec_pretty(&records)?;
        write_output(output, &body)?;
        info!("exported {} dictations to {}", records.len(), output.display());
        Ok(JsonExportSummary {
            path: output.to_path_buf(),
            count: records.len(),
            bytes: body.len(),
        })
    }

    pub fn daily_notes(&self, range: &ExportRange) -> Result<Vec<DailyNote>> {
        let store = Store::open(&self.config)?;
        let tz = store.normalizer();

        let mut filter = Self::filter(range);
        filter.require_nonempty_text = true;
        let rows = store.query(&filter)?;

        let mut undated = 0usize;
        let mut days: IndexMap<String, Vec<NoteEntry>> = IndexMap::new();
        for e in &rows {
            let Some(ts) = e.timestamp else {
                undated += 1;
                continue;
            };
            days.entry(tz.local_day(ts)).or_default().push(NoteEntry {
                time: tz.local_time(ts),
                app: self.apps.canonical_name(e.app.as_deref()),
                text: note_text(e),
                words: e.words(),
            });
        }
        if undated > 0 {
            warn!("{undated} dictations have no timestamp and were left out of the notes");
        }

        Ok(days
            .into_iter()
            .map(|(day, entries)| render_note(day, &entries))
            .collect())
    }

    /// Write one note per day. A failing day is logged and the rest are
    /// still written; the run then reports how many made it.
    pub fn write_notes(&self, range: &ExportRange, dir: &Path) -> Result<NotesSummary> {
        let notes = self.daily_notes(range)?;
        fs::create_dir_all(dir).map_err(|e| ReportError::write_failure(dir, e))?;

        let expected = notes.len();
        let mut written = 0usize;
        for note in &notes {
            let path = dir.join(note.file_name());
            match write_output(&path, note.content.as_bytes()) {
                Ok(()) => written += 1,
                Err(err) => error!("daily note for {} failed: {err}", note.day),
            }
        }

        if written < expected {
            return Err(ReportError::NotesIncomplete { written, expected });
        }
        info!("exported {written} daily notes to {}", dir.display());
        Ok(NotesSummary {
            dir: dir.to_path_buf(),
            written,
            expected,
        })
    }
}

struct NoteEntry {
    time: String,
    app: String,
    text: String,
    words: i64,
}

fn note_text(e: &DictationEvent) -> String {
    e.formatted_text.clone().unwrap_or_default()
}

fn render_note(day: String, entries: &[NoteEntry]) -> DailyNote {
    let words: i64 = entries.iter().map(|e| e.words).sum();
    let mut content = String::new();
    content.push_str("---\n");
    content.push_str("type: voice-log\n");
    content.push_str(&format!("date: {day}\n"));
    content.push_str(&format!("total_words: {words}\n"));
    content.push_str(&format!("dictations: {}\n", entries.len()));
    content.push_str("---\n\n");
    content.push_str(&format!("# Voice Log - {day}\n\n"));
    content.push_str(&format!(
        "Total: {} words across {} dictations\n\n",
        fmt_thousands(words),
        entries.len()
    ));

    for e in entries {
        content.push_str(&format!("## {} ({})\n\n", e.time, e.app));
        content.push_str(&e.text);
        content.push_str("\n\n");
    }

    DailyNote {
        day,
        words,
        dictations: entries.len(),
        content,
    }
}
