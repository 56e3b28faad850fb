//! Throwaway history stores for tests.

use std::cell::Cell;

use rusqlite::{params, Connection};
use tempfile::TempDir;

use crate::config::ReportConfig;
use crate::store::Store;

const SCHEMA: &str = r#"
CREATE TABLE History (
  transcriptEntityId TEXT PRIMARY KEY,
  asrText TEXT,
  formattedText TEXT,
  editedText TEXT,
  timestamp TEXT,
  status TEXT,
  app TEXT,
  url TEXT,
  duration REAL,
  numWords INTEGER,
  audio BLOB
);
"#;

pub(crate) struct Fixture {
    pub dir: TempDir,
    pub config: ReportConfig,
    conn: Connection,
    next_id: Cell<u32>,
}

impl Fixture {
    /// Empty store at UTC-5.
    pub fn new() -> Self {
        Self::with_offset(-5 * 60)
    }

    pub fn with_offset(tz_offset_minutes: i32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        Self {
            config: ReportConfig::new(&path, tz_offset_minutes),
            dir,
            conn,
            next_id: Cell::new(0),
        }
    }

    pub fn insert(&self, row: FixtureRow) {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.conn
            .execute(
                "INSERT INTO History (transcriptEntityId, asrText, formattedText, editedText, \
                 timestamp, status, app, url, duration, numWords, audio) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, x'00ff')",
                params![
                    format!("t-{id:04}"),
                    row.formatted.as_deref().map(|t| t.to_lowercase()),
                    row.formatted,
                    row.edited,
                    row.timestamp,
                    row.status,
                    row.app,
                    row.url,
                    row.duration,
                    row.num_words,
                ],
            )
            .unwrap();
    }

    pub fn store(&self) -> Store {
        Store::open(&self.config).unwrap()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct FixtureRow {
    pub timestamp: Option<String>,
    pub app: Option<String>,
    pub url: Option<String>,
    pub formatted: Option<String>,
    pub edited: Option<String>,
    pub duration: Option<f64>,
    pub num_words: Option<i64>,
    pub status: Option<String>,
}

impl FixtureRow {
    /// A formatted dictation at a UTC `YYYY-MM-DD HH:MM:SS` timestamp.
    pub fn at(ts: &str) -> Self {
        Self {
            timestamp: Some(ts.to_string()),
            app: Some("com.example.Notes".to_string()),
            url: None,
            formatted: Some("some dictated text".to_string()),
            edited: None,
            duration: Some(6.0),
            num_words: Some(3),
            status: Some("formatted".to_string()),
        }
    }

    pub fn undated() -> Self {
        Self {
            timestamp: None,
            ..Self::at("")
        }
    }

    pub fn app(mut self, app: &str) -> Self {
        self.app = Some(app.to_string());
        self
    }

    pub fn no_app(mut self) -> Self {
        self.app = None;
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.formatted = Some(text.to_string());
        self
    }

    pub fn no_text(mut self) -> Self {
        self.formatted = None;
        self
    }

    pub fn words(mut self, n: i64) -> Self {
        self.num_words = Some(n);
        self
    }

    pub fn no_words(mut self) -> Self {
        self.num_words = None;
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn no_duration(mut self) -> Self {
        self.duration = None;
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn no_status(mut self) -> Self {
        self.status = None;
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }
}
