use std::path::{Path, PathBuf};

use crate::clock::TimeNormalizer;

/// Legacy default: Eastern Standard Time, fixed.
pub const DEFAULT_TZ_OFFSET_MINUTES: i32 = -5 * 60;
pub const TZ_OFFSET_MINUTES_MIN: i32 = -14 * 60;
pub const TZ_OFFSET_MINUTES_MAX: i32 = 14 * 60;

/// Upper bound on rows pulled into memory by one statistics or export query.
pub const DEFAULT_MAX_ROWS: usize = 1_000_000;

const STORE_RELATIVE_PATH: &str = "Library/Application Support/Wispr Flow/flow.sqlite";
const DASHBOARD_FILE_NAME: &str = "wispr-dashboard.html";

/// Everything a report generator needs to know about its environment.
///
/// Built once by the binary and handed to each generator, so tests can point
/// generators at fixture stores and arbitrary offsets.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub db_path: PathBuf,
    pub tz_offset_minutes: i32,
    pub max_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            tz_offset_minutes: DEFAULT_TZ_OFFSET_MINUTES,
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl ReportConfig {
    pub fn new(db_path: impl Into<PathBuf>, tz_offset_minutes: i32) -> Self {
        Self {
            db_path: expand_home(db_path.into()),
            tz_offset_minutes: normalize_tz_offset_minutes(Some(tz_offset_minutes)),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn normalizer(&self) -> TimeNormalizer {
        TimeNormalizer::from_minutes(self.tz_offset_minutes)
    }
}

pub fn normalize_tz_offset_minutes(v: Option<i32>) -> i32 {
    v.unwrap_or(DEFAULT_TZ_OFFSET_MINUTES)
        .clamp(TZ_OFFSET_MINUTES_MIN, TZ_OFFSET_MINUTES_MAX)
}

pub fn default_db_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(STORE_RELATIVE_PATH),
        None => PathBuf::from(STORE_RELATIVE_PATH),
    }
}

pub fn default_dashboard_path() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DASHBOARD_FILE_NAME)
}

/// Expand a leading `~` to the home directory. Other paths pass through.
pub fn expand_home(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
