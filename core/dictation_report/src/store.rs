//! Read-only access to the dictation history table.

use rusqlite::{params_from_iter, types::Value, Connection, OpenFlags, Row};
use time::{Date, OffsetDateTime};
use tracing::{debug, warn};

use crate::apps::Canonicalizer;
use crate::clock::{format_day, TimeNormalizer};
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};

/// One captured dictation, as stored by the dictation app.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DictationEvent {
    pub id: Option<String>,
    pub timestamp: Option<OffsetDateTime>,
    pub app: Option<String>,
    pub url: Option<String>,
    pub raw_text: Option<String>,
    pub formatted_text: Option<String>,
    pub edited_text: Option<String>,
    pub duration_seconds: Option<f64>,
    pub num_words: Option<i64>,
    pub status: Option<String>,
}

impl DictationEvent {
    pub fn words(&self) -> i64 {
        self.num_words.unwrap_or(0).max(0)
    }

    pub fn duration(&self) -> f64 {
        self.duration_seconds.unwrap_or(0.0).max(0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

/// Conjunctive filter over the history table. Every value ends up as a bound
/// parameter.
#[derive(Clone, Debug, Default)]
pub struct FilterSet {
    pub exclude_cancelled: bool,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub app: Option<String>,
    pub text: Option<String>,
    pub require_formatted_text: bool,
    pub require_nonempty_text: bool,
    /// Load the text columns. Statistics leave them out.
    pub with_text: bool,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl FilterSet {
    /// Counted rows only, no text payloads.
    pub fn statistics() -> Self {
        Self {
            exclude_cancelled: true,
            ..Self::default()
        }
    }

    /// Full rows, cancelled ones included.
    pub fn events() -> Self {
        Self {
            with_text: true,
            ..Self::default()
        }
    }

    pub fn between(mut self, from: Option<Date>, to: Option<Date>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn app(mut self, app: Option<String>) -> Self {
        self.app = app.filter(|a| !a.is_empty());
        self
    }

    pub fn containing(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = SortOrder::NewestFirst;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

pub struct Store {
    conn: Connection,
    tz: TimeNormalizer,
    app_rules: Canonicalizer,
    max_rows: usize,
}

impl Store {
    /// Open the history store read-only.
    ///
    /// Fails with [`ReportError::StoreUnavailable`] if the file is missing,
    /// cannot be opened, or has no `History` table.
    pub fn open(config: &ReportConfig) -> Result<Self> {
        let path = config.db_path.clone();
        if !path.exists() {
            return Err(ReportError::store_unavailable(path, "file does not exist"));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| ReportError::store_unavailable(&path, err.to_string()))?;

        if let Err(err) = conn.prepare("SELECT 1 FROM History LIMIT 1") {
            return Err(ReportError::store_unavailable(&path, err.to_string()));
        }

        debug!("opened history store {}", path.display());
        Ok(Self {
            conn,
            tz: config.normalizer(),
            app_rules: Canonicalizer::top_apps(),
            max_rows: config.max_rows.max(1),
        })
    }

    pub fn normalizer(&self) -> TimeNormalizer {
        self.tz
    }

    pub fn query(&self, filter: &FilterSet) -> Result<Vec<DictationEvent>> {
        let (sql, params) = self.build_query(filter);
        debug!(%sql, params = params.len(), "querying history");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), event_from_row)?;
        let out = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        if out.len() >= self.max_rows && filter.limit.map_or(true, |l| l > self.max_rows) {
            warn!(
                "history query stopped at the {} row cap; results are truncated",
                self.max_rows
            );
        }
        Ok(out)
    }

    fn build_query(&self, filter: &FilterSet) -> (String, Vec<Value>) {
        let text_cols = if filter.with_text {
            "asrText, formattedText, editedText"
        } else {
            "NULL, NULL, NULL"
        };
        let mut sql = format!(
            "SELECT CAST(transcriptEntityId AS TEXT), \
             CAST(strftime('%s', timestamp) AS INTEGER) AS ts, \
             app, url, {text_cols}, CAST(duration AS REAL), CAST(numWords AS INTEGER), status \
             FROM History"
        );

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if filter.exclude_cancelled {
            clauses.push("status IS NOT 'cancelled'".to_string());
        }
        if let Some(from) = filter.from {
            clauses.push("date(timestamp, ?) >= ?".to_string());
            params.push(Value::Text(self.tz.sqlite_modifier()));
            params.push(Value::Text(format_day(from)));
        }
        if let Some(to) = filter.to {
            clauses.push("date(timestamp, ?) <= ?".to_string());
            params.push(Value::Text(self.tz.sqlite_modifier()));
            params.push(Value::Text(format_day(to)));
        }
        if let Some(app) = filter.app.as_deref() {
            let mut patterns = vec![like_contains(app)];
            patterns.extend(
                self.app_rules
                    .patterns_for_display(app)
                    .into_iter()
                    .map(like_contains),
            );
            let alternatives = vec!["app LIKE ? ESCAPE '\\'"; patterns.len()].join(" OR ");
            clauses.push(format!("({alternatives})"));
            params.extend(patterns.into_iter().map(Value::Text));
        }
        if let Some(text) = filter.text.as_deref() {
            clauses.push("instr(formattedText, ?) > 0".to_string());
            params.push(Value::Text(text.to_string()));
        }
        if filter.require_formatted_text || filter.require_nonempty_text {
            clauses.push("formattedText IS NOT NULL".to_string());
        }
        if filter.require_nonempty_text {
            clauses.push("formattedText != ''".to_string());
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let dir = match filter.order {
            SortOrder::OldestFirst => "ASC",
            SortOrder::NewestFirst => "DESC",
        };
        sql.push_str(&format!(" ORDER BY ts {dir}, timestamp {dir} LIMIT ?"));

        let limit = filter.limit.unwrap_or(self.max_rows).min(self.max_rows);
        params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

        (sql, params)
    }
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<DictationEvent> {
    let epoch: Option<i64> = row.get(1)?;
    Ok(DictationEvent {
        id: row.get(0)?,
        timestamp: epoch.and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok()),
        app: row.get(2)?,
        url: row.get(3)?,
        raw_text: row.get(4)?,
        formatted_text: row.get(5)?,
        edited_text: row.get(6)?,
        duration_seconds: row.get(7)?,
        num_words: row.get(8)?,
        status: row.get(9)?,
    })
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn like_contains(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::parse_local_day;
    use crate::testutil::{Fixture, FixtureRow};

    fn day(s: &str) -> Option<Date> {
        parse_local_day(s)
    }

    #[test]
    fn missing_store_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ReportConfig::new(dir.path().join("nope.sqlite"), -300);
        match Store::open(&cfg) {
            Err(ReportError::StoreUnavailable { path, .. }) => {
                assert!(path.ends_with("nope.sqlite"));
            }
            other => panic!("expected StoreUnavailable, got {:?}", other.err()),
        }
    }

    #[test]
    fn store_without_history_table_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.sqlite");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE something (x INTEGER);")
            .unwrap();
        let cfg = ReportConfig::new(&path, -300);
        assert!(matches!(
            Store::open(&cfg),
            Err(ReportError::StoreUnavailable { .. })
        ));
    }

    #[test]
    fn statistics_filter_drops_only_cancelled() {
        let fx = Fixture::new();
        fx.insert(FixtureRow::at("2024-01-01 15:00:00").words(10));
        fx.insert(FixtureRow::at("2024-01-01 15:01:00").words(20).status("cancelled"));
        fx.insert(FixtureRow::at("2024-01-01 15:02:00").words(30).no_status());

        let rows = fx.store().query(&FilterSet::statistics()).unwrap();
        let words: Vec<i64> = rows.iter().map(|r| r.words()).collect();
        assert_eq!(words, vec![10, 30]);
        assert!(rows.iter().all(|r| r.formatted_text.is_none()));

        let all = fx.store().query(&FilterSet::events()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].formatted_text.is_some());
    }

    #[test]
    fn date_range_uses_local_days() {
        let fx = Fixture::new();
        // 04:30 UTC on the 2nd is still the 1st at -05:00.
        fx.insert(FixtureRow::at("2024-01-02 04:30:00").words(1));
        fx.insert(FixtureRow::at("2024-01-02 05:30:00").words(2));
        fx.insert(FixtureRow::at("2024-01-03 12:00:00").words(3));
        fx.insert(FixtureRow::undated().words(4));

        let store = fx.store();
        let first = store
            .query(&FilterSet::statistics().between(day("2024-01-01"), day("2024-01-01")))
            .unwrap();
        assert_eq!(first.iter().map(|r| r.words()).collect::<Vec<_>>(), vec![1]);

        let from_second = store
            .query(&FilterSet::statistics().between(day("2024-01-02"), None))
            .unwrap();
        assert_eq!(from_second.iter().map(|r| r.words()).collect::<Vec<_>>(), vec![2, 3]);

        let everything = store.query(&FilterSet::statistics()).unwrap();
        assert_eq!(everything.len(), 4);
    }

    #[test]
    fn text_match_is_case_sensitive_and_literal() {
        let fx = Fixture::new();
        fx.insert(FixtureRow::at("2024-01-01 12:00:00").text("Hello world"));
        fx.insert(FixtureRow::at("2024-01-01 12:01:00").text("say hello"));
        fx.insert(FixtureRow::at("2024-01-01 12:02:00").text("100% sure"));
        fx.insert(FixtureRow::at("2024-01-01 12:03:00").text("it's O'Brien"));

        let store = fx.store();
        let q = |t: &str| store.query(&FilterSet::events().containing(t)).unwrap().len();
        assert_eq!(q("hello"), 1);
        assert_eq!(q("%"), 1);
        assert_eq!(q("O'Brien"), 1);
        assert_eq!(q("' OR 1=1 --"), 0);
    }

    #[test]
    fn app_filter_matches_raw_and_display_names() {
        let fx = Fixture::new();
        fx.insert(FixtureRow::at("2024-01-01 12:00:00").app("com.todesktop.230313mzl4w4u92"));
        fx.insert(FixtureRow::at("2024-01-01 12:01:00").app("com.mitchellh.ghostty"));
        fx.insert(FixtureRow::at("2024-01-01 12:02:00").app("com.weird_name.app"));

        let store = fx.store();
        let q = |a: &str| {
            store
                .query(&FilterSet::events().app(Some(a.to_string())))
                .unwrap()
                .into_iter()
                .filter_map(|r| r.app)
                .collect::<Vec<_>>()
        };
        assert_eq!(q("Claude"), vec!["com.todesktop.230313mzl4w4u92"]);
        assert_eq!(q("GHOSTTY"), vec!["com.mitchellh.ghostty"]);
        // `_` is literal, not a single-character wildcard.
        assert_eq!(q("com_mitchellh"), Vec::<String>::new());
        assert_eq!(q("weird_"), vec!["com.weird_name.app"]);
    }

    #[test]
    fn newest_first_with_limit() {
        let fx = Fixture::new();
        for (i, ts) in ["2024-01-01 10:00:00", "2024-01-03 10:00:00", "2024-01-02 10:00:00"]
            .iter()
            .enumerate()
        {
            fx.insert(FixtureRow::at(ts).words(i as i64));
        }
        let rows = fx
            .store()
            .query(&FilterSet::events().newest_first().limit(2))
            .unwrap();
        assert_eq!(rows.iter().map(|r| r.words()).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn timestamps_with_zone_suffix_parse() {
        let fx = Fixture::new();
        fx.insert(FixtureRow::at("2024-05-01 14:23:11.123 +00:00"));
        let rows = fx.store().query(&FilterSet::events()).unwrap();
        let ts = rows[0].timestamp.unwrap();
        assert_eq!(ts.unix_timestamp(), 1_714_573_391);
    }

    #[test]
    fn like_contains_escapes_wildcards() {
        assert_eq!(like_contains("a%b_c\\"), "%a\\%b\\_c\\\\%");
    }
}
