use serde::Serialize;
use time::Date;
use tracing::{info, warn};

use crate::apps::Canonicalizer;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::report::truncate_chars;
use crate::store::{FilterSet, Store};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 500;
const PREVIEW_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct SearchQuery {
    pub text: String,
    pub app: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            app: None,
            from: None,
            to: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
    /// Local `YYYY-MM-DD HH:MM:SS`.
    pub time: Option<String>,
    pub app: String,
    pub text: String,
    pub words: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

pub struct SearchReport {
    config: ReportConfig,
    apps: Canonicalizer,
}

impl SearchReport {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            apps: Canonicalizer::search(),
        }
    }

    pub fn run(&self, q: &SearchQuery) -> Result<SearchResults> {
        let store = Store::open(&self.config)?;
        let tz = store.normalizer();

        let limit = q.limit.clamp(1, MAX_LIMIT);
        if limit != q.limit {
            warn!("search limit {} out of range, using {limit}", q.limit);
        }
        let filter = FilterSet::events()
            .containing(q.text.clone())
            .app(q.app.clone())
            .between(q.from, q.to)
            .newest_first()
            .limit(limit);
        let rows = store.query(&filter)?;
        info!("search {:?} matched {} dictations", q.text, rows.len());

        let hits = rows
            .into_iter()
            .map(|e| SearchHit {
                time: e.timestamp.map(|ts| tz.local_datetime(ts)),
                app: self.apps.canonical_name(e.app.as_deref()),
                words: e.words(),
                text: e.formatted_text.unwrap_or_default(),
            })
            .collect();

        Ok(SearchResults {
            query: q.text.clone(),
            hits,
        })
    }
}

pub fn render_text(results: &SearchResults) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n🔍 Search: '{}' ({} results)\n",
        results.query,
        results.hits.len()
    ));
    out.push_str(&"=".repeat(60));
    out.push('\n');

    if results.hits.is_empty() {
        out.push_str("\nNo matches found.\n");
        return out;
    }

    for hit in &results.hits {
        out.push_str(&format!(
            "\n📅 {} | {} | {} words\n",
            hit.time.as_deref().unwrap_or("unknown time"),
            hit.app,
            hit.words
        ));
        out.push_str(&format!("   {}\n", truncate_chars(&hit.text, PREVIEW_CHARS)));
    }
    out.push('\n');
    out
}
