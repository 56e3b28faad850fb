//! Static HTML dashboard. The page embeds three precomputed series and four
//! headline numbers; charting happens client-side.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::aggregate::{aggregate_by, totals, BucketOrder};
use crate::apps::Canonicalizer;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::report::{fmt_thousands, write_output};
use crate::store::{FilterSet, Store};

const TEMPLATE: &str = include_str!("../../templates/dashboard.html");

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyWords {
    pub date: String,
    pub words: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HourlyWords {
    pub hour: String,
    pub words: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppWords {
    pub app: String,
    pub words: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_words: i64,
    pub total_dictations: u64,
    pub total_hours: f64,
    pub avg_words: i64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub daily: Vec<DailyWords>,
    pub hourly: Vec<HourlyWords>,
    pub apps: Vec<AppWords>,
}

pub struct DashboardReport {
    config: ReportConfig,
    apps: Canonicalizer,
}

impl DashboardReport {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            apps: Canonicalizer::dashboard(),
        }
    }

    pub fn collect(&self) -> Result<DashboardData> {
        let store = Store::open(&self.config)?;
        let tz = store.normalizer();
        let rows = store.query(&FilterSet::statistics())?;

        let t = totals(&rows);
        let stats = DashboardStats {
            total_words: t.words,
            total_dictations: t.dictations,
            total_hours: t.hours(),
            avg_words: average_words(t.words, t.dictations),
            first_date: t.first.map(|ts| tz.local_day(ts)),
            last_date: t.last.map(|ts| tz.local_day(ts)),
        };

        let daily = aggregate_by(&rows, |e| e.timestamp.map(|ts| tz.local_day(ts)), BucketOrder::ByKey)
            .into_iter()
            .map(|r| DailyWords {
                date: r.key,
                words: r.words,
            })
            .collect();
        let hourly = aggregate_by(&rows, |e| e.timestamp.map(|ts| tz.local_hour(ts)), BucketOrder::ByKey)
            .into_iter()
            .map(|r| HourlyWords {
                hour: r.key,
                words: r.words,
            })
            .collect();
        let apps = aggregate_by(
            &rows,
            |e| Some(self.apps.canonical_name(e.app.as_deref())),
            BucketOrder::TopByWords(None),
        )
        .into_iter()
        .map(|r| AppWords {
            app: r.key,
            words: r.words,
        })
        .collect();

        Ok(DashboardData {
            stats,
            daily,
            hourly,
            apps,
        })
    }

    pub fn write(&self, output: &Path) -> Result<PathBuf> {
        let data = self.collect()?;
        let html = render_html(&data)?;
        write_output(output, html.as_bytes())?;
        info!("dashboard written to {}", output.display());
        Ok(output.to_path_buf())
    }
}

/// `round(words / max(dictations, 1))`, halves to even.
pub fn average_words(words: i64, dictations: u64) -> i64 {
    (words as f64 / dictations.max(1) as f64).round_ties_even() as i64
}

pub fn render_html(data: &DashboardData) -> Result<String> {
    let subtitle = match (&data.stats.first_date, &data.stats.last_date) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "No dictations yet".to_string(),
    };

    Ok(TEMPLATE
        .replace("{{SUBTITLE}}", &html_escape(&subtitle))
        .replace("{{TOTAL_WORDS}}", &fmt_thousands(data.stats.total_words))
        .replace(
            "{{TOTAL_DICTATIONS}}",
            &fmt_thousands(data.stats.total_dictations as i64),
        )
        .replace("{{TOTAL_HOURS}}", &format!("{:.1}", data.stats.total_hours))
        .replace("{{AVG_WORDS}}", &data.stats.avg_words.to_string())
        .replace("{{DAILY_JSON}}", &script_json(&data.daily)?)
        .replace("{{HOURLY_JSON}}", &script_json(&data.hourly)?)
        .replace("{{APP_JSON}}", &script_json(&data.apps)?))
}

/// JSON safe to inline in a `<script>` block.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
