use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::aggregate::{aggregate_by, round1, totals, BucketOrder};
use crate::apps::Canonicalizer;
use crate::clock::Period;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::report::fmt_thousands;
use crate::store::{FilterSet, Store};

const TOP_APPS: usize = 10;
const TOP_APPS_SHOWN: usize = 7;
const RECENT_DAYS: usize = 7;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AppUsage {
    pub app: String,
    pub count: u64,
    pub words: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayUsage {
    pub date: String,
    pub dictations: u64,
    pub words: i64,
    pub minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HourUsage {
    pub hour: String,
    pub count: u64,
    pub words: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryStats {
    pub period: &'static str,
    pub total_dictations: u64,
    pub total_words: i64,
    pub total_hours: f64,
    pub avg_words_per_dictation: f64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub top_apps: Vec<AppUsage>,
    /// Most recent day first.
    pub daily: Vec<DayUsage>,
    /// All 24 hours, `00` first.
    pub hourly: Vec<HourUsage>,
    pub peak_hour: Option<HourUsage>,
}

pub struct StatsReport {
    config: ReportConfig,
    apps: Canonicalizer,
}

impl StatsReport {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            apps: Canonicalizer::top_apps(),
        }
    }

    pub fn collect(&self, period: Option<Period>, now: OffsetDateTime) -> Result<SummaryStats> {
        let store = Store::open(&self.config)?;
        let tz = store.normalizer();

        let mut filter = FilterSet::statistics();
        if let Some(p) = period {
            let (from, to) = p.range(tz.today(now));
            filter = filter.between(Some(from), Some(to));
        }
        let rows = store.query(&filter)?;
        info!("summarizing {} dictations ({})", rows.len(), Period::label(period));

        let t = totals(&rows);

        let top_apps = aggregate_by(
            &rows,
            |e| Some(self.apps.canonical_name(e.app.as_deref())),
            BucketOrder::TopByWords(Some(TOP_APPS)),
        )
        .into_iter()
        .map(|r| AppUsage {
            app: r.key,
            count: r.dictations,
            words: r.words,
        })
        .collect();

        let days = aggregate_by(&rows, |e| e.timestamp.map(|ts| tz.local_day(ts)), BucketOrder::ByKey);
        let daily = days
            .into_iter()
            .rev()
            .take(RECENT_DAYS)
            .map(|r| DayUsage {
                date: r.key,
                dictations: r.dictations,
                words: r.words,
                minutes: round1(r.duration_seconds / 60.0),
            })
            .collect();

        let observed = aggregate_by(&rows, |e| e.timestamp.map(|ts| tz.local_hour(ts)), BucketOrder::ByKey);
        let hourly: Vec<HourUsage> = (0..24)
            .map(|h| {
                let hour = format!("{h:02}");
                match observed.iter().find(|r| r.key == hour) {
                    Some(r) => HourUsage {
                        hour,
                        count: r.dictations,
                        words: r.words,
                    },
                    None => HourUsage {
                        hour,
                        count: 0,
                        words: 0,
                    },
                }
            })
            .collect();
        let peak_hour = peak_hour(&hourly);

        Ok(SummaryStats {
            period: Period::label(period),
            total_dictations: t.dictations,
            total_words: t.words,
            total_hours: t.hours(),
            avg_words_per_dictation: t.avg_words(),
            first_date: t.first.map(|ts| tz.local_day(ts)),
            last_date: t.last.map(|ts| tz.local_day(ts)),
            top_apps,
            daily,
            hourly,
            peak_hour,
        })
    }
}

/// Busiest hour by dictation count; the earliest hour wins a tie.
fn peak_hour(hourly: &[HourUsage]) -> Option<HourUsage> {
    let mut best: Option<&HourUsage> = None;
    for h in hourly.iter().filter(|h| h.count > 0) {
        if best.map_or(true, |b| h.count > b.count) {
            best = Some(h);
        }
    }
    best.cloned()
}

pub fn render_text(stats: &SummaryStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n🎙️  Wispr Flow Stats ({})\n", stats.period));
    out.push_str(&"=".repeat(50));
    out.push('\n');

    out.push_str("\n📊 Overview:\n");
    out.push_str(&format!(
        "   Dictations:  {}\n",
        fmt_thousands(stats.total_dictations as i64)
    ));
    out.push_str(&format!("   Total Words: {}\n", fmt_thousands(stats.total_words)));
    out.push_str(&format!("   Hours:       {:.1}h\n", stats.total_hours));
    out.push_str(&format!(
        "   Avg/Dict:    {:.1} words\n",
        stats.avg_words_per_dictation
    ));
    out.push_str(&format!(
        "   Period:      {} to {}\n",
        stats.first_date.as_deref().unwrap_or("n/a"),
        stats.last_date.as_deref().unwrap_or("n/a")
    ));

    out.push_str("\n📱 Top Apps:\n");
    if stats.top_apps.is_empty() {
        out.push_str("   (none)\n");
    }
    for app in stats.top_apps.iter().take(TOP_APPS_SHOWN) {
        out.push_str(&format!(
            "   {:20} {} words ({} dictations)\n",
            app.app,
            fmt_thousands(app.words),
            app.count
        ));
    }

    out.push_str("\n📅 Recent Days:\n");
    if stats.daily.is_empty() {
        out.push_str("   (none)\n");
    }
    for day in &stats.daily {
        out.push_str(&format!(
            "   {}: {} words ({} dict, {:.1}min)\n",
            day.date,
            fmt_thousands(day.words),
            day.dictations,
            day.minutes
        ));
    }

    if let Some(peak) = &stats.peak_hour {
        out.push_str(&format!(
            "\n⏰ Peak Hour: {}:00 ({} dictations)\n",
            peak.hour, peak.count
        ));
    }
    out.push('\n');
    out
}
