//! Fixed-offset local time.
//!
//! The history store keeps UTC instants. Every day or hour a report shows,
//! groups by, or filters on goes through [`TimeNormalizer`], and the SQL date
//! filters use [`TimeNormalizer::sqlite_modifier`], so both sides agree on
//! where a local day starts.

use serde::Serialize;
use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeNormalizer {
    offset: UtcOffset,
}

impl TimeNormalizer {
    pub fn from_minutes(minutes: i32) -> Self {
        let offset =
            UtcOffset::from_whole_seconds(minutes.saturating_mul(60)).unwrap_or(UtcOffset::UTC);
        Self { offset }
    }

    pub fn offset_minutes(&self) -> i32 {
        i32::from(self.offset.whole_minutes())
    }

    /// SQLite date-function modifier applying the same offset, e.g. `-300 minutes`.
    pub fn sqlite_modifier(&self) -> String {
        format!("{:+} minutes", self.offset_minutes())
    }

    pub fn local_date(&self, ts: OffsetDateTime) -> Date {
        ts.to_offset(self.offset).date()
    }

    /// `YYYY-MM-DD`
    pub fn local_day(&self, ts: OffsetDateTime) -> String {
        format_day(self.local_date(ts))
    }

    /// Zero-padded `00`..`23`.
    pub fn local_hour(&self, ts: OffsetDateTime) -> String {
        format!("{:02}", ts.to_offset(self.offset).hour())
    }

    /// `HH:MM`
    pub fn local_time(&self, ts: OffsetDateTime) -> String {
        let local = ts.to_offset(self.offset);
        format!("{:02}:{:02}", local.hour(), local.minute())
    }

    /// `YYYY-MM-DD HH:MM:SS`
    pub fn local_datetime(&self, ts: OffsetDateTime) -> String {
        let local = ts.to_offset(self.offset);
        format!(
            "{} {:02}:{:02}:{:02}",
            format_day(local.date()),
            local.hour(),
            local.minute(),
            local.second()
        )
    }

    pub fn today(&self, now: OffsetDateTime) -> Date {
        self.local_date(now)
    }
}

pub fn format_day(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

/// Parse a strict `YYYY-MM-DD` local day.
pub fn parse_local_day(input: &str) -> Option<Date> {
    let parts: Vec<&str> = input.trim().split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
        return None;
    }
    let y: i32 = parts[0].parse().ok()?;
    let m: u8 = parts[1].parse().ok()?;
    let d: u8 = parts[2].parse().ok()?;
    let month = Month::try_from(m).ok()?;
    Date::from_calendar_date(y, month, d).ok()
}

/// Named relative date range, counted in local days ending today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
}

impl Period {
    fn days(self) -> i64 {
        match self {
            Period::Today => 1,
            Period::Week => 7,
            Period::Month => 30,
        }
    }

    /// Inclusive `(from, to)` local-day range.
    pub fn range(self, today: Date) -> (Date, Date) {
        let from = today
            .checked_sub(Duration::days(self.days() - 1))
            .unwrap_or(Date::MIN);
        (from, today)
    }

    pub fn label(period: Option<Period>) -> &'static str {
        match period {
            Some(Period::Today) => "today",
            Some(Period::Week) => "week",
            Some(Period::Month) => "month",
            None => "all",
        }
    }
}
